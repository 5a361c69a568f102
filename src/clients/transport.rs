use async_trait::async_trait;
use std::fmt;

use super::gemini::ModelRequest;

/// 一次 HTTP 往返的原始结果（任何状态码都算"收到了响应"）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// 没有拿到响应时的错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportError {
    /// 连接重置、超时等网络层错误可以重试
    pub retryable: bool,
    pub message: String,
}

impl TransportError {
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            retryable: true,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            retryable: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 模型 API 的传输层
///
/// 每次调用对应一次网络请求，重试策略在 [`super::ModelClient`] 中实现。
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &ModelRequest) -> Result<RawResponse, TransportError>;
}
