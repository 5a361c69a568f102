//! 带重试的模型客户端
//!
//! 状态机：`Attempting(i) → {Success, Retryable, Fatal}`，
//! Retryable 在 i+1 < max 时等待 `initial_backoff * 2^i` 后进入 `Attempting(i+1)`，
//! 否则进入 Exhausted。最后一次失败之后不再等待。

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::gemini::{GenerateContentResponse, ModelRequest};
use super::transport::{RawResponse, Transport};
use crate::config::Config;
use crate::error::GenerationError;
use crate::utils::logging::truncate_text;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 总尝试次数（含第一次）
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_attempts: config.max_attempts,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }

    /// 第 `attempt_index` 次（从 0 开始）失败后的等待时间
    pub fn backoff(&self, attempt_index: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(1u32 << attempt_index.min(31))
    }
}

/// 单次尝试的结果
#[derive(Debug)]
enum Attempt {
    Success(String),
    Retryable(String),
    Fatal(GenerationError),
}

/// 模型客户端
///
/// 显式构造后传给需要它的组件，API Key 由传输层持有。
pub struct ModelClient {
    transport: Arc<dyn Transport>,
    policy: RetryPolicy,
}

impl ModelClient {
    pub fn new(transport: Arc<dyn Transport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// 发送请求并返回生成的原始文本
    ///
    /// 503 和网络错误按指数退避重试；其他 HTTP 错误、响应结构不符合约定、
    /// 重试耗尽都是 Fatal。尝试之间严格串行。
    pub async fn call(&self, request: ModelRequest) -> Result<String, GenerationError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            debug!("第 {}/{} 次调用模型 API...", attempt + 1, max_attempts);

            match self.attempt(&request).await {
                Attempt::Success(text) => {
                    debug!("第 {} 次调用成功, 返回 {} 字符", attempt + 1, text.len());
                    return Ok(text);
                }
                Attempt::Fatal(err) => {
                    error!("模型 API 调用失败 (不可重试): {}", err);
                    return Err(err);
                }
                Attempt::Retryable(reason) => {
                    if attempt + 1 < max_attempts {
                        let wait = self.policy.backoff(attempt);
                        warn!(
                            "模型 API 暂时不可用 (尝试 {}/{}): {}, {:?} 后重试...",
                            attempt + 1,
                            max_attempts,
                            reason,
                            wait
                        );
                        sleep(wait).await;
                    } else {
                        warn!(
                            "模型 API 暂时不可用 (尝试 {}/{}): {}",
                            attempt + 1,
                            max_attempts,
                            reason
                        );
                    }
                    last_error = reason;
                }
            }
        }

        info!("❌ 已重试 {} 次, 放弃本次调用", max_attempts);
        Err(GenerationError::RetriesExhausted {
            attempts: max_attempts,
            last_error,
        })
    }

    async fn attempt(&self, request: &ModelRequest) -> Attempt {
        match self.transport.send(request).await {
            Ok(response) => interpret_response(response),
            Err(e) if e.retryable => Attempt::Retryable(format!("网络错误: {}", e)),
            Err(e) => Attempt::Fatal(GenerationError::Transport { message: e.message }),
        }
    }
}

fn interpret_response(response: RawResponse) -> Attempt {
    let RawResponse { status, body } = response;

    match status {
        200..=299 => {}
        503 => {
            return Attempt::Retryable(format!(
                "HTTP 503 服务过载: {}",
                truncate_text(&body, 200)
            ))
        }
        _ => return Attempt::Fatal(GenerationError::Http { status, body }),
    }

    let envelope: GenerateContentResponse = match serde_json::from_str(&body) {
        Ok(envelope) => envelope,
        Err(e) => {
            return Attempt::Fatal(GenerationError::InvalidEnvelope {
                reason: e.to_string(),
                body,
            })
        }
    };

    match envelope.first_text() {
        Some(text) => Attempt::Success(text.to_string()),
        None => Attempt::Fatal(GenerationError::MissingText { body }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fake::{gemini_body, FakeTransport};
    use crate::clients::transport::TransportError;

    fn client(transport: Arc<FakeTransport>) -> ModelClient {
        ModelClient::new(transport, RetryPolicy::default())
    }

    fn request() -> ModelRequest {
        ModelRequest::user_prompt("Generate 1 MCQs")
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_secs(1));
        assert_eq!(policy.backoff(1), Duration::from_secs(2));
        assert_eq!(policy.backoff(2), Duration::from_secs(4));
        assert_eq!(policy.backoff(3), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_k_overloads_with_growing_waits() {
        for k in 0..5usize {
            let transport = Arc::new(FakeTransport::new(move |call, _| {
                if call < k {
                    Ok(RawResponse {
                        status: 503,
                        body: "overloaded".to_string(),
                    })
                } else {
                    Ok(gemini_body("Q: ok"))
                }
            }));

            let text = client(transport.clone()).call(request()).await.unwrap();
            assert_eq!(text, "Q: ok");
            assert_eq!(transport.call_count(), k + 1);

            let gaps = transport.gaps();
            let expected: Vec<Duration> = (0..k as u32)
                .map(|i| Duration::from_secs(1 << i))
                .collect();
            assert_eq!(gaps, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_always_overloaded_exhausts_after_five_attempts() {
        let transport = Arc::new(FakeTransport::new(|_, _| {
            Ok(RawResponse {
                status: 503,
                body: "overloaded".to_string(),
            })
        }));

        let started = tokio::time::Instant::now();
        let err = client(transport.clone()).call(request()).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::RetriesExhausted { attempts: 5, .. }
        ));
        assert_eq!(transport.call_count(), 5);
        // 1 + 2 + 4 + 8，最后一次失败后不再等待
        assert_eq!(started.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_errors_are_retried() {
        let transport = Arc::new(FakeTransport::new(|call, _| {
            if call == 0 {
                Err(TransportError::network("connection reset"))
            } else {
                Ok(gemini_body("Q: after reset"))
            }
        }));

        let text = client(transport.clone()).call(request()).await.unwrap();
        assert_eq!(text, "Q: after reset");
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn test_other_status_is_fatal_without_retry() {
        let transport = Arc::new(FakeTransport::new(|_, _| {
            Ok(RawResponse {
                status: 400,
                body: "API key not valid".to_string(),
            })
        }));

        let err = client(transport.clone()).call(request()).await.unwrap_err();
        match err {
            GenerationError::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "API key not valid");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unparseable_body_is_fatal() {
        let transport = Arc::new(FakeTransport::new(|_, _| {
            Ok(RawResponse {
                status: 200,
                body: "<html>proxy error</html>".to_string(),
            })
        }));

        let err = client(transport.clone()).call(request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::InvalidEnvelope { .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_text_path_is_fatal() {
        let transport = Arc::new(FakeTransport::new(|_, _| {
            Ok(RawResponse {
                status: 200,
                body: r#"{"candidates":[{"finishReason":"SAFETY"}]}"#.to_string(),
            })
        }));

        let err = client(transport.clone()).call(request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::MissingText { .. }));
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_client_side_transport_error_is_fatal() {
        let transport = Arc::new(FakeTransport::new(|_, _| {
            Err(TransportError::fatal("builder error"))
        }));

        let err = client(transport.clone()).call(request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::Transport { .. }));
        assert_eq!(transport.call_count(), 1);
    }
}
