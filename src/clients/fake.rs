//! 测试用的传输层：按调用序号和请求内容决定响应，并记录每次调用的时间

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use super::gemini::ModelRequest;
use super::transport::{RawResponse, Transport, TransportError};

type Responder = dyn Fn(usize, &ModelRequest) -> Result<RawResponse, TransportError> + Send + Sync;

pub(crate) struct FakeTransport {
    responder: Box<Responder>,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl FakeTransport {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &ModelRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    /// 相邻两次调用之间的时间间隔
    pub(crate) fn gaps(&self) -> Vec<Duration> {
        let calls = self.calls.lock().unwrap();
        calls.windows(2).map(|w| w[1].0 - w[0].0).collect()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, request: &ModelRequest) -> Result<RawResponse, TransportError> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((Instant::now(), request.prompt_text().to_string()));
            calls.len() - 1
        };
        (self.responder)(call, request)
    }
}

/// 包装成 Gemini 的成功响应
pub(crate) fn gemini_body(text: &str) -> RawResponse {
    RawResponse {
        status: 200,
        body: serde_json::json!({
            "candidates": [{"content": {"role": "model", "parts": [{"text": text}]}}]
        })
        .to_string(),
    }
}
