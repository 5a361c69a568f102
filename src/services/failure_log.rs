//! 失败记录服务 - 业务能力层
//!
//! 只负责"追加写失败记录文件"，不关心流程。
//! 文档生成是后台任务，调用方看不到失败，失败原因都落在这里。

use chrono::Local;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppResult, StoreError};

/// 默认失败记录文件
pub const DEFAULT_FAILURE_LOG: &str = "generation_failures.log";

/// 失败记录服务
///
/// - 每次写入一行：时间 | 文档 | 文件名 | 原因
/// - 多个后台任务共享同一个实例，写入互斥
#[derive(Debug)]
pub struct FailureLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::with_path(DEFAULT_FAILURE_LOG)
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 追加一条失败记录
    pub async fn record(&self, document_id: &str, filename: &str, reason: &str) -> AppResult<()> {
        debug!(
            "写入失败记录: 文档 {} | 文件 {} | 原因长度: {}",
            document_id,
            filename,
            reason.len()
        );

        let line = format!(
            "{} | 文档 {} | 文件 {} | {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            document_id,
            filename,
            reason.replace('\n', " ")
        );

        let _guard = self.write_lock.lock().await;
        let io_err = |source| StoreError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(io_err)?;
        file.write_all(line.as_bytes()).await.map_err(io_err)?;
        file.flush().await.map_err(io_err)?;

        Ok(())
    }
}

impl Default for FailureLog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_appends_one_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let log = FailureLog::with_path(dir.path().join("failures.log"));

        log.record("doc-1", "notes.txt", "HTTP 400\nbad key")
            .await
            .unwrap();
        log.record("doc-2", "paper.pdf", "retries exhausted")
            .await
            .unwrap();

        let content = tokio::fs::read_to_string(log.path()).await.unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("文档 doc-1 | 文件 notes.txt | HTTP 400 bad key"));
        assert!(lines[1].ends_with("retries exhausted"));
    }
}
