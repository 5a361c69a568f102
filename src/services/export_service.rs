//! 导出服务 - 业务能力层
//!
//! 把符合条件的题目导出为格式化的 JSON 数组。

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppResult, BusinessError, StoreError};
use crate::models::{QuestionQuery, QuestionRecord};
use crate::store::Store;

/// 导出服务
pub struct ExportService {
    store: Arc<Store>,
}

impl ExportService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// 导出为 JSON 字符串；没有符合条件的题目时报错
    pub async fn export_json(&self, query: &QuestionQuery) -> AppResult<String> {
        let questions = self.matching(query).await?;
        Ok(serde_json::to_string_pretty(&questions)?)
    }

    /// 导出到文件，返回导出的题目数量
    pub async fn export_to_file(&self, query: &QuestionQuery, path: &Path) -> AppResult<usize> {
        let questions = self.matching(query).await?;
        let json = serde_json::to_string_pretty(&questions)?;

        tokio::fs::write(path, json)
            .await
            .map_err(|source| StoreError::Io {
                path: path.display().to_string(),
                source,
            })?;

        info!("📤 已导出 {} 道题目到 {}", questions.len(), path.display());
        Ok(questions.len())
    }

    async fn matching(&self, query: &QuestionQuery) -> AppResult<Vec<QuestionRecord>> {
        let questions = self.store.questions.find(|q| query.matches(q)).await;
        if questions.is_empty() {
            return Err(BusinessError::NothingToExport.into());
        }
        Ok(questions)
    }
}
