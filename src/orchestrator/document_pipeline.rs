//! 文档上传流水线 - 编排层
//!
//! ## 职责
//!
//! 1. **校验**：文件类型、每块题目数量
//! 2. **提取**：文件 → 纯文本（空白文本直接拒绝）
//! 3. **登记**：保存文档元数据
//! 4. **派发**：把生成任务交给 `JobQueue` 后立即返回
//!
//! 提取出来的文本不落库，只在后台任务里使用一次。

use std::path::Path;
use std::sync::Arc;
use tracing::info;

use crate::error::{AppResult, BusinessError, ExtractError};
use crate::models::{Difficulty, DocumentRecord};
use crate::orchestrator::job_queue::JobQueue;
use crate::services::text_extractor::DocumentKind;
use crate::services::TextExtractor;
use crate::store::Store;
use crate::workflow::{GenerationCtx, GenerationFlow};

/// 每个分块生成题目数量的范围
pub const MIN_QUESTIONS_PER_CHUNK: usize = 1;
pub const MAX_QUESTIONS_PER_CHUNK: usize = 5;

/// 上传参数
#[derive(Debug, Clone, PartialEq)]
pub struct UploadOptions {
    pub questions_per_chunk: usize,
    pub difficulty: Difficulty,
    pub category: Option<String>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            questions_per_chunk: 2,
            difficulty: Difficulty::Medium,
            category: None,
        }
    }
}

/// 文档服务
pub struct DocumentService {
    store: Arc<Store>,
    extractor: TextExtractor,
    flow: Arc<GenerationFlow>,
    jobs: Arc<JobQueue>,
}

impl DocumentService {
    pub fn new(store: Arc<Store>, flow: Arc<GenerationFlow>, jobs: Arc<JobQueue>) -> Self {
        Self {
            store,
            extractor: TextExtractor::new(),
            flow,
            jobs,
        }
    }

    /// 上传文档：登记后立即返回，题目在后台生成
    pub async fn upload(
        &self,
        path: impl AsRef<Path>,
        options: UploadOptions,
    ) -> AppResult<DocumentRecord> {
        let path = path.as_ref();

        if !(MIN_QUESTIONS_PER_CHUNK..=MAX_QUESTIONS_PER_CHUNK)
            .contains(&options.questions_per_chunk)
        {
            return Err(BusinessError::InvalidQuestionCount {
                requested: options.questions_per_chunk,
                min: MIN_QUESTIONS_PER_CHUNK,
                max: MAX_QUESTIONS_PER_CHUNK,
            }
            .into());
        }
        DocumentKind::from_path(path)?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let file_size = tokio::fs::metadata(path)
            .await
            .map_err(|source| ExtractError::ReadFailed {
                path: path.display().to_string(),
                source,
            })?
            .len();

        let text = self.extractor.extract(path).await?;

        let document = self
            .store
            .documents
            .insert_one(DocumentRecord::new(filename, file_size))
            .await?;
        info!(
            "📥 文档已登记: {} ({} 字节, ID {})",
            document.filename, document.file_size, document.id
        );

        let ctx = GenerationCtx::new(
            &document,
            options.questions_per_chunk,
            options.difficulty,
            options.category,
        );
        self.jobs
            .spawn_document_job(self.flow.clone(), ctx, text)
            .await;

        Ok(document)
    }

    /// 全部已上传文档
    pub async fn list_documents(&self) -> Vec<DocumentRecord> {
        self.store.documents.find(|_| true).await
    }
}
