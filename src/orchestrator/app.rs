//! 批量运行器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责资源的创建和一次完整的批量运行。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：打开存储、创建模型客户端、生成流程和任务队列
//! 2. **主题生成**：配置了 `topic` 时先按主题生成一批题目
//! 3. **批量上传**：扫描文档目录，逐个上传（生成在后台进行）
//! 4. **收尾**：等待所有后台任务结束，按需导出 JSON
//! 5. **全局统计**：汇总文档、题目和失败数量
//!
//! ## 设计特点
//!
//! - **资源所有者**：唯一持有 Store / ModelClient / JobQueue 的模块
//! - **向下委托**：上传委托 `DocumentService`，生成委托 `GenerationFlow`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::clients::{ModelClient, ReqwestTransport, RetryPolicy, Transport};
use crate::config::Config;
use crate::error::{AppError, BusinessError};
use crate::models::{QuestionQuery, Source};
use crate::orchestrator::document_pipeline::{DocumentService, UploadOptions};
use crate::orchestrator::job_queue::JobQueue;
use crate::services::text_extractor::is_supported;
use crate::services::{Chunker, ExportService, FailureLog, QuestionService, QuizService};
use crate::store::Store;
use crate::utils::logging::{self, FinalStats};
use crate::workflow::{GenerationFlow, TopicRequest};

/// 应用主结构
pub struct App {
    config: Config,
    store: Arc<Store>,
    flow: Arc<GenerationFlow>,
    jobs: Arc<JobQueue>,
    documents: DocumentService,
}

impl App {
    /// 初始化应用（Gemini + reqwest）
    pub async fn initialize(config: Config) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config).context("创建 HTTP 客户端失败")?;
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// 使用指定的传输层初始化
    pub async fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Result<Self> {
        logging::log_startup(config.max_concurrent_jobs, &config.data_dir);

        let store = Arc::new(
            Store::open(config.data_path())
                .await
                .with_context(|| format!("无法打开数据目录: {}", config.data_dir))?,
        );
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        let model = Arc::new(ModelClient::new(transport, RetryPolicy::from_config(&config)));

        let flow = Arc::new(
            GenerationFlow::new(model, store.clone(), chunker)
                .with_verbose_logging(config.verbose_logging),
        );
        let failure_log = Arc::new(FailureLog::with_path(&config.failure_log_file));
        let jobs = Arc::new(JobQueue::new(config.max_concurrent_jobs, failure_log));
        let documents = DocumentService::new(store.clone(), flow.clone(), jobs.clone());

        Ok(Self {
            config,
            store,
            flow,
            jobs,
            documents,
        })
    }

    pub fn documents(&self) -> &DocumentService {
        &self.documents
    }

    pub fn flow(&self) -> &GenerationFlow {
        &self.flow
    }

    pub fn questions(&self) -> QuestionService {
        QuestionService::new(self.store.clone())
    }

    pub fn quizzes(&self) -> QuizService {
        QuizService::new(self.store.clone())
    }

    pub fn exports(&self) -> ExportService {
        ExportService::new(self.store.clone())
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<FinalStats> {
        let mut stats = FinalStats::default();

        // 主题生成（可选）
        if let Some(topic) = &self.config.topic {
            stats.questions_generated += self.generate_topic(topic).await;
        }

        // 上传文档目录中的所有文档
        let files = self.scan_documents().await?;
        if files.is_empty() {
            warn!("⚠️ 没有找到待处理的文档");
        } else {
            logging::log_documents_found(files.len(), &self.config.documents_folder);
        }

        let options = UploadOptions {
            questions_per_chunk: self.config.questions_per_chunk,
            difficulty: self.config.default_difficulty,
            category: self.config.category.clone(),
        };
        for (index, path) in files.iter().enumerate() {
            info!("[文档 {}/{}] 📥 上传 {}", index + 1, files.len(), path.display());
            match self.documents.upload(path, options.clone()).await {
                Ok(_) => stats.documents_uploaded += 1,
                Err(e) => {
                    error!("[文档 {}/{}] ❌ 上传失败: {}", index + 1, files.len(), e);
                    stats.documents_rejected += 1;
                }
            }
        }

        // 等待后台生成结束
        info!("⏳ 等待后台生成任务完成...");
        let summary = self.jobs.drain().await;
        stats.questions_generated += summary.questions_saved;
        stats.failed_chunks = summary.failed_chunks;
        stats.failed_jobs = summary.failed;

        // 导出（可选）
        if let Some(export_file) = &self.config.export_file {
            self.export(Path::new(export_file)).await?;
        }

        for source in [Source::AiGenerated, Source::DocumentUpload, Source::Manual] {
            let query = QuestionQuery {
                source: Some(source),
                ..Default::default()
            };
            let count = self.store.questions.find(|q| query.matches(q)).await.len();
            stats.questions_by_source.push((source.as_str(), count));
        }

        logging::print_final_stats(&stats, &self.config.failure_log_file);
        Ok(stats)
    }

    /// 主题生成失败不影响后续文档处理
    async fn generate_topic(&self, topic: &str) -> usize {
        let request = TopicRequest {
            topic: topic.to_string(),
            num_questions: self.config.topic_num_questions,
            difficulty: self.config.default_difficulty,
            category: self.config.category.clone(),
        };
        match self.flow.generate_from_topic(&request).await {
            Ok(saved) => saved.len(),
            Err(e) => {
                error!("[主题 {}] ❌ 生成失败: {}", topic, e);
                0
            }
        }
    }

    /// 扫描文档目录，只保留支持的文件类型，按文件名排序
    async fn scan_documents(&self) -> Result<Vec<PathBuf>> {
        let folder = Path::new(&self.config.documents_folder);
        info!("\n📁 正在扫描待处理的文档: {}", folder.display());

        if !folder.exists() {
            warn!("⚠️ 文档目录不存在: {}", folder.display());
            return Ok(Vec::new());
        }

        let mut entries = tokio::fs::read_dir(folder)
            .await
            .with_context(|| format!("无法读取文档目录: {}", folder.display()))?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if is_supported(&path) {
                files.push(path);
            } else {
                info!("跳过不支持的文件: {}", path.display());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn export(&self, path: &Path) -> Result<()> {
        match self
            .exports()
            .export_to_file(&QuestionQuery::default(), path)
            .await
        {
            Ok(_) => Ok(()),
            Err(AppError::Business(BusinessError::NothingToExport)) => {
                warn!("⚠️ 题库为空，跳过导出");
                Ok(())
            }
            Err(e) => Err(anyhow::Error::new(e).context(format!("导出失败: {}", path.display()))),
        }
    }
}
