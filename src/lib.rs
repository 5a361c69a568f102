//! # MCQ Generator
//!
//! 基于大模型的选择题生成：按主题或上传的文档生成选择题，入库后可组卷、判分、导出。
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Clients / Store）
//! - `clients/` - 模型 API：`Transport` 负责一次网络往返，`ModelClient` 负责重试
//! - `store/` - 三个集合（questions / documents / quiz_results），JSON 快照持久化
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，不关心调用顺序
//! - `Chunker` - 重叠分块
//! - `prompt_builder` / `response_parser` - 提示词与模型输出解析
//! - `TextExtractor` - txt / pdf / docx 文本提取
//! - `QuestionService` / `QuizService` / `ExportService` - 题目管理、测验、导出
//! - `FailureLog` - 写失败记录能力
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一次生成"的完整流程
//! - `GenerationCtx` - 上下文封装（文档 + 生成参数）
//! - `GenerationFlow` - 分块 → 提示词 → 模型 → 解析 → 入库
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 批量运行器，管理资源
//! - `orchestrator/document_pipeline` - 文档上传
//! - `orchestrator/job_queue` - 后台任务与并发控制
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod logger;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod store;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use clients::{ModelClient, RawResponse, RetryPolicy, Transport, TransportError};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{
    Difficulty, DocumentRecord, McqItem, QuestionDraft, QuestionQuery, QuestionRecord, Source,
};
pub use orchestrator::{App, DocumentService, JobQueue, UploadOptions};
pub use store::Store;
pub use workflow::{DocumentGenerationReport, GenerationCtx, GenerationFlow, TopicRequest};
