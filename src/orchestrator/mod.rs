//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责资源管理、后台任务和批量调度。
//!
//! ## 模块划分
//!
//! ### `app` - 批量运行器
//! - 管理应用生命周期（初始化、运行）
//! - 持有 Store、ModelClient、JobQueue
//! - 主题生成、扫描文档目录、导出、全局统计
//!
//! ### `document_pipeline` - 文档上传
//! - 校验 → 提取文本 → 登记文档 → 派发后台任务
//!
//! ### `job_queue` - 后台任务队列
//! - tokio::spawn + Semaphore 控制并发
//! - 失败写入失败记录文件
//! - drain 等待全部完成
//!
//! ## 层次关系
//!
//! ```text
//! app (处理整个文档目录)
//!     ↓
//! document_pipeline (处理单个文档上传)
//!     ↓
//! job_queue (后台运行)
//!     ↓
//! workflow::GenerationFlow (一个文档 / 一个主题的生成)
//!     ↓
//! services (能力层：chunker / prompt / parser / extractor ...)
//!     ↓
//! clients (模型 API：重试 + 传输层)
//! ```

pub mod app;
pub mod document_pipeline;
pub mod job_queue;

// 重新导出主要类型
pub use app::App;
pub use document_pipeline::{DocumentService, UploadOptions};
pub use job_queue::{JobQueue, JobSummary};
