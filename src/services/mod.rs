//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，不关心调用顺序：
//! - 生成相关：`chunker` / `prompt_builder` / `response_parser`
//! - 文件相关：`text_extractor` / `failure_log`
//! - 数据相关：`question_service` / `quiz_service` / `export_service`

pub mod chunker;
pub mod export_service;
pub mod failure_log;
pub mod prompt_builder;
pub mod question_service;
pub mod quiz_service;
pub mod response_parser;
pub mod text_extractor;

pub use chunker::{Chunker, Chunks};
pub use export_service::ExportService;
pub use failure_log::FailureLog;
pub use prompt_builder::{build_prompt, build_request, PromptSpec};
pub use question_service::QuestionService;
pub use quiz_service::QuizService;
pub use response_parser::{parse_mcq_items, parse_with_diagnostics, DropReason, ParsedBatch};
pub use text_extractor::TextExtractor;
