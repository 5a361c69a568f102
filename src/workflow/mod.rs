pub mod generation_ctx;
pub mod generation_flow;

pub use generation_ctx::GenerationCtx;
pub use generation_flow::{
    ChunkFailure, DocumentGenerationReport, GenerationFlow, TopicRequest, MAX_TOPIC_QUESTIONS,
    MIN_TOPIC_QUESTIONS,
};
