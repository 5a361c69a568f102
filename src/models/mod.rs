pub mod document;
pub mod mcq;
pub mod question;
pub mod quiz;

pub use document::DocumentRecord;
pub use mcq::McqItem;
pub use question::{Difficulty, QuestionDraft, QuestionQuery, QuestionRecord, Source};
pub use quiz::{QuizQuestion, QuizRequest, QuizResult, QuizSubmission, UserAnswer};

/// 生成记录 ID（UUID v4 字符串）
pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
