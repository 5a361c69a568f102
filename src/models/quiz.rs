use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

/// 组卷请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizRequest {
    #[serde(default = "default_quiz_size")]
    pub num_questions: usize,
    #[serde(default)]
    pub difficulty: Option<super::Difficulty>,
    #[serde(default)]
    pub category: Option<String>,
}

fn default_quiz_size() -> usize {
    5
}

impl Default for QuizRequest {
    fn default() -> Self {
        Self {
            num_questions: default_quiz_size(),
            difficulty: None,
            category: None,
        }
    }
}

/// 发给答题者的题目（不含答案）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
}

/// 单题作答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: String,
    pub user_answer_index: usize,
}

/// 一次测验提交
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSubmission {
    pub answers: Vec<UserAnswer>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// 测验结果，每次提交创建一次，之后不再修改
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub quiz_date: DateTime<Utc>,
    pub total_questions: usize,
    pub correct_answers: usize,
    /// 百分制得分
    pub score: f64,
}

impl QuizResult {
    pub fn new(total_questions: usize, correct_answers: usize, user_id: Option<String>) -> Self {
        let score = if total_questions == 0 {
            0.0
        } else {
            100.0 * correct_answers as f64 / total_questions as f64
        };
        Self {
            id: super::new_record_id(),
            user_id,
            quiz_date: Utc::now(),
            total_questions,
            correct_answers,
            score,
        }
    }
}

impl Record for QuizResult {
    const COLLECTION: &'static str = "quiz_results";

    fn id(&self) -> &str {
        &self.id
    }
}
