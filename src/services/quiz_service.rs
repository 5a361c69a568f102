//! 测验服务 - 业务能力层
//!
//! 组卷：从符合条件的题目中随机抽取不重复的若干道，只下发题干和选项。
//! 判分：按题目 ID 对答案，找不到的题目按答错处理。

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppResult, BusinessError};
use crate::models::{
    QuestionQuery, QuestionRecord, QuizQuestion, QuizRequest, QuizResult, QuizSubmission,
};
use crate::store::Store;

/// 一次测验的题目数量范围
pub const MIN_QUIZ_QUESTIONS: usize = 1;
pub const MAX_QUIZ_QUESTIONS: usize = 20;

/// 测验服务
pub struct QuizService {
    store: Arc<Store>,
}

impl QuizService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// 随机组卷
    pub async fn generate_quiz(&self, request: &QuizRequest) -> AppResult<Vec<QuizQuestion>> {
        if !(MIN_QUIZ_QUESTIONS..=MAX_QUIZ_QUESTIONS).contains(&request.num_questions) {
            return Err(BusinessError::InvalidQuestionCount {
                requested: request.num_questions,
                min: MIN_QUIZ_QUESTIONS,
                max: MAX_QUIZ_QUESTIONS,
            }
            .into());
        }

        let query = QuestionQuery {
            difficulty: request.difficulty,
            category: request.category.clone(),
            ..Default::default()
        };
        let pool = self.store.questions.find(|q| query.matches(q)).await;

        let selected = sample_questions(&pool, request.num_questions, &mut rand::thread_rng())?;
        info!(
            "✓ 组卷完成: 从 {} 道候选题中抽取 {} 道",
            pool.len(),
            selected.len()
        );
        Ok(selected)
    }

    /// 提交答案并保存成绩
    pub async fn submit(&self, submission: QuizSubmission) -> AppResult<QuizResult> {
        if submission.answers.is_empty() {
            return Err(BusinessError::EmptySubmission.into());
        }

        let ids: Vec<&str> = submission
            .answers
            .iter()
            .map(|a| a.question_id.as_str())
            .collect();
        let questions: HashMap<String, QuestionRecord> = self
            .store
            .questions
            .find(|q| ids.contains(&q.id.as_str()))
            .await
            .into_iter()
            .map(|q| (q.id.clone(), q))
            .collect();

        let mut correct = 0;
        for answer in &submission.answers {
            match questions.get(&answer.question_id) {
                Some(question) if question.correct_answer_index == answer.user_answer_index => {
                    correct += 1;
                }
                Some(_) => {}
                None => warn!("⚠️ 提交中的题目 {} 不存在，按答错处理", answer.question_id),
            }
        }

        let result = QuizResult::new(submission.answers.len(), correct, submission.user_id);
        let result = self.store.quiz_results.insert_one(result).await?;
        info!(
            "✓ 测验已判分: {}/{} ({:.1} 分)",
            result.correct_answers, result.total_questions, result.score
        );
        Ok(result)
    }

    /// 全部测验成绩
    pub async fn results(&self) -> Vec<QuizResult> {
        self.store.quiz_results.find(|_| true).await
    }
}

/// 不放回抽样；候选不足时报错
fn sample_questions<R: Rng + ?Sized>(
    pool: &[QuestionRecord],
    count: usize,
    rng: &mut R,
) -> AppResult<Vec<QuizQuestion>> {
    if pool.len() < count {
        return Err(BusinessError::NotEnoughQuestions {
            found: pool.len(),
            requested: count,
        }
        .into());
    }

    Ok(pool
        .choose_multiple(rng, count)
        .map(|q| QuizQuestion {
            id: q.id.clone(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
        })
        .collect())
}
