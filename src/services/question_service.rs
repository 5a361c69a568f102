//! 题目管理服务 - 业务能力层
//!
//! 手动录入、查询、修改、删除题目。生成出来的题目也走同一个集合，
//! 这里不区分来源，只有 `create_manual` 会把来源固定为 manual。

use std::sync::Arc;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::models::{QuestionDraft, QuestionQuery, QuestionRecord, Source};
use crate::store::{Record, Store};

/// 题目管理服务
pub struct QuestionService {
    store: Arc<Store>,
}

impl QuestionService {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// 手动创建一道题
    pub async fn create_manual(&self, draft: QuestionDraft) -> AppResult<QuestionRecord> {
        let record = QuestionRecord::from_draft(draft, Source::Manual)?;
        let record = self.store.questions.insert_one(record).await?;
        info!("✓ 手动创建题目 {}", record.id);
        Ok(record)
    }

    /// 按条件查询题目，按创建顺序返回
    pub async fn list(&self, query: &QuestionQuery) -> Vec<QuestionRecord> {
        self.store.questions.find(|q| query.matches(q)).await
    }

    pub async fn get(&self, id: &str) -> AppResult<QuestionRecord> {
        self.store
            .questions
            .find_one(id)
            .await
            .ok_or_else(|| AppError::not_found(QuestionRecord::COLLECTION, id))
    }

    /// 用草稿覆盖题目内容，ID、来源、创建时间和来源文档保持不变
    pub async fn update(&self, id: &str, draft: QuestionDraft) -> AppResult<QuestionRecord> {
        let updated = self
            .store
            .questions
            .update_one(id, |record| record.apply_draft(draft))
            .await?
            .ok_or_else(|| AppError::not_found(QuestionRecord::COLLECTION, id))?;
        info!("✓ 题目 {} 已更新", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.store.questions.delete_one(id).await? {
            return Err(AppError::not_found(QuestionRecord::COLLECTION, id));
        }
        info!("✓ 题目 {} 已删除", id);
        Ok(())
    }
}
