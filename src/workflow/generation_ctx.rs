//! 文档生成上下文
//!
//! 封装"我正在为哪个文档出题、按什么要求出题"这一信息

use std::fmt::Display;

use crate::models::{DocumentRecord, Difficulty};

/// 文档生成上下文
#[derive(Debug, Clone)]
pub struct GenerationCtx {
    /// 文档ID，写入生成题目的 `generated_from_doc_id`
    pub document_id: String,

    /// 文件名（仅用于日志和失败记录）
    pub filename: String,

    /// 每个分块生成的题目数量
    pub questions_per_chunk: usize,

    pub difficulty: Difficulty,

    pub category: Option<String>,
}

impl GenerationCtx {
    /// 创建新的生成上下文
    pub fn new(
        document: &DocumentRecord,
        questions_per_chunk: usize,
        difficulty: Difficulty,
        category: Option<String>,
    ) -> Self {
        Self {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            questions_per_chunk,
            difficulty,
            category,
        }
    }

    /// 生成题目的分类列表
    pub fn categories(&self) -> Vec<String> {
        self.category.iter().cloned().collect()
    }
}

impl Display for GenerationCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[文档 #{} 文件 {}]", self.document_id, self.filename)
    }
}
