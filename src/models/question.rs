use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult, ConfigError};
use crate::store::Record;

/// 题目选项数量范围
pub const MIN_OPTIONS: usize = 2;
pub const MAX_OPTIONS: usize = 6;

/// 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ConfigError::EnvVarParseFailed {
                var_name: "difficulty".to_string(),
                value: s.to_string(),
                expected_type: "easy|medium|hard".to_string(),
            }),
        }
    }
}

/// 题目来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    AiGenerated,
    #[default]
    Manual,
    DocumentUpload,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::AiGenerated => "ai_generated",
            Source::Manual => "manual",
            Source::DocumentUpload => "document_upload",
        }
    }
}

/// 落库的题目
///
/// 不变量：`correct_answer_index < options.len()`，选项数量在 [2, 6]。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_from_doc_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl QuestionRecord {
    /// 由草稿创建新记录（分配 ID 和时间戳），草稿必须已通过校验
    pub fn from_draft(draft: QuestionDraft, source: Source) -> AppResult<Self> {
        draft.validate()?;
        Ok(Self {
            id: super::new_record_id(),
            question_text: draft.question_text,
            options: draft.options,
            correct_answer_index: draft.correct_answer_index,
            explanation: draft.explanation,
            difficulty: draft.difficulty,
            categories: normalize_categories(draft.categories),
            source,
            generated_from_doc_id: None,
            created_at: Utc::now(),
        })
    }

    /// 用草稿覆盖可编辑字段，保留 ID、来源、创建时间和来源文档
    pub fn apply_draft(&mut self, draft: QuestionDraft) -> AppResult<()> {
        draft.validate()?;
        self.question_text = draft.question_text;
        self.options = draft.options;
        self.correct_answer_index = draft.correct_answer_index;
        self.explanation = draft.explanation;
        self.difficulty = draft.difficulty;
        self.categories = normalize_categories(draft.categories);
        Ok(())
    }

    pub fn correct_option(&self) -> Option<&str> {
        self.options
            .get(self.correct_answer_index)
            .map(String::as_str)
    }

    pub fn has_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

impl Record for QuestionRecord {
    const COLLECTION: &'static str = "questions";

    fn id(&self) -> &str {
        &self.id
    }
}

/// 题目的可编辑部分（手动创建 / 更新时使用）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub categories: Vec<String>,
}

impl QuestionDraft {
    pub fn validate(&self) -> AppResult<()> {
        if self.question_text.trim().is_empty() {
            return Err(AppError::invalid_question("题干不能为空"));
        }
        if !(MIN_OPTIONS..=MAX_OPTIONS).contains(&self.options.len()) {
            return Err(AppError::invalid_question(format!(
                "选项数量 {} 超出范围 [{}, {}]",
                self.options.len(),
                MIN_OPTIONS,
                MAX_OPTIONS
            )));
        }
        if self.correct_answer_index >= self.options.len() {
            return Err(AppError::invalid_question(format!(
                "正确答案索引 {} 超出范围 [0, {}]",
                self.correct_answer_index,
                self.options.len() - 1
            )));
        }
        Ok(())
    }
}

/// 分类当作集合使用：去掉空白项并去重，保留首次出现的顺序
fn normalize_categories(categories: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(categories.len());
    for category in categories {
        let category = category.trim().to_string();
        if !category.is_empty() && !out.contains(&category) {
            out.push(category);
        }
    }
    out
}

/// 题目查询条件，所有条件之间为"与"关系
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionQuery {
    #[serde(default)]
    pub ids: Option<Vec<String>>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub source: Option<Source>,
    #[serde(default)]
    pub document_id: Option<String>,
}

impl QuestionQuery {
    pub fn matches(&self, record: &QuestionRecord) -> bool {
        if let Some(ids) = &self.ids {
            if !ids.iter().any(|id| id == &record.id) {
                return false;
            }
        }
        if let Some(difficulty) = self.difficulty {
            if record.difficulty != difficulty {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !record.has_category(category) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if record.source != source {
                return false;
            }
        }
        if let Some(document_id) = &self.document_id {
            if record.generated_from_doc_id.as_deref() != Some(document_id.as_str()) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> QuestionDraft {
        QuestionDraft {
            question_text: "What is the capital of France?".to_string(),
            options: vec!["Berlin".into(), "Madrid".into(), "Paris".into(), "Rome".into()],
            correct_answer_index: 2,
            explanation: None,
            difficulty: Difficulty::Easy,
            categories: vec!["Geography".into(), " Geography ".into(), "".into()],
        }
    }

    #[test]
    fn test_draft_validation() {
        assert!(draft().validate().is_ok());

        let mut bad = draft();
        bad.correct_answer_index = 4;
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.options = vec!["only".into()];
        bad.correct_answer_index = 0;
        assert!(bad.validate().is_err());

        let mut bad = draft();
        bad.question_text = "   ".to_string();
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_from_draft_dedups_categories() {
        let record = QuestionRecord::from_draft(draft(), Source::Manual).unwrap();
        assert_eq!(record.categories, vec!["Geography".to_string()]);
        assert_eq!(record.correct_option(), Some("Paris"));
        assert_eq!(record.source, Source::Manual);
    }

    #[test]
    fn test_query_matches() {
        let mut record = QuestionRecord::from_draft(draft(), Source::DocumentUpload).unwrap();
        record.generated_from_doc_id = Some("doc-1".to_string());

        assert!(QuestionQuery::default().matches(&record));
        assert!(QuestionQuery {
            category: Some("Geography".into()),
            difficulty: Some(Difficulty::Easy),
            document_id: Some("doc-1".into()),
            ..Default::default()
        }
        .matches(&record));
        assert!(!QuestionQuery {
            source: Some(Source::Manual),
            ..Default::default()
        }
        .matches(&record));
        assert!(!QuestionQuery {
            ids: Some(vec!["other".into()]),
            ..Default::default()
        }
        .matches(&record));
    }

    #[test]
    fn test_enum_serde_names() {
        assert_eq!(
            serde_json::to_string(&Source::DocumentUpload).unwrap(),
            "\"document_upload\""
        );
        assert_eq!(serde_json::to_string(&Difficulty::Hard).unwrap(), "\"hard\"");
        assert_eq!("EASY".parse::<Difficulty>().unwrap(), Difficulty::Easy);
        assert!("extreme".parse::<Difficulty>().is_err());
    }
}
