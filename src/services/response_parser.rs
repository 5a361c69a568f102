//! 模型输出解析 - 业务能力层
//!
//! 逐行解析模型按约定格式返回的文本：
//!
//! ```text
//! Q: <题干>
//! A) <选项>
//! B) <选项>
//! C) <选项>
//! D) <选项>
//! Answer: <A|B|C|D>
//! Explanation: <可选>
//! ```
//!
//! 模型输出不可信，格式错误的题目只丢弃那一道并记录诊断，永远不返回错误。
//!
//! 选项按出现顺序记录而不是按字母：模型如果打乱了 A–D 的顺序，
//! 答案字母会对到错误的选项上。这里保持按位置的行为，不做纠正。

use tracing::{debug, warn};

use crate::models::McqItem;
use crate::utils::logging::truncate_text;

/// 每道题要求的选项数量
pub const EXPECTED_OPTIONS: usize = 4;

/// 答案字母 → 选项位置
static ANSWER_LETTERS: phf::Map<char, usize> = phf::phf_map! {
    'A' => 0,
    'B' => 1,
    'C' => 2,
    'D' => 3,
};

const OPTION_PREFIXES: [&str; 4] = ["A)", "B)", "C)", "D)"];

/// 被丢弃题目的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// 有内容但没有题干（通常是第一个 `Q:` 之前的多余输出）
    MissingQuestion,
    /// 选项数量不是 4
    WrongOptionCount { found: usize },
    /// 没有合法的答案字母
    MissingAnswer,
    /// 答案字母超出已收集的选项
    AnswerOutOfRange { letter: char, options: usize },
}

/// 一道被丢弃的题目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub question: String,
    pub reason: DropReason,
}

/// 解析结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedBatch {
    pub items: Vec<McqItem>,
    pub dropped: Vec<Diagnostic>,
}

/// 解析模型输出，只返回合法题目
pub fn parse_mcq_items(raw: &str) -> Vec<McqItem> {
    parse_with_diagnostics(raw).items
}

/// 解析模型输出，同时返回被丢弃题目的诊断
pub fn parse_with_diagnostics(raw: &str) -> ParsedBatch {
    let mut batch = ParsedBatch::default();
    let mut current = Pending::default();

    for line in raw.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(rest) = line.strip_prefix("Q:") {
            std::mem::take(&mut current).finish(&mut batch);
            current.question = rest.trim().to_string();
            current.started = true;
        } else if OPTION_PREFIXES.iter().any(|p| line.starts_with(p)) {
            current.options.push(line[2..].trim().to_string());
            current.started = true;
        } else if let Some(rest) = line.strip_prefix("Answer:") {
            // 不合法的答案行不覆盖已经接受的字母
            match parse_answer_letter(rest) {
                Some(letter) => current.answer = Some(letter),
                None => warn!("无法从 '{}' 中解析出合法的答案字母", truncate_text(line, 80)),
            }
            current.started = true;
        } else if let Some(rest) = line.strip_prefix("Explanation:") {
            current.explanation = Some(rest.trim().to_string());
        }
    }
    current.finish(&mut batch);

    debug!(
        "解析完成: 有效 {} 道, 丢弃 {} 道",
        batch.items.len(),
        batch.dropped.len()
    );
    batch
}

/// 冒号后的文本，去空白转大写，必须恰好是 A–D 中的一个字母
fn parse_answer_letter(rest: &str) -> Option<char> {
    let letter = rest.trim().to_uppercase();
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if ANSWER_LETTERS.contains_key(&c) => Some(c),
        _ => None,
    }
}

/// 正在累积的题目
#[derive(Debug, Default)]
struct Pending {
    question: String,
    options: Vec<String>,
    answer: Option<char>,
    explanation: Option<String>,
    /// 是否见过题干、选项或答案行
    started: bool,
}

impl Pending {
    fn finish(self, batch: &mut ParsedBatch) {
        if !self.started {
            return;
        }
        match self.into_item() {
            Ok(item) => batch.items.push(item),
            Err(diagnostic) => {
                if diagnostic.reason == DropReason::MissingQuestion {
                    debug!("忽略题干之前的多余输出");
                } else {
                    warn!(
                        "丢弃格式错误的题目 '{}': {:?}",
                        truncate_text(&diagnostic.question, 60),
                        diagnostic.reason
                    );
                }
                batch.dropped.push(diagnostic);
            }
        }
    }

    fn into_item(self) -> Result<McqItem, Diagnostic> {
        let reject = |question: &str, reason| Diagnostic {
            question: question.to_string(),
            reason,
        };

        if self.question.is_empty() {
            return Err(reject(&self.question, DropReason::MissingQuestion));
        }
        if self.options.len() != EXPECTED_OPTIONS {
            return Err(reject(
                &self.question,
                DropReason::WrongOptionCount {
                    found: self.options.len(),
                },
            ));
        }
        let Some(letter) = self.answer else {
            return Err(reject(&self.question, DropReason::MissingAnswer));
        };
        let index = ANSWER_LETTERS.get(&letter).copied().unwrap_or(usize::MAX);
        let Some(correct_answer) = self.options.get(index).cloned() else {
            return Err(reject(
                &self.question,
                DropReason::AnswerOutOfRange {
                    letter,
                    options: self.options.len(),
                },
            ));
        };

        Ok(McqItem {
            question: self.question,
            options: self.options,
            correct_answer,
            explanation: self.explanation,
        })
    }
}
