//! 提示词构建 - 业务能力层
//!
//! 只负责把 (素材, 题目数量, 难度, 分类) 变成模型请求。
//! 输出格式只是"要求"，模型不一定遵守，解析器必须容错。

use crate::clients::ModelRequest;
use crate::models::Difficulty;

/// 一次生成请求的参数
#[derive(Debug, Clone, Copy)]
pub struct PromptSpec<'a> {
    /// 主题或文档片段
    pub source_text: &'a str,
    pub num_questions: usize,
    pub difficulty: Difficulty,
    pub category: Option<&'a str>,
}

/// 构建提示词文本
pub fn build_prompt(spec: &PromptSpec<'_>) -> String {
    let category_line = match spec.category {
        Some(category) if !category.trim().is_empty() => format!(
            "The questions should be related to the category: {}.\n",
            category.trim()
        ),
        _ => String::new(),
    };

    format!(
        r#"Generate {num} MCQs on the topic '{source}'.
Each MCQ should have exactly 4 options (A, B, C, D) and one correct answer.
Difficulty: {difficulty}.
{category_line}
**STRICT FORMAT REQUIRED:**
Q: <question text>
A) <option A text>
B) <option B text>
C) <option C text>
D) <option D text>
Answer: <A/B/C/D>
Explanation: <optional explanation text>

Ensure there are no introductory or concluding remarks, just the MCQs following this exact format, separated by blank lines."#,
        num = spec.num_questions,
        source = spec.source_text,
        difficulty = spec.difficulty.as_str(),
        category_line = category_line,
    )
}

/// 构建模型请求
pub fn build_request(spec: &PromptSpec<'_>) -> ModelRequest {
    ModelRequest::user_prompt(build_prompt(spec))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_contract() {
        let spec = PromptSpec {
            source_text: "photosynthesis",
            num_questions: 3,
            difficulty: Difficulty::Hard,
            category: Some("Biology"),
        };
        let prompt = build_prompt(&spec);

        assert!(prompt.starts_with("Generate 3 MCQs on the topic 'photosynthesis'."));
        assert!(prompt.contains("Difficulty: hard."));
        assert!(prompt.contains("related to the category: Biology."));
        for marker in ["Q: ", "A) ", "B) ", "C) ", "D) ", "Answer: <A/B/C/D>", "Explanation: "] {
            assert!(prompt.contains(marker), "missing {marker}");
        }
        assert!(prompt.contains("separated by blank lines"));
    }

    #[test]
    fn test_prompt_without_category() {
        let spec = PromptSpec {
            source_text: "rust ownership",
            num_questions: 1,
            difficulty: Difficulty::Medium,
            category: Some("  "),
        };
        let prompt = build_prompt(&spec);
        assert!(!prompt.contains("category"));
    }

    #[test]
    fn test_request_wraps_prompt_as_user_message() {
        let spec = PromptSpec {
            source_text: "t",
            num_questions: 2,
            difficulty: Difficulty::Easy,
            category: None,
        };
        let request = build_request(&spec);
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(request.prompt_text(), build_prompt(&spec));
    }
}
