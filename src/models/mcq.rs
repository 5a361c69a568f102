use serde::{Deserialize, Serialize};

/// 从模型输出解析出的一道选择题（临时结构，不落库）
///
/// 不变量：`correct_answer` 必须等于 `options` 中的某一项。
/// 解析器只会按这个不变量构造它，落库前由编排层再校验一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct McqItem {
    pub question: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl McqItem {
    /// 正确答案在选项中的位置（按文本查找）
    pub fn correct_answer_index(&self) -> Option<usize> {
        self.options
            .iter()
            .position(|option| option == &self.correct_answer)
    }
}
