//! 题目生成流程 - 流程层
//!
//! 核心职责：定义"一次生成"的完整流程
//!
//! 两条入口，行为不同：
//! 1. `generate_from_topic`：单次 提示词 → 模型 → 解析，模型错误直接向上返回
//! 2. `generate_from_document`：分块后逐块 提示词 → 模型 → 解析，
//!    单块失败只记录，不影响其他分块，最后一次性批量入库

use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::clients::ModelClient;
use crate::error::{AppResult, BusinessError};
use crate::models::{Difficulty, McqItem, QuestionDraft, QuestionRecord, Source};
use crate::services::{build_request, parse_with_diagnostics, Chunker, PromptSpec};
use crate::store::Store;
use crate::utils::logging::truncate_text;
use crate::workflow::generation_ctx::GenerationCtx;

/// 按主题生成时的题目数量范围
pub const MIN_TOPIC_QUESTIONS: usize = 1;
pub const MAX_TOPIC_QUESTIONS: usize = 50;

/// 按主题生成的请求
#[derive(Debug, Clone, PartialEq)]
pub struct TopicRequest {
    pub topic: String,
    pub num_questions: usize,
    pub difficulty: Difficulty,
    pub category: Option<String>,
}

/// 单个分块的失败原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFailure {
    /// 分块序号（从 0 开始）
    pub index: usize,
    pub reason: String,
}

/// 一次文档生成的结果统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentGenerationReport {
    pub chunks_total: usize,
    /// 调用过模型的分块（不含空白分块）
    pub chunks_processed: usize,
    pub failed_chunks: Vec<ChunkFailure>,
    /// 解析时丢弃的题目
    pub items_dropped: usize,
    pub questions_saved: usize,
}

/// 题目生成流程
///
/// - 编排 分块 → 提示词 → 模型 → 解析 → 转换 → 入库
/// - 模型客户端和存储由外部构造后传入
pub struct GenerationFlow {
    model: Arc<ModelClient>,
    store: Arc<Store>,
    chunker: Chunker,
    verbose_logging: bool,
}

impl GenerationFlow {
    pub fn new(model: Arc<ModelClient>, store: Arc<Store>, chunker: Chunker) -> Self {
        Self {
            model,
            store,
            chunker,
            verbose_logging: false,
        }
    }

    /// 打开后以 debug 级别输出模型原始返回
    pub fn with_verbose_logging(mut self, verbose: bool) -> Self {
        self.verbose_logging = verbose;
        self
    }

    /// 按主题生成题目并入库，返回入库的题目
    ///
    /// 模型调用失败时返回错误，不会部分入库。
    pub async fn generate_from_topic(
        &self,
        request: &TopicRequest,
    ) -> AppResult<Vec<QuestionRecord>> {
        let topic = request.topic.trim();
        if topic.is_empty() {
            return Err(BusinessError::EmptyTopic.into());
        }
        if !(MIN_TOPIC_QUESTIONS..=MAX_TOPIC_QUESTIONS).contains(&request.num_questions) {
            return Err(BusinessError::InvalidQuestionCount {
                requested: request.num_questions,
                min: MIN_TOPIC_QUESTIONS,
                max: MAX_TOPIC_QUESTIONS,
            }
            .into());
        }

        info!(
            "[主题 {}] 🤖 请求生成 {} 道 {} 难度题目...",
            truncate_text(topic, 40),
            request.num_questions,
            request.difficulty
        );

        let spec = PromptSpec {
            source_text: topic,
            num_questions: request.num_questions,
            difficulty: request.difficulty,
            category: request.category.as_deref(),
        };
        let raw = self.model.call(build_request(&spec)).await?;
        self.log_raw_output(&raw);

        let batch = parse_with_diagnostics(&raw);
        let categories: Vec<String> = request.category.iter().cloned().collect();
        let records: Vec<QuestionRecord> = batch
            .items
            .into_iter()
            .filter_map(|item| {
                to_record(item, request.difficulty, &categories, Source::AiGenerated, None)
            })
            .collect();

        let saved = self.store.questions.insert_many(records).await?;
        info!(
            "[主题 {}] ✅ 生成并保存 {} 道题目",
            truncate_text(topic, 40),
            saved.len()
        );
        Ok(saved)
    }

    /// 为文档生成题目并批量入库
    ///
    /// 单个分块的模型错误只记录到报告里，不向上返回；只有入库失败才返回错误。
    pub async fn generate_from_document(
        &self,
        ctx: &GenerationCtx,
        text: &str,
    ) -> AppResult<DocumentGenerationReport> {
        let mut report = DocumentGenerationReport {
            chunks_total: self.chunker.count_chunks(text.chars().count()),
            ..Default::default()
        };

        if text.trim().is_empty() {
            warn!("{} ⚠️ 文档没有可处理的内容", ctx);
            return Ok(report);
        }

        info!(
            "{} 📄 开始生成: 共 {} 个分块, 每块 {} 道题",
            ctx, report.chunks_total, ctx.questions_per_chunk
        );

        let mut items: Vec<McqItem> = Vec::new();
        for (index, chunk) in self.chunker.chunks(text).enumerate() {
            if chunk.trim().is_empty() {
                debug!("{} 跳过空白分块 {}", ctx, index + 1);
                continue;
            }

            report.chunks_processed += 1;
            info!(
                "{} 🤖 处理分块 {}/{}...",
                ctx,
                index + 1,
                report.chunks_total
            );

            let spec = PromptSpec {
                source_text: chunk,
                num_questions: ctx.questions_per_chunk,
                difficulty: ctx.difficulty,
                category: ctx.category.as_deref(),
            };

            match self.model.call(build_request(&spec)).await {
                Ok(raw) => {
                    self.log_raw_output(&raw);
                    let batch = parse_with_diagnostics(&raw);
                    info!(
                        "{} ✓ 分块 {} 解析出 {} 道题目",
                        ctx,
                        index + 1,
                        batch.items.len()
                    );
                    report.items_dropped += batch.dropped.len();
                    items.extend(batch.items);
                }
                Err(e) => {
                    error!("{} ❌ 分块 {} 生成失败: {}", ctx, index + 1, e);
                    report.failed_chunks.push(ChunkFailure {
                        index,
                        reason: e.to_string(),
                    });
                }
            }
        }

        let categories = ctx.categories();
        let records: Vec<QuestionRecord> = items
            .into_iter()
            .filter_map(|item| {
                to_record(
                    item,
                    ctx.difficulty,
                    &categories,
                    Source::DocumentUpload,
                    Some(&ctx.document_id),
                )
            })
            .collect();

        if records.is_empty() {
            warn!("{} ⚠️ 没有生成任何有效题目", ctx);
        } else {
            let saved = self.store.questions.insert_many(records).await?;
            report.questions_saved = saved.len();
        }

        info!(
            "{} ✅ 生成完成: 保存 {} 道题目, 失败分块 {}/{}",
            ctx,
            report.questions_saved,
            report.failed_chunks.len(),
            report.chunks_processed
        );
        Ok(report)
    }

    fn log_raw_output(&self, raw: &str) {
        if self.verbose_logging {
            debug!("模型原始输出:\n{}", raw);
        } else {
            debug!("模型原始输出: {}", truncate_text(raw, 200));
        }
    }
}

/// 解析结果 → 落库记录
///
/// 正确答案必须能在选项中找到，否则丢弃
fn to_record(
    item: McqItem,
    difficulty: Difficulty,
    categories: &[String],
    source: Source,
    document_id: Option<&str>,
) -> Option<QuestionRecord> {
    let Some(correct_answer_index) = item.correct_answer_index() else {
        warn!(
            "⚠️ 正确答案 '{}' 不在选项中，丢弃题目: {}",
            item.correct_answer,
            truncate_text(&item.question, 60)
        );
        return None;
    };

    let explanation = item
        .explanation
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| format!("The correct answer is {}.", item.correct_answer));

    let draft = QuestionDraft {
        question_text: item.question,
        options: item.options,
        correct_answer_index,
        explanation: Some(explanation),
        difficulty,
        categories: categories.to_vec(),
    };

    match QuestionRecord::from_draft(draft, source) {
        Ok(mut record) => {
            record.generated_from_doc_id = document_id.map(str::to_string);
            Some(record)
        }
        Err(e) => {
            warn!("⚠️ 题目数据不合法，丢弃: {}", e);
            None
        }
    }
}
