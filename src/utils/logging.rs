/// 日志工具模块
///
/// 提供日志格式化和输出的辅助函数
use tracing::info;

/// 批量运行的最终统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FinalStats {
    /// 成功登记的文档
    pub documents_uploaded: usize,
    /// 上传被拒绝的文档
    pub documents_rejected: usize,
    /// 后台任务中失败的分块
    pub failed_chunks: usize,
    /// 整体失败的后台任务
    pub failed_jobs: usize,
    /// 本次运行新增的题目
    pub questions_generated: usize,
    /// 题库中各来源的题目数量
    pub questions_by_source: Vec<(&'static str, usize)>,
}

/// 记录程序启动信息
pub fn log_startup(max_concurrent_jobs: usize, data_dir: &str) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 选择题批量生成模式");
    info!("📊 最大并发任务数: {}", max_concurrent_jobs);
    info!("💾 数据目录: {}", data_dir);
    info!("{}", "=".repeat(60));
}

/// 记录待处理文档信息
pub fn log_documents_found(total: usize, folder: &str) {
    info!("✓ 在 {} 中找到 {} 个待处理的文档", folder, total);
    info!("💡 上传后题目在后台生成，全部完成后再输出统计\n");
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &FinalStats, failure_log_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "📄 文档: 登记 {} 个, 拒绝 {} 个",
        stats.documents_uploaded, stats.documents_rejected
    );
    info!("✅ 新增题目: {}", stats.questions_generated);
    info!(
        "❌ 失败: 分块 {} 个, 任务 {} 个",
        stats.failed_chunks, stats.failed_jobs
    );
    for (source, count) in &stats.questions_by_source {
        info!("   题库 [{}]: {} 道", source, count);
    }
    info!("{}", "=".repeat(60));
    if stats.failed_chunks + stats.failed_jobs > 0 {
        info!("\n失败记录已保存至: {}", failure_log_path);
    }
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大字符数
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
