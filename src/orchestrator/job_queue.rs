//! 后台生成任务队列 - 编排层
//!
//! ## 职责
//!
//! 文档上传后立即返回，题目生成在后台继续：
//!
//! 1. **派发**：`tokio::spawn` 启动任务，立即返回
//! 2. **并发控制**：Semaphore 限制同时运行的文档任务数量
//! 3. **失败记录**：任务失败、分块失败写入失败记录文件
//! 4. **回收**：每次派发前把已结束的任务计入汇总，句柄列表不会无限增长
//! 5. **收尾**：`drain` 等待所有已派发的任务结束（不取消）
//!
//! 调用方拿不到任务结果，只能查询题目集合或者看失败记录。

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info, warn};

use crate::services::FailureLog;
use crate::workflow::{DocumentGenerationReport, GenerationCtx, GenerationFlow};

/// 单个任务的结果
#[derive(Debug)]
enum JobOutcome {
    Finished(DocumentGenerationReport),
    Failed,
}

/// 已派发任务的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobSummary {
    pub jobs: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub failed_chunks: usize,
    pub questions_saved: usize,
}

/// 后台任务队列
pub struct JobQueue {
    semaphore: Arc<Semaphore>,
    failure_log: Arc<FailureLog>,
    handles: Mutex<Vec<(GenerationCtx, JoinHandle<JobOutcome>)>>,
    /// 已回收但还没被 `drain` 取走的结果
    reaped: Mutex<JobSummary>,
}

impl JobQueue {
    pub fn new(max_concurrent_jobs: usize, failure_log: Arc<FailureLog>) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent_jobs.max(1))),
            failure_log,
            handles: Mutex::new(Vec::new()),
            reaped: Mutex::new(JobSummary::default()),
        }
    }

    /// 派发一个文档生成任务，不等待它开始执行
    pub async fn spawn_document_job(
        &self,
        flow: Arc<GenerationFlow>,
        ctx: GenerationCtx,
        text: String,
    ) {
        self.reap_finished().await;

        let semaphore = self.semaphore.clone();
        let failure_log = self.failure_log.clone();
        let job_ctx = ctx.clone();

        let handle = tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    error!("{} ❌ 无法获取任务许可: {}", job_ctx, e);
                    record_failure(&failure_log, &job_ctx, &e.to_string()).await;
                    return JobOutcome::Failed;
                }
            };

            match flow.generate_from_document(&job_ctx, &text).await {
                Ok(report) => {
                    for failure in &report.failed_chunks {
                        let reason = format!("分块 {}: {}", failure.index + 1, failure.reason);
                        record_failure(&failure_log, &job_ctx, &reason).await;
                    }
                    JobOutcome::Finished(report)
                }
                Err(e) => {
                    error!("{} ❌ 后台生成失败: {}", job_ctx, e);
                    record_failure(&failure_log, &job_ctx, &e.to_string()).await;
                    JobOutcome::Failed
                }
            }
        });

        info!("{} 📦 已派发后台生成任务", ctx);
        self.handles.lock().await.push((ctx, handle));
    }

    /// 尚未结束或尚未被回收的任务数量
    pub async fn pending(&self) -> usize {
        self.handles.lock().await.len()
    }

    /// 等待所有已派发的任务结束并汇总
    pub async fn drain(&self) -> JobSummary {
        let mut summary = JobSummary::default();

        loop {
            let batch = std::mem::take(&mut *self.handles.lock().await);
            if batch.is_empty() {
                break;
            }

            let (contexts, handles): (Vec<_>, Vec<_>) = batch.into_iter().unzip();
            let results = join_all(handles).await;

            for (ctx, result) in contexts.iter().zip(results) {
                self.tally(&mut summary, ctx, result).await;
            }
        }

        let reaped = std::mem::take(&mut *self.reaped.lock().await);
        summary.merge(reaped);
        summary
    }

    /// 把已经结束的任务从句柄列表中移出并计入汇总
    async fn reap_finished(&self) {
        let mut reaped = self.reaped.lock().await;
        let finished = {
            let mut handles = self.handles.lock().await;
            let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut *handles)
                .into_iter()
                .partition(|(_, handle)| handle.is_finished());
            *handles = running;
            finished
        };

        for (ctx, handle) in finished {
            let result = handle.await;
            self.tally(&mut reaped, &ctx, result).await;
        }
    }

    async fn tally(
        &self,
        summary: &mut JobSummary,
        ctx: &GenerationCtx,
        result: Result<JobOutcome, JoinError>,
    ) {
        summary.jobs += 1;
        match result {
            Ok(JobOutcome::Finished(report)) => {
                summary.succeeded += 1;
                summary.failed_chunks += report.failed_chunks.len();
                summary.questions_saved += report.questions_saved;
            }
            Ok(JobOutcome::Failed) => summary.failed += 1,
            Err(e) => {
                error!("{} 任务执行失败: {}", ctx, e);
                record_failure(&self.failure_log, ctx, &format!("任务异常退出: {}", e)).await;
                summary.failed += 1;
            }
        }
    }
}

impl JobSummary {
    fn merge(&mut self, other: JobSummary) {
        self.jobs += other.jobs;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.failed_chunks += other.failed_chunks;
        self.questions_saved += other.questions_saved;
    }
}

async fn record_failure(failure_log: &FailureLog, ctx: &GenerationCtx, reason: &str) {
    if let Err(e) = failure_log
        .record(&ctx.document_id, &ctx.filename, reason)
        .await
    {
        warn!("{} ⚠️ 写入失败记录失败: {}", ctx, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fake::{gemini_body, FakeTransport};
    use crate::clients::{
        ModelClient, ModelRequest, RawResponse, RetryPolicy, Transport, TransportError,
    };
    use crate::models::{Difficulty, DocumentRecord};
    use crate::services::Chunker;
    use crate::store::Store;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn flow(transport: Arc<FakeTransport>, store: Arc<Store>) -> Arc<GenerationFlow> {
        let model = Arc::new(ModelClient::new(transport, RetryPolicy::default()));
        Arc::new(GenerationFlow::new(model, store, Chunker::new(10, 0).unwrap()))
    }

    fn ctx(filename: &str) -> GenerationCtx {
        GenerationCtx::new(
            &DocumentRecord::new(filename, 10),
            1,
            Difficulty::Medium,
            None,
        )
    }

    #[tokio::test]
    async fn test_drain_waits_for_all_jobs_and_logs_failed_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let failure_log = Arc::new(FailureLog::with_path(dir.path().join("failures.log")));
        let queue = JobQueue::new(2, failure_log.clone());

        let transport = Arc::new(FakeTransport::new(|_, request| {
            if request.prompt_text().contains("broken") {
                Ok(RawResponse {
                    status: 500,
                    body: "internal".into(),
                })
            } else {
                Ok(gemini_body(
                    "Q: Sample?\nA) 1\nB) 2\nC) 3\nD) 4\nAnswer: A\n",
                ))
            }
        }));
        let store = Arc::new(Store::in_memory());
        let flow = flow(transport, store.clone());

        queue
            .spawn_document_job(flow.clone(), ctx("a.txt"), "first doc".into())
            .await;
        queue
            .spawn_document_job(flow.clone(), ctx("b.txt"), "second doc".into())
            .await;
        queue
            .spawn_document_job(flow.clone(), ctx("c.txt"), "broken doc".into())
            .await;
        assert_eq!(queue.pending().await, 3);

        let summary = queue.drain().await;
        assert_eq!(summary.jobs, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.failed_chunks, 1);
        assert_eq!(summary.questions_saved, 2);
        assert_eq!(store.questions.count().await, 2);
        assert_eq!(queue.pending().await, 0);

        let log = tokio::fs::read_to_string(failure_log.path()).await.unwrap();
        assert_eq!(log.lines().count(), 1);
        assert!(log.contains("文件 c.txt"));
        assert!(log.contains("HTTP 500"));
    }

    /// 每次调用都要等一会儿，同时记录并发峰值
    struct SlowTransport {
        running: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl Transport for SlowTransport {
        async fn send(&self, _request: &ModelRequest) -> Result<RawResponse, TransportError> {
            let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            self.running.fetch_sub(1, Ordering::SeqCst);
            Ok(gemini_body("Q: Slow?\nA) 1\nB) 2\nC) 3\nD) 4\nAnswer: B\n"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_running_jobs_are_capped() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JobQueue::new(2, Arc::new(FailureLog::with_path(dir.path().join("f.log"))));

        let transport = Arc::new(SlowTransport {
            running: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let model = Arc::new(ModelClient::new(transport.clone(), RetryPolicy::default()));
        let store = Arc::new(Store::in_memory());
        let flow = Arc::new(GenerationFlow::new(model, store.clone(), Chunker::default()));

        for i in 0..5 {
            queue
                .spawn_document_job(flow.clone(), ctx(&format!("{i}.txt")), format!("doc {i}"))
                .await;
        }

        let summary = queue.drain().await;
        assert_eq!(summary.succeeded, 5);
        assert_eq!(store.questions.count().await, 5);
        assert_eq!(transport.peak.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_jobs_are_reaped_before_drain() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JobQueue::new(2, Arc::new(FailureLog::with_path(dir.path().join("f.log"))));

        let transport = Arc::new(FakeTransport::new(|_, _| {
            Ok(gemini_body("Q: Done?\nA) 1\nB) 2\nC) 3\nD) 4\nAnswer: C\n"))
        }));
        let store = Arc::new(Store::in_memory());
        let flow = flow(transport, store.clone());

        for i in 0..3 {
            queue
                .spawn_document_job(flow.clone(), ctx(&format!("{i}.txt")), format!("doc {i}"))
                .await;
            // 让刚派发的任务跑完
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        // 前两个任务在派发后续任务时已被回收
        assert_eq!(queue.pending().await, 1);

        let summary = queue.drain().await;
        assert_eq!(summary.jobs, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.questions_saved, 3);
        assert_eq!(queue.pending().await, 0);
        assert_eq!(queue.drain().await, JobSummary::default());
    }

    #[tokio::test]
    async fn test_drain_on_empty_queue() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JobQueue::new(1, Arc::new(FailureLog::with_path(dir.path().join("f.log"))));
        assert_eq!(queue.drain().await, JobSummary::default());
    }
}
