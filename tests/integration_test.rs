use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use strongbird::config::ExtractionConfig;
use strongbird::models::{parse_batch_lines, ContentBlock, ExtractedContent, JobState, StateBoard};
use strongbird::services::{plan_jobs, JobSource, PlanOptions};
use strongbird::{
    ExpansionJob, ExtractionOrchestrator, ExtractionPipeline, JobError, JobErrorKind, JobFlow,
    PagePool,
};

/// 带延迟的脚本化提取流程，记录同时运行的任务数
struct ScriptedPipeline {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    calls: AtomicUsize,
    /// 序号对应的延迟（毫秒），让完成顺序与提交顺序不同
    delays: Vec<u64>,
    failing: Vec<&'static str>,
}

impl ScriptedPipeline {
    fn new(delays: Vec<u64>) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            delays,
            failing: Vec::new(),
        }
    }

    fn failing_on(mut self, url: &'static str) -> Self {
        self.failing.push(url);
        self
    }
}

#[async_trait]
impl ExtractionPipeline for ScriptedPipeline {
    type Handle = usize;

    fn name(&self) -> &str {
        "scripted"
    }

    async fn extract(
        &self,
        handle: &mut usize,
        url: &str,
        _config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        *handle += 1;

        let delay = self.delays.get(call).copied().unwrap_or(5);
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.iter().any(|failing| *failing == url) {
            return Err(JobError::navigation(format!("forced failure: {}", url)));
        }
        Ok(ExtractedContent {
            url: url.to_string(),
            final_url: None,
            blocks: vec![ContentBlock::Paragraph {
                text: format!("content of {}", url),
            }],
            metadata: None,
            math_count: 0,
        })
    }
}

fn orchestrator(
    pipeline: ScriptedPipeline,
    workers: usize,
) -> ExtractionOrchestrator<ScriptedPipeline> {
    let pool = PagePool::new(vec![0usize; workers]);
    let flow = Arc::new(JobFlow::new(pipeline, Arc::new(ExtractionConfig::default())));
    ExtractionOrchestrator::new(pool, flow, workers)
}

fn plan(template: &str) -> Vec<ExpansionJob> {
    plan_jobs(
        &JobSource::Urls(vec![template.to_string()]),
        PlanOptions::default(),
    )
    .unwrap()
    .jobs
}

#[tokio::test]
async fn test_concurrency_ceiling_and_order_restoration() {
    // 前面的任务更慢，完成顺序与提交顺序相反
    let delays = vec![120, 100, 80, 60, 50, 40, 30, 20, 10, 5];
    let orchestrator = orchestrator(ScriptedPipeline::new(delays), 3);
    let jobs = plan("https://example.com/page/[1-10]");
    assert_eq!(jobs.len(), 10);

    let report = orchestrator.run(jobs).await;

    // 所有句柄都已归还，每个任务都使用过一个句柄
    assert_eq!(orchestrator.pool().available(), 3);
    let uses: usize = orchestrator.pool().drain().into_iter().sum();
    assert_eq!(uses, 10);

    assert_eq!(report.total, 10);
    assert_eq!(report.succeeded, 10);
    let seqs: Vec<usize> = report.results.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, (0..10).collect::<Vec<_>>());
    let urls: Vec<&str> = report.results.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls[0], "https://example.com/page/1");
    assert_eq!(urls[9], "https://example.com/page/10");
}

#[tokio::test]
async fn test_running_jobs_never_exceed_worker_count() {
    let pipeline = Arc::new(ScriptedPipeline::new(vec![30; 10]));
    let pool = PagePool::new(vec![0usize; 3]);
    let flow = Arc::new(JobFlow::new(
        SharedPipeline(Arc::clone(&pipeline)),
        Arc::new(ExtractionConfig::default()),
    ));
    let orchestrator = ExtractionOrchestrator::new(pool, flow, 3);

    let board = Arc::new(StateBoard::new(10));
    let report = orchestrator
        .run_with_states(plan("https://example.com/[0-9]"), Arc::clone(&board))
        .await;

    assert_eq!(report.succeeded, 10);
    assert!(board.peak_running() <= 3);
    assert_eq!(board.count(JobState::Succeeded), 10);
    assert_eq!(pipeline.calls.load(Ordering::SeqCst), 10);
    let peak = pipeline.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak in-flight was {}", peak);
    assert!(peak >= 2, "jobs should overlap, peak was {}", peak);
}

#[tokio::test]
async fn test_single_failure_does_not_stop_batch() {
    let pipeline = ScriptedPipeline::new(vec![5; 5]).failing_on("https://example.com/3");
    let orchestrator = orchestrator(pipeline, 2);

    let report = orchestrator.run(plan("https://example.com/[1-5]")).await;

    assert_eq!(report.total, 5);
    assert_eq!(report.succeeded, 4);
    assert_eq!(report.failed, 1);
    let failure = &report.results[2];
    assert_eq!(failure.url, "https://example.com/3");
    assert_eq!(failure.error().unwrap().kind, JobErrorKind::Navigation);
    assert!(report.results[3].is_success());
    assert!(report.results[4].is_success());
}

#[tokio::test]
async fn test_batch_file_lines_become_ordered_jobs() {
    let content = "# seed list\n\nhttps://example.com/a\r\nhttps://example.com/b\n";
    let lines = parse_batch_lines(content);
    let jobs = plan_jobs(&JobSource::Batch(lines), PlanOptions::default())
        .unwrap()
        .jobs;

    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[0].url(), "https://example.com/a");
    assert_eq!(jobs[1].url(), "https://example.com/b");
    assert_eq!(jobs[1].template_index(), 1);

    let report = orchestrator(ScriptedPipeline::new(vec![10, 1]), 2)
        .run(jobs)
        .await;
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.results[0].url, "https://example.com/a");
}

/// 通过 Arc 共享计数器的包装
struct SharedPipeline(Arc<ScriptedPipeline>);

#[async_trait]
impl ExtractionPipeline for SharedPipeline {
    type Handle = usize;

    fn name(&self) -> &str {
        self.0.name()
    }

    async fn extract(
        &self,
        handle: &mut usize,
        url: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError> {
        self.0.extract(handle, url, config).await
    }
}

#[tokio::test]
#[ignore] // 默认忽略，需要本机 Chrome：cargo test -- --ignored
async fn test_browser_extracts_data_url() {
    use strongbird::browser::{open_pages, BrowserSession};
    use strongbird::config::BrowserSettings;
    use strongbird::services::BrowserPipeline;
    use strongbird::JsExecutor;

    let settings = BrowserSettings::default();
    let session = BrowserSession::start(&settings)
        .await
        .expect("启动浏览器失败");
    let pages = open_pages(session.browser(), 1, &settings)
        .await
        .expect("创建页面失败");
    let executors: Vec<JsExecutor> = pages
        .into_iter()
        .map(|p| JsExecutor::new(p, Duration::from_secs(30)))
        .collect();

    let pool = PagePool::new(executors);
    let flow = Arc::new(JobFlow::new(
        BrowserPipeline::new(),
        Arc::new(ExtractionConfig::default()),
    ));
    let orchestrator = ExtractionOrchestrator::new(Arc::clone(&pool), flow, 1);
    let job = ExpansionJob::new(
        0,
        0,
        0,
        "data:text/html,<html lang=en><title>T</title><body><h1>Hello</h1><p>World</p></body></html>",
    );

    let report = orchestrator.run(vec![job]).await;
    let pages = pool.drain().into_iter().map(JsExecutor::into_page).collect();
    session.shutdown(pages).await;

    assert_eq!(report.succeeded, 1, "{:?}", report.results[0].error());
}
