//! 页面执行器 - 基础设施层
//!
//! 持有一个 page 资源，只暴露"导航 / 等待 / 执行 JS"的能力

use std::time::Duration;

use chromiumoxide::Page;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio::time::{sleep, timeout, Instant};
use tracing::debug;

use crate::error::{JobError, JobErrorKind};

/// 轮询选择器的间隔
const SELECTOR_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// JS 执行器
///
/// 职责：
/// - 持有一个 Page 资源（由页面池借出）
/// - 暴露 goto() / eval() 能力
/// - 不认识任务 / 模板
/// - 不处理提取流程
#[derive(Debug)]
pub struct JsExecutor {
    page: Page,
    timeout: Duration,
}

impl JsExecutor {
    /// 创建新的 JS 执行器
    pub fn new(page: Page, timeout: Duration) -> Self {
        Self { page, timeout }
    }

    /// 获取 page 的引用（用于其他操作）
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// 取回 page（用于关闭）
    pub fn into_page(self) -> Page {
        self.page
    }

    /// 导航到 URL 并等待加载完成
    pub async fn goto(&self, url: &str) -> Result<(), JobError> {
        debug!("导航到: {}", url);
        match timeout(self.timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(JobError::from_cdp(e, JobErrorKind::Navigation)),
            Err(_) => Err(JobError::timeout(format!(
                "导航超时 ({} ms): {}",
                self.timeout.as_millis(),
                url
            ))),
        }
    }

    /// 当前页面地址（跳转后的最终 URL）
    pub async fn current_url(&self) -> Option<String> {
        self.page.url().await.ok().flatten()
    }

    /// 等待选择器出现
    pub async fn wait_for_selector(&self, selector: &str) -> Result<(), JobError> {
        self.wait_for_selector_within(selector, self.timeout).await
    }

    /// 在给定时间内等待选择器出现
    pub async fn wait_for_selector_within(
        &self,
        selector: &str,
        limit: Duration,
    ) -> Result<(), JobError> {
        let deadline = Instant::now() + limit;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(JobError::timeout(format!(
                    "等待选择器超时 ({} ms): {}",
                    limit.as_millis(),
                    selector
                )));
            }
            sleep(SELECTOR_POLL_INTERVAL).await;
        }
    }

    /// 执行 JS 代码并返回 JSON 结果
    pub async fn eval(&self, js_code: impl Into<String>) -> Result<JsonValue, JobError> {
        let evaluation = timeout(self.timeout, self.page.evaluate(js_code.into()))
            .await
            .map_err(|_| JobError::timeout("脚本执行超时"))?
            .map_err(|e| JobError::from_cdp(e, JobErrorKind::Script))?;
        evaluation
            .into_value()
            .map_err(|e| JobError::new(JobErrorKind::Script, format!("脚本返回值无法解析: {}", e)))
    }

    /// 执行 JS 代码并反序列化为指定类型
    pub async fn eval_as<T: DeserializeOwned>(
        &self,
        js_code: impl Into<String>,
    ) -> Result<T, JobError> {
        let json_value = self.eval(js_code).await?;
        let typed_value = serde_json::from_value(json_value)?;
        Ok(typed_value)
    }

    /// 逐步滚动到底部，触发懒加载，直到页面高度不再变化
    pub async fn scroll_to_bottom(&self, step: u32) -> Result<(), JobError> {
        let mut previous = 0u64;
        let mut current: u64 = self.eval_as("document.body.scrollHeight").await?;

        while current != previous {
            previous = current;
            let mut y = 0;
            while y < current {
                self.eval(format!("window.scrollTo(0, {})", y)).await?;
                sleep(Duration::from_millis(100)).await;
                y += u64::from(step);
            }
            sleep(Duration::from_millis(500)).await;
            current = self.eval_as("document.body.scrollHeight").await?;
        }
        Ok(())
    }

    /// 回到空白页，释放上一个任务的页面状态
    pub async fn reset(&self) {
        if let Err(e) = self.page.goto("about:blank").await {
            debug!("重置页面失败: {}", e);
        }
    }
}
