//! 浏览器提取流程 - 业务能力层
//!
//! 在池中借出的页面上完成一次"导航 → 交互 → 公式处理 → 正文提取"

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::error::JobError;
use crate::infrastructure::JsExecutor;
use crate::models::ExtractedContent;
use crate::services::math::MathNormalizer;
use crate::services::page_script::{build_extract_script, PagePayload};
use crate::services::pipeline::{assemble_content, ExtractionPipeline};

/// 每次滚动的像素
const SCROLL_STEP: u32 = 800;

/// 基于 chromiumoxide 页面的提取流程
#[derive(Debug, Default)]
pub struct BrowserPipeline {
    math: MathNormalizer,
}

impl BrowserPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    async fn run_steps(
        &self,
        executor: &JsExecutor,
        url: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError> {
        executor.goto(url).await?;

        if let Some(selector) = &config.wait_for_selector {
            debug!("等待选择器: {}", selector);
            executor.wait_for_selector(selector).await?;
        }

        if let Some(script) = &config.execute_script {
            debug!("执行自定义脚本");
            executor.eval(script.as_str()).await?;
        }

        let math_count = if config.process_math {
            self.math.normalize(executor).await?.processed
        } else {
            0
        };

        if config.scroll_to_bottom {
            executor.scroll_to_bottom(SCROLL_STEP).await?;
        }

        if config.wait_time_ms > 0 {
            tokio::time::sleep(Duration::from_millis(config.wait_time_ms)).await;
        }

        let mut payload: PagePayload = executor.eval_as(build_extract_script(config)).await?;
        if payload.final_url.is_none() {
            payload.final_url = executor.current_url().await;
        }

        assemble_content(url, payload, math_count, config)
    }
}

#[async_trait]
impl ExtractionPipeline for BrowserPipeline {
    type Handle = JsExecutor;

    fn name(&self) -> &str {
        "browser"
    }

    async fn extract(
        &self,
        handle: &mut JsExecutor,
        url: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError> {
        let result = self.run_steps(handle, url, config).await;
        // 无论成败都回到空白页，下一个任务拿到的是干净的页面
        handle.reset().await;
        result
    }
}
