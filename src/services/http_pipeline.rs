//! HTTP 提取流程 - 业务能力层
//!
//! 关闭 JavaScript 时使用：直接请求 HTML 并静态提取，不启动浏览器

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, warn};

use crate::config::{BrowserSettings, ExtractionConfig};
use crate::error::{BrowserError, JobError};
use crate::models::ExtractedContent;
use crate::services::html_text::extract_from_html;
use crate::services::math::contains_math_markup;
use crate::services::pipeline::{assemble_content, ExtractionPipeline};

/// 基于 reqwest 的提取流程
#[derive(Debug, Default)]
pub struct HttpPipeline;

impl HttpPipeline {
    pub fn new() -> Self {
        Self
    }

    /// 按浏览器设置创建 HTTP 客户端（每个池句柄一个）
    pub fn build_client(settings: &BrowserSettings) -> Result<Client, BrowserError> {
        Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(Duration::from_millis(settings.timeout_ms))
            .build()
            .map_err(|e| BrowserError::ConfigurationFailed {
                message: format!("HTTP 客户端创建失败: {}", e),
            })
    }
}

#[async_trait]
impl ExtractionPipeline for HttpPipeline {
    type Handle = Client;

    fn name(&self) -> &str {
        "http"
    }

    async fn extract(
        &self,
        client: &mut Client,
        url: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError> {
        debug!("请求: {}", url);
        let response = client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let html = response.text().await?;

        if config.process_math && contains_math_markup(&html) {
            warn!("页面包含数学公式，但未启用 JavaScript，公式不会被转换: {}", url);
        }

        let mut payload = extract_from_html(&html, &final_url, config);
        payload.final_url = Some(final_url);
        assemble_content(url, payload, 0, config)
    }
}
