//! 提取流程接口
//!
//! 渲染 + 提取对编排层是不透明的外部能力：给定 URL 与共享的提取配置，
//! 在独占的句柄上执行一次，返回提取结果或分类后的错误。

use async_trait::async_trait;
use tracing::warn;

use crate::config::ExtractionConfig;
use crate::error::JobError;
use crate::models::ExtractedContent;
use crate::services::page_script::PagePayload;

#[async_trait]
pub trait ExtractionPipeline: Send + Sync + 'static {
    /// 池中的句柄类型（浏览器页面、HTTP 客户端等）
    type Handle: Send + 'static;

    /// 流程名称（用于日志）
    fn name(&self) -> &str;

    /// 在独占的句柄上提取一个 URL
    async fn extract(
        &self,
        handle: &mut Self::Handle,
        url: &str,
        config: &ExtractionConfig,
    ) -> Result<ExtractedContent, JobError>;
}

/// 把页面数据整理为提取结果
///
/// 语言不符或没有正文时返回 `EmptyContent`
pub fn assemble_content(
    url: &str,
    payload: PagePayload,
    math_count: usize,
    config: &ExtractionConfig,
) -> Result<ExtractedContent, JobError> {
    check_language(&payload, config)?;

    let final_url = payload.final_url.filter(|final_url| final_url != url);
    let metadata =
        (config.with_metadata && !payload.metadata.is_empty()).then_some(payload.metadata);

    let content = ExtractedContent {
        url: url.to_string(),
        final_url,
        blocks: payload.blocks,
        metadata,
        math_count,
    };

    if content.is_blank() {
        return Err(JobError::empty_content(format!(
            "页面没有可提取的正文: {}",
            url
        )));
    }
    Ok(content)
}

/// 页面语言与目标语言不符时视为失败
fn check_language(payload: &PagePayload, config: &ExtractionConfig) -> Result<(), JobError> {
    let (Some(target), Some(lang)) = (&config.target_lang, &payload.metadata.language) else {
        return Ok(());
    };
    if language_matches(lang, target) {
        return Ok(());
    }
    warn!("页面语言 {} 与目标语言 {} 不符", lang, target);
    Err(JobError::empty_content(format!(
        "页面语言 {} 与目标语言 {} 不符",
        lang, target
    )))
}

/// 比较主语言标签，`en-US` 与 `en` 视为相同
fn language_matches(page_lang: &str, target: &str) -> bool {
    let primary = |tag: &str| {
        tag.split(['-', '_'])
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    };
    primary(page_lang) == primary(target)
}
