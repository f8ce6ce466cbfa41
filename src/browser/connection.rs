use std::time::Duration;

use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::{Browser, Page};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::BrowserSettings;
use crate::error::BrowserError;

/// 连接到已启动的浏览器（远程调试端口）
pub async fn connect_to_browser(port: u16) -> Result<(Browser, JoinHandle<()>), BrowserError> {
    let browser_url = format!("http://localhost:{}", port);
    info!("正在连接到浏览器: {}", browser_url);

    let (browser, mut handler) = Browser::connect(&browser_url).await.map_err(|source| {
        error!("连接浏览器失败: {}", source);
        BrowserError::ConnectionFailed { port, source }
    })?;
    debug!("浏览器连接成功");

    // 在后台处理浏览器事件
    let handler_task = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 等待浏览器状态同步
    sleep(Duration::from_millis(300)).await;

    Ok((browser, handler_task))
}

/// 创建 `count` 个空白页面并设置 User-Agent
pub async fn open_pages(
    browser: &Browser,
    count: usize,
    settings: &BrowserSettings,
) -> Result<Vec<Page>, BrowserError> {
    let mut pages = Vec::with_capacity(count);
    for index in 0..count {
        let page = browser.new_page("about:blank").await.map_err(|source| {
            error!("创建第 {} 个页面失败: {}", index + 1, source);
            BrowserError::PageCreationFailed { source }
        })?;
        page.set_user_agent(SetUserAgentOverrideParams::new(settings.user_agent.clone()))
            .await
            .map_err(|source| BrowserError::PageCreationFailed { source })?;
        pages.push(page);
    }
    debug!("已创建 {} 个页面", pages.len());
    Ok(pages)
}
