use std::time::Duration;

use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::BrowserSettings;
use crate::error::BrowserError;

/// 按设置启动浏览器，返回浏览器与事件处理任务
pub async fn launch_browser(
    settings: &BrowserSettings,
) -> Result<(Browser, JoinHandle<()>), BrowserError> {
    info!(
        "🚀 启动{}浏览器...",
        if settings.headless { "无头" } else { "" }
    );

    let mut builder = BrowserConfig::builder()
        .window_size(settings.viewport_width, settings.viewport_height)
        .request_timeout(Duration::from_millis(settings.timeout_ms))
        .args(vec![
            "--disable-gpu",           // 无头模式下禁用 GPU
            "--no-sandbox",            // 容器中没有沙盒权限
            "--disable-dev-shm-usage", // 防止共享内存不足
        ]);

    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(executable) = &settings.chrome_executable {
        debug!("浏览器路径: {}", executable);
        builder = builder.chrome_executable(executable);
    }

    let config = builder.build().map_err(|message| {
        error!("配置浏览器失败: {}", message);
        BrowserError::ConfigurationFailed { message }
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|source| {
        error!("启动浏览器失败: {}", source);
        BrowserError::LaunchFailed { source }
    })?;
    debug!("浏览器启动成功");

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
