//! 浏览器生命周期：启动或连接浏览器，创建页面池所需的页面

mod connection;
mod headless;

pub use connection::{connect_to_browser, open_pages};
pub use headless::launch_browser;

use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::BrowserSettings;
use crate::error::BrowserError;

/// 一次运行持有的浏览器
///
/// 自己启动的浏览器在关闭时一并退出；通过调试端口连接的只关闭本程序创建的页面
pub struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    owned: bool,
}

impl BrowserSession {
    /// 按设置启动或连接浏览器
    pub async fn start(settings: &BrowserSettings) -> Result<Self, BrowserError> {
        let (browser, handler_task, owned) = match settings.debug_port {
            Some(port) => {
                let (browser, task) = connect_to_browser(port).await?;
                (browser, task, false)
            }
            None => {
                let (browser, task) = launch_browser(settings).await?;
                (browser, task, true)
            }
        };
        Ok(Self {
            browser,
            handler_task,
            owned,
        })
    }

    pub fn browser(&self) -> &Browser {
        &self.browser
    }

    /// 关闭页面，必要时关闭浏览器
    pub async fn shutdown(mut self, pages: Vec<Page>) {
        for page in pages {
            if let Err(e) = page.close().await {
                debug!("关闭页面失败: {}", e);
            }
        }
        if self.owned {
            if let Err(e) = self.browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            let _ = self.browser.wait().await;
        }
        self.handler_task.abort();
    }
}
