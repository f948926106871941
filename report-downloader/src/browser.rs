//! Chrome session backed by the DevTools protocol
//!
//! A [`ChromeSession`] owns the browser process, its CDP handler task and an
//! optional virtual display. It is acquired per download run and torn down
//! with [`ChromeSession::close`]; dropping it still stops the handler and
//! the display.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use error::{AppError, DriverError};
use futures_util::StreamExt;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::config::DownloaderConfig;
use crate::driver::BrowserDriver;

const WINDOW_WIDTH: u32 = 1200;
const WINDOW_HEIGHT: u32 = 1000;
const DISPLAY_NUMBER: u32 = 99;

/// Xvfb server used when a headful browser has no real display.
pub struct VirtualDisplay {
    child: Child,
    name: String,
}

impl VirtualDisplay {
    /// Start Xvfb on display `:number`
    pub async fn start(number: u32, width: u32, height: u32) -> Result<Self, DriverError> {
        let name = format!(":{}", number);
        let child = Command::new("Xvfb")
            .arg(&name)
            .arg("-screen")
            .arg("0")
            .arg(format!("{}x{}x24", width, height))
            .arg("-nolisten")
            .arg("tcp")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| DriverError::Launch(format!("failed to start Xvfb: {}", e)))?;

        // Xvfb gives no readiness signal; give it a moment to open the socket.
        tokio::time::sleep(Duration::from_millis(500)).await;
        tracing::info!("Virtual display {} started", name);

        Ok(Self { child, name })
    }

    /// X display name, e.g. ":99"
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stop the X server and wait for it to exit
    pub async fn stop(mut self) -> Result<(), DriverError> {
        self.child
            .kill()
            .await
            .map_err(|e| DriverError::Command(format!("failed to stop Xvfb: {}", e)))?;
        tracing::info!("Virtual display {} stopped", self.name);
        Ok(())
    }
}

/// The page the downloader drives.
#[derive(Debug, Clone)]
pub struct ChromePage {
    page: Page,
}

impl ChromePage {
    async fn find(&self, locator: &str) -> Result<Element, DriverError> {
        self.page
            .find_xpath(locator)
            .await
            .map_err(|_| DriverError::not_found(locator))
    }
}

fn command_error(e: impl std::fmt::Display) -> DriverError {
    DriverError::Command(e.to_string())
}

#[async_trait]
impl BrowserDriver for ChromePage {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(command_error)?;
        Ok(())
    }

    async fn click(&self, locator: &str) -> Result<(), DriverError> {
        self.find(locator).await?.click().await.map_err(command_error)?;
        Ok(())
    }

    async fn send_keys(&self, locator: &str, text: &str) -> Result<(), DriverError> {
        let element = self.find(locator).await?;
        element.click().await.map_err(command_error)?;
        element.type_str(text).await.map_err(command_error)?;
        Ok(())
    }

    async fn read_text(&self, locator: &str) -> Result<String, DriverError> {
        let text = self
            .find(locator)
            .await?
            .inner_text()
            .await
            .map_err(command_error)?;
        Ok(text.unwrap_or_default().trim().to_string())
    }

    async fn exists(&self, locator: &str) -> Result<bool, DriverError> {
        self.page
            .evaluate(xpath_exists_script(locator))
            .await
            .map_err(command_error)?
            .into_value::<bool>()
            .map_err(command_error)
    }
}

/// Script answering whether `locator` matches a node. Only a missing node is
/// `false`; protocol failures surface from `evaluate`.
fn xpath_exists_script(locator: &str) -> String {
    let literal = serde_json::Value::String(locator.to_string());
    format!(
        "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue !== null",
        literal
    )
}

/// An owned browser session.
pub struct ChromeSession {
    browser: Browser,
    page: ChromePage,
    handler_task: JoinHandle<()>,
    display: Option<VirtualDisplay>,
}

impl ChromeSession {
    /// Launch Chrome configured to save downloads into `config.download_path`
    pub async fn launch(config: &DownloaderConfig) -> Result<Self, AppError> {
        let download_dir = prepare_download_dir(&config.download_path).await?;

        let display = if config.virtual_display && !config.show_browser {
            Some(VirtualDisplay::start(DISPLAY_NUMBER, WINDOW_WIDTH, WINDOW_HEIGHT).await?)
        } else {
            None
        };

        let chrome_path = config
            .chrome_path
            .clone()
            .or_else(find_chrome)
            .ok_or_else(|| {
                DriverError::Launch(
                    "Chrome/Chromium not found. Install it or set CHROME_PATH".to_string(),
                )
            })?;
        tracing::info!("Using browser: {}", chrome_path.display());

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .arg("--ignore-certificate-errors")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if let Some(proxy) = &config.proxy {
            builder = builder.arg(format!("--proxy-server={}", proxy));
        }
        if let Some(display) = &display {
            builder = builder.with_head().arg(format!("--display={}", display.name()));
        } else if config.show_browser {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(DriverError::Launch)?;

        let (browser, mut handler) = Browser::launch(browser_config)
            .await
            .map_err(|e| DriverError::Launch(e.to_string()))?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = match open_page(&browser, &download_dir).await {
            Ok(page) => page,
            Err(e) => {
                handler_task.abort();
                return Err(e.into());
            }
        };

        Ok(Self {
            browser,
            page: ChromePage { page },
            handler_task,
            display,
        })
    }

    /// Driver for the session's page
    pub fn page(&self) -> &ChromePage {
        &self.page
    }

    /// Close the browser, stop the CDP handler and the virtual display
    pub async fn close(mut self) -> Result<(), AppError> {
        tracing::info!("Closing browser session");
        let closed = self.browser.close().await.map_err(command_error);
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler_task.abort();
        if let Some(display) = self.display.take() {
            display.stop().await?;
        }
        closed?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

async fn open_page(browser: &Browser, download_dir: &Path) -> Result<Page, DriverError> {
    let page = browser
        .new_page("about:blank")
        .await
        .map_err(|e| DriverError::Launch(format!("failed to open page: {}", e)))?;

    let behavior = SetDownloadBehaviorParams::builder()
        .behavior(SetDownloadBehaviorBehavior::Allow)
        .download_path(download_dir.to_string_lossy().to_string())
        .build()
        .map_err(DriverError::Launch)?;
    page.execute(behavior).await.map_err(command_error)?;
    tracing::debug!("Downloads go to {}", download_dir.display());

    Ok(page)
}

async fn prepare_download_dir(path: &Path) -> Result<PathBuf, AppError> {
    tokio::fs::create_dir_all(path).await?;
    Ok(tokio::fs::canonicalize(path).await?)
}

/// Find Chrome/Chromium executable.
pub fn find_chrome() -> Option<PathBuf> {
    for name in ["google-chrome", "chromium", "chromium-browser"] {
        if let Ok(output) = std::process::Command::new("which").arg(name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(PathBuf::from(path));
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    candidates
        .iter()
        .map(PathBuf::from)
        .find(|candidate| candidate.exists())
}
