use report_calendar::{BoundaryPolicy, DelayWindow, PacingConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Production login page; redirects to the analytics site afterwards.
pub const DEFAULT_LOGIN_URL: &str =
    "https://twitter.com/login?redirect_after_login=https%3A%2F%2Fanalytics.twitter.com%2Fabout&hide_message=1";

/// Production analytics site.
pub const DEFAULT_ANALYTICS_URL: &str = "https://analytics.twitter.com";

/// Report downloader configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloaderConfig {
    /// Folder the browser saves reports into
    pub download_path: PathBuf,

    /// Optional `HOST:PORT` proxy for the browser
    pub proxy: Option<String>,

    /// Show the browser window (debugging)
    pub show_browser: bool,

    /// Run a headful browser inside an Xvfb virtual display
    pub virtual_display: bool,

    /// Chrome/Chromium executable; auto-detected when unset
    pub chrome_path: Option<PathBuf>,

    /// Upper bound on waiting for one report file; `None` waits forever
    pub download_timeout_secs: Option<u64>,

    /// Minimum delay between download-folder polls in milliseconds
    pub poll_interval_ms: u64,

    /// How the last batch of a long range is bounded
    pub boundary: BoundaryPolicy,

    /// Delays between UI actions
    pub pacing: PacingConfig,

    /// Login page URL
    pub login_url: String,

    /// Analytics site base URL
    pub analytics_url: String,

    /// Service version
    pub version: String,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            download_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            proxy: None,
            show_browser: false,
            virtual_display: false,
            chrome_path: None,
            download_timeout_secs: None,
            poll_interval_ms: 500,
            boundary: BoundaryPolicy::default(),
            pacing: PacingConfig::default(),
            login_url: DEFAULT_LOGIN_URL.to_string(),
            analytics_url: DEFAULT_ANALYTICS_URL.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value.to_lowercase() == "true" || value == "1"
}

impl DownloaderConfig {
    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("DOWNLOAD_PATH") {
            config.download_path = PathBuf::from(path);
        }

        if let Ok(proxy) = std::env::var("PROXY") {
            if !proxy.is_empty() {
                config.proxy = Some(proxy);
            }
        }

        if let Ok(show) = std::env::var("SHOW_BROWSER") {
            config.show_browser = is_truthy(&show);
        }

        if let Ok(display) = std::env::var("VIRTUAL_DISPLAY") {
            config.virtual_display = is_truthy(&display);
        }

        if let Ok(path) = std::env::var("CHROME_PATH") {
            config.chrome_path = Some(PathBuf::from(path));
        }

        if let Ok(timeout) = std::env::var("DOWNLOAD_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(n) => config.download_timeout_secs = Some(n),
                Err(_) => tracing::warn!("Ignoring invalid DOWNLOAD_TIMEOUT_SECS: {}", timeout),
            }
        }

        if let Ok(interval) = std::env::var("POLL_INTERVAL_MS") {
            if let Ok(n) = interval.parse() {
                config.poll_interval_ms = n;
            }
        }

        if let Ok(boundary) = std::env::var("BATCH_BOUNDARY") {
            match boundary.parse() {
                Ok(policy) => config.boundary = policy,
                Err(e) => tracing::warn!("Ignoring BATCH_BOUNDARY: {}", e),
            }
        }

        if let Ok(pacing) = std::env::var("PACING") {
            config.pacing.enabled = pacing.to_lowercase() != "off" && pacing != "0";
        }

        if let Ok(window) = std::env::var("ACTION_DELAY_MS") {
            match DelayWindow::parse(&window) {
                Some(w) => config.pacing.action = w,
                None => tracing::warn!("Ignoring invalid ACTION_DELAY_MS: {}", window),
            }
        }

        if let Ok(window) = std::env::var("STEP_DELAY_MS") {
            match DelayWindow::parse(&window) {
                Some(w) => config.pacing.step = w,
                None => tracing::warn!("Ignoring invalid STEP_DELAY_MS: {}", window),
            }
        }

        if let Ok(url) = std::env::var("LOGIN_URL") {
            config.login_url = url;
        }

        if let Ok(url) = std::env::var("ANALYTICS_URL") {
            config.analytics_url = url.trim_end_matches('/').to_string();
        }

        config
    }

    /// Get the download timeout as Duration
    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }

    /// Get the poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Analytics page listing a user's tweets, where the export lives
    pub fn report_page_url(&self, username: &str) -> String {
        format!("{}/user/{}/tweets", self.analytics_url, username)
    }
}
