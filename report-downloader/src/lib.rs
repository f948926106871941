//! Analytics Report Downloader
//!
//! Logs into the analytics dashboard with a Chrome session, sets the report
//! period through the date-range widget and downloads one CSV per batch.
//! It exposes [`DownloaderService`] via tower::Service for InProcess calls.

pub mod browser;
pub mod config;
pub mod downloader;
pub mod driver;
pub mod job;
pub mod selectors;
pub mod service;
pub mod watcher;
pub mod widget;

pub use browser::{find_chrome, ChromePage, ChromeSession, VirtualDisplay};
pub use config::DownloaderConfig;
pub use downloader::{DownloadReport, DownloadRequest, ReportDownloader};
pub use driver::{BrowserDriver, MockBrowser};
pub use job::{BatchResult, DownloadJob, JobStatus};
pub use service::DownloaderService;
pub use widget::DashboardCalendar;
