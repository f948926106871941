//! Downloader service
//!
//! Implements tower::Service for InProcess calls: each request launches its
//! own browser session, runs the download and closes the session again.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use error::AppError;

use crate::browser::ChromeSession;
use crate::config::DownloaderConfig;
use crate::downloader::{DownloadReport, DownloadRequest, ReportDownloader};

/// Browser-backed report download service
#[derive(Debug, Clone)]
pub struct DownloaderService {
    config: Arc<DownloaderConfig>,
}

impl DownloaderService {
    pub fn new(config: DownloaderConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    /// Launch a session, download, and always close the session
    pub async fn run_session(
        config: Arc<DownloaderConfig>,
        request: DownloadRequest,
    ) -> Result<DownloadReport, AppError> {
        let session = ChromeSession::launch(&config).await?;
        let pacer = config.pacing.build();

        let result = ReportDownloader::new(session.page(), pacer.as_ref(), &config)
            .run(&request)
            .await;

        if let Err(e) = session.close().await {
            e.log("browser teardown");
        }
        result
    }
}

impl tower::Service<DownloadRequest> for DownloaderService {
    type Response = DownloadReport;
    type Error = AppError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, request: DownloadRequest) -> Self::Future {
        let config = Arc::clone(&self.config);
        Box::pin(Self::run_session(config, request))
    }
}
