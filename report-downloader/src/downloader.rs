//! Login, navigation and the batch download loop.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use error::AppError;
use report_calendar::{parse_date, split_date_range, DateRange, Pacer, Pause, ReportPeriodService};
use serde::Serialize;

use crate::config::DownloaderConfig;
use crate::driver::BrowserDriver;
use crate::job::{DownloadJob, JobStatus};
use crate::selectors;
use crate::watcher;
use crate::widget::DashboardCalendar;

/// What to download, and whose account to download it from.
#[derive(Clone)]
pub struct DownloadRequest {
    /// Account name, lower-cased
    pub username: String,
    pub password: String,
    /// Inclusive `from`/`to` dates; `None` keeps the dashboard's default period
    pub period: Option<(NaiveDate, NaiveDate)>,
}

impl DownloadRequest {
    pub fn new(username: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            username: username.as_ref().trim().to_lowercase(),
            password: password.into(),
            period: None,
        }
    }

    /// Restrict the download to `from..=to`, both `MM/DD/YYYY`
    pub fn with_date_range(mut self, from: &str, to: &str) -> Result<Self, AppError> {
        let from = parse_date(from)?;
        let to = parse_date(to)?;
        if from > to {
            return Err(AppError::Validation(format!(
                "start date {} is after end date {}",
                from.format(report_calendar::DATE_FORMAT),
                to.format(report_calendar::DATE_FORMAT)
            )));
        }
        self.period = Some((from, to));
        Ok(self)
    }
}

impl fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("username", &self.username)
            .field("password", &"********")
            .field("period", &self.period)
            .finish()
    }
}

/// Outcome of a download run.
#[derive(Debug, Clone, Serialize)]
pub struct DownloadReport {
    pub job: DownloadJob,
    /// Every report in the download folder after the run
    pub reports: Vec<PathBuf>,
}

impl DownloadReport {
    /// Whether every batch downloaded
    pub fn is_success(&self) -> bool {
        self.job.status == JobStatus::Completed
    }
}

/// Drives one logged-in browser through the analytics export.
pub struct ReportDownloader<'a, D: BrowserDriver + ?Sized> {
    driver: &'a D,
    pacer: &'a dyn Pacer,
    config: &'a DownloaderConfig,
}

impl<'a, D: BrowserDriver + ?Sized> ReportDownloader<'a, D> {
    pub fn new(driver: &'a D, pacer: &'a dyn Pacer, config: &'a DownloaderConfig) -> Self {
        Self {
            driver,
            pacer,
            config,
        }
    }

    /// Log in, open the report page and download one report per batch
    ///
    /// Login and navigation failures are returned as errors. A failing batch
    /// stops the run but still yields a report: the job is `Failed`, the
    /// failed batch carries its error, and later batches stay `Queued`.
    pub async fn run(&self, request: &DownloadRequest) -> Result<DownloadReport, AppError> {
        let periods: Vec<Option<DateRange>> = match request.period {
            None => vec![None],
            Some((from, to)) => {
                let batches = split_date_range(from, to, self.config.boundary);
                if batches.is_empty() {
                    tracing::warn!(
                        "Date range {} - {} yields no batches; nothing to download",
                        from.format(report_calendar::DATE_FORMAT),
                        to.format(report_calendar::DATE_FORMAT)
                    );
                }
                batches.into_iter().map(Some).collect()
            }
        };

        tokio::fs::create_dir_all(&self.config.download_path).await?;
        let mut job = DownloadJob::new(periods, self.config.download_path.clone());
        tracing::info!(
            "Job {} created: {} batch(es) for {}",
            job.job_id,
            job.total_count(),
            request.username
        );

        self.login(request).await?;
        self.go_to_analytics().await?;
        self.go_to_report_page(&request.username).await?;

        job.start();
        for index in 0..job.total_count() {
            job.current_batch_index = index;
            let range = job.batches[index].range;
            job.batches[index].set_running();
            tracing::info!(
                "Batch {}/{}: {}",
                index + 1,
                job.total_count(),
                job.batches[index].label()
            );

            match self.run_batch(range).await {
                Ok(path) => {
                    tracing::info!("Report saved: {}", path.display());
                    job.batches[index].set_completed(path);
                }
                Err(e) => {
                    e.log(&format!("batch {}", job.batches[index].label()));
                    job.batches[index].set_failed(&e);
                    job.set_last_error(e.to_string());
                    break;
                }
            }
        }
        job.update_overall_status();

        self.pacer.pause(Pause::Action).await;
        let reports = watcher::list_reports(&self.config.download_path).await?;
        tracing::info!(
            "Job {} finished: {}/{} batch(es), {} report(s) in {}",
            job.job_id,
            job.success_count(),
            job.total_count(),
            reports.len(),
            self.config.download_path.display()
        );

        Ok(DownloadReport { job, reports })
    }

    async fn login(&self, request: &DownloadRequest) -> Result<(), AppError> {
        tracing::info!("Logging in as {}", request.username);
        self.driver.goto(&self.config.login_url).await?;
        self.pacer.pause(Pause::Action).await;

        self.driver
            .send_keys(selectors::USERNAME_INPUT, &request.username)
            .await?;
        self.pacer.pause(Pause::Action).await;

        self.driver
            .send_keys(selectors::PASSWORD_INPUT, &request.password)
            .await?;
        self.pacer.pause(Pause::Action).await;

        self.driver.click(selectors::LOGIN_SUBMIT).await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }

    async fn go_to_analytics(&self) -> Result<(), AppError> {
        self.driver.goto(&self.config.analytics_url).await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }

    async fn go_to_report_page(&self, username: &str) -> Result<(), AppError> {
        let url = self.config.report_page_url(username);
        tracing::info!("Opening report page {}", url);
        self.driver.goto(&url).await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }

    async fn run_batch(&self, range: Option<DateRange>) -> Result<PathBuf, AppError> {
        if let Some(range) = range {
            let calendar = DashboardCalendar::new(self.driver);
            ReportPeriodService::new(&calendar, self.pacer)
                .set_report_period(&range)
                .await?;
        }
        self.download_report().await
    }

    /// Click export and wait for the new report file
    ///
    /// The error banner means the export was rejected; export is clicked
    /// again until a file lands. Without a configured timeout this waits
    /// indefinitely.
    pub async fn download_report(&self) -> Result<PathBuf, AppError> {
        let dir = self.config.download_path.as_path();
        self.pacer.pause(Pause::Action).await;
        let before = watcher::snapshot(dir).await?;

        self.driver.click(selectors::EXPORT_BUTTON).await?;

        match self.config.download_timeout() {
            Some(limit) => tokio::time::timeout(limit, self.wait_for_report(dir, &before))
                .await
                .map_err(|_| {
                    AppError::Timeout(format!(
                        "no report appeared in {} within {}s",
                        dir.display(),
                        limit.as_secs()
                    ))
                })?,
            None => self.wait_for_report(dir, &before).await,
        }
    }

    async fn wait_for_report(
        &self,
        dir: &Path,
        before: &HashSet<PathBuf>,
    ) -> Result<PathBuf, AppError> {
        loop {
            if let Some(path) = watcher::new_file(dir, before).await? {
                return Ok(path);
            }

            if self.driver.exists(selectors::ERROR_BANNER).await? {
                tracing::warn!("Export rejected by the dashboard, retrying");
                self.driver.click(selectors::EXPORT_BUTTON).await?;
            }

            self.pacer.pause(Pause::Action).await;
            tokio::time::sleep(self.config.poll_interval()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ParseError;

    #[test]
    fn test_request_lowercases_username() {
        let request = DownloadRequest::new(" SomeUser ", "secret");
        assert_eq!(request.username, "someuser");
        assert!(request.period.is_none());
    }

    #[test]
    fn test_request_debug_masks_password() {
        let request = DownloadRequest::new("someone", "hunter2");
        let debug = format!("{:?}", request);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("someone"));
    }

    #[test]
    fn test_with_date_range() {
        let request = DownloadRequest::new("someone", "pw")
            .with_date_range("01/01/2015", "02/28/2015")
            .unwrap();
        assert_eq!(
            request.period,
            Some((
                NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2015, 2, 28).unwrap()
            ))
        );
    }

    #[test]
    fn test_with_date_range_rejects_inverted_and_malformed() {
        let inverted = DownloadRequest::new("someone", "pw").with_date_range("03/01/2015", "01/01/2015");
        assert!(matches!(inverted, Err(AppError::Validation(_))));

        let malformed = DownloadRequest::new("someone", "pw").with_date_range("2015-01-01", "01/31/2015");
        assert!(matches!(malformed, Err(AppError::Parse(ParseError::InvalidDate(_)))));
    }
}
