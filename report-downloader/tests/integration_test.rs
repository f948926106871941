//! End-to-end download runs against the mock dashboard.

use std::path::Path;

use report_calendar::{BoundaryPolicy, DisplayedMonth, NoPacer, PickerSide};
use report_downloader::{
    selectors, DownloadRequest, DownloaderConfig, JobStatus, MockBrowser, ReportDownloader,
};

fn test_config(dir: &Path) -> DownloaderConfig {
    DownloaderConfig {
        download_path: dir.to_path_buf(),
        poll_interval_ms: 5,
        login_url: "http://localhost:8080/login".to_string(),
        analytics_url: "http://localhost:8080".to_string(),
        ..DownloaderConfig::default()
    }
}

#[tokio::test]
async fn test_default_period_downloads_one_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let browser = MockBrowser::new(dir.path());

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&DownloadRequest::new("SomeUser", "secret"))
        .await
        .unwrap();

    assert_eq!(report.reports.len(), 1);
    assert_eq!(report.job.status, JobStatus::Completed);
    assert_eq!(report.job.total_count(), 1);
    assert!(report.job.batches[0].range.is_none());

    assert_eq!(
        browser.visited(),
        vec![
            "http://localhost:8080/login".to_string(),
            "http://localhost:8080".to_string(),
            "http://localhost:8080/user/someuser/tweets".to_string(),
        ]
    );
    assert_eq!(browser.typed(selectors::USERNAME_INPUT).as_deref(), Some("someuser"));
    assert_eq!(browser.typed(selectors::PASSWORD_INPUT).as_deref(), Some("secret"));
    assert_eq!(browser.click_count(selectors::DATE_RANGE_BUTTON), 0);
}

#[tokio::test]
async fn test_full_year_runs_five_batches() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let browser = MockBrowser::new(dir.path());
    let request = DownloadRequest::new("someone", "pw")
        .with_date_range("01/01/2015", "12/31/2015")
        .unwrap();

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(report.job.status, JobStatus::Completed);
    assert_eq!(report.job.success_count(), 5);
    assert_eq!(report.reports.len(), 5);
    assert_eq!(browser.downloads(), 5);
    assert_eq!(browser.click_count(selectors::DATE_RANGE_BUTTON), 10);
    assert_eq!(browser.click_count(selectors::APPLY_BUTTON), 10);

    let last = report.job.batches[4].range.unwrap();
    assert_eq!(last.to_string(), "12/31/2015 - 03/30/2016");
    assert_eq!(browser.displayed(PickerSide::Start), DisplayedMonth::new(2015, 12));
    assert_eq!(browser.displayed(PickerSide::End), DisplayedMonth::new(2016, 3));
    assert_eq!(browser.picked(PickerSide::End), Some(30));
}

#[tokio::test]
async fn test_clamp_policy_ends_on_requested_date() {
    let dir = tempfile::tempdir().unwrap();
    let config = DownloaderConfig {
        boundary: BoundaryPolicy::Clamp,
        ..test_config(dir.path())
    };
    let browser = MockBrowser::new(dir.path());
    let request = DownloadRequest::new("someone", "pw")
        .with_date_range("01/01/2015", "12/31/2015")
        .unwrap();

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&request)
        .await
        .unwrap();

    let last = report.job.batches.last().and_then(|b| b.range).unwrap();
    assert_eq!(last.to_string().split(" - ").nth(1), Some("12/31/2015"));
    assert_eq!(report.reports.len(), report.job.total_count());
}

#[tokio::test]
async fn test_error_banner_triggers_export_retry() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let browser = MockBrowser::new(dir.path()).with_failing_exports(1);

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&DownloadRequest::new("someone", "pw"))
        .await
        .unwrap();

    assert_eq!(browser.click_count(selectors::EXPORT_BUTTON), 2);
    assert_eq!(report.reports.len(), 1);
    assert_eq!(report.job.status, JobStatus::Completed);
}

#[tokio::test]
async fn test_download_timeout_fails_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = DownloaderConfig {
        download_timeout_secs: Some(1),
        ..test_config(dir.path())
    };
    let browser = MockBrowser::new(dir.path()).with_failing_exports(u32::MAX);

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&DownloadRequest::new("someone", "pw"))
        .await
        .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.job.status, JobStatus::Failed);
    assert_eq!(report.job.batches[0].status, JobStatus::Failed);
    assert_eq!(
        report.job.batches[0].error.as_ref().map(|e| e.code.as_str()),
        Some("TIMEOUT")
    );
    assert!(report.reports.is_empty());
    assert_eq!(browser.downloads(), 0);
    assert!(browser.click_count(selectors::EXPORT_BUTTON) > 1);
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_results() {
    let dir = tempfile::tempdir().unwrap();
    let config = DownloaderConfig {
        download_timeout_secs: Some(1),
        ..test_config(dir.path())
    };
    let browser = MockBrowser::new(dir.path()).with_export_limit(1);
    let request = DownloadRequest::new("someone", "pw")
        .with_date_range("01/01/2015", "07/15/2015")
        .unwrap();

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(report.job.total_count(), 3);
    assert_eq!(report.job.status, JobStatus::Failed);
    assert_eq!(report.job.success_count(), 1);

    let first = &report.job.batches[0];
    assert_eq!(first.status, JobStatus::Completed);
    assert_eq!(
        first.csv_path.as_deref(),
        Some(dir.path().join("tweet_activity_metrics_1.csv").as_path())
    );

    let second = &report.job.batches[1];
    assert_eq!(second.status, JobStatus::Failed);
    assert_eq!(second.error.as_ref().map(|e| e.code.as_str()), Some("TIMEOUT"));
    assert!(report.job.last_error.is_some());

    assert_eq!(report.job.batches[2].status, JobStatus::Queued);
    assert_eq!(report.reports, vec![dir.path().join("tweet_activity_metrics_1.csv")]);
}

#[tokio::test]
async fn test_same_day_range_downloads_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());
    let browser = MockBrowser::new(dir.path());
    let request = DownloadRequest::new("someone", "pw")
        .with_date_range("03/15/2015", "03/15/2015")
        .unwrap();

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&request)
        .await
        .unwrap();

    assert_eq!(report.job.total_count(), 0);
    assert_eq!(report.job.status, JobStatus::Completed);
    assert!(report.reports.is_empty());
    assert_eq!(browser.click_count(selectors::EXPORT_BUTTON), 0);
}

#[tokio::test]
async fn test_existing_reports_are_listed_after_run() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("older_export.csv"), "id\n").unwrap();
    let config = test_config(dir.path());
    let browser = MockBrowser::new(dir.path());

    let report = ReportDownloader::new(&browser, &NoPacer, &config)
        .run(&DownloadRequest::new("someone", "pw"))
        .await
        .unwrap();

    assert_eq!(report.reports.len(), 2);
    assert_eq!(
        report.job.batches[0].csv_path.as_deref(),
        Some(dir.path().join("tweet_activity_metrics_1.csv").as_path())
    );
}
