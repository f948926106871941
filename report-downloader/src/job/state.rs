use chrono::{DateTime, Utc};
use error::{AppError, ErrorResponse};
use report_calendar::DateRange;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// Job status enum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting to be processed
    #[default]
    Queued,
    /// Currently running
    Running,
    /// Completed successfully
    Completed,
    /// Failed with an error
    Failed,
}

/// Result for a single report period in a job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Report period; `None` is the dashboard's default period
    pub range: Option<DateRange>,
    /// Current status
    pub status: JobStatus,
    /// Path to the downloaded report (if successful)
    pub csv_path: Option<PathBuf>,
    /// Error summary (if failed)
    pub error: Option<ErrorResponse>,
}

impl BatchResult {
    /// Create a new queued batch
    pub fn new(range: Option<DateRange>) -> Self {
        Self {
            range,
            status: JobStatus::Queued,
            csv_path: None,
            error: None,
        }
    }

    /// Mark as running
    pub fn set_running(&mut self) {
        self.status = JobStatus::Running;
    }

    /// Mark as completed with the report path
    pub fn set_completed(&mut self, csv_path: PathBuf) {
        self.status = JobStatus::Completed;
        self.csv_path = Some(csv_path);
    }

    /// Mark as failed
    pub fn set_failed(&mut self, error: &AppError) {
        self.status = JobStatus::Failed;
        self.error = Some(ErrorResponse::from(error));
    }

    /// Label for logs
    pub fn label(&self) -> String {
        self.range
            .map(|r| r.to_string())
            .unwrap_or_else(|| "default period".to_string())
    }
}

/// Progress of one download run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadJob {
    /// Unique job ID
    pub job_id: String,
    /// Overall job status
    pub status: JobStatus,
    /// One entry per report period, in download order
    pub batches: Vec<BatchResult>,
    /// Job creation time
    pub created_at: DateTime<Utc>,
    /// Processing start time
    pub started_at: Option<DateTime<Utc>>,
    /// Index of the batch being processed
    pub current_batch_index: usize,
    /// Folder reports are saved into
    pub download_path: PathBuf,
    /// Last error message
    pub last_error: Option<String>,
}

impl DownloadJob {
    /// Create a new job state
    pub fn new(periods: Vec<Option<DateRange>>, download_path: PathBuf) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::Queued,
            batches: periods.into_iter().map(BatchResult::new).collect(),
            created_at: Utc::now(),
            started_at: None,
            current_batch_index: 0,
            download_path,
            last_error: None,
        }
    }

    /// Mark job as started
    pub fn start(&mut self) {
        self.status = JobStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Set the last error message
    pub fn set_last_error(&mut self, error: String) {
        self.last_error = Some(error);
    }

    /// Get success count
    pub fn success_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.status == JobStatus::Completed)
            .count()
    }

    /// Get fail count
    pub fn fail_count(&self) -> usize {
        self.batches
            .iter()
            .filter(|b| b.status == JobStatus::Failed)
            .count()
    }

    /// Get the number of finished batches
    pub fn completed_count(&self) -> usize {
        self.success_count() + self.fail_count()
    }

    /// Get the total number of batches
    pub fn total_count(&self) -> usize {
        self.batches.len()
    }

    /// Check if all batches are processed
    pub fn is_complete(&self) -> bool {
        self.completed_count() == self.total_count()
    }

    /// Update overall status based on batch results
    pub fn update_overall_status(&mut self) {
        if self.fail_count() > 0 {
            self.status = JobStatus::Failed;
        } else if self.is_complete() {
            self.status = JobStatus::Completed;
        } else if self.batches.iter().any(|b| b.status == JobStatus::Running) {
            self.status = JobStatus::Running;
        }
    }
}
