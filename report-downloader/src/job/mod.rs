pub mod state;

pub use state::{BatchResult, DownloadJob, JobStatus};
