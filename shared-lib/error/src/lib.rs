//! Common error types for the report downloader crates.
//!
//! This crate provides unified error handling across the calendar core
//! and the browser-driven downloader.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timeout: {0}")]
    Timeout(String),
}

impl AppError {
    /// Stable code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Parse(e) => e.code(),
            AppError::Driver(e) => e.code(),
            AppError::Config(_) => "CONFIG_INVALID",
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::Io(_) => "IO_FAILED",
            AppError::Timeout(_) => "TIMEOUT",
        }
    }

    /// Emit this error through tracing with its code attached.
    pub fn log(&self, context: &str) {
        tracing::error!(code = self.code(), "{}: {}", context, self);
    }
}

/// Date and displayed-month parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid date '{0}' (expected MM/DD/YYYY)")]
    InvalidDate(String),

    #[error("Invalid displayed month '{0}' (expected e.g. 'Jan 2015')")]
    InvalidDisplayedMonth(String),
}

impl ParseError {
    fn code(&self) -> &'static str {
        match self {
            ParseError::InvalidDate(_) => "PARSE_INVALID_DATE",
            ParseError::InvalidDisplayedMonth(_) => "PARSE_INVALID_MONTH",
        }
    }
}

/// Browser-driver errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error("Element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("Day {day} not selectable in {month}")]
    DayNotFound { day: u32, month: String },

    #[error("Browser launch failed: {0}")]
    Launch(String),

    #[error("Browser command failed: {0}")]
    Command(String),
}

impl DriverError {
    /// Shorthand for a missing element.
    pub fn not_found(locator: impl Into<String>) -> Self {
        DriverError::ElementNotFound {
            locator: locator.into(),
        }
    }

    fn code(&self) -> &'static str {
        match self {
            DriverError::ElementNotFound { .. } => "DRIVER_ELEMENT_NOT_FOUND",
            DriverError::DayNotFound { .. } => "DRIVER_DAY_NOT_FOUND",
            DriverError::Launch(_) => "DRIVER_LAUNCH_FAILED",
            DriverError::Command(_) => "DRIVER_COMMAND_FAILED",
        }
    }
}

/// Serializable error summary, recorded per failed batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Add details to the error response.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        let response = Self::new(err.code(), err.to_string());
        match err {
            AppError::Driver(DriverError::ElementNotFound { locator }) => {
                response.with_details(locator.clone())
            }
            _ => response,
        }
    }
}
