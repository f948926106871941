//! Report Calendar
//!
//! Date-range batching and date-picker navigation for the analytics
//! dashboard. The browser itself stays behind the [`CalendarWidget`] trait so
//! the logic here can run against any driver.

pub mod batcher;
pub mod models;
pub mod navigator;
pub mod pacing;
pub mod service;

pub use batcher::{split_date_range, split_date_strings, BoundaryPolicy, MAX_WINDOW_DAYS};
pub use models::{
    format_date, parse_date, DateRange, DisplayedMonth, MonthDelta, NavStep, NavigationPlan,
    PickerSide, TargetDate, DATE_FORMAT,
};
pub use navigator::{CalendarWidget, DatePicker};
pub use pacing::{DelayWindow, NoPacer, Pacer, PacingConfig, Pause, RandomPacer};
pub use service::ReportPeriodService;
