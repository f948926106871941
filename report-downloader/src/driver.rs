//! BrowserDriver trait and a mock dashboard for tests and development.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use error::DriverError;
use report_calendar::{DisplayedMonth, PickerSide};

use crate::selectors;

/// Minimal browser-automation surface the downloader needs.
///
/// Locators are XPath expressions. A locator that matches nothing fails with
/// [`DriverError::ElementNotFound`].
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate the page to `url`
    async fn goto(&self, url: &str) -> Result<(), DriverError>;

    /// Click the element at `locator`
    async fn click(&self, locator: &str) -> Result<(), DriverError>;

    /// Type `text` into the element at `locator`
    async fn send_keys(&self, locator: &str, text: &str) -> Result<(), DriverError>;

    /// Visible text of the element at `locator`
    async fn read_text(&self, locator: &str) -> Result<String, DriverError>;

    /// Whether `locator` currently matches an element
    async fn exists(&self, locator: &str) -> Result<bool, DriverError>;
}

#[derive(Debug)]
struct MockState {
    visited: Vec<String>,
    typed: HashMap<String, String>,
    clicks: Vec<String>,
    shown: [DisplayedMonth; 2],
    picked: [Option<u32>; 2],
    failing_exports: u32,
    export_limit: Option<u32>,
    banner_visible: bool,
    downloads: u32,
}

/// In-process stand-in for the analytics dashboard.
///
/// It understands the locators in [`selectors`]: both calendar pickers move
/// between months, and each export click writes a CSV into `download_path`
/// unless configured to fail, in which case the error banner appears.
#[derive(Debug)]
pub struct MockBrowser {
    download_path: PathBuf,
    state: Mutex<MockState>,
}

impl MockBrowser {
    /// Create a mock dashboard saving exports into `download_path`
    pub fn new(download_path: impl Into<PathBuf>) -> Self {
        Self {
            download_path: download_path.into(),
            state: Mutex::new(MockState {
                visited: Vec::new(),
                typed: HashMap::new(),
                clicks: Vec::new(),
                shown: [DisplayedMonth::new(2016, 5), DisplayedMonth::new(2016, 6)],
                picked: [None, None],
                failing_exports: 0,
                export_limit: None,
                banner_visible: false,
                downloads: 0,
            }),
        }
    }

    /// Months the start and end pickers show when the page loads
    pub fn with_displayed(self, start: DisplayedMonth, end: DisplayedMonth) -> Self {
        self.lock().shown = [start, end];
        self
    }

    /// Make the next `count` export clicks fail with the error banner
    pub fn with_failing_exports(self, count: u32) -> Self {
        self.lock().failing_exports = count;
        self
    }

    /// Reject every export once `count` reports have been downloaded
    pub fn with_export_limit(self, count: u32) -> Self {
        self.lock().export_limit = Some(count);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock().visited.clone()
    }

    pub fn typed(&self, locator: &str) -> Option<String> {
        self.lock().typed.get(locator).cloned()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.lock().clicks.clone()
    }

    /// Number of clicks on exactly `locator`
    pub fn click_count(&self, locator: &str) -> usize {
        self.lock().clicks.iter().filter(|c| c.as_str() == locator).count()
    }

    pub fn displayed(&self, side: PickerSide) -> DisplayedMonth {
        self.lock().shown[index(side)]
    }

    /// Day last picked on one side
    pub fn picked(&self, side: PickerSide) -> Option<u32> {
        self.lock().picked[index(side)]
    }

    pub fn downloads(&self) -> u32 {
        self.lock().downloads
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        // A poisoned lock only means another test thread panicked.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn step(&self, side: PickerSide, forward: bool) -> Result<(), DriverError> {
        let mut state = self.lock();
        let current = state.shown[index(side)];
        let first = first_of(current)?;
        let moved = if forward {
            first.checked_add_months(Months::new(1))
        } else {
            first.checked_sub_months(Months::new(1))
        }
        .ok_or_else(|| DriverError::Command(format!("cannot move past {}", current)))?;
        state.shown[index(side)] = DisplayedMonth::new(moved.year(), moved.month());
        Ok(())
    }

    fn pick_day(&self, locator: &str) -> Option<Result<(), DriverError>> {
        for side in [PickerSide::Start, PickerSide::End] {
            for day in 1..=31 {
                if locator == selectors::day_cell(side, day) {
                    let mut state = self.lock();
                    let shown = state.shown[index(side)];
                    return Some(match first_of(shown) {
                        Ok(first) if day <= days_in_month(first) => {
                            state.picked[index(side)] = Some(day);
                            Ok(())
                        }
                        Ok(_) => Err(DriverError::not_found(locator)),
                        Err(e) => Err(e),
                    });
                }
            }
        }
        None
    }

    async fn export(&self) -> Result<(), DriverError> {
        let file = {
            let mut state = self.lock();
            if state.failing_exports > 0 {
                state.failing_exports -= 1;
                state.banner_visible = true;
                return Ok(());
            }
            if state.export_limit.is_some_and(|limit| state.downloads >= limit) {
                state.banner_visible = true;
                return Ok(());
            }
            state.banner_visible = false;
            state.downloads += 1;
            self.download_path
                .join(format!("tweet_activity_metrics_{}.csv", state.downloads))
        };

        let content = "Tweet id,Tweet permalink,Tweet text,time,impressions\n\
                       1,https://example.invalid/1,hello,2015-01-01 00:00 +0000,10\n";
        tokio::fs::write(&file, content)
            .await
            .map_err(|e| DriverError::Command(format!("mock download failed: {}", e)))
    }
}

fn index(side: PickerSide) -> usize {
    match side {
        PickerSide::Start => 0,
        PickerSide::End => 1,
    }
}

fn first_of(month: DisplayedMonth) -> Result<NaiveDate, DriverError> {
    NaiveDate::from_ymd_opt(month.year, month.month, 1)
        .ok_or_else(|| DriverError::Command(format!("invalid month {}", month)))
}

fn days_in_month(first: NaiveDate) -> u32 {
    first
        .checked_add_months(Months::new(1))
        .map(|next| (next - first).num_days() as u32)
        .unwrap_or(31)
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn goto(&self, url: &str) -> Result<(), DriverError> {
        tracing::debug!("Mock navigate to {}", url);
        self.lock().visited.push(url.to_string());
        Ok(())
    }

    async fn click(&self, locator: &str) -> Result<(), DriverError> {
        self.lock().clicks.push(locator.to_string());

        match locator {
            selectors::LOGIN_SUBMIT | selectors::DATE_RANGE_BUTTON | selectors::APPLY_BUTTON => {
                return Ok(())
            }
            selectors::EXPORT_BUTTON => return self.export().await,
            _ => {}
        }

        for side in [PickerSide::Start, PickerSide::End] {
            if locator == selectors::previous_button(side) {
                return self.step(side, false);
            }
            if locator == selectors::next_button(side) {
                return self.step(side, true);
            }
        }

        self.pick_day(locator)
            .unwrap_or_else(|| Err(DriverError::not_found(locator)))
    }

    async fn send_keys(&self, locator: &str, text: &str) -> Result<(), DriverError> {
        match locator {
            selectors::USERNAME_INPUT | selectors::PASSWORD_INPUT => {
                self.lock()
                    .typed
                    .insert(locator.to_string(), text.to_string());
                Ok(())
            }
            _ => Err(DriverError::not_found(locator)),
        }
    }

    async fn read_text(&self, locator: &str) -> Result<String, DriverError> {
        for side in [PickerSide::Start, PickerSide::End] {
            if locator == selectors::month_header(side) {
                return Ok(self.displayed(side).to_string());
            }
        }
        Err(DriverError::not_found(locator))
    }

    async fn exists(&self, locator: &str) -> Result<bool, DriverError> {
        if locator == selectors::ERROR_BANNER {
            return Ok(self.lock().banner_visible);
        }
        Ok(false)
    }
}
