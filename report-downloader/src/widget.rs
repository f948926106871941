//! The dashboard's date-range control, seen through a [`BrowserDriver`].

use async_trait::async_trait;
use error::DriverError;
use report_calendar::{CalendarWidget, NavStep, PickerSide};

use crate::driver::BrowserDriver;
use crate::selectors;

/// Date-range widget backed by live page elements.
pub struct DashboardCalendar<'a, D: BrowserDriver + ?Sized> {
    driver: &'a D,
}

impl<'a, D: BrowserDriver + ?Sized> DashboardCalendar<'a, D> {
    pub fn new(driver: &'a D) -> Self {
        Self { driver }
    }
}

#[async_trait]
impl<D: BrowserDriver + ?Sized> CalendarWidget for DashboardCalendar<'_, D> {
    async fn open(&self) -> Result<(), DriverError> {
        self.driver.click(selectors::DATE_RANGE_BUTTON).await
    }

    async fn displayed_month(&self, side: PickerSide) -> Result<String, DriverError> {
        self.driver.read_text(&selectors::month_header(side)).await
    }

    async fn step(&self, side: PickerSide, step: NavStep) -> Result<(), DriverError> {
        let locator = match step {
            NavStep::Previous => selectors::previous_button(side),
            NavStep::Next => selectors::next_button(side),
        };
        self.driver.click(&locator).await
    }

    async fn click_day(&self, side: PickerSide, day: u32) -> Result<(), DriverError> {
        self.driver.click(&selectors::day_cell(side, day)).await
    }

    async fn apply(&self) -> Result<(), DriverError> {
        self.driver.click(selectors::APPLY_BUTTON).await
    }
}
