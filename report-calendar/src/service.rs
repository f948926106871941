//! Report period service
//!
//! Drives the full date-range widget interaction for one batch: open the
//! control, pick both ends, and confirm.

use error::AppError;

use crate::models::{DateRange, PickerSide, TargetDate};
use crate::navigator::{CalendarWidget, DatePicker};
use crate::pacing::{Pause, Pacer};

/// Sets the report period on a dashboard's two-sided date picker.
pub struct ReportPeriodService<'a, W: CalendarWidget + ?Sized> {
    widget: &'a W,
    pacer: &'a dyn Pacer,
}

impl<'a, W: CalendarWidget + ?Sized> ReportPeriodService<'a, W> {
    pub fn new(widget: &'a W, pacer: &'a dyn Pacer) -> Self {
        Self { widget, pacer }
    }

    /// Select `range` in the widget.
    ///
    /// The start picker is fully settled before the end picker is read, since
    /// the right-hand calendar's header depends on the left-hand selection.
    pub async fn set_report_period(&self, range: &DateRange) -> Result<(), AppError> {
        tracing::info!(period = %range, "Setting report period");

        self.open().await?;
        self.pick(PickerSide::Start, range.start().into()).await?;
        self.pick(PickerSide::End, range.end().into()).await?;
        self.apply().await?;

        // The dashboard only refreshes its export after a second confirm.
        self.open().await?;
        self.apply().await?;

        Ok(())
    }

    async fn open(&self) -> Result<(), AppError> {
        self.widget.open().await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }

    async fn pick(&self, side: PickerSide, target: TargetDate) -> Result<(), AppError> {
        DatePicker::new(self.widget, self.pacer, side)
            .select_date(target)
            .await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }

    async fn apply(&self) -> Result<(), AppError> {
        self.widget.apply().await?;
        self.pacer.pause(Pause::Action).await;
        Ok(())
    }
}
