//! Calendar navigator
//!
//! Brings one date picker from whatever month it currently shows to a target
//! date, then clicks the target day.

use async_trait::async_trait;
use error::{AppError, DriverError};

use crate::models::{DisplayedMonth, NavStep, NavigationPlan, PickerSide, TargetDate};
use crate::pacing::{Pause, Pacer};

/// A two-sided date-range widget living in an external UI.
///
/// The widget owns its display state; callers must re-read it before each
/// decision because previous commands may have changed it.
#[async_trait]
pub trait CalendarWidget: Send + Sync {
    /// Open the date-range control.
    async fn open(&self) -> Result<(), DriverError>;

    /// Header text of the month shown by one picker, e.g. "Jan 2015".
    async fn displayed_month(&self, side: PickerSide) -> Result<String, DriverError>;

    /// Click the previous or next month button of one picker.
    async fn step(&self, side: PickerSide, step: NavStep) -> Result<(), DriverError>;

    /// Click the selectable cell for `day` in the month one picker shows.
    async fn click_day(&self, side: PickerSide, day: u32) -> Result<(), DriverError>;

    /// Confirm the selected range.
    async fn apply(&self) -> Result<(), DriverError>;
}

/// Selects one target date on one side of a [`CalendarWidget`].
pub struct DatePicker<'a, W: CalendarWidget + ?Sized> {
    widget: &'a W,
    pacer: &'a dyn Pacer,
    side: PickerSide,
}

impl<'a, W: CalendarWidget + ?Sized> DatePicker<'a, W> {
    pub fn new(widget: &'a W, pacer: &'a dyn Pacer, side: PickerSide) -> Self {
        Self {
            widget,
            pacer,
            side,
        }
    }

    /// Read the picker header and plan the clicks to reach `target`.
    pub async fn plan(&self, target: TargetDate) -> Result<NavigationPlan, AppError> {
        let header = self.widget.displayed_month(self.side).await?;
        let displayed = DisplayedMonth::parse(&header)?;
        Ok(NavigationPlan::new(displayed, target))
    }

    /// Navigate to the target month and click the target day.
    pub async fn select_date(&self, target: TargetDate) -> Result<NavigationPlan, AppError> {
        let plan = self.plan(target).await?;
        tracing::debug!(
            side = %self.side,
            target = %target,
            delta = plan.delta.get(),
            "Navigating date picker"
        );

        for step in &plan.steps {
            self.widget.step(self.side, *step).await?;
            self.pacer.pause(Pause::Step).await;
        }

        self.widget
            .click_day(self.side, plan.day)
            .await
            .map_err(|e| match e {
                DriverError::ElementNotFound { .. } => DriverError::DayNotFound {
                    day: plan.day,
                    month: format!("{:02}/{}", target.month(), target.year()),
                },
                other => other,
            })?;

        Ok(plan)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory widget used by the calendar tests.

    use std::sync::Mutex;

    use chrono::Datelike;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Event {
        Open,
        Read(PickerSide),
        Step(PickerSide, NavStep),
        Day(PickerSide, u32),
        Apply,
    }

    pub struct FakeWidget {
        pub shown: Mutex<[DisplayedMonth; 2]>,
        pub events: Mutex<Vec<Event>>,
        /// Days that render as unavailable cells
        pub disabled_days: Vec<u32>,
    }

    impl FakeWidget {
        pub fn new(start: DisplayedMonth, end: DisplayedMonth) -> Self {
            Self {
                shown: Mutex::new([start, end]),
                events: Mutex::new(Vec::new()),
                disabled_days: Vec::new(),
            }
        }

        pub fn shown(&self, side: PickerSide) -> DisplayedMonth {
            self.shown.lock().unwrap()[index(side)]
        }

        pub fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn record(&self, event: Event) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn index(side: PickerSide) -> usize {
        match side {
            PickerSide::Start => 0,
            PickerSide::End => 1,
        }
    }

    fn days_in(month: DisplayedMonth) -> u32 {
        let first = chrono::NaiveDate::from_ymd_opt(month.year, month.month, 1).unwrap();
        let next = first + chrono::Months::new(1);
        (next - first).num_days() as u32
    }

    #[async_trait]
    impl CalendarWidget for FakeWidget {
        async fn open(&self) -> Result<(), DriverError> {
            self.record(Event::Open);
            Ok(())
        }

        async fn displayed_month(&self, side: PickerSide) -> Result<String, DriverError> {
            self.record(Event::Read(side));
            Ok(self.shown(side).to_string())
        }

        async fn step(&self, side: PickerSide, step: NavStep) -> Result<(), DriverError> {
            self.record(Event::Step(side, step));
            let mut shown = self.shown.lock().unwrap();
            let current = shown[index(side)];
            let first = chrono::NaiveDate::from_ymd_opt(current.year, current.month, 1).unwrap();
            let moved = match step {
                NavStep::Next => first + chrono::Months::new(1),
                NavStep::Previous => first - chrono::Months::new(1),
            };
            shown[index(side)] = DisplayedMonth::new(moved.year(), moved.month());
            Ok(())
        }

        async fn click_day(&self, side: PickerSide, day: u32) -> Result<(), DriverError> {
            let month = self.shown(side);
            if day == 0 || day > days_in(month) || self.disabled_days.contains(&day) {
                return Err(DriverError::not_found(format!("day {} in {}", day, month)));
            }
            self.record(Event::Day(side, day));
            Ok(())
        }

        async fn apply(&self) -> Result<(), DriverError> {
            self.record(Event::Apply);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Event, FakeWidget};
    use super::*;
    use crate::pacing::NoPacer;

    fn month(text: &str) -> DisplayedMonth {
        DisplayedMonth::parse(text).unwrap()
    }

    #[tokio::test]
    async fn test_select_date_in_displayed_month() {
        let widget = FakeWidget::new(month("Jan 2015"), month("Feb 2015"));
        let picker = DatePicker::new(&widget, &NoPacer, PickerSide::Start);

        let plan = picker.select_date("01/20/2015".parse().unwrap()).await.unwrap();

        assert!(plan.steps.is_empty());
        assert_eq!(
            widget.events(),
            vec![Event::Read(PickerSide::Start), Event::Day(PickerSide::Start, 20)]
        );
    }

    #[tokio::test]
    async fn test_select_date_navigates_forward() {
        let widget = FakeWidget::new(month("Nov 2014"), month("Dec 2014"));
        let picker = DatePicker::new(&widget, &NoPacer, PickerSide::Start);

        picker.select_date("02/03/2015".parse().unwrap()).await.unwrap();

        let steps = widget
            .events()
            .into_iter()
            .filter(|e| matches!(e, Event::Step(..)))
            .count();
        assert_eq!(steps, 3);
        assert_eq!(widget.shown(PickerSide::Start), month("Feb 2015"));
        assert_eq!(widget.shown(PickerSide::End), month("Dec 2014"));
    }

    #[tokio::test]
    async fn test_select_date_navigates_backward() {
        let widget = FakeWidget::new(month("Mar 2015"), month("Mar 2015"));
        let picker = DatePicker::new(&widget, &NoPacer, PickerSide::End);

        picker.select_date("01/31/2015".parse().unwrap()).await.unwrap();

        assert_eq!(
            widget.events(),
            vec![
                Event::Read(PickerSide::End),
                Event::Step(PickerSide::End, NavStep::Previous),
                Event::Step(PickerSide::End, NavStep::Previous),
                Event::Day(PickerSide::End, 31),
            ]
        );
    }

    #[tokio::test]
    async fn test_plan_rereads_display_each_time() {
        let widget = FakeWidget::new(month("Jan 2015"), month("Jan 2015"));
        let picker = DatePicker::new(&widget, &NoPacer, PickerSide::Start);
        let target: TargetDate = "04/01/2015".parse().unwrap();

        assert_eq!(picker.plan(target).await.unwrap().delta.get(), 3);
        picker.select_date(target).await.unwrap();
        assert_eq!(picker.plan(target).await.unwrap().delta.get(), 0);
    }

    #[tokio::test]
    async fn test_missing_day_cell_is_day_not_found() {
        let mut widget = FakeWidget::new(month("Jun 2015"), month("Jun 2015"));
        widget.disabled_days = vec![15];
        let picker = DatePicker::new(&widget, &NoPacer, PickerSide::Start);

        let err = picker.select_date("06/15/2015".parse().unwrap()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Driver(DriverError::DayNotFound { day: 15, .. })
        ));
    }

    #[tokio::test]
    async fn test_unreadable_header_is_parse_error() {
        struct Garbled;

        #[async_trait]
        impl CalendarWidget for Garbled {
            async fn open(&self) -> Result<(), DriverError> {
                Ok(())
            }
            async fn displayed_month(&self, _side: PickerSide) -> Result<String, DriverError> {
                Ok("Loading...".to_string())
            }
            async fn step(&self, _side: PickerSide, _step: NavStep) -> Result<(), DriverError> {
                Ok(())
            }
            async fn click_day(&self, _side: PickerSide, _day: u32) -> Result<(), DriverError> {
                Ok(())
            }
            async fn apply(&self) -> Result<(), DriverError> {
                Ok(())
            }
        }

        let picker = DatePicker::new(&Garbled, &NoPacer, PickerSide::Start);
        let err = picker.select_date("06/15/2015".parse().unwrap()).await.unwrap_err();
        assert!(matches!(err, AppError::Parse(_)));
    }
}
