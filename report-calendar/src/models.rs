//! Calendar models
//!
//! Domain models shared by the batcher and the date-picker navigator.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use error::ParseError;
use serde::{Deserialize, Serialize};

/// Textual date format used for every date input and output.
pub const DATE_FORMAT: &str = "%m/%d/%Y";

/// Format of the month/year header shown by a date picker (e.g. "Jan 2015").
pub const DISPLAYED_MONTH_FORMAT: &str = "%b %Y";

/// Parse a `MM/DD/YYYY` string into a naive calendar date.
///
/// The year must be exactly four digits; chrono alone would also take
/// short or signed years.
pub fn parse_date(input: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = input.trim();
    if !has_date_shape(trimmed) {
        return Err(ParseError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ParseError::InvalidDate(input.to_string()))
}

/// `\d{1,2}/\d{1,2}/\d{4}`
fn has_date_shape(s: &str) -> bool {
    let parts: Vec<&str> = s.split('/').collect();
    let widths = [1..=2, 1..=2, 4..=4];
    parts.len() == widths.len()
        && parts.iter().zip(widths.iter()).all(|(part, width)| {
            width.contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
        })
}

/// Render a date as `MM/DD/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// A caller-supplied calendar date with no timezone component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TargetDate(NaiveDate);

impl TargetDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    pub fn day(&self) -> u32 {
        self.0.day()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }
}

impl FromStr for TargetDate {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_date(s).map(Self)
    }
}

impl From<NaiveDate> for TargetDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format_date(self.0))
    }
}

/// Month/year currently shown in a date picker header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedMonth {
    pub year: i32,
    pub month: u32,
}

impl DisplayedMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// Parse the picker header text, e.g. "Jan 2015".
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        // chrono needs a day to build a date; pin it to the first.
        let anchored = format!("1 {}", text.trim());
        let date = NaiveDate::parse_from_str(&anchored, &format!("%d {}", DISPLAYED_MONTH_FORMAT))
            .map_err(|_| ParseError::InvalidDisplayedMonth(text.to_string()))?;
        Ok(Self::new(date.year(), date.month()))
    }

    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month)
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(date) => write!(f, "{}", date.format(DISPLAYED_MONTH_FORMAT)),
            None => write!(f, "{:02}/{}", self.month, self.year),
        }
    }
}

/// Signed number of months from a displayed month to a target month.
///
/// Positive means the target is later, negative earlier, zero the same month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MonthDelta(pub i64);

impl MonthDelta {
    pub fn between(displayed: DisplayedMonth, target: TargetDate) -> Self {
        let target = DisplayedMonth::new(target.year(), target.month());
        Self(target.ordinal() - displayed.ordinal())
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Number of navigation clicks needed to close the gap.
    pub fn magnitude(&self) -> u64 {
        self.0.unsigned_abs()
    }
}

/// A single month navigation click on a picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NavStep {
    Previous,
    Next,
}

/// Which of the two range pickers an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PickerSide {
    /// Left calendar, range start
    Start,
    /// Right calendar, range end
    End,
}

impl fmt::Display for PickerSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PickerSide::Start => write!(f, "start"),
            PickerSide::End => write!(f, "end"),
        }
    }
}

/// Steps to bring a picker to the target month, then the day to select.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationPlan {
    pub delta: MonthDelta,
    pub steps: Vec<NavStep>,
    pub day: u32,
}

impl NavigationPlan {
    pub fn new(displayed: DisplayedMonth, target: TargetDate) -> Self {
        let delta = MonthDelta::between(displayed, target);
        let step = if delta.get() > 0 {
            NavStep::Next
        } else {
            NavStep::Previous
        };
        let count = usize::try_from(delta.magnitude()).unwrap_or(usize::MAX);

        Self {
            delta,
            steps: vec![step; count],
            day: target.day(),
        }
    }
}

/// Inclusive calendar date range with `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawDateRange")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

#[derive(Deserialize)]
struct RawDateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<RawDateRange> for DateRange {
    type Error = String;

    fn try_from(raw: RawDateRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
            .ok_or_else(|| format!("range end {} precedes start {}", raw.end, raw.start))
    }
}

impl DateRange {
    /// Build a range; `None` when `end` precedes `start`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Parse a `MM/DD/YYYY` pair.
    pub fn parse(start: &str, end: &str) -> Result<Option<Self>, ParseError> {
        Ok(Self::new(parse_date(start)?, parse_date(end)?))
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Inclusive length in days.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// The range as a `[start, end]` pair of `MM/DD/YYYY` strings.
    pub fn to_strings(&self) -> [String; 2] {
        [format_date(self.start), format_date(self.end)]
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", format_date(self.start), format_date(self.end))
    }
}
