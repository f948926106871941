//! Date-range batcher
//!
//! The dashboard refuses report periods longer than 91 days, so longer
//! requests are split into consecutive windows.

use chrono::{Duration, NaiveDate};
use error::ParseError;
use serde::{Deserialize, Serialize};

use crate::models::{parse_date, DateRange};

/// Longest report period the provider accepts, in days (inclusive).
pub const MAX_WINDOW_DAYS: i64 = 91;

/// Distance from a window's first day to its last.
const WINDOW_SPAN_DAYS: i64 = MAX_WINDOW_DAYS - 1;

/// How the final window is bounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Every window is a full 91 days; the last may end after `to`.
    #[default]
    Overshoot,
    /// The last window ends exactly on `to`.
    Clamp,
}

impl std::str::FromStr for BoundaryPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overshoot" => Ok(Self::Overshoot),
            "clamp" => Ok(Self::Clamp),
            other => Err(format!("unknown batch boundary policy '{}'", other)),
        }
    }
}

/// Number of windows the policy produces for `from..=to`.
pub fn batch_count(from: NaiveDate, to: NaiveDate, policy: BoundaryPolicy) -> usize {
    let delta = (to - from).num_days();
    if delta < 0 {
        return 0;
    }
    let count = match policy {
        // ceil(delta / 90): a zero-length request yields no window.
        BoundaryPolicy::Overshoot => (delta + WINDOW_SPAN_DAYS - 1) / WINDOW_SPAN_DAYS,
        BoundaryPolicy::Clamp => (delta + MAX_WINDOW_DAYS) / MAX_WINDOW_DAYS,
    };
    usize::try_from(count).unwrap_or(0)
}

/// Split `from..=to` into contiguous windows of at most 91 days.
///
/// Callers must ensure `from <= to`; an inverted range yields no windows.
pub fn split_date_range(from: NaiveDate, to: NaiveDate, policy: BoundaryPolicy) -> Vec<DateRange> {
    let count = batch_count(from, to, policy);
    let mut batches = Vec::with_capacity(count);
    let mut start = from;

    for _ in 0..count {
        let full = start.checked_add_signed(Duration::days(WINDOW_SPAN_DAYS));
        let end = match (policy, full) {
            (BoundaryPolicy::Clamp, Some(end)) => end.min(to),
            (BoundaryPolicy::Clamp, None) => to,
            (BoundaryPolicy::Overshoot, Some(end)) => end,
            // No full window fits before the end of chrono's calendar.
            (BoundaryPolicy::Overshoot, None) => break,
        };
        match DateRange::new(start, end) {
            Some(range) => batches.push(range),
            None => break,
        }
        match end.succ_opt() {
            Some(next) => start = next,
            None => break,
        }
    }

    tracing::debug!(
        from = %from,
        to = %to,
        ?policy,
        batches = batches.len(),
        "Split date range"
    );
    batches
}

/// Textual entry point: both bounds in `MM/DD/YYYY`.
pub fn split_date_strings(
    from: &str,
    to: &str,
    policy: BoundaryPolicy,
) -> Result<Vec<DateRange>, ParseError> {
    let from = parse_date(from)?;
    let to = parse_date(to)?;
    Ok(split_date_range(from, to, policy))
}
