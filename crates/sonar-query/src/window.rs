//! Time window resolver.
//!
//! Different analytic views share default-lookback expectations: 90 days
//! for most topics, unrestricted for the wide-range legacy ones. The
//! defaulting lives here so compilers never hardcode it twice.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use sonar_core::request::TimeSlot;
use sonar_core::types::TimeWindow;

/// Topics whose no-input default is "no time restriction at all", not a
/// wide range.
pub const WIDE_RANGE_TOPICS: &[u64] = &[103, 160];

pub const DEFAULT_LOOKBACK_DAYS: i64 = 90;

/// Resolve explicit dates, named slots and topic defaults into one
/// window. `now` is a parameter so tests are not wall-clock dependent.
pub fn resolve(
    from_date: Option<NaiveDate>,
    to_date: Option<NaiveDate>,
    slot: Option<TimeSlot>,
    topic_id: u64,
    now: DateTime<Utc>,
) -> TimeWindow {
    if let (Some(from), Some(to)) = (from_date, to_date) {
        return TimeWindow::between(start_of_day(from), end_of_day(to));
    }
    if let Some(slot) = slot {
        return TimeWindow::between(now - Duration::days(slot.days()), now);
    }
    if !WIDE_RANGE_TOPICS.contains(&topic_id) {
        return TimeWindow::between(now - Duration::days(DEFAULT_LOOKBACK_DAYS), now);
    }
    TimeWindow::inactive()
}

pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

pub fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);
    day.and_time(last_second).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).single().expect("valid timestamp")
    }

    #[test]
    fn explicit_dates_win_and_normalize_to_day_bounds() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1);
        let to = NaiveDate::from_ymd_opt(2024, 1, 31);
        let w = resolve(from, to, Some(TimeSlot::Last7Days), 118, fixed_now());
        assert!(w.active);
        assert_eq!(w.from.map(|d| d.to_rfc3339()), Some("2024-01-01T00:00:00+00:00".into()));
        assert_eq!(w.to.map(|d| d.to_rfc3339()), Some("2024-01-31T23:59:59+00:00".into()));
    }

    #[test]
    fn single_date_is_not_enough_for_the_explicit_branch() {
        let w = resolve(NaiveDate::from_ymd_opt(2024, 1, 1), None, None, 118, fixed_now());
        assert_eq!(w.from, Some(fixed_now() - Duration::days(90)));
    }

    #[test]
    fn named_slot() {
        let w = resolve(None, None, Some(TimeSlot::Last30Days), 118, fixed_now());
        assert!(w.active);
        assert_eq!(w.from, Some(fixed_now() - Duration::days(30)));
        assert_eq!(w.to, Some(fixed_now()));
    }

    #[test]
    fn default_is_90_days_for_normal_topics() {
        let w = resolve(None, None, None, 118, fixed_now());
        assert!(w.active);
        assert_eq!(w.from, Some(fixed_now() - Duration::days(90)));
    }

    #[test]
    fn wide_range_topic_gets_no_window_at_all() {
        for topic in WIDE_RANGE_TOPICS {
            let w = resolve(None, None, None, *topic, fixed_now());
            assert!(!w.active);
            assert_eq!(w.from, None);
            assert_eq!(w.to, None);
        }
    }
}
