//! Calendar bucketing
//!
//! Splits a date range into weekly, biweekly or monthly buckets. The same
//! scaffolding serves every period-producing metric, so the boundary rules
//! live here once: weeks start on the Monday on/before the range start,
//! months on the first calendar day, and every bucket end clips to the
//! requested range end.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Bucket granularity for period metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    Weekly,
    Biweekly,
    Monthly,
}

/// One calendar bucket, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Bucket `[range_start, range_end]` by granularity. An unset granularity
/// yields an empty list, not an error.
pub fn periods(
    range_start: NaiveDate,
    range_end: NaiveDate,
    granularity: Option<Granularity>,
) -> Vec<Period> {
    let Some(granularity) = granularity else {
        return Vec::new();
    };

    let mut results = Vec::new();

    match granularity {
        Granularity::Weekly => {
            let mut start = monday_on_or_before(range_start);
            while start <= range_end {
                let end = sunday_on_or_after(start).min(range_end);
                results.push(Period { start, end });
                start += Duration::days(7);
            }
        }
        Granularity::Biweekly => {
            let mut start = monday_on_or_before(range_start);
            while start <= range_end {
                let end = (start + Duration::days(13)).min(range_end);
                results.push(Period { start, end });
                start += Duration::days(14);
            }
        }
        Granularity::Monthly => {
            let mut start = first_day_of_month(range_start);
            while start <= range_end {
                let end = last_day_of_month(start).min(range_end);
                results.push(Period { start, end });
                start = next_month(start);
            }
        }
    }

    results
}

/// Start of a calendar day as a UTC instant.
pub fn day_start(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"))
}

/// Last second of a calendar day as a UTC instant.
pub fn day_end(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(
        &date
            .and_hms_opt(23, 59, 59)
            .expect("23:59:59 is always valid"),
    )
}

fn monday_on_or_before(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn sunday_on_or_after(date: NaiveDate) -> NaiveDate {
    date + Duration::days(i64::from(6 - date.weekday().num_days_from_monday()))
}

fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).expect("day 1 exists in every month")
}

fn next_month(first_of_month: NaiveDate) -> NaiveDate {
    first_of_month
        .checked_add_months(Months::new(1))
        .expect("date arithmetic stays in range")
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    next_month(first_day_of_month(date)) - Duration::days(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn one_exact_week() {
        // 2025-11-03 is a Monday, 2025-11-09 the following Sunday.
        let buckets = periods(date(2025, 11, 3), date(2025, 11, 9), Some(Granularity::Weekly));
        assert_eq!(
            buckets,
            vec![Period {
                start: date(2025, 11, 3),
                end: date(2025, 11, 9),
            }]
        );
    }

    #[test]
    fn week_end_clips_to_range_end() {
        let buckets = periods(date(2025, 11, 3), date(2025, 11, 5), Some(Granularity::Weekly));
        assert_eq!(
            buckets,
            vec![Period {
                start: date(2025, 11, 3),
                end: date(2025, 11, 5),
            }]
        );
    }

    #[test]
    fn week_start_snaps_back_to_monday() {
        // 2025-11-05 is a Wednesday; its bucket starts the Monday before.
        let buckets = periods(date(2025, 11, 5), date(2025, 11, 16), Some(Granularity::Weekly));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, date(2025, 11, 3));
        assert_eq!(buckets[0].end, date(2025, 11, 9));
        assert_eq!(buckets[1].start, date(2025, 11, 10));
        assert_eq!(buckets[1].end, date(2025, 11, 16));
    }

    #[test]
    fn biweekly_buckets_span_fourteen_days() {
        let buckets = periods(date(2025, 11, 3), date(2025, 11, 30), Some(Granularity::Biweekly));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].start, date(2025, 11, 3));
        assert_eq!(buckets[0].end, date(2025, 11, 16));
        assert_eq!(buckets[1].start, date(2025, 11, 17));
        assert_eq!(buckets[1].end, date(2025, 11, 30));
    }

    #[test]
    fn monthly_buckets_follow_calendar_months() {
        let buckets = periods(date(2025, 1, 15), date(2025, 3, 10), Some(Granularity::Monthly));
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets[0].start, date(2025, 1, 1));
        assert_eq!(buckets[0].end, date(2025, 1, 31));
        assert_eq!(buckets[1].start, date(2025, 2, 1));
        assert_eq!(buckets[1].end, date(2025, 2, 28));
        // Final month clips to the range end.
        assert_eq!(buckets[2].start, date(2025, 3, 1));
        assert_eq!(buckets[2].end, date(2025, 3, 10));
    }

    #[test]
    fn december_rolls_over_the_year() {
        let buckets = periods(date(2025, 12, 10), date(2026, 1, 5), Some(Granularity::Monthly));
        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].end, date(2025, 12, 31));
        assert_eq!(buckets[1].start, date(2026, 1, 1));
        assert_eq!(buckets[1].end, date(2026, 1, 5));
    }

    #[test]
    fn unset_granularity_yields_no_buckets() {
        assert!(periods(date(2025, 11, 3), date(2025, 11, 9), None).is_empty());
    }

    #[test]
    fn day_bounds_cover_the_whole_day() {
        let start = day_start(date(2025, 11, 3));
        let end = day_end(date(2025, 11, 3));
        assert_eq!((end - start).num_seconds(), 86_399);
    }
}
