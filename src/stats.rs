//! Monthly visit aggregation.
//!
//! The window covers the current calendar month and the eleven before it, in UTC.

use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const WINDOW_MONTHS: u32 = 12;

/// Raw per-month count as produced by a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBucket {
    pub start: NaiveDate,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    /// Short month name, e.g. `Oct`.
    pub month: String,
    /// `YYYY-MM`, unique within the window.
    pub period: String,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitStats {
    pub monthly: Vec<MonthlyCount>,
    pub total: i64,
}

fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First instant included in the trailing window ending at `now`.
pub fn window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let this_month = month_start(now.date_naive());
    let first = this_month
        .checked_sub_months(Months::new(WINDOW_MONTHS - 1))
        .unwrap_or(this_month);
    Utc.from_utc_datetime(&first.and_time(chrono::NaiveTime::MIN))
}

/// Groups timestamps at or after `since` into calendar-month buckets, ascending.
pub fn bucket_visits<I>(visits: I, since: DateTime<Utc>) -> Vec<MonthBucket>
where
    I: IntoIterator<Item = DateTime<Utc>>,
{
    let mut counts: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for at in visits.into_iter().filter(|at| *at >= since) {
        *counts.entry(month_start(at.date_naive())).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(start, count)| MonthBucket { start, count })
        .collect()
}

pub fn label_buckets(buckets: Vec<MonthBucket>) -> Vec<MonthlyCount> {
    buckets
        .into_iter()
        .map(|b| MonthlyCount {
            month: b.start.format("%b").to_string(),
            period: b.start.format("%Y-%m").to_string(),
            count: b.count,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_window_start_is_first_of_month_eleven_months_back() {
        let start = window_start(at(2026, 10, 18));
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 11, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_three_visits_same_month_make_one_bucket() {
        let now = at(2026, 10, 18);
        let visits = vec![at(2026, 10, 1), at(2026, 10, 5), at(2026, 10, 18)];
        let buckets = bucket_visits(visits, window_start(now));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].count, 3);
    }

    #[test]
    fn test_visits_outside_window_are_dropped() {
        let now = at(2026, 10, 18);
        let buckets = bucket_visits(vec![at(2025, 10, 31), at(2025, 11, 1)], window_start(now));
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].start, NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
    }

    #[test]
    fn test_buckets_are_ascending_and_labelled() {
        let now = at(2026, 3, 2);
        let labelled = label_buckets(bucket_visits(
            vec![at(2026, 2, 3), at(2025, 12, 24), at(2026, 2, 9)],
            window_start(now),
        ));
        assert_eq!(
            labelled,
            vec![
                MonthlyCount {
                    month: "Dec".to_string(),
                    period: "2025-12".to_string(),
                    count: 1
                },
                MonthlyCount {
                    month: "Feb".to_string(),
                    period: "2026-02".to_string(),
                    count: 2
                },
            ]
        );
    }
}
