//! Calendar windows used by the per-user statistics.
//!
//! Both windows are derived from the `now` passed in on every call, so a
//! query made right after a month or week rollover lands in the new bucket.

use crate::domain::AnalysisStats;
use chrono::{DateTime, Datelike, Days, NaiveTime, Utc};

/// First instant of the UTC month containing `now`.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let date = now.date_naive() - Days::new(u64::from(now.day0()));
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Monday 00:00:00 UTC of the ISO week containing `now`.
pub fn week_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let back = u64::from(now.weekday().num_days_from_monday());
    let date = now.date_naive() - Days::new(back);
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Counts `timestamps` into the total, month and week buckets for `now`.
pub fn tally(timestamps: impl IntoIterator<Item = DateTime<Utc>>, now: DateTime<Utc>) -> AnalysisStats {
    let month = month_start(now);
    let week = week_start(now);

    timestamps
        .into_iter()
        .fold(AnalysisStats::default(), |mut stats, at| {
            stats.total += 1;
            if at >= month {
                stats.this_month += 1;
            }
            if at >= week {
                stats.this_week += 1;
            }
            stats
        })
}
