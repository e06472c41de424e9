use chrono::{DateTime, Days, NaiveTime, TimeZone, Utc};

/// Midnight UTC of the day `now` falls on.
pub fn utc_midnight(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.from_utc_datetime(&now.date_naive().and_time(NaiveTime::MIN))
}

/// The next instant strictly after `now` at `hour:minute` UTC.
///
/// Out-of-range `hour`/`minute` are clamped to 23:59.
pub fn next_daily_run_utc(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let at = NaiveTime::from_hms_opt(hour.min(23), minute.min(59), 0).unwrap_or(NaiveTime::MIN);
    let candidate = Utc.from_utc_datetime(&now.date_naive().and_time(at));
    if candidate > now {
        candidate
    } else {
        candidate
            .checked_add_days(Days::new(1))
            .unwrap_or(candidate)
    }
}
