use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Late-execution window: a trigger that should have fired within the last
/// 24h but didn't (process was down, pool was saturated) still runs instead
/// of being skipped.
pub const MISFIRE_GRACE: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
pub enum Trigger {
    Interval(Duration),
    Cron(String),
}

impl Trigger {
    /// Every job trigger coalesces missed runs into one and allows at most
    /// one concurrent instance — this is not configurable per job.
    pub fn next_fire_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Trigger::Interval(d) => chrono::Duration::from_std(*d).ok().map(|d| after + d),
            Trigger::Cron(expr) => {
                let schedule = cron::Schedule::from_str(expr).ok()?;
                schedule.after(&after).next()
            }
        }
    }

    /// A scheduled fire time is a misfire once it's more than `MISFIRE_GRACE`
    /// in the past relative to `now`. Within the grace window the job still
    /// runs late; past it, the run is dropped and the next regular fire is
    /// used instead.
    pub fn is_within_misfire_grace(scheduled: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        match (now - scheduled).to_std() {
            Ok(elapsed) => elapsed <= MISFIRE_GRACE,
            Err(_) => true, // scheduled is in the future
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interval_trigger_advances_by_duration() {
        let t = Trigger::Interval(Duration::from_secs(300));
        let now = Utc::now();
        let next = t.next_fire_after(now).unwrap();
        assert_eq!((next - now).num_seconds(), 300);
    }

    #[test]
    fn misfire_grace_boundary() {
        let now = Utc::now();
        let within = now - chrono::Duration::hours(23);
        let past = now - chrono::Duration::hours(25);
        assert!(Trigger::is_within_misfire_grace(within, now));
        assert!(!Trigger::is_within_misfire_grace(past, now));
    }

    #[test]
    fn cron_trigger_parses_standard_fields() {
        // seconds minutes hours day-of-month month day-of-week (cron crate's 6-field form)
        let t = Trigger::Cron("0 0 9 * * *".to_string());
        let now = Utc::now();
        assert!(t.next_fire_after(now).is_some());
    }
}
