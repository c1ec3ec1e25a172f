//! Daily market-review scheduler.

use std::sync::Arc;

use anyhow::{anyhow, bail};
use bourse_agents::Orchestrator;
use bourse_models::config::ScheduleConfig;
use chrono::{DateTime, Duration, FixedOffset, NaiveTime, TimeZone, Utc};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Wall-clock time of day in a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    time: NaiveTime,
    utc_offset: FixedOffset,
}

impl DailySchedule {
    pub fn new(hour: u32, minute: u32, utc_offset_minutes: i32) -> anyhow::Result<Self> {
        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| anyhow!("Invalid schedule time {hour:02}:{minute:02}"))?;
        let utc_offset = FixedOffset::east_opt(utc_offset_minutes * 60)
            .ok_or_else(|| anyhow!("Invalid UTC offset: {utc_offset_minutes} minutes"))?;
        Ok(Self { time, utc_offset })
    }

    pub fn from_config(config: &ScheduleConfig) -> anyhow::Result<Self> {
        if !config.enabled {
            bail!("Daily schedule is disabled");
        }
        Self::new(config.hour, config.minute, config.utc_offset_minutes)
    }

    /// Next firing instant strictly after `now`.
    pub fn next_fire(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let local_date = now.with_timezone(&self.utc_offset).date_naive();
        let local_fire = local_date.and_time(self.time);
        let offset = Duration::seconds(i64::from(self.utc_offset.local_minus_utc()));
        let fire = Utc.from_utc_datetime(&(local_fire - offset));

        if fire > now {
            fire
        } else {
            fire + Duration::days(1)
        }
    }

    /// Time left until the next firing.
    pub fn until_next(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.next_fire(now) - now)
            .to_std()
            .unwrap_or(std::time::Duration::ZERO)
    }
}

/// Fire the daily review on schedule until cancelled.
///
/// Each review is spawned and never awaited here, so a slow cycle cannot
/// delay the next firing.
pub async fn run_scheduler(
    orchestrator: Arc<Orchestrator>,
    schedule: DailySchedule,
    cancel: CancellationToken,
) {
    info!(schedule = ?schedule, "Daily review scheduler starting");

    loop {
        let now = Utc::now();
        let next = schedule.next_fire(now);
        info!(next_fire = %next, "Next daily market review scheduled");

        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Daily review scheduler shutting down");
                break;
            }
            _ = tokio::time::sleep(schedule.until_next(now)) => {
                info!("Running scheduled daily market review");
                drop(orchestrator.spawn_daily_review());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn ist_ten() -> DailySchedule {
        DailySchedule::from_config(&ScheduleConfig::default()).unwrap()
    }

    #[test]
    fn fires_later_the_same_day() {
        // 08:30 IST
        let next = ist_ten().next_fire(utc("2024-06-03T03:00:00Z"));
        assert_eq!(next, utc("2024-06-03T04:30:00Z"));
    }

    #[test]
    fn fires_next_day_once_passed() {
        let next = ist_ten().next_fire(utc("2024-06-03T05:00:00Z"));
        assert_eq!(next, utc("2024-06-04T04:30:00Z"));
    }

    #[test]
    fn exact_fire_time_moves_to_next_day() {
        let next = ist_ten().next_fire(utc("2024-06-03T04:30:00Z"));
        assert_eq!(next, utc("2024-06-04T04:30:00Z"));
    }

    #[test]
    fn local_date_differs_from_utc_date() {
        // 23:00 UTC on the 3rd is 04:30 IST on the 4th
        let next = ist_ten().next_fire(utc("2024-06-03T23:00:00Z"));
        assert_eq!(next, utc("2024-06-04T04:30:00Z"));
    }

    #[test]
    fn negative_offset() {
        let schedule = DailySchedule::new(9, 30, -300).unwrap();
        let next = schedule.next_fire(utc("2024-06-03T12:00:00Z"));
        assert_eq!(next, utc("2024-06-03T14:30:00Z"));
    }

    #[test]
    fn until_next_is_positive() {
        let now = utc("2024-06-03T04:29:00Z");
        assert_eq!(
            ist_ten().until_next(now),
            std::time::Duration::from_secs(60)
        );
    }

    #[test]
    fn rejects_invalid_settings() {
        assert!(DailySchedule::new(24, 0, 0).is_err());
        assert!(DailySchedule::new(10, 60, 0).is_err());
        assert!(DailySchedule::new(10, 0, 24 * 60).is_err());

        let disabled = ScheduleConfig {
            enabled: false,
            ..ScheduleConfig::default()
        };
        assert!(DailySchedule::from_config(&disabled).is_err());
    }
}
