//! TTL policy tied to the duty-rotation boundary.
//!
//! Duty pharmacies change at a fixed local wall-clock time each day, so a
//! cached duty list is valid until the next boundary, not for a fixed
//! number of hours. Turkey does not observe DST, so naive local arithmetic
//! is exact here.

use std::time::Duration;

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};

/// Hour of the default rotation boundary (09:00 local).
const DEFAULT_BOUNDARY_HOUR: i64 = 9;

/// Computes cache lifetimes that expire at a duty-rotation boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationSchedule {
    boundary: NaiveTime,
}

impl Default for RotationSchedule {
    fn default() -> Self {
        Self {
            boundary: NaiveTime::MIN + TimeDelta::hours(DEFAULT_BOUNDARY_HOUR),
        }
    }
}

impl RotationSchedule {
    /// A schedule with a custom boundary time (e.g. 08:00 instead of 09:00).
    pub fn new(boundary: NaiveTime) -> Self {
        Self { boundary }
    }

    /// The local wall-clock time at which the duty list rotates.
    pub fn boundary(&self) -> NaiveTime {
        self.boundary
    }

    /// Duration until the boundary `days_ahead` rotations from now.
    ///
    /// `days_ahead = 1` targets the next boundary: today's if it is still
    /// ahead, otherwise tomorrow's. Each further day adds 24 hours. The
    /// result is always strictly positive; `days_ahead` is clamped to at
    /// least 1.
    pub fn ttl_until(&self, days_ahead: u32) -> Duration {
        self.ttl_until_from(Local::now().naive_local(), days_ahead)
    }

    /// Same as [`ttl_until`](Self::ttl_until) with an explicit `now`.
    pub fn ttl_until_from(&self, now: NaiveDateTime, days_ahead: u32) -> Duration {
        let days_ahead = days_ahead.max(1);

        let mut target = now.date().and_time(self.boundary);
        if target <= now {
            target += TimeDelta::days(1);
        }
        target += TimeDelta::days(i64::from(days_ahead) - 1);

        (target - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// TTL for the daily duty list.
    pub fn daily(&self) -> Duration {
        self.ttl_until(1)
    }

    /// TTL for slow-moving aggregates (the rolling all-pharmacies cache,
    /// canonical place lists).
    pub fn weekly(&self) -> Duration {
        self.ttl_until(7)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn schedule_at(hour: u32) -> RotationSchedule {
        RotationSchedule::new(NaiveTime::from_hms_opt(hour, 0, 0).unwrap())
    }

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 8, 7)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn before_boundary_targets_today() {
        let ttl = schedule_at(8).ttl_until_from(at(7, 0), 1);
        assert_eq!(ttl, Duration::from_secs(3600));
    }

    #[test]
    fn past_boundary_rolls_to_next_day() {
        let ttl = schedule_at(8).ttl_until_from(at(9, 0), 1);
        assert_eq!(ttl, Duration::from_secs(23 * 3600));
    }

    #[test]
    fn exactly_at_boundary_is_a_full_day() {
        let ttl = schedule_at(8).ttl_until_from(at(8, 0), 1);
        assert_eq!(ttl, Duration::from_secs(24 * 3600));
    }

    #[test]
    fn weekly_extends_six_days_past_next_boundary() {
        let ttl = schedule_at(8).ttl_until_from(at(7, 0), 7);
        assert_eq!(ttl, Duration::from_secs(6 * 24 * 3600 + 3600));
    }

    #[test]
    fn zero_days_clamps_to_one() {
        let schedule = schedule_at(8);
        assert_eq!(
            schedule.ttl_until_from(at(7, 0), 0),
            schedule.ttl_until_from(at(7, 0), 1)
        );
    }

    #[test]
    fn default_boundary_is_nine() {
        let schedule = RotationSchedule::default();
        assert_eq!(schedule.boundary(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    proptest! {
        /// The TTL is strictly positive and bounded by days_ahead days,
        /// whatever the current time.
        #[test]
        fn always_positive_and_bounded(
            hour in 0u32..24,
            min in 0u32..60,
            sec in 0u32..60,
            boundary_hour in 0u32..24,
            days_ahead in 1u32..30,
        ) {
            let schedule = RotationSchedule::new(
                NaiveTime::from_hms_opt(boundary_hour, 0, 0).unwrap(),
            );
            let now = NaiveDate::from_ymd_opt(2026, 8, 7)
                .unwrap()
                .and_hms_opt(hour, min, sec)
                .unwrap();

            let ttl = schedule.ttl_until_from(now, days_ahead);

            prop_assert!(ttl > Duration::ZERO);
            prop_assert!(ttl <= Duration::from_secs(u64::from(days_ahead) * 24 * 3600));
        }
    }
}
