//! Ordered validation gate shared by availability queries and booking mutations.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::config::SchedulingConfig;

/// Rejection raised by the scheduling gate; the first failing rule wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PolicyViolation {
    #[error("{date} falls on the non-working day")]
    NonWorkingDay { date: NaiveDate },
    #[error("booking must start in the future")]
    InThePast,
    #[error("start time {start} is before working hours begin at {opens}")]
    BeforeWorkingHours { start: NaiveTime, opens: NaiveTime },
    #[error("duration must be a positive number of minutes, got {minutes}")]
    InvalidDuration { minutes: i64 },
    #[error("booking would end after working hours close at {closes}")]
    AfterWorkingHours { closes: NaiveTime },
    #[error("cleaner count must be between 1 and {max}, got {requested}")]
    InvalidCleanerCount { requested: i64, max: u32 },
    #[error("cannot check availability for past dates")]
    PastDate { date: NaiveDate },
}

/// Scheduling rules evaluated against a caller-supplied local "now".
#[derive(Debug, Clone, Copy)]
pub struct SchedulingPolicy {
    config: SchedulingConfig,
}

impl SchedulingPolicy {
    pub fn new(config: SchedulingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    /// Full gate for booking creation and reschedule.
    pub fn validate_booking(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: i64,
        cleaner_count: i64,
        now: NaiveDateTime,
    ) -> Result<(), PolicyViolation> {
        self.validate_window(date, start, duration_minutes, now)?;
        self.validate_cleaner_count(cleaner_count)
    }

    /// Gate for availability-by-window queries; identical to the booking gate minus the
    /// cleaner count rule.
    pub fn validate_window(
        &self,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: i64,
        now: NaiveDateTime,
    ) -> Result<(), PolicyViolation> {
        self.ensure_working_day(date)?;

        if date.and_time(start) <= now {
            return Err(PolicyViolation::InThePast);
        }

        let hours = self.config.working_hours;
        if start < hours.start {
            return Err(PolicyViolation::BeforeWorkingHours {
                start,
                opens: hours.start,
            });
        }

        if duration_minutes <= 0 {
            return Err(PolicyViolation::InvalidDuration {
                minutes: duration_minutes,
            });
        }

        // compared in minutes since midnight so long durations cannot wrap past midnight
        let closes = minutes_of(hours.end);
        if minutes_of(start)
            .checked_add(duration_minutes)
            .map_or(true, |end| end > closes)
        {
            return Err(PolicyViolation::AfterWorkingHours { closes: hours.end });
        }

        Ok(())
    }

    /// Reduced gate for whole-day availability: only a day that is already over is rejected.
    pub fn validate_day(&self, date: NaiveDate, now: NaiveDateTime) -> Result<(), PolicyViolation> {
        self.ensure_working_day(date)?;

        if date.and_time(self.config.working_hours.end) < now {
            return Err(PolicyViolation::PastDate { date });
        }

        Ok(())
    }

    pub fn validate_cleaner_count(&self, cleaner_count: i64) -> Result<(), PolicyViolation> {
        let max = self.config.max_cleaners_per_vehicle;
        if cleaner_count < 1 || cleaner_count > i64::from(max) {
            return Err(PolicyViolation::InvalidCleanerCount {
                requested: cleaner_count,
                max,
            });
        }
        Ok(())
    }

    /// First bookable instant of `date`: working-hours start, pushed to `now + break` today.
    pub fn effective_day_start(&self, date: NaiveDate, now: NaiveDateTime) -> NaiveTime {
        let opens = self.config.working_hours.start;
        if date != now.date() {
            return opens;
        }

        let buffer = chrono::Duration::minutes(i64::from(self.config.break_minutes));
        let (now_with_buffer, wrapped) = now.time().overflowing_add_signed(buffer);
        if wrapped != 0 {
            // the buffer runs past midnight, so nothing is left today
            return self.config.working_hours.end;
        }

        now_with_buffer.max(opens)
    }

    fn ensure_working_day(&self, date: NaiveDate) -> Result<(), PolicyViolation> {
        if self.config.is_working_day(date.weekday()) {
            Ok(())
        } else {
            Err(PolicyViolation::NonWorkingDay { date })
        }
    }
}

fn minutes_of(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight() / 60)
}
