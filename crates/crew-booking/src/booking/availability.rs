use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use tracing::debug;

use super::error::BookingError;
use super::repository::ScheduleStore;
use super::service::{cleaner_ids, local_now};
use super::views::{
    CleanerDailyAvailabilityView, CleanerView, VehicleAvailabilityView,
    VehicleDailyAvailabilityView,
};
use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::scheduling::allocator::{available_members, group_by_cleaner, group_by_vehicle};
use crate::scheduling::buffer::end_after;
use crate::scheduling::{daily_free_slots, PaddedWindow, SchedulingPolicy};

/// Read-only availability queries over the current schedule.
pub struct AvailabilityService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    policy: SchedulingPolicy,
}

impl<S, C> AvailabilityService<S, C>
where
    S: ScheduleStore + 'static,
    C: Clock + 'static,
{
    pub fn new(store: Arc<S>, clock: Arc<C>, config: SchedulingConfig) -> Self {
        Self {
            store,
            clock,
            policy: SchedulingPolicy::new(config),
        }
    }

    /// Free time slots of every cleaner on `date`, grouped by vehicle.
    ///
    /// Cleaners without any free slot are left out, and so are vehicles left without cleaners.
    pub fn daily(
        &self,
        date: NaiveDate,
    ) -> Result<Vec<VehicleDailyAvailabilityView>, BookingError> {
        let now = self.now_local();
        self.policy.validate_day(date, now)?;

        let roster = self.store.cleaners_with_vehicle()?;
        if roster.is_empty() {
            return Ok(Vec::new());
        }

        let assignments = self
            .store
            .assignments_on_date(&cleaner_ids(&roster), date)?;
        let by_cleaner = group_by_cleaner(assignments);
        let opens = self.policy.effective_day_start(date, now);
        let closes = self.policy.config().working_hours.end;
        let break_minutes = self.policy.config().break_minutes;

        let mut vehicles = Vec::new();
        for (vehicle_id, crew) in group_by_vehicle(&roster) {
            let cleaners: Vec<CleanerDailyAvailabilityView> = crew
                .iter()
                .filter_map(|member| {
                    let assigned = by_cleaner
                        .get(&member.cleaner_id)
                        .map(Vec::as_slice)
                        .unwrap_or_default();
                    let time_slots = daily_free_slots(opens, closes, break_minutes, assigned);
                    (!time_slots.is_empty()).then(|| CleanerDailyAvailabilityView {
                        cleaner_id: member.cleaner_id,
                        name: member.cleaner_name.clone(),
                        time_slots,
                    })
                })
                .collect();

            let Some(first) = crew.first() else {
                continue;
            };
            if cleaners.is_empty() {
                continue;
            }
            vehicles.push(VehicleDailyAvailabilityView {
                vehicle_id,
                vehicle_name: first.vehicle_name.clone(),
                cleaners,
            });
        }

        debug!(
            %date,
            effective_start = %opens,
            vehicles = vehicles.len(),
            "computed daily availability"
        );
        Ok(vehicles)
    }

    /// Cleaners free for the whole padded window starting at `start_time`, grouped by vehicle.
    pub fn window(
        &self,
        date: NaiveDate,
        start_time: NaiveTime,
        duration_minutes: i64,
    ) -> Result<Vec<VehicleAvailabilityView>, BookingError> {
        self.policy
            .validate_window(date, start_time, duration_minutes, self.now_local())?;

        let roster = self.store.cleaners_with_vehicle()?;
        if roster.is_empty() {
            return Ok(Vec::new());
        }

        let end_time = end_after(start_time, duration_minutes);
        let padded = PaddedWindow::around(start_time, end_time, self.policy.config().break_minutes);
        let conflicts = group_by_cleaner(self.store.conflicting_assignments(
            &cleaner_ids(&roster),
            date,
            padded,
        )?);

        let vehicles: Vec<VehicleAvailabilityView> = group_by_vehicle(&roster)
            .into_iter()
            .filter_map(|(vehicle_id, crew)| {
                let cleaners: Vec<CleanerView> = available_members(&crew, &conflicts)
                    .map(CleanerView::from)
                    .collect();
                let first = crew.first()?;
                (!cleaners.is_empty()).then(|| VehicleAvailabilityView {
                    vehicle_id,
                    vehicle_name: first.vehicle_name.clone(),
                    cleaners,
                })
            })
            .collect();

        debug!(
            %date,
            start = %start_time,
            duration_minutes,
            vehicles = vehicles.len(),
            "computed window availability"
        );
        Ok(vehicles)
    }

    fn now_local(&self) -> NaiveDateTime {
        local_now(self.clock.as_ref(), self.policy.config())
    }
}
