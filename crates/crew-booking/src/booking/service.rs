use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use tracing::{info, warn};

use super::error::BookingError;
use super::repository::{ScheduleStore, StoreError};
use super::views::{BookingRequest, BookingView, CleanerView, RescheduleRequest};
use crate::clock::Clock;
use crate::config::SchedulingConfig;
use crate::scheduling::allocator::{self, group_by_cleaner, group_by_vehicle};
use crate::scheduling::buffer::end_after;
use crate::scheduling::{
    Allocation, AssignmentWindow, Booking, BookingId, CleanerId, CrewMember, PaddedWindow,
    SchedulingPolicy,
};

/// Creates, reschedules and cancels bookings.
pub struct BookingService<S, C> {
    store: Arc<S>,
    clock: Arc<C>,
    policy: SchedulingPolicy,
}

impl<S, C> BookingService<S, C>
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

    /// Validates the request, picks a vehicle with enough free cleaners and stores the booking.
    pub fn create(&self, request: BookingRequest) -> Result<BookingView, BookingError> {
        let BookingRequest {
            date,
            start_time,
            duration_minutes,
            cleaner_count,
        } = request;

        self.policy.validate_booking(
            date,
            start_time,
            duration_minutes,
            cleaner_count,
            self.now_local(),
        )?;
        let required = usize::try_from(cleaner_count).unwrap_or_default();
        let end_time = end_after(start_time, duration_minutes);
        let window = PaddedWindow::around(start_time, end_time, self.break_minutes());

        let locks = self.store.schedule_locks();
        locks.with_dates(&[date], || -> Result<BookingView, BookingError> {
            let roster = self.roster()?;
            let conflicts =
                self.store
                    .conflicting_assignments(&cleaner_ids(&roster), date, window)?;
            let allocation = self.allocate(&roster, conflicts, required, date)?;

            let id = self.store.next_booking_id()?;
            let mut booking = Booking::new(id, date, start_time, end_time, allocation.vehicle_id)?;
            for member in &allocation.cleaners {
                booking.assign_cleaner(member.cleaner_id)?;
            }
            let stored = self.store.insert_booking(booking)?;

            info!(
                booking = %stored.id(),
                %date,
                start = %start_time,
                vehicle = %allocation.vehicle_name,
                cleaners = required,
                "booking created"
            );
            Ok(view_with_allocation(&stored, &allocation))
        })
    }

    /// Moves a booking to a new date and start, keeping its duration and cleaner count.
    ///
    /// The booking's own assignments never count as conflicts, so it may overlap its previous
    /// window.
    pub fn reschedule(
        &self,
        id: BookingId,
        request: RescheduleRequest,
    ) -> Result<BookingView, BookingError> {
        let RescheduleRequest { date, start_time } = request;

        self.with_booking_locked(id, Some(date), |mut booking| {
            if booking.is_cancelled() {
                return Err(BookingError::AlreadyCancelled(id));
            }
            if booking.date() == date && booking.start_time() == start_time {
                return self.view_of(&booking);
            }

            let now = self.now_local();
            if booking.date().and_time(booking.start_time()) <= now {
                return Err(BookingError::AlreadyStarted(id));
            }

            let count = booking.cleaner_count();
            let max = self.policy.config().max_cleaners_per_vehicle;
            if count > max as usize {
                return Err(BookingError::CleanerCountExceedsLimit {
                    booking: id,
                    count,
                    max,
                });
            }

            let duration = booking.duration_minutes();
            self.policy
                .validate_booking(date, start_time, duration, count as i64, now)?;

            let end_time = end_after(start_time, duration);
            let window = PaddedWindow::around(start_time, end_time, self.break_minutes());
            let roster = self.roster()?;
            let conflicts = self.store.conflicting_assignments_excluding(
                id,
                &cleaner_ids(&roster),
                date,
                window,
            )?;
            let allocation = self.allocate(&roster, conflicts, count, date)?;

            let previous = (booking.date(), booking.start_time());
            booking.move_to(date, start_time, end_time, allocation.vehicle_id)?;
            for member in &allocation.cleaners {
                booking.assign_cleaner(member.cleaner_id)?;
            }
            self.store.update_booking(booking.clone())?;

            info!(
                booking = %id,
                from_date = %previous.0,
                from_start = %previous.1,
                %date,
                start = %start_time,
                vehicle = %allocation.vehicle_name,
                "booking rescheduled"
            );
            Ok(view_with_allocation(&booking, &allocation))
        })
    }

    /// Cancels a booking that has not started yet and releases its cleaners.
    pub fn cancel(&self, id: BookingId) -> Result<(), BookingError> {
        self.with_booking_locked(id, None, |mut booking| {
            if booking.is_cancelled() {
                return Err(BookingError::AlreadyCancelled(id));
            }
            if booking.date().and_time(booking.start_time()) <= self.now_local() {
                return Err(BookingError::AlreadyStarted(id));
            }

            booking.cancel()?;
            self.store.update_booking(booking)?;
            info!(booking = %id, "booking cancelled");
            Ok(())
        })
    }

    pub fn get(&self, id: BookingId) -> Result<BookingView, BookingError> {
        let booking = self.load(id)?;
        self.view_of(&booking)
    }

    /// Runs `critical` on a fresh copy of the booking while its date (and `target`, if any) is
    /// locked. Retries when a concurrent reschedule moved the booking between read and lock.
    fn with_booking_locked<T>(
        &self,
        id: BookingId,
        target: Option<NaiveDate>,
        mut critical: impl FnMut(Booking) -> Result<T, BookingError>,
    ) -> Result<T, BookingError> {
        loop {
            let observed = self.load(id)?.date();
            let mut dates = vec![observed];
            dates.extend(target);

            let locks = self.store.schedule_locks();
            let attempt = locks.with_dates(&dates, || -> Result<Option<T>, BookingError> {
                let booking = self.load(id)?;
                if booking.date() != observed {
                    return Ok(None);
                }
                critical(booking).map(Some)
            })?;

            if let Some(outcome) = attempt {
                return Ok(outcome);
            }
        }
    }

    fn allocate(
        &self,
        roster: &[CrewMember],
        conflicts: Vec<AssignmentWindow>,
        required: usize,
        date: NaiveDate,
    ) -> Result<Allocation, BookingError> {
        let crews = group_by_vehicle(roster);
        let conflicts = group_by_cleaner(conflicts);
        allocator::allocate(&crews, &conflicts, required).map_err(|err| {
            warn!(%date, required, vehicles = crews.len(), "no vehicle has enough free cleaners");
            BookingError::from(err)
        })
    }

    fn roster(&self) -> Result<Vec<CrewMember>, BookingError> {
        let roster = self.store.cleaners_with_vehicle()?;
        if roster.is_empty() {
            return Err(BookingError::NoCleanersConfigured);
        }
        Ok(roster)
    }

    fn load(&self, id: BookingId) -> Result<Booking, BookingError> {
        self.store
            .fetch_booking(id)?
            .ok_or(BookingError::NotFound(id))
    }

    fn view_of(&self, booking: &Booking) -> Result<BookingView, BookingError> {
        let vehicle = self
            .store
            .vehicle(booking.vehicle_id())?
            .ok_or(StoreError::NotFound)?;

        let mut cleaners = Vec::with_capacity(booking.cleaner_count());
        for cleaner_id in booking.cleaner_ids() {
            let cleaner = self.store.cleaner(cleaner_id)?.ok_or(StoreError::NotFound)?;
            cleaners.push(CleanerView {
                cleaner_id: cleaner.id,
                name: cleaner.name,
            });
        }

        Ok(BookingView {
            booking_id: booking.id(),
            date: booking.date(),
            start_time: booking.start_time(),
            end_time: booking.end_time(),
            status: booking.status(),
            vehicle_id: vehicle.id,
            vehicle_name: vehicle.name,
            cleaners,
        })
    }

    fn now_local(&self) -> NaiveDateTime {
        local_now(self.clock.as_ref(), self.policy.config())
    }

    fn break_minutes(&self) -> u32 {
        self.policy.config().break_minutes
    }
}

pub(crate) fn local_now<C: Clock + ?Sized>(clock: &C, config: &SchedulingConfig) -> NaiveDateTime {
    clock.now().with_timezone(&config.timezone).naive_local()
}

pub(crate) fn cleaner_ids(roster: &[CrewMember]) -> Vec<CleanerId> {
    roster.iter().map(|member| member.cleaner_id).collect()
}

fn view_with_allocation(booking: &Booking, allocation: &Allocation) -> BookingView {
    BookingView {
        booking_id: booking.id(),
        date: booking.date(),
        start_time: booking.start_time(),
        end_time: booking.end_time(),
        status: booking.status(),
        vehicle_id: allocation.vehicle_id,
        vehicle_name: allocation.vehicle_name.clone(),
        cleaners: allocation.cleaners.iter().map(CleanerView::from).collect(),
    }
}
