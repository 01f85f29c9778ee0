use std::sync::Arc;

use axum::response::Response;
use axum::Router;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde_json::Value;

use crate::booking::locks::ScheduleLocks;
use crate::booking::repository::{ScheduleStore, StoreError};
use crate::booking::{
    booking_router, AvailabilityService, BookingApi, BookingRequest, BookingService,
    InMemoryScheduleStore, RescheduleRequest,
};
use crate::clock::FixedClock;
use crate::config::SchedulingConfig;
use crate::scheduling::{
    AssignmentWindow, Booking, BookingId, Cleaner, CleanerId, CrewMember, PaddedWindow, Vehicle,
    VehicleId,
};

pub(super) fn config() -> SchedulingConfig {
    SchedulingConfig::default()
}

pub(super) fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, d).expect("valid date")
}

/// 2026-01-19, the Monday "now" falls on.
pub(super) fn monday() -> NaiveDate {
    day(19)
}

pub(super) fn tuesday() -> NaiveDate {
    day(20)
}

pub(super) fn wednesday() -> NaiveDate {
    day(21)
}

pub(super) fn friday() -> NaiveDate {
    day(23)
}

pub(super) fn at(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
}

/// Instant whose wall clock in the default +05:30 zone reads `date` at `hour:minute`.
pub(super) fn local_instant(date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
    config()
        .timezone
        .from_local_datetime(&date.and_time(at(hour, minute)))
        .single()
        .expect("unambiguous local time")
        .with_timezone(&Utc)
}

/// Monday 09:00 local.
pub(super) fn clock() -> Arc<FixedClock> {
    clock_at(monday(), 9, 0)
}

pub(super) fn clock_at(date: NaiveDate, hour: u32, minute: u32) -> Arc<FixedClock> {
    Arc::new(FixedClock(local_instant(date, hour, minute)))
}

pub(super) fn fleet(vehicles: usize, crew_size: usize) -> Arc<InMemoryScheduleStore> {
    let store = Arc::new(InMemoryScheduleStore::new());
    store.seed_fleet(vehicles, crew_size).expect("fleet seeds");
    store
}

pub(super) fn booking_service(
    store: &Arc<InMemoryScheduleStore>,
) -> BookingService<InMemoryScheduleStore, FixedClock> {
    BookingService::new(Arc::clone(store), clock(), config())
}

pub(super) fn availability_service(
    store: &Arc<InMemoryScheduleStore>,
) -> AvailabilityService<InMemoryScheduleStore, FixedClock> {
    AvailabilityService::new(Arc::clone(store), clock(), config())
}

pub(super) fn request(
    date: NaiveDate,
    start: NaiveTime,
    duration_minutes: i64,
    cleaner_count: i64,
) -> BookingRequest {
    BookingRequest {
        date,
        start_time: start,
        duration_minutes,
        cleaner_count,
    }
}

pub(super) fn move_to(date: NaiveDate, start: NaiveTime) -> RescheduleRequest {
    RescheduleRequest {
        date,
        start_time: start,
    }
}

pub(super) fn router_with_fleet(vehicles: usize, crew_size: usize) -> Router {
    let api = BookingApi::new(fleet(vehicles, crew_size), clock(), config());
    booking_router(Arc::new(api))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn assert_error_body(payload: &Value, status: u16) {
    assert_eq!(payload["status"], status);
    assert!(payload["timestamp"].is_string());
    assert!(payload["error"].is_string());
    assert!(payload["message"].is_string());
}

/// Store whose every call fails as if the backend were down.
#[derive(Default)]
pub(super) struct UnavailableStore {
    locks: ScheduleLocks,
}

impl UnavailableStore {
    fn down<T>() -> Result<T, StoreError> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }
}

impl ScheduleStore for UnavailableStore {
    fn schedule_locks(&self) -> &ScheduleLocks {
        &self.locks
    }

    fn cleaners_with_vehicle(&self) -> Result<Vec<CrewMember>, StoreError> {
        Self::down()
    }

    fn assignments_on_date(
        &self,
        _cleaners: &[CleanerId],
        _date: NaiveDate,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        Self::down()
    }

    fn conflicting_assignments(
        &self,
        _cleaners: &[CleanerId],
        _date: NaiveDate,
        _window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        Self::down()
    }

    fn conflicting_assignments_excluding(
        &self,
        _booking: BookingId,
        _cleaners: &[CleanerId],
        _date: NaiveDate,
        _window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        Self::down()
    }

    fn next_booking_id(&self) -> Result<BookingId, StoreError> {
        Self::down()
    }

    fn insert_booking(&self, _booking: Booking) -> Result<Booking, StoreError> {
        Self::down()
    }

    fn update_booking(&self, _booking: Booking) -> Result<(), StoreError> {
        Self::down()
    }

    fn fetch_booking(&self, _id: BookingId) -> Result<Option<Booking>, StoreError> {
        Self::down()
    }

    fn vehicle(&self, _id: VehicleId) -> Result<Option<Vehicle>, StoreError> {
        Self::down()
    }

    fn cleaner(&self, _id: CleanerId) -> Result<Option<Cleaner>, StoreError> {
        Self::down()
    }
}
