use chrono::NaiveDate;

use super::locks::ScheduleLocks;
use crate::scheduling::{
    AssignmentWindow, Booking, BookingId, Cleaner, CleanerId, CrewMember, DomainError,
    PaddedWindow, Vehicle, VehicleId,
};

/// Storage abstraction the booking services read snapshots from and write decisions to.
///
/// Implementations only answer queries; callers serialize read-then-write sequences through
/// the store's [`ScheduleLocks`], so every service sharing a store shares its locks.
pub trait ScheduleStore: Send + Sync {
    /// Per-date locks guarding this store's read-conflicts-then-write sequences.
    fn schedule_locks(&self) -> &ScheduleLocks;

    /// Every cleaner currently riding in a vehicle, ordered by cleaner id.
    fn cleaners_with_vehicle(&self) -> Result<Vec<CrewMember>, StoreError>;

    /// Assignments of `cleaners` on `date`, ordered by booking start.
    fn assignments_on_date(
        &self,
        cleaners: &[CleanerId],
        date: NaiveDate,
    ) -> Result<Vec<AssignmentWindow>, StoreError>;

    /// Assignments of `cleaners` on `date` whose booking overlaps `window`.
    fn conflicting_assignments(
        &self,
        cleaners: &[CleanerId],
        date: NaiveDate,
        window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError>;

    /// Same as [`ScheduleStore::conflicting_assignments`] but ignoring `booking`'s own rows.
    fn conflicting_assignments_excluding(
        &self,
        booking: BookingId,
        cleaners: &[CleanerId],
        date: NaiveDate,
        window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError>;

    fn next_booking_id(&self) -> Result<BookingId, StoreError>;
    fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError>;
    fn update_booking(&self, booking: Booking) -> Result<(), StoreError>;
    fn fetch_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError>;

    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, StoreError>;
    fn cleaner(&self, id: CleanerId) -> Result<Option<Cleaner>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Rejected(#[from] DomainError),
}
