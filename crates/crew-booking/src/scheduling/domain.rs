use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VehicleId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CleanerId(pub u64);

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct BookingId(pub u64);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CleanerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
}

/// A cleaner; vehicle membership is an id reference, never an owning pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cleaner {
    pub id: CleanerId,
    pub name: String,
    pub vehicle_id: Option<VehicleId>,
}

/// Roster entry: a cleaner joined with the vehicle it currently rides in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrewMember {
    pub cleaner_id: CleanerId,
    pub cleaner_name: String,
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Created,
    Cancelled,
}

impl BookingStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Booking-to-cleaner join row. The `(booking_id, cleaner_id)` pair is its identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub booking_id: BookingId,
    pub cleaner_id: CleanerId,
}

/// Assignment joined with the window of the booking it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignmentWindow {
    pub booking_id: BookingId,
    pub cleaner_id: CleanerId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("end time {end} must be after start time {start}")]
    InvalidTimeRange { start: NaiveTime, end: NaiveTime },
    #[error("cleaner {cleaner} is already assigned to booking {booking}")]
    DuplicateAssignment {
        booking: BookingId,
        cleaner: CleanerId,
    },
    #[error("booking {0} is cancelled and can no longer change")]
    Cancelled(BookingId),
    #[error("vehicle name '{0}' is already registered")]
    DuplicateVehicleName(String),
    #[error("vehicle {0} does not exist")]
    UnknownVehicle(VehicleId),
    #[error("cleaner {0} does not exist")]
    UnknownCleaner(CleanerId),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    id: BookingId,
    date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    vehicle_id: VehicleId,
    status: BookingStatus,
    assignments: Vec<Assignment>,
}

impl Booking {
    pub fn new(
        id: BookingId,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        vehicle_id: VehicleId,
    ) -> Result<Self, DomainError> {
        ensure_range(start_time, end_time)?;
        Ok(Self {
            id,
            date,
            start_time,
            end_time,
            vehicle_id,
            status: BookingStatus::Created,
            assignments: Vec::new(),
        })
    }

    pub fn id(&self) -> BookingId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn start_time(&self) -> NaiveTime {
        self.start_time
    }

    pub fn end_time(&self) -> NaiveTime {
        self.end_time
    }

    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    pub fn status(&self) -> BookingStatus {
        self.status
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn cleaner_ids(&self) -> impl Iterator<Item = CleanerId> + '_ {
        self.assignments.iter().map(|assignment| assignment.cleaner_id)
    }

    pub fn cleaner_count(&self) -> usize {
        self.assignments.len()
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == BookingStatus::Cancelled
    }

    pub fn assign_cleaner(&mut self, cleaner_id: CleanerId) -> Result<(), DomainError> {
        self.ensure_active()?;
        if self.cleaner_ids().any(|existing| existing == cleaner_id) {
            return Err(DomainError::DuplicateAssignment {
                booking: self.id,
                cleaner: cleaner_id,
            });
        }
        self.assignments.push(Assignment {
            booking_id: self.id,
            cleaner_id,
        });
        Ok(())
    }

    /// Moves the booking to a new window and vehicle, dropping every existing assignment.
    pub fn move_to(
        &mut self,
        date: NaiveDate,
        start_time: NaiveTime,
        end_time: NaiveTime,
        vehicle_id: VehicleId,
    ) -> Result<(), DomainError> {
        self.ensure_active()?;
        ensure_range(start_time, end_time)?;
        self.date = date;
        self.start_time = start_time;
        self.end_time = end_time;
        self.vehicle_id = vehicle_id;
        self.assignments.clear();
        Ok(())
    }

    pub fn cancel(&mut self) -> Result<(), DomainError> {
        self.ensure_active()?;
        self.assignments.clear();
        self.status = BookingStatus::Cancelled;
        Ok(())
    }

    pub fn assignment_windows(&self) -> impl Iterator<Item = AssignmentWindow> + '_ {
        self.assignments.iter().map(|assignment| AssignmentWindow {
            booking_id: self.id,
            cleaner_id: assignment.cleaner_id,
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
        })
    }

    fn ensure_active(&self) -> Result<(), DomainError> {
        if self.is_cancelled() {
            Err(DomainError::Cancelled(self.id))
        } else {
            Ok(())
        }
    }
}

fn ensure_range(start: NaiveTime, end: NaiveTime) -> Result<(), DomainError> {
    if end > start {
        Ok(())
    } else {
        Err(DomainError::InvalidTimeRange { start, end })
    }
}
