use crate::scheduling::{AllocationError, BookingId, DomainError, PolicyViolation};

use super::repository::StoreError;

/// Error raised by the booking and availability services.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Validation(#[from] PolicyViolation),
    #[error("not enough cleaners available for the requested time")]
    InsufficientCapacity { required: usize },
    #[error("booking not found: {0}")]
    NotFound(BookingId),
    #[error("booking {0} is already cancelled")]
    AlreadyCancelled(BookingId),
    #[error("booking {0} has already started")]
    AlreadyStarted(BookingId),
    #[error("no cleaners are assigned to any vehicle")]
    NoCleanersConfigured,
    #[error("booking {booking} needs {count} cleaners but the limit per vehicle is {max}")]
    CleanerCountExceedsLimit {
        booking: BookingId,
        count: usize,
        max: u32,
    },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AllocationError> for BookingError {
    fn from(value: AllocationError) -> Self {
        match value {
            AllocationError::InsufficientCapacity { required } => {
                Self::InsufficientCapacity { required }
            }
        }
    }
}

/// How a caller should treat a [`BookingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    ClientInput,
    Conflict,
    NotFound,
    Internal,
}

impl BookingError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Validation(_) => ErrorClass::ClientInput,
            Self::NotFound(_) => ErrorClass::NotFound,
            Self::InsufficientCapacity { .. }
            | Self::AlreadyCancelled(_)
            | Self::AlreadyStarted(_)
            | Self::NoCleanersConfigured
            | Self::CleanerCountExceedsLimit { .. } => ErrorClass::Conflict,
            Self::Domain(DomainError::InvalidTimeRange { .. }) => ErrorClass::ClientInput,
            Self::Domain(_) => ErrorClass::Conflict,
            Self::Store(StoreError::NotFound) => ErrorClass::NotFound,
            Self::Store(StoreError::Conflict | StoreError::Rejected(_)) => ErrorClass::Conflict,
            Self::Store(StoreError::Unavailable(_)) => ErrorClass::Internal,
        }
    }
}
