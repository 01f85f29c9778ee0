//! Booking and availability services over a [`ScheduleStore`], plus their HTTP surface.
//!
//! Every mutation reads the roster and conflicting assignments, allocates, and writes back while
//! holding the [`ScheduleLocks`] of the dates it touches.

pub mod availability;
pub mod error;
pub mod locks;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod views;

#[cfg(test)]
mod tests;

pub use availability::AvailabilityService;
pub use error::{BookingError, ErrorClass};
pub use locks::ScheduleLocks;
pub use memory::InMemoryScheduleStore;
pub use repository::{ScheduleStore, StoreError};
pub use router::{booking_router, BookingApi};
pub use service::BookingService;
pub use views::{
    BookingRequest, BookingView, CleanerDailyAvailabilityView, CleanerView, RescheduleRequest,
    VehicleAvailabilityView, VehicleDailyAvailabilityView,
};
