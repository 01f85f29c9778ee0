//! Allocation engine: time-slot algebra, buffer-aware conflict checks, per-cleaner availability,
//! first-fit vehicle allocation and the scheduling policy gate.
//!
//! Everything here is synchronous and pure; callers pass in roster and assignment snapshots.

pub mod allocator;
pub mod availability;
pub mod buffer;
pub mod domain;
pub mod policy;
pub mod slot;

pub use allocator::{allocate, Allocation, AllocationError, AssignmentsByCleaner, VehicleCrews};
pub use availability::daily_free_slots;
pub use buffer::PaddedWindow;
pub use domain::{
    Assignment, AssignmentWindow, Booking, BookingId, BookingStatus, Cleaner, CleanerId,
    CrewMember, DomainError, Vehicle, VehicleId,
};
pub use policy::{PolicyViolation, SchedulingPolicy};
pub use slot::TimeSlot;
