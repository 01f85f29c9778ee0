use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;

use super::locks::ScheduleLocks;
use super::repository::{ScheduleStore, StoreError};
use crate::scheduling::{
    AssignmentWindow, Booking, BookingId, Cleaner, CleanerId, CrewMember, DomainError,
    PaddedWindow, Vehicle, VehicleId,
};

#[derive(Debug, Default)]
struct Arena {
    vehicles: BTreeMap<VehicleId, Vehicle>,
    cleaners: BTreeMap<CleanerId, Cleaner>,
    bookings: BTreeMap<BookingId, Booking>,
    last_vehicle_id: u64,
    last_cleaner_id: u64,
    last_booking_id: u64,
}

impl Arena {
    fn windows_on<'a>(
        &'a self,
        cleaners: &'a [CleanerId],
        date: NaiveDate,
    ) -> impl Iterator<Item = AssignmentWindow> + 'a {
        let wanted: HashSet<CleanerId> = cleaners.iter().copied().collect();
        self.bookings
            .values()
            .filter(move |booking| booking.date() == date && !booking.is_cancelled())
            .flat_map(|booking| booking.assignment_windows())
            .filter(move |window| wanted.contains(&window.cleaner_id))
    }
}

/// Arena-backed store: vehicles, cleaners and bookings live in id-keyed maps and refer to each
/// other only by id.
#[derive(Debug, Default)]
pub struct InMemoryScheduleStore {
    arena: Mutex<Arena>,
    locks: ScheduleLocks,
}

impl InMemoryScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn arena(&self) -> Result<MutexGuard<'_, Arena>, StoreError> {
        self.arena
            .lock()
            .map_err(|_| StoreError::Unavailable("schedule store mutex poisoned".to_string()))
    }

    /// Registers a vehicle; names are unique.
    pub fn add_vehicle(&self, name: &str) -> Result<Vehicle, StoreError> {
        let mut arena = self.arena()?;
        if arena.vehicles.values().any(|vehicle| vehicle.name == name) {
            return Err(DomainError::DuplicateVehicleName(name.to_string()).into());
        }
        arena.last_vehicle_id += 1;
        let vehicle = Vehicle {
            id: VehicleId(arena.last_vehicle_id),
            name: name.to_string(),
        };
        arena.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    pub fn add_cleaner(&self, name: &str) -> Result<Cleaner, StoreError> {
        let mut arena = self.arena()?;
        arena.last_cleaner_id += 1;
        let cleaner = Cleaner {
            id: CleanerId(arena.last_cleaner_id),
            name: name.to_string(),
            vehicle_id: None,
        };
        arena.cleaners.insert(cleaner.id, cleaner.clone());
        Ok(cleaner)
    }

    /// Moves a cleaner into `vehicle`; any previous membership is dropped.
    pub fn assign_cleaner(&self, cleaner: CleanerId, vehicle: VehicleId) -> Result<(), StoreError> {
        let mut arena = self.arena()?;
        if !arena.vehicles.contains_key(&vehicle) {
            return Err(DomainError::UnknownVehicle(vehicle).into());
        }
        let record = arena
            .cleaners
            .get_mut(&cleaner)
            .ok_or(DomainError::UnknownCleaner(cleaner))?;
        record.vehicle_id = Some(vehicle);
        Ok(())
    }

    pub fn unassign_cleaner(&self, cleaner: CleanerId) -> Result<(), StoreError> {
        let mut arena = self.arena()?;
        let record = arena
            .cleaners
            .get_mut(&cleaner)
            .ok_or(DomainError::UnknownCleaner(cleaner))?;
        record.vehicle_id = None;
        Ok(())
    }

    /// Registers `vehicles` vehicles named `Vehicle-v`, each with `crew_size` cleaners named
    /// `Cleaner-v-c`. Does nothing and returns `false` when any vehicle already exists.
    pub fn seed_fleet(&self, vehicles: usize, crew_size: usize) -> Result<bool, StoreError> {
        if !self.vehicles()?.is_empty() {
            return Ok(false);
        }

        for v in 1..=vehicles {
            let vehicle = self.add_vehicle(&format!("Vehicle-{v}"))?;
            for c in 1..=crew_size {
                let cleaner = self.add_cleaner(&format!("Cleaner-{v}-{c}"))?;
                self.assign_cleaner(cleaner.id, vehicle.id)?;
            }
        }
        Ok(true)
    }

    pub fn vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(self.arena()?.vehicles.values().cloned().collect())
    }

    /// Cleaners currently riding in `vehicle`, ordered by id.
    pub fn crew_of(&self, vehicle: VehicleId) -> Result<Vec<Cleaner>, StoreError> {
        Ok(self
            .arena()?
            .cleaners
            .values()
            .filter(|cleaner| cleaner.vehicle_id == Some(vehicle))
            .cloned()
            .collect())
    }
}

impl ScheduleStore for InMemoryScheduleStore {
    fn schedule_locks(&self) -> &ScheduleLocks {
        &self.locks
    }

    fn cleaners_with_vehicle(&self) -> Result<Vec<CrewMember>, StoreError> {
        let arena = self.arena()?;
        Ok(arena
            .cleaners
            .values()
            .filter_map(|cleaner| {
                let vehicle = arena.vehicles.get(&cleaner.vehicle_id?)?;
                Some(CrewMember {
                    cleaner_id: cleaner.id,
                    cleaner_name: cleaner.name.clone(),
                    vehicle_id: vehicle.id,
                    vehicle_name: vehicle.name.clone(),
                })
            })
            .collect())
    }

    fn assignments_on_date(
        &self,
        cleaners: &[CleanerId],
        date: NaiveDate,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        let arena = self.arena()?;
        let mut windows: Vec<_> = arena.windows_on(cleaners, date).collect();
        windows.sort_by_key(|window| (window.start_time, window.booking_id));
        Ok(windows)
    }

    fn conflicting_assignments(
        &self,
        cleaners: &[CleanerId],
        date: NaiveDate,
        window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        let arena = self.arena()?;
        Ok(arena
            .windows_on(cleaners, date)
            .filter(|assigned| window.conflicts_with(assigned.start_time, assigned.end_time))
            .collect())
    }

    fn conflicting_assignments_excluding(
        &self,
        booking: BookingId,
        cleaners: &[CleanerId],
        date: NaiveDate,
        window: PaddedWindow,
    ) -> Result<Vec<AssignmentWindow>, StoreError> {
        let arena = self.arena()?;
        Ok(arena
            .windows_on(cleaners, date)
            .filter(|assigned| assigned.booking_id != booking)
            .filter(|assigned| window.conflicts_with(assigned.start_time, assigned.end_time))
            .collect())
    }

    fn next_booking_id(&self) -> Result<BookingId, StoreError> {
        let mut arena = self.arena()?;
        arena.last_booking_id += 1;
        Ok(BookingId(arena.last_booking_id))
    }

    fn insert_booking(&self, booking: Booking) -> Result<Booking, StoreError> {
        let mut arena = self.arena()?;
        if arena.bookings.contains_key(&booking.id()) {
            return Err(StoreError::Conflict);
        }
        arena.bookings.insert(booking.id(), booking.clone());
        Ok(booking)
    }

    fn update_booking(&self, booking: Booking) -> Result<(), StoreError> {
        let mut arena = self.arena()?;
        match arena.bookings.get_mut(&booking.id()) {
            Some(stored) => {
                *stored = booking;
                Ok(())
            }
            None => Err(StoreError::NotFound),
        }
    }

    fn fetch_booking(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.arena()?.bookings.get(&id).cloned())
    }

    fn vehicle(&self, id: VehicleId) -> Result<Option<Vehicle>, StoreError> {
        Ok(self.arena()?.vehicles.get(&id).cloned())
    }

    fn cleaner(&self, id: CleanerId) -> Result<Option<Cleaner>, StoreError> {
        Ok(self.arena()?.cleaners.get(&id).cloned())
    }
}
