//! First-fit vehicle allocation.

use std::collections::{BTreeMap, HashMap};

use super::domain::{AssignmentWindow, CleanerId, CrewMember, VehicleId};

/// Cleaners grouped per vehicle. Vehicles iterate in ascending id order; cleaners keep the order
/// in which the roster listed them.
pub type VehicleCrews = BTreeMap<VehicleId, Vec<CrewMember>>;

/// Assignments keyed by the cleaner holding them.
pub type AssignmentsByCleaner = HashMap<CleanerId, Vec<AssignmentWindow>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub vehicle_id: VehicleId,
    pub vehicle_name: String,
    pub cleaners: Vec<CrewMember>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocationError {
    #[error("not enough cleaners available for the requested time ({required} required)")]
    InsufficientCapacity { required: usize },
}

pub fn group_by_vehicle(roster: &[CrewMember]) -> VehicleCrews {
    let mut crews = VehicleCrews::new();
    for member in roster {
        crews
            .entry(member.vehicle_id)
            .or_default()
            .push(member.clone());
    }
    crews
}

pub fn group_by_cleaner(assignments: Vec<AssignmentWindow>) -> AssignmentsByCleaner {
    let mut grouped = AssignmentsByCleaner::new();
    for assignment in assignments {
        grouped
            .entry(assignment.cleaner_id)
            .or_default()
            .push(assignment);
    }
    grouped
}

/// Members of `crew` with no conflicting assignment, in crew order.
pub fn available_members<'a>(
    crew: &'a [CrewMember],
    conflicts: &'a AssignmentsByCleaner,
) -> impl Iterator<Item = &'a CrewMember> + 'a {
    crew.iter().filter(move |member| {
        conflicts
            .get(&member.cleaner_id)
            .map_or(true, |assigned| assigned.is_empty())
    })
}

/// Picks the first vehicle, in ascending id order, with at least `required` free cleaners and
/// takes the first `required` of them. Never splits a request across vehicles.
pub fn allocate(
    crews: &VehicleCrews,
    conflicts: &AssignmentsByCleaner,
    required: usize,
) -> Result<Allocation, AllocationError> {
    for (vehicle_id, crew) in crews {
        let Some(first) = crew.first() else {
            continue;
        };

        let chosen: Vec<CrewMember> = available_members(crew, conflicts)
            .take(required)
            .cloned()
            .collect();

        if required > 0 && chosen.len() == required {
            return Ok(Allocation {
                vehicle_id: *vehicle_id,
                vehicle_name: first.vehicle_name.clone(),
                cleaners: chosen,
            });
        }
    }

    Err(AllocationError::InsufficientCapacity { required })
}
