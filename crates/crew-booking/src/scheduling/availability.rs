use chrono::NaiveTime;

use super::buffer::PaddedWindow;
use super::domain::AssignmentWindow;
use super::slot::TimeSlot;

/// Free slots of one cleaner between `effective_start` and `working_end`.
///
/// Each assignment is padded by `break_minutes` and subtracted from every slot still free,
/// in ascending order of booking start.
pub fn daily_free_slots(
    effective_start: NaiveTime,
    working_end: NaiveTime,
    break_minutes: u32,
    assignments: &[AssignmentWindow],
) -> Vec<TimeSlot> {
    let Ok(day) = TimeSlot::new(effective_start, working_end) else {
        return Vec::new();
    };

    let mut ordered: Vec<&AssignmentWindow> = assignments.iter().collect();
    ordered.sort_by_key(|assignment| (assignment.start_time, assignment.end_time));

    ordered
        .into_iter()
        .fold(vec![day], |free, assignment| {
            let padded =
                PaddedWindow::around(assignment.start_time, assignment.end_time, break_minutes);
            free.iter()
                .flat_map(|slot| slot.subtract(padded.start, padded.end))
                .collect()
        })
}
