use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Half-open interval `[start, end)` within a single calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSlot {
    start: NaiveTime,
    end: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("time slot end {end} must be after start {start}")]
pub struct InvalidTimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeSlot {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, InvalidTimeSlot> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidTimeSlot { start, end })
        }
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// Strict overlap: intervals that only touch at an endpoint do not overlap.
    pub fn overlaps(&self, other: &TimeSlot) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Removes `[block_start, block_end)` from this slot.
    ///
    /// Returns the slot itself when the block lies entirely outside it, otherwise the left
    /// remainder followed by the right remainder, omitting empty pieces.
    pub fn subtract(&self, block_start: NaiveTime, block_end: NaiveTime) -> Vec<TimeSlot> {
        if block_end < self.start || block_start > self.end {
            return vec![*self];
        }

        let mut remaining = Vec::with_capacity(2);

        if block_start > self.start {
            if let Ok(left) = TimeSlot::new(self.start, block_start.min(self.end)) {
                remaining.push(left);
            }
        }

        if block_end < self.end {
            if let Ok(right) = TimeSlot::new(block_end.max(self.start), self.end) {
                remaining.push(right);
            }
        }

        remaining
    }
}
