use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;

/// Per-date mutual exclusion around every read-conflicts-then-write sequence.
///
/// Two mutations touching the same date never interleave, so a cleaner observed as free stays
/// free until the booking that claims it is written.
#[derive(Debug, Default)]
pub struct ScheduleLocks {
    dates: Mutex<HashMap<NaiveDate, Arc<Mutex<()>>>>,
}

impl ScheduleLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handles for `dates`, sorted and deduplicated so that callers locking several dates
    /// always acquire them in the same order.
    pub fn handles(&self, dates: &[NaiveDate]) -> Vec<Arc<Mutex<()>>> {
        let mut ordered = dates.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        let mut registry = self.dates.lock().unwrap_or_else(PoisonError::into_inner);
        ordered
            .into_iter()
            .map(|date| Arc::clone(registry.entry(date).or_default()))
            .collect()
    }

    /// Runs `critical` while holding the locks of every date in `dates`.
    pub fn with_dates<T>(&self, dates: &[NaiveDate], critical: impl FnOnce() -> T) -> T {
        let handles = self.handles(dates);
        let outcome = {
            // the guarded value is `()`, so a poisoned lock carries no broken state
            let _guards: Vec<_> = handles
                .iter()
                .map(|handle| handle.lock().unwrap_or_else(PoisonError::into_inner))
                .collect();
            critical()
        };
        drop(handles);
        self.release(dates);
        outcome
    }

    /// Forgets the lock of every date in `dates` that no caller holds or waits on any more.
    fn release(&self, dates: &[NaiveDate]) {
        let mut registry = self.dates.lock().unwrap_or_else(PoisonError::into_inner);
        for date in dates {
            // handles are only cloned under the registry lock, so a count of one is final
            if registry
                .get(date)
                .is_some_and(|handle| Arc::strong_count(handle) == 1)
            {
                registry.remove(date);
            }
        }
    }
}
