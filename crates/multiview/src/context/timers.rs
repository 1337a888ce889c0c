//! Per-window periodic ticks

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::Instant;

use crate::backend::WindowId;

/// One-shot deadlines keyed by window, re-armed by whoever fires them
#[derive(Debug, Default)]
pub struct TimerSchedule {
    deadlines: BinaryHeap<Reverse<(Instant, WindowId)>>,
}

impl TimerSchedule {
    /// Create an empty schedule
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire a tick for `id` once `deadline` has passed
    pub fn arm(&mut self, id: WindowId, deadline: Instant) {
        self.deadlines.push(Reverse((deadline, id)));
    }

    /// Remove and return every timer due at `now`, earliest first
    pub fn due(&mut self, now: Instant) -> Vec<WindowId> {
        let mut fired = Vec::new();
        while let Some(Reverse((deadline, id))) = self.deadlines.peek().copied() {
            if deadline > now {
                break;
            }
            self.deadlines.pop();
            fired.push(id);
        }
        fired
    }

    /// Number of armed timers
    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    /// Whether no timer is armed
    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}
