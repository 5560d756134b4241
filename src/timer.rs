//! One-shot timer queue for the cooperative animation loop.
//!
//! Nothing here fires on its own: the host asks for the next deadline,
//! waits for it however it likes (a tokio sleep in the CLI, nothing at all
//! in tests) and hands due ids back to the controller.

use crate::animation::{Scheduler, TimerId};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::Instant;

/// Pending one-shot timers keyed by id.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    pending: BTreeMap<TimerId, Instant>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    /// Earliest pending timer and its deadline.
    pub fn next_deadline(&self) -> Option<(TimerId, Instant)> {
        self.pending
            .iter()
            .min_by_key(|(id, deadline)| (**deadline, **id))
            .map(|(id, deadline)| (*id, *deadline))
    }

    /// Remove and return the earliest timer whose deadline has passed.
    pub fn pop_due(&mut self, now: Instant) -> Option<TimerId> {
        let (id, deadline) = self.next_deadline()?;
        if deadline > now {
            return None;
        }
        self.pending.remove(&id);
        Some(id)
    }

    /// Remove and return the earliest timer regardless of its deadline.
    pub fn pop_next(&mut self) -> Option<TimerId> {
        let (id, _) = self.next_deadline()?;
        self.pending.remove(&id);
        Some(id)
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.pending.insert(id, Instant::now() + delay);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}
