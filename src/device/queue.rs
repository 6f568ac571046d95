//! Per-device queue of manual-mode attribute updates.
//!
//! A newer request for an attribute supersedes any pending request for the
//! same attribute, so the hardware never replays stale values. Requests for
//! different attributes keep their arrival order.

use std::collections::VecDeque;

use super::panel::{Attribute, AttributeUpdate};

/// Ordered, deduplicating update queue.
#[derive(Debug, Clone, Default)]
pub struct UpdateQueue {
    pending: VecDeque<AttributeUpdate>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self {
            pending: VecDeque::new(),
        }
    }

    /// Enqueue `update`, dropping a stale request for the same attribute.
    ///
    /// Returns the superseded request, if any.
    pub fn push(&mut self, update: AttributeUpdate) -> Option<AttributeUpdate> {
        let key = update.attribute();
        let stale = self
            .pending
            .iter()
            .position(|u| u.attribute() == key)
            .and_then(|i| self.pending.remove(i));
        if let Some(old) = &stale {
            tracing::debug!(?key, ?old, new = ?update, "coalesced stale update");
        }
        self.pending.push_back(update);
        stale
    }

    /// Put back an update that could not be applied, ahead of everything
    /// else. Dropped if a newer request for the same attribute is pending.
    pub fn requeue(&mut self, update: AttributeUpdate) {
        if !self.contains(update.attribute()) {
            self.pending.push_front(update);
        }
    }

    /// Take the oldest pending update.
    pub fn pop(&mut self) -> Option<AttributeUpdate> {
        self.pending.pop_front()
    }

    /// Whether an update for `attribute` is waiting.
    pub fn contains(&self, attribute: Attribute) -> bool {
        self.pending.iter().any(|u| u.attribute() == attribute)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
