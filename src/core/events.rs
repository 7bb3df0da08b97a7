//! Simulation event queue
//!
//! Things that happened during a tick, for renderers and loggers that want
//! more than the final positions. Double-buffered: events pushed during
//! tick N become readable once `Simulation::tick` swaps at the start of
//! tick N+1. Callers that read within the same tick swap themselves.
//!
//! # Example
//!
//! ```ignore
//! sim.tick();
//! sim.events_mut().swap();
//! for event in sim.events().iter() {
//!     if let SimEvent::Blocked { agent, at } = event {
//!         flash_cell(*at);
//!     }
//! }
//! ```

use std::collections::VecDeque;

use serde::Serialize;

use crate::ai::{AgentId, Cell};

/// Simulation events
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[non_exhaustive]
pub enum SimEvent {
    /// A new goal was picked
    GoalSelected { agent: AgentId, goal: Cell },
    /// A path was planned toward the current goal
    PathPlanned { agent: AgentId, steps: usize },
    /// The agent advanced one cell
    Moved { agent: AgentId, to: Cell },
    /// The agent stepped onto its goal
    Arrived { agent: AgentId, at: Cell },
    /// A step was rejected because another agent holds the cell
    Blocked { agent: AgentId, at: Cell },
    /// No path exists to the goal
    PathNotFound { agent: AgentId, goal: Cell },
    /// No cell was available as a goal
    NoValidTarget { agent: AgentId },
    /// All agents were told to pick new goals
    Retargeted,
}

/// Double-buffered event queue.
///
/// - Push: O(1) amortized
/// - Iteration: O(n)
/// - Swap: O(1)
#[derive(Debug)]
pub struct EventQueue {
    /// Events being written this tick
    pending: VecDeque<SimEvent>,
    /// Events from previous tick, ready for processing
    processing: VecDeque<SimEvent>,
}

impl EventQueue {
    const DEFAULT_CAPACITY: usize = 64;

    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity),
            processing: VecDeque::with_capacity(capacity),
        }
    }

    /// Push an event to be processed next tick.
    #[inline]
    pub fn push(&mut self, event: SimEvent) {
        self.pending.push_back(event);
    }

    /// Swap the pending and processing queues.
    ///
    /// After swapping, `iter()` returns the events pushed since the last
    /// swap and `push()` writes to a fresh pending queue.
    pub fn swap(&mut self) {
        std::mem::swap(&mut self.pending, &mut self.processing);
        self.pending.clear();
    }

    /// Iterate over events from the previous tick.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &SimEvent> {
        self.processing.iter()
    }

    /// Drain all events from the previous tick.
    #[inline]
    pub fn drain(&mut self) -> impl Iterator<Item = SimEvent> + '_ {
        self.processing.drain(..)
    }

    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.processing.is_empty()
    }

    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.processing.len()
    }

    #[must_use]
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Iterate over events pushed since the last swap.
    pub fn pending(&self) -> impl Iterator<Item = &SimEvent> {
        self.pending.iter()
    }

    /// Clear all events (both pending and processing).
    pub fn clear(&mut self) {
        self.pending.clear();
        self.processing.clear();
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_queue_push_and_swap() {
        let mut queue = EventQueue::new();

        queue.push(SimEvent::Retargeted);
        assert!(queue.is_empty(), "Events should not be visible before swap");
        assert_eq!(queue.pending_count(), 1);

        queue.swap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.iter().next(), Some(&SimEvent::Retargeted));
    }

    #[test]
    fn test_event_queue_double_buffer_isolation() {
        let mut queue = EventQueue::new();
        let agent = AgentId(0);

        queue.push(SimEvent::Moved { agent, to: Cell::new(1, 0) });
        queue.swap();

        queue.push(SimEvent::Moved { agent, to: Cell::new(2, 0) });

        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events, vec![&SimEvent::Moved { agent, to: Cell::new(1, 0) }]);

        queue.swap();
        let events: Vec<_> = queue.iter().collect();
        assert_eq!(events, vec![&SimEvent::Moved { agent, to: Cell::new(2, 0) }]);
    }

    #[test]
    fn test_event_queue_drain_and_clear() {
        let mut queue = EventQueue::new();

        queue.push(SimEvent::NoValidTarget { agent: AgentId(1) });
        queue.push(SimEvent::Retargeted);
        queue.swap();

        let events: Vec<_> = queue.drain().collect();
        assert_eq!(events.len(), 2);
        assert!(queue.is_empty());

        queue.push(SimEvent::Retargeted);
        queue.clear();
        assert_eq!(queue.pending_count(), 0);
    }
}
