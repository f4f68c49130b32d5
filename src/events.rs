//! Typed Control Events
//!
//! Replaces global broadcast event fields with an explicit publish/subscribe
//! channel: widgets publish typed [`ControlEvent`]s during the tick, the
//! [`EventBus`] filters them against its subscriptions, and the host drains
//! the pending batch once per frame. Subscription lifecycle is deterministic:
//! removing a control from the surface (or unsubscribing its id) stops
//! delivery immediately.

use crate::surface::ControlId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A value or state change published by a control.
///
/// Events are delivered in publication order within a frame, which follows
/// the surface's control insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ControlEvent {
    /// A knob's clamped value changed.
    Value { id: ControlId, value: f64 },

    /// A toggle flipped or was leveled to a new state.
    Switch { id: ControlId, on: bool },

    /// A button was pressed. Independent of [`ControlEvent::ButtonUp`].
    ButtonDown { id: ControlId },

    /// A button was released.
    ButtonUp { id: ControlId },

    /// A wave generator sample; published every tick, changed or not.
    WaveSample {
        id: ControlId,
        position: f64,
        value: f64,
    },

    /// One sample of a running stab pulse.
    Stab { id: ControlId, value: f64 },
}

impl ControlEvent {
    /// The publishing control.
    pub fn source(&self) -> ControlId {
        match self {
            ControlEvent::Value { id, .. }
            | ControlEvent::Switch { id, .. }
            | ControlEvent::ButtonDown { id }
            | ControlEvent::ButtonUp { id }
            | ControlEvent::WaveSample { id, .. }
            | ControlEvent::Stab { id, .. } => *id,
        }
    }
}

/// Default cap on undrained events before the oldest are dropped.
const MAX_PENDING_EVENTS: usize = 1024;

/// Collects events published during a tick and delivers them to the host.
///
/// With no explicit subscriptions the bus delivers everything; subscribing
/// narrows delivery to the chosen controls. Events are never deduplicated:
/// a down/up pair within one frame arrives as two events, in order.
#[derive(Debug)]
pub struct EventBus {
    filter: Option<HashSet<ControlId>>,
    pending: Vec<ControlEvent>,
    max_pending: usize,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            filter: None,
            pending: Vec::new(),
            max_pending: MAX_PENDING_EVENTS,
        }
    }

    /// Deliver events only for `id` (and any other subscribed ids).
    pub fn subscribe(&mut self, id: ControlId) {
        self.filter.get_or_insert_with(HashSet::new).insert(id);
    }

    /// Stop delivering events for `id`.
    pub fn unsubscribe(&mut self, id: ControlId) {
        if let Some(filter) = &mut self.filter {
            filter.remove(&id);
        }
    }

    /// Deliver events from every control (the default).
    pub fn subscribe_all(&mut self) {
        self.filter = None;
    }

    pub fn is_subscribed(&self, id: ControlId) -> bool {
        match &self.filter {
            None => true,
            Some(filter) => filter.contains(&id),
        }
    }

    /// Publish an event. Dropped silently when the source is not subscribed;
    /// past the cap the oldest pending event is dropped first.
    pub fn publish(&mut self, event: ControlEvent) {
        if !self.is_subscribed(event.source()) {
            return;
        }
        if self.pending.len() >= self.max_pending {
            self.pending.remove(0);
        }
        self.pending.push(event);
    }

    /// Take all pending events, oldest first.
    pub fn drain(&mut self) -> Vec<ControlEvent> {
        std::mem::take(&mut self.pending)
    }

    /// Peek at pending events without draining.
    pub fn pending(&self) -> &[ControlEvent] {
        &self.pending
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::{DefaultKey, KeyData};

    fn key(n: u64) -> DefaultKey {
        KeyData::from_ffi(n | (1 << 32)).into()
    }

    #[test]
    fn test_delivers_everything_by_default() {
        let mut bus = EventBus::new();
        bus.publish(ControlEvent::Value {
            id: key(1),
            value: 0.5,
        });
        bus.publish(ControlEvent::ButtonDown { id: key(2) });
        assert_eq!(bus.pending_count(), 2);
    }

    #[test]
    fn test_subscription_filters() {
        let mut bus = EventBus::new();
        let a = key(1);
        let b = key(2);
        bus.subscribe(a);

        bus.publish(ControlEvent::ButtonDown { id: a });
        bus.publish(ControlEvent::ButtonDown { id: b });
        let events = bus.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source(), a);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut bus = EventBus::new();
        let a = key(1);
        bus.subscribe(a);
        bus.unsubscribe(a);
        bus.publish(ControlEvent::ButtonDown { id: a });
        assert_eq!(bus.pending_count(), 0);

        bus.subscribe_all();
        bus.publish(ControlEvent::ButtonDown { id: a });
        assert_eq!(bus.pending_count(), 1);
    }

    #[test]
    fn test_drain_preserves_order_and_duplicates() {
        let mut bus = EventBus::new();
        let a = key(1);
        bus.publish(ControlEvent::ButtonDown { id: a });
        bus.publish(ControlEvent::ButtonUp { id: a });
        bus.publish(ControlEvent::ButtonDown { id: a });

        let events = bus.drain();
        assert_eq!(
            events,
            vec![
                ControlEvent::ButtonDown { id: a },
                ControlEvent::ButtonUp { id: a },
                ControlEvent::ButtonDown { id: a },
            ]
        );
        assert_eq!(bus.pending_count(), 0);
    }

    #[test]
    fn test_cap_drops_oldest() {
        let mut bus = EventBus::new();
        bus.max_pending = 4;
        for i in 0..6 {
            bus.publish(ControlEvent::Value {
                id: key(1),
                value: i as f64,
            });
        }
        let events = bus.drain();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            ControlEvent::Value {
                id: key(1),
                value: 2.0
            }
        );
    }
}
