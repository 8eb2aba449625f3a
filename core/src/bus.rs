//! Synchronous publish/subscribe registry for [`GameEvent`] notifications.

use std::fmt;

use crate::{EventKind, GameEvent};

type Listener = Box<dyn FnMut(&GameEvent)>;

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

struct Subscription {
    id: SubscriptionId,
    kind: Option<EventKind>,
    listener: Listener,
}

/// Dispatches events to listeners synchronously, in registration order.
///
/// Listeners borrow nothing from the engine, so they cannot call back into it
/// while an event is being dispatched.
#[derive(Default)]
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    next_id: u64,
}

impl EventBus {
    /// Creates a bus without listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener for a single topic.
    pub fn subscribe(
        &mut self,
        kind: EventKind,
        listener: impl FnMut(&GameEvent) + 'static,
    ) -> SubscriptionId {
        self.register(Some(kind), Box::new(listener))
    }

    /// Registers a listener for every topic.
    pub fn subscribe_all(&mut self, listener: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        self.register(None, Box::new(listener))
    }

    /// Removes a listener. Returns `false` when the handle was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|subscription| subscription.id != id);
        before != self.subscriptions.len()
    }

    /// Delivers `event` to matching listeners and returns how many were invoked.
    pub fn publish(&mut self, event: &GameEvent) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for subscription in &mut self.subscriptions {
            if subscription.kind.map_or(true, |wanted| wanted == kind) {
                (subscription.listener)(event);
                delivered += 1;
            }
        }
        delivered
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn register(&mut self, kind: Option<EventKind>, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        log::debug!(
            "listener {} subscribed to {}",
            id.0,
            kind.map_or("*", EventKind::as_str)
        );
        self.subscriptions.push(Subscription { id, kind, listener });
        id
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("listeners", &self.subscriptions.len())
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::EventBus;
    use crate::{EventKind, GameEvent, GameStatus};

    #[test]
    fn listeners_run_in_registration_order_and_filter_by_topic() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let _ = bus.subscribe_all(move |event| first.borrow_mut().push(("all", event.kind())));
        let second = Rc::clone(&seen);
        let _ = bus.subscribe(EventKind::Gold, move |event| {
            second.borrow_mut().push(("gold", event.kind()));
        });

        let delivered = bus.publish(&GameEvent::GoldChanged { gold: 5, delta: 5 });
        assert_eq!(delivered, 2);
        let delivered = bus.publish(&GameEvent::StatusChanged {
            status: GameStatus::Defeat,
        });
        assert_eq!(delivered, 1);

        assert_eq!(
            *seen.borrow(),
            vec![
                ("all", EventKind::Gold),
                ("gold", EventKind::Gold),
                ("all", EventKind::StatusChanged),
            ]
        );
    }

    #[test]
    fn unsubscribed_listeners_are_silent() {
        let mut bus = EventBus::new();
        let count = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&count);
        let id = bus.subscribe(EventKind::Gold, move |_| *counter.borrow_mut() += 1);

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.publish(&GameEvent::GoldChanged { gold: 1, delta: 1 }), 0);
        assert_eq!(*count.borrow(), 0);
    }
}
