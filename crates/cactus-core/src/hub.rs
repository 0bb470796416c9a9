//! Notification hub: synchronous, multi-subscriber fan-out of published facts.
//!
//! The hub is owned by one [`Simulation`] run rather than living in process
//! globals, so a reset can drop every subscriber at once via
//! [`NotificationHub::teardown`].
//!
//! # Delivery semantics
//!
//! - [`publish`] invokes every matching subscriber in registration order on
//!   the caller's stack before returning. Nothing is queued.
//! - The subscriber list is snapshotted when a publish starts. Handlers
//!   added or removed while a publish is in flight take effect from the
//!   next publish.
//! - Handlers may re-enter the hub (subscribe, unsubscribe, publish).
//!
//! The hub is single-threaded (`Rc` + `RefCell`); all state lives in one
//! execution context.
//!
//! [`Simulation`]: crate::simulation::Simulation
//! [`publish`]: NotificationHub::publish

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use cactus_types::{Notification, Topic};

/// Handle returned by a subscription, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Handler = Rc<dyn Fn(&Notification)>;

struct Subscriber {
    id: SubscriptionId,
    /// `None` subscribes to every topic.
    topic: Option<Topic>,
    handler: Handler,
}

/// A set of typed broadcast channels, one per [`Topic`].
#[derive(Default)]
pub struct NotificationHub {
    subscribers: RefCell<Vec<Subscriber>>,
    next_id: Cell<u64>,
}

impl core::fmt::Debug for NotificationHub {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NotificationHub")
            .field("subscribers", &self.subscriber_count())
            .finish_non_exhaustive()
    }
}

impl NotificationHub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for facts published on `topic`.
    pub fn subscribe(
        &self,
        topic: Topic,
        handler: impl Fn(&Notification) + 'static,
    ) -> SubscriptionId {
        self.register(Some(topic), Rc::new(handler))
    }

    /// Register `handler` for every published fact.
    pub fn subscribe_all(&self, handler: impl Fn(&Notification) + 'static) -> SubscriptionId {
        self.register(None, Rc::new(handler))
    }

    /// Remove a subscription. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let before = subscribers.len();
        subscribers.retain(|sub| sub.id != id);
        subscribers.len() != before
    }

    /// Deliver `notification` to every subscriber of its topic.
    pub fn publish(&self, notification: &Notification) {
        let topic = notification.topic();
        // Snapshot so handlers can re-enter the hub without a borrow conflict.
        let handlers: Vec<Handler> = self
            .subscribers
            .borrow()
            .iter()
            .filter(|sub| sub.topic.is_none_or(|t| t == topic))
            .map(|sub| Rc::clone(&sub.handler))
            .collect();

        for handler in handlers {
            handler(notification);
        }
    }

    /// Number of live subscriptions across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.borrow().len()
    }

    /// Drop every subscription.
    ///
    /// Must be called before a full restart so stale subscribers from the
    /// previous run never see the new run's facts.
    pub fn teardown(&self) {
        self.subscribers.borrow_mut().clear();
    }

    fn register(&self, topic: Option<Topic>, handler: Handler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().saturating_add(1));
        self.subscribers.borrow_mut().push(Subscriber { id, topic, handler });
        id
    }
}

#[cfg(test)]
mod tests {
    use cactus_types::OrbitPhase;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<Notification>>>, impl Fn(&Notification) + 'static) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        (log, move |n: &Notification| sink.borrow_mut().push(*n))
    }

    #[test]
    fn publish_reaches_topic_subscribers_only() {
        let hub = NotificationHub::new();
        let (scores, on_score) = recorder();
        let (phases, on_phase) = recorder();
        hub.subscribe(Topic::Score, on_score);
        hub.subscribe(Topic::OrbitPhase, on_phase);

        hub.publish(&Notification::ScoreChanged(3));

        assert_eq!(*scores.borrow(), vec![Notification::ScoreChanged(3)]);
        assert!(phases.borrow().is_empty());
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let hub = NotificationHub::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for tag in 0..3_u8 {
            let order = Rc::clone(&order);
            hub.subscribe_all(move |_| order.borrow_mut().push(tag));
        }

        hub.publish(&Notification::PlantDied);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let hub = NotificationHub::new();
        let (log, on_any) = recorder();
        let id = hub.subscribe_all(on_any);

        assert!(hub.unsubscribe(id));
        assert!(!hub.unsubscribe(id));
        hub.publish(&Notification::AbilityTriggered);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn subscription_added_during_publish_waits_for_next_publish() {
        let hub = Rc::new(NotificationHub::new());
        let late_calls = Rc::new(Cell::new(0_u32));

        {
            let hub_handle = Rc::clone(&hub);
            let late_calls = Rc::clone(&late_calls);
            hub.subscribe(Topic::OrbitPhase, move |_| {
                let late_calls = Rc::clone(&late_calls);
                hub_handle.subscribe(Topic::OrbitPhase, move |_| {
                    late_calls.set(late_calls.get() + 1);
                });
            });
        }

        hub.publish(&Notification::OrbitPhaseChanged(OrbitPhase::Eclipse));
        assert_eq!(late_calls.get(), 0);
        assert_eq!(hub.subscriber_count(), 2);

        hub.publish(&Notification::OrbitPhaseChanged(OrbitPhase::Sunlit));
        assert_eq!(late_calls.get(), 1);
    }

    #[test]
    fn unsubscribe_during_publish_takes_effect_next_publish() {
        let hub = Rc::new(NotificationHub::new());
        let later_calls = Rc::new(Cell::new(0_u32));
        let later_id = Rc::new(Cell::new(None));

        {
            let hub_handle = Rc::clone(&hub);
            let later_id = Rc::clone(&later_id);
            hub.subscribe(Topic::Score, move |_| {
                if let Some(id) = later_id.take() {
                    assert!(hub_handle.unsubscribe(id));
                }
            });
        }
        {
            let later_calls = Rc::clone(&later_calls);
            let id = hub.subscribe(Topic::Score, move |_| {
                later_calls.set(later_calls.get() + 1);
            });
            later_id.set(Some(id));
        }

        hub.publish(&Notification::ScoreChanged(1));
        assert_eq!(later_calls.get(), 1, "already snapshotted for this publish");
        assert_eq!(hub.subscriber_count(), 1);

        hub.publish(&Notification::ScoreChanged(2));
        assert_eq!(later_calls.get(), 1);
    }

    #[test]
    fn handler_may_publish_reentrantly() {
        let hub = Rc::new(NotificationHub::new());
        let (log, on_death) = recorder();
        hub.subscribe(Topic::Death, on_death);

        let hub_handle = Rc::clone(&hub);
        hub.subscribe(Topic::Temperature, move |_| {
            hub_handle.publish(&Notification::PlantDied);
        });

        hub.publish(&Notification::TemperatureChanged(-5.0));
        assert_eq!(*log.borrow(), vec![Notification::PlantDied]);
    }

    #[test]
    fn teardown_drops_everything() {
        let hub = NotificationHub::new();
        let (log, on_any) = recorder();
        hub.subscribe_all(on_any);
        hub.subscribe(Topic::Score, |_| {});

        hub.teardown();
        assert_eq!(hub.subscriber_count(), 0);
        hub.publish(&Notification::ScoreChanged(1));
        assert!(log.borrow().is_empty());
    }
}
