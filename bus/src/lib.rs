#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Typed publish/subscribe event bus for the Furrow simulation.
//!
//! Publishers broadcast plain payload values without knowing who listens;
//! consumers register closures per payload type and receive every matching
//! publish synchronously, in registration order. The bus is strictly
//! single-threaded: handlers run on the publisher's call stack and their
//! effects are visible as soon as `publish` returns.
//!
//! Dispatch snapshots the handler list before invoking anything, so
//! handlers registered during a publish are not invoked until the next
//! publish of that payload type. A handler that panics aborts the publish
//! on the caller's stack; there is no isolation between consumers.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type ErasedHandler = Rc<RefCell<dyn FnMut(&dyn Any)>>;

/// Token identifying one registration on the bus.
///
/// Closures are not comparable, so unsubscription goes through the token
/// returned by [`EventBus::subscribe`]. Registering the same logic twice
/// yields two tokens and two deliveries per publish; each registration is
/// removed individually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    kind: TypeId,
    seq: u64,
}

struct Subscriber {
    seq: u64,
    handler: ErasedHandler,
}

#[derive(Default)]
struct Registry {
    channels: HashMap<TypeId, Vec<Subscriber>>,
    next_seq: u64,
}

/// Process-wide typed event registry.
///
/// Constructed once by the host and shared by `Rc` with every component
/// that publishes or subscribes.
#[derive(Default)]
pub struct EventBus {
    registry: RefCell<Registry>,
}

impl EventBus {
    /// Creates an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for every future publish of payload type `E`.
    pub fn subscribe<E, F>(&self, mut handler: F) -> SubscriptionId
    where
        E: 'static,
        F: FnMut(&E) + 'static,
    {
        let erased: ErasedHandler = Rc::new(RefCell::new(move |payload: &dyn Any| {
            if let Some(payload) = payload.downcast_ref::<E>() {
                handler(payload);
            }
        }));

        let mut registry = self.registry.borrow_mut();
        let seq = registry.next_seq;
        registry.next_seq += 1;
        registry
            .channels
            .entry(TypeId::of::<E>())
            .or_default()
            .push(Subscriber {
                seq,
                handler: erased,
            });

        SubscriptionId {
            kind: TypeId::of::<E>(),
            seq,
        }
    }

    /// Removes a previous registration. Unknown or already-removed tokens
    /// are a no-op.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        let mut registry = self.registry.borrow_mut();
        if let Some(channel) = registry.channels.get_mut(&id.kind) {
            channel.retain(|subscriber| subscriber.seq != id.seq);
        }
    }

    /// Invokes every handler currently registered for `E`, synchronously
    /// and in registration order. No registered handler: no-op.
    ///
    /// The registry borrow is released before dispatch, so handlers may
    /// publish further events or change subscriptions; a handler
    /// re-entering its own dispatch fails fast on the handler borrow.
    pub fn publish<E: 'static>(&self, event: &E) {
        let snapshot: Vec<ErasedHandler> = {
            let registry = self.registry.borrow();
            match registry.channels.get(&TypeId::of::<E>()) {
                Some(channel) => channel
                    .iter()
                    .map(|subscriber| Rc::clone(&subscriber.handler))
                    .collect(),
                None => return,
            }
        };

        for handler in snapshot {
            (&mut *handler.borrow_mut())(event);
        }
    }

    /// Number of handlers currently registered for payload type `E`.
    #[must_use]
    pub fn subscriber_count<E: 'static>(&self) -> usize {
        self.registry
            .borrow()
            .channels
            .get(&TypeId::of::<E>())
            .map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("channels", &registry.channels.len())
            .field("next_seq", &registry.next_seq)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ping(u32);

    #[derive(Debug, PartialEq)]
    struct Pong(u32);

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        bus.publish(&Ping(1));
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
    }

    #[test]
    fn handlers_run_in_registration_order() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        let _a = bus.subscribe::<Ping, _>(move |event| first.borrow_mut().push(("a", event.0)));
        let second = Rc::clone(&seen);
        let _b = bus.subscribe::<Ping, _>(move |event| second.borrow_mut().push(("b", event.0)));

        bus.publish(&Ping(7));
        assert_eq!(*seen.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn unsubscribe_stops_delivery_and_tolerates_unknown_tokens() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0u32));

        let counter = Rc::clone(&seen);
        let id = bus.subscribe::<Ping, _>(move |_| *counter.borrow_mut() += 1);

        bus.publish(&Ping(1));
        bus.unsubscribe(id);
        bus.unsubscribe(id);
        bus.publish(&Ping(2));

        assert_eq!(*seen.borrow(), 1);
        assert_eq!(bus.subscriber_count::<Ping>(), 0);
    }

    #[test]
    fn duplicate_registration_delivers_twice() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(0u32));

        for _ in 0..2 {
            let counter = Rc::clone(&seen);
            let _id = bus.subscribe::<Ping, _>(move |_| *counter.borrow_mut() += 1);
        }

        bus.publish(&Ping(1));
        assert_eq!(*seen.borrow(), 2);
    }

    #[test]
    fn payload_types_are_isolated() {
        let bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let pings = Rc::clone(&seen);
        let _a = bus.subscribe::<Ping, _>(move |event| pings.borrow_mut().push(event.0));

        bus.publish(&Pong(9));
        assert!(seen.borrow().is_empty());
        bus.publish(&Ping(3));
        assert_eq!(*seen.borrow(), vec![3]);
    }

    #[test]
    fn subscribers_added_during_publish_miss_the_in_flight_event() {
        let bus = Rc::new(EventBus::new());
        let late_seen = Rc::new(RefCell::new(0u32));

        let bus_for_handler = Rc::clone(&bus);
        let late_for_handler = Rc::clone(&late_seen);
        let _a = bus.subscribe::<Ping, _>(move |_| {
            let late = Rc::clone(&late_for_handler);
            let _late_id = bus_for_handler.subscribe::<Ping, _>(move |_| {
                *late.borrow_mut() += 1;
            });
        });

        bus.publish(&Ping(1));
        assert_eq!(*late_seen.borrow(), 0, "late subscriber ran in-flight");

        bus.publish(&Ping(2));
        assert_eq!(*late_seen.borrow(), 1);
    }

    #[test]
    fn handlers_may_publish_other_events_reentrantly() {
        let bus = Rc::new(EventBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let pongs = Rc::clone(&seen);
        let _a = bus.subscribe::<Pong, _>(move |event| pongs.borrow_mut().push(event.0));

        let bus_for_handler = Rc::clone(&bus);
        let _b = bus.subscribe::<Ping, _>(move |event| {
            bus_for_handler.publish(&Pong(event.0 * 2));
        });

        bus.publish(&Ping(21));
        assert_eq!(*seen.borrow(), vec![42]);
    }
}
