//! In-process publish/subscribe for room lifecycle events.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::Notify;

use roomdrop_core::events::{Event, EventName};

/// Single-slot mailbox per subscription.
///
/// Holds at most one event; a publish into a full mailbox replaces the
/// buffered event. Latest-value-wins, not at-least-once delivery.
#[derive(Debug, Default)]
struct Mailbox {
    slot: Mutex<Option<Event>>,
    notify: Notify,
    closed: AtomicBool,
}

/// Event bus keyed by [`EventName`].
///
/// `publish` never blocks the publisher regardless of how slowly
/// subscribers read, and is safe to call concurrently with subscribe
/// and unsubscribe on the same topic.
#[derive(Debug, Default)]
pub struct EventBus {
    topics: Mutex<HashMap<EventName, Vec<Arc<Mailbox>>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscription for `name`.
    pub fn subscribe(self: &Arc<Self>, name: EventName) -> Subscription {
        let mailbox = Arc::new(Mailbox::default());
        self.lock_topics()
            .entry(name)
            .or_default()
            .push(mailbox.clone());
        Subscription {
            bus: Arc::downgrade(self),
            name,
            mailbox,
        }
    }

    /// Deliver `event` to every subscriber of its topic.
    pub fn publish(&self, event: Event) {
        let topics = self.lock_topics();
        let Some(mailboxes) = topics.get(&event.name) else {
            return;
        };
        for mailbox in mailboxes {
            if mailbox.closed.load(Ordering::Acquire) {
                continue;
            }
            *mailbox.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(event.clone());
            mailbox.notify.notify_one();
        }
    }

    fn lock_topics(&self) -> std::sync::MutexGuard<'_, HashMap<EventName, Vec<Arc<Mailbox>>>> {
        self.topics.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn remove(&self, name: EventName, mailbox: &Arc<Mailbox>) {
        let mut topics = self.lock_topics();
        if let Some(mailboxes) = topics.get_mut(&name) {
            mailboxes.retain(|m| !Arc::ptr_eq(m, mailbox));
            if mailboxes.is_empty() {
                topics.remove(&name);
            }
        }
    }
}

/// Receiving half of one subscription.
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    bus: Weak<EventBus>,
    name: EventName,
    mailbox: Arc<Mailbox>,
}

impl Subscription {
    /// Wait for the next event. Returns `None` once unsubscribed.
    pub async fn recv(&mut self) -> Option<Event> {
        loop {
            if let Some(event) = self.take() {
                return Some(event);
            }
            if self.mailbox.closed.load(Ordering::Acquire) {
                return None;
            }
            self.mailbox.notify.notified().await;
        }
    }

    /// Take the buffered event, if any, without waiting.
    pub fn try_recv(&mut self) -> Option<Event> {
        self.take()
    }

    /// Remove this subscription and close its mailbox. Idempotent; safe
    /// to call concurrently with publish.
    pub fn unsubscribe(&self) {
        if self.mailbox.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(bus) = self.bus.upgrade() {
            bus.remove(self.name, &self.mailbox);
        }
        // Wake a pending recv so it observes the close.
        self.mailbox.notify.notify_one();
    }

    fn take(&self) -> Option<Event> {
        self.mailbox
            .slot
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
