//! Editor change notifications
//!
//! Listeners register per event and receive a [`TransactionEvent`] after each
//! dispatched transaction. Registration returns an id for [`EventBus::off`];
//! [`EventBus::subscribe`] wraps that in a [`Subscription`] guard that
//! deregisters when dropped.
//!
//! Listeners may register or remove listeners while an event is being
//! emitted. Additions take effect for the next emission; removals take
//! effect immediately.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use log::debug;

use super::document::EditorDocument;

/// Events emitted by the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditorEvent {
    /// After every dispatched transaction
    Transaction,
    /// After transactions that changed the document
    Update,
}

/// Payload delivered to listeners.
#[derive(Debug, Clone, Copy)]
pub struct TransactionEvent<'a> {
    pub document: &'a EditorDocument,
    /// Incremented on every transaction
    pub version: u64,
    pub doc_changed: bool,
}

/// Identifies a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Box<dyn FnMut(&TransactionEvent<'_>)>;

struct Entry {
    id: ListenerId,
    event: EditorEvent,
    callback: Listener,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Registered ids; entries missing here are skipped and dropped
    live: Vec<(ListenerId, EditorEvent)>,
    /// Callbacks not currently being run
    entries: Vec<Entry>,
    emitting: usize,
}

impl Registry {
    fn is_live(&self, id: ListenerId) -> bool {
        self.live.iter().any(|(live, _)| *live == id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// EventBus
// ─────────────────────────────────────────────────────────────────────────────

/// Listener registry shared between the editor and its subscriptions.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Rc<RefCell<Registry>>,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.borrow();
        f.debug_struct("EventBus")
            .field("listeners", &registry.live.len())
            .field("emitting", &(registry.emitting > 0))
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener.
    pub fn on<F>(&self, event: EditorEvent, listener: F) -> ListenerId
    where
        F: FnMut(&TransactionEvent<'_>) + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.live.push((id, event));
        registry.entries.push(Entry {
            id,
            event,
            callback: Box::new(listener),
        });
        id
    }

    /// Remove a listener. Returns `false` if it was not registered for `event`.
    pub fn off(&self, event: EditorEvent, id: ListenerId) -> bool {
        let removed: Vec<Entry> = {
            let mut registry = self.registry.borrow_mut();
            let before = registry.live.len();
            registry.live.retain(|&(live, ev)| !(live == id && ev == event));
            if registry.live.len() == before {
                return false;
            }
            let (removed, kept) = std::mem::take(&mut registry.entries)
                .into_iter()
                .partition(|entry| entry.id == id);
            registry.entries = kept;
            removed
        };
        // Callbacks may own subscriptions; drop them outside the borrow
        drop(removed);
        true
    }

    /// Register a listener that is removed when the returned guard drops.
    pub fn subscribe<F>(&self, event: EditorEvent, listener: F) -> Subscription
    where
        F: FnMut(&TransactionEvent<'_>) + 'static,
    {
        let id = self.on(event, listener);
        Subscription {
            registry: Rc::downgrade(&self.registry),
            event,
            id,
        }
    }

    /// Number of listeners registered for `event`.
    pub fn listener_count(&self, event: EditorEvent) -> usize {
        self.registry
            .borrow()
            .live
            .iter()
            .filter(|(_, ev)| *ev == event)
            .count()
    }

    /// Call every listener registered for `event`.
    pub fn emit(&self, event: EditorEvent, payload: &TransactionEvent<'_>) {
        let mut running = {
            let mut registry = self.registry.borrow_mut();
            registry.emitting += 1;
            std::mem::take(&mut registry.entries)
        };

        for entry in running.iter_mut().filter(|e| e.event == event) {
            // Removed by an earlier listener in this emission
            if !self.registry.borrow().is_live(entry.id) {
                continue;
            }
            (entry.callback)(payload);
        }

        let removed: Vec<Entry> = {
            let mut registry = self.registry.borrow_mut();
            registry.emitting -= 1;
            let (mut kept, removed): (Vec<Entry>, Vec<Entry>) = running
                .into_iter()
                .partition(|entry| registry.is_live(entry.id));
            kept.append(&mut registry.entries);
            registry.entries = kept;
            removed
        };
        drop(removed);
        debug!(
            "Emitted {:?} to {} listeners (version {})",
            event,
            self.listener_count(event),
            payload.version
        );
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Subscription
// ─────────────────────────────────────────────────────────────────────────────

/// Registration guard returned by [`EventBus::subscribe`].
#[must_use = "dropping a Subscription removes the listener"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    event: EditorEvent,
    id: ListenerId,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event", &self.event)
            .field("id", &self.id)
            .finish()
    }
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            EventBus { registry }.off(self.event, self.id);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
