//! Named event subscriptions shared by models and collections.
//!
//! Listeners fire synchronously, in registration order, on the thread that
//! emits. The listener list is snapshotted before dispatch so handlers can
//! subscribe or unsubscribe without deadlocking the emitter.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Event name that addresses every registered listener.
pub const WILDCARD: &str = "*";

/// Fired on a model after a successful load, save or create.
pub const SYNC: &str = "sync";

/// Fired on a model once it has been deleted.
pub const DELETE: &str = "delete";

/// Fired on a model when a sync request fails.
pub const ERROR: &str = "error";

/// Fired on a collection when a member model is deleted.
pub const MODEL_DELETE: &str = "model:delete";

/// Fired on a collection for every model added to it.
pub const ADD: &str = "add";

/// Handle returned by [`EventEmitter::on`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Handler<A> = Arc<dyn Fn(&A) + Send + Sync>;

struct Listener<A> {
    id: ListenerId,
    handler: Handler<A>,
}

/// Per-instance registry of named listeners receiving `&A`.
pub struct EventEmitter<A> {
    listeners: Mutex<HashMap<String, Vec<Listener<A>>>>,
    next_id: AtomicU64,
}

impl<A: 'static> EventEmitter<A> {
    /// Creates an empty emitter.
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a handler for `name`.
    pub fn on<F>(&self, name: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .entry(name.into())
            .or_default()
            .push(Listener {
                id,
                handler: Arc::new(handler),
            });
        id
    }

    /// Registers a handler that receives `context` as its receiver on every call.
    pub fn on_with_context<C, F>(&self, name: impl Into<String>, context: C, handler: F) -> ListenerId
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &A) + Send + Sync + 'static,
    {
        self.on(name, move |arg| handler(&context, arg))
    }

    /// Removes listeners and returns how many were dropped.
    ///
    /// With `Some(id)` only that listener goes; with `None` every listener for
    /// `name` goes. The [`WILDCARD`] name clears the whole registry.
    pub fn off(&self, name: &str, id: Option<ListenerId>) -> usize {
        if name == WILDCARD {
            return self.clear();
        }

        let mut listeners = self.listeners.lock();
        let Some(entries) = listeners.get_mut(name) else {
            return 0;
        };

        let before = entries.len();
        match id {
            Some(id) => entries.retain(|l| l.id != id),
            None => entries.clear(),
        }
        let removed = before - entries.len();

        if entries.is_empty() {
            listeners.remove(name);
        }
        removed
    }

    /// Drops every listener for every name.
    pub fn clear(&self) -> usize {
        let mut listeners = self.listeners.lock();
        let removed = listeners.values().map(Vec::len).sum();
        listeners.clear();
        removed
    }

    /// Invokes every listener for `name` and returns how many ran.
    ///
    /// Emitting [`WILDCARD`] is a teardown request and clears the registry.
    pub fn emit(&self, name: &str, arg: &A) -> usize {
        if name == WILDCARD {
            self.clear();
            return 0;
        }

        let handlers: Vec<Handler<A>> = match self.listeners.lock().get(name) {
            Some(entries) => entries.iter().map(|l| Arc::clone(&l.handler)).collect(),
            None => return 0,
        };

        tracing::trace!(event = name, listeners = handlers.len(), "dispatching event");
        for handler in &handlers {
            handler(arg);
        }
        handlers.len()
    }

    /// Returns the number of listeners for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.listeners.lock().get(name).map_or(0, Vec::len)
    }

    /// Returns true if no listener is registered under any name.
    pub fn is_empty(&self) -> bool {
        self.listeners.lock().is_empty()
    }
}

impl<A: 'static> Default for EventEmitter<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for EventEmitter<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.lock();
        let mut names: Vec<(&String, usize)> =
            listeners.iter().map(|(k, v)| (k, v.len())).collect();
        names.sort();
        f.debug_struct("EventEmitter")
            .field("listeners", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&str) -> Box<dyn Fn(&u32) + Send + Sync>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        let make = move |tag: &str| -> Box<dyn Fn(&u32) + Send + Sync> {
            let sink = Arc::clone(&sink);
            let tag = tag.to_string();
            Box::new(move |n: &u32| sink.lock().push(format!("{tag}:{n}")))
        };
        (log, make)
    }

    #[test]
    fn emit_in_registration_order() {
        let emitter = EventEmitter::<u32>::new();
        let (log, make) = recorder();

        emitter.on("sync", make("a"));
        emitter.on("sync", make("b"));
        emitter.on("delete", make("c"));

        assert_eq!(emitter.emit("sync", &7), 2);
        assert_eq!(*log.lock(), vec!["a:7", "b:7"]);
    }

    #[test]
    fn emit_without_listeners_is_noop() {
        let emitter = EventEmitter::<u32>::new();
        assert_eq!(emitter.emit("nothing", &1), 0);
    }

    #[test]
    fn off_single_listener() {
        let emitter = EventEmitter::<u32>::new();
        let (log, make) = recorder();

        let first = emitter.on("sync", make("a"));
        emitter.on("sync", make("b"));

        assert_eq!(emitter.off("sync", Some(first)), 1);
        emitter.emit("sync", &1);
        assert_eq!(*log.lock(), vec!["b:1"]);
    }

    #[test]
    fn off_all_for_name() {
        let emitter = EventEmitter::<u32>::new();
        let (_, make) = recorder();

        emitter.on("sync", make("a"));
        emitter.on("sync", make("b"));
        emitter.on("delete", make("c"));

        assert_eq!(emitter.off("sync", None), 2);
        assert_eq!(emitter.listener_count("sync"), 0);
        assert_eq!(emitter.listener_count("delete"), 1);
    }

    #[test]
    fn wildcard_clears_everything() {
        let emitter = EventEmitter::<u32>::new();
        let (_, make) = recorder();

        emitter.on("sync", make("a"));
        emitter.on("delete", make("b"));
        assert_eq!(emitter.off(WILDCARD, None), 2);
        assert!(emitter.is_empty());

        emitter.on("sync", make("a"));
        emitter.on("delete", make("b"));
        emitter.emit(WILDCARD, &0);
        assert!(emitter.is_empty());
    }

    #[test]
    fn context_is_passed_as_receiver() {
        let emitter = EventEmitter::<u32>::new();
        let totals = Arc::new(Mutex::new(0u32));

        emitter.on_with_context("sync", Arc::clone(&totals), |totals, n| {
            *totals.lock() += n;
        });
        emitter.emit("sync", &3);
        emitter.emit("sync", &4);

        assert_eq!(*totals.lock(), 7);
    }

    #[test]
    fn handlers_may_unsubscribe_during_dispatch() {
        let emitter = Arc::new(EventEmitter::<u32>::new());
        let calls = Arc::new(Mutex::new(0u32));

        let inner = Arc::clone(&emitter);
        let counter = Arc::clone(&calls);
        emitter.on("once", move |_| {
            *counter.lock() += 1;
            inner.off("once", None);
        });

        emitter.emit("once", &0);
        emitter.emit("once", &0);
        assert_eq!(*calls.lock(), 1);
    }
}
