//! Named, synchronous broadcast between decoupled parts of the application.
//!
//! Dispatch mirrors a DOM `EventTarget`: listeners for a name run in
//! registration order on the thread that calls [`EventBus::emit`], adding the
//! same listener twice is a no-op, and a listener removed mid-dispatch is
//! skipped. The registry lock is never held while listener code runs, so
//! listeners may call back into the bus.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, trace, warn};

/// One dispatch, as seen by a listener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusEvent<P = Value> {
    pub name: String,
    pub payload: Option<P>,
}

/// A registered callback. Identity is the `Arc` allocation: pass the same
/// handle to [`EventBus::off`] that was given to [`EventBus::on`].
pub type Listener<P = Value> = Arc<dyn Fn(&BusEvent<P>) + Send + Sync>;

/// Anything events can be pushed into.
pub trait EventSink<P = Value>: Send + Sync {
    fn emit(&self, name: &str, payload: Option<P>);
}

struct Registration<P> {
    listener: Listener<P>,
    removed: AtomicBool,
}

impl<P> Registration<P> {
    fn retire(&self) {
        self.removed.store(true, Ordering::Release);
    }

    fn is_retired(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }
}

struct Registry<P> {
    by_name: HashMap<String, Vec<Arc<Registration<P>>>>,
}

fn same_listener<P>(a: &Listener<P>, b: &Listener<P>) -> bool {
    // Compare data pointers only; vtable pointers are not unique per type.
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Cloning yields another handle to the same listener registry.
pub struct EventBus<P = Value> {
    inner: Arc<Mutex<Registry<P>>>,
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                by_name: HashMap::new(),
            })),
        }
    }

    fn registry(&self) -> MutexGuard<'_, Registry<P>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("event bus registry lock poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Delivers `payload` to every listener currently registered for `name`.
    ///
    /// Listeners added during this dispatch are not called by it. A panicking
    /// listener unwinds out of `emit` and the rest are not called.
    pub fn emit(&self, name: &str, payload: Option<P>) {
        let snapshot: Vec<Arc<Registration<P>>> = match self.registry().by_name.get(name) {
            Some(regs) => regs.clone(),
            None => {
                trace!(event = name, "no listeners");
                return;
            }
        };

        trace!(event = name, listeners = snapshot.len(), "dispatching");
        let event = BusEvent {
            name: name.to_string(),
            payload,
        };
        for reg in snapshot {
            if reg.is_retired() {
                continue;
            }
            (reg.listener)(&event);
        }
    }

    /// Registers `listener` for `name`. Registering the same handle again
    /// for the same name does nothing.
    pub fn on(&self, name: &str, listener: Listener<P>) {
        let mut registry = self.registry();
        let regs = registry.by_name.entry(name.to_string()).or_default();
        if regs.iter().any(|r| same_listener(&r.listener, &listener)) {
            trace!(event = name, "listener already registered");
            return;
        }
        regs.push(Arc::new(Registration {
            listener,
            removed: AtomicBool::new(false),
        }));
        debug!(event = name, listeners = regs.len(), "listener added");
    }

    /// Wraps `f` in a [`Listener`], registers it, and returns the handle
    /// needed to remove it later.
    pub fn on_fn<F>(&self, name: &str, f: F) -> Listener<P>
    where
        F: Fn(&BusEvent<P>) + Send + Sync + 'static,
    {
        let listener: Listener<P> = Arc::new(f);
        self.on(name, Arc::clone(&listener));
        listener
    }

    /// Removes `listener` from `name`. Unknown listeners are ignored.
    pub fn off(&self, name: &str, listener: &Listener<P>) {
        let mut registry = self.registry();
        let Some(regs) = registry.by_name.get_mut(name) else {
            return;
        };
        let Some(pos) = regs
            .iter()
            .position(|r| same_listener(&r.listener, listener))
        else {
            return;
        };
        let removed = regs.remove(pos);
        let remaining = regs.len();
        if remaining == 0 {
            registry.by_name.remove(name);
        }
        drop(registry);

        // Captured state may touch the bus when dropped.
        removed.retire();
        drop(removed);
        debug!(event = name, listeners = remaining, "listener removed");
    }

    pub fn listener_count(&self, name: &str) -> usize {
        self.registry().by_name.get(name).map_or(0, Vec::len)
    }

    pub fn has_listeners(&self, name: &str) -> bool {
        self.listener_count(name) > 0
    }

    /// Drops every listener for `name`.
    pub fn clear(&self, name: &str) {
        let removed = self.registry().by_name.remove(name);
        if let Some(regs) = removed {
            regs.iter().for_each(|r| r.retire());
            debug!(event = name, removed = regs.len(), "listeners cleared");
        }
    }

    pub fn clear_all(&self) {
        let removed = std::mem::take(&mut self.registry().by_name);
        for regs in removed.values() {
            regs.iter().for_each(|r| r.retire());
        }
        drop(removed);
        debug!("all listeners cleared");
    }
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Clone for EventBus<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P> fmt::Debug for EventBus<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let registry = self.registry();
        let mut names: Vec<(&str, usize)> = registry
            .by_name
            .iter()
            .map(|(name, regs)| (name.as_str(), regs.len()))
            .collect();
        names.sort_unstable();
        f.debug_struct("EventBus").field("listeners", &names).finish()
    }
}

impl<P> EventSink<P> for EventBus<P> {
    fn emit(&self, name: &str, payload: Option<P>) {
        EventBus::emit(self, name, payload);
    }
}
