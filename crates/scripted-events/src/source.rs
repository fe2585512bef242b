// Host event sources
// The host exposes a fixed set of event sources grouped by handler; anything can
// subscribe a callback to a source and must unsubscribe with the same callback.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;

use crate::args::{EventArgs, EventKind};

/// Whether a source delivers a payload to its callbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadShape {
    None,
    Typed,
}

/// One event source the host exposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventSourceDescriptor {
    /// Handler group the source belongs to (e.g. "Player", "Server")
    pub handler: &'static str,
    pub event: EventKind,
    pub shape: PayloadShape,
}

impl EventSourceDescriptor {
    pub const fn new(handler: &'static str, event: EventKind, shape: PayloadShape) -> Self {
        Self {
            handler,
            event,
            shape,
        }
    }

    pub fn name(&self) -> &'static str {
        self.event.name()
    }
}

/// Callback installed on an event source
#[derive(Clone)]
pub enum EventCallback {
    Bare(Arc<dyn Fn() + Send + Sync>),
    Typed(Arc<dyn Fn(&mut EventArgs) + Send + Sync>),
}

impl EventCallback {
    pub fn bare(f: impl Fn() + Send + Sync + 'static) -> Self {
        EventCallback::Bare(Arc::new(f))
    }

    pub fn typed(f: impl Fn(&mut EventArgs) + Send + Sync + 'static) -> Self {
        EventCallback::Typed(Arc::new(f))
    }

    pub fn shape(&self) -> PayloadShape {
        match self {
            EventCallback::Bare(_) => PayloadShape::None,
            EventCallback::Typed(_) => PayloadShape::Typed,
        }
    }

    /// Identity comparison; two clones of the same callback are the same
    pub fn same_as(&self, other: &EventCallback) -> bool {
        match (self, other) {
            (EventCallback::Bare(a), EventCallback::Bare(b)) => Arc::ptr_eq(a, b),
            (EventCallback::Typed(a), EventCallback::Typed(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl std::fmt::Debug for EventCallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventCallback::Bare(_) => write!(f, "EventCallback::Bare"),
            EventCallback::Typed(_) => write!(f, "EventCallback::Typed"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("event source {handler}.{event} is not known to the host")]
    UnknownSource {
        handler: &'static str,
        event: &'static str,
    },
    #[error("event source {handler}.{event} expects a {expected:?} callback")]
    ShapeMismatch {
        handler: &'static str,
        event: &'static str,
        expected: PayloadShape,
    },
}

/// The host's registry of subscribable event sources
pub trait EventSourceRegistry: Send + Sync {
    /// Every source the host knows about
    fn sources(&self) -> Vec<EventSourceDescriptor>;

    fn subscribe(
        &self,
        source: &EventSourceDescriptor,
        callback: EventCallback,
    ) -> Result<(), SubscribeError>;

    /// Remove a callback previously passed to `subscribe`. Returns false if it
    /// was not installed.
    fn unsubscribe(&self, source: &EventSourceDescriptor, callback: &EventCallback) -> bool;
}

/// In-process event source registry; raising an event runs its callbacks
/// synchronously on the caller's thread
pub struct EventHub {
    sources: Vec<EventSourceDescriptor>,
    handlers: Mutex<HashMap<EventSourceDescriptor, Vec<EventCallback>>>,
}

impl EventHub {
    /// Hub exposing the standard server sources
    pub fn new() -> Self {
        Self::with_sources(Self::standard_sources())
    }

    pub fn with_sources(sources: Vec<EventSourceDescriptor>) -> Self {
        Self {
            sources,
            handlers: Mutex::new(HashMap::new()),
        }
    }

    pub fn standard_sources() -> Vec<EventSourceDescriptor> {
        use EventKind::*;
        use PayloadShape::{None as Bare, Typed};

        vec![
            EventSourceDescriptor::new("Server", WaitingForPlayers, Bare),
            EventSourceDescriptor::new("Server", RoundStarted, Bare),
            EventSourceDescriptor::new("Server", RoundEnded, Typed),
            EventSourceDescriptor::new("Server", RestartingRound, Bare),
            EventSourceDescriptor::new("Player", Joined, Typed),
            EventSourceDescriptor::new("Player", Left, Typed),
            EventSourceDescriptor::new("Player", ChangingRole, Typed),
            EventSourceDescriptor::new("Player", Spawned, Typed),
            EventSourceDescriptor::new("Player", Hurting, Typed),
            EventSourceDescriptor::new("Player", Died, Typed),
            EventSourceDescriptor::new("Player", InteractingDoor, Typed),
            EventSourceDescriptor::new("Player", ActivatingGenerator, Typed),
            EventSourceDescriptor::new("Map", Decontaminating, Typed),
        ]
    }

    /// Raise a typed event on every source exposing its kind
    pub fn raise(&self, args: &mut EventArgs) {
        let kind = args.kind();
        for callback in self.callbacks_for(kind, PayloadShape::Typed) {
            if let EventCallback::Typed(f) = callback {
                f(args);
            }
        }
    }

    /// Raise a payload-less event
    pub fn raise_bare(&self, kind: EventKind) {
        for callback in self.callbacks_for(kind, PayloadShape::None) {
            if let EventCallback::Bare(f) = callback {
                f();
            }
        }
    }

    /// Number of callbacks installed across all sources for `kind`
    pub fn handler_count(&self, kind: EventKind) -> usize {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        handlers
            .iter()
            .filter(|(source, _)| source.event == kind)
            .map(|(_, callbacks)| callbacks.len())
            .sum()
    }

    // Snapshot so callbacks may subscribe/unsubscribe while being raised
    fn callbacks_for(&self, kind: EventKind, shape: PayloadShape) -> Vec<EventCallback> {
        let handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        self.sources
            .iter()
            .filter(|source| source.event == kind && source.shape == shape)
            .filter_map(|source| handlers.get(source))
            .flat_map(|callbacks| callbacks.iter().cloned())
            .collect()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSourceRegistry for EventHub {
    fn sources(&self) -> Vec<EventSourceDescriptor> {
        self.sources.clone()
    }

    fn subscribe(
        &self,
        source: &EventSourceDescriptor,
        callback: EventCallback,
    ) -> Result<(), SubscribeError> {
        if !self.sources.contains(source) {
            return Err(SubscribeError::UnknownSource {
                handler: source.handler,
                event: source.name(),
            });
        }
        if callback.shape() != source.shape {
            return Err(SubscribeError::ShapeMismatch {
                handler: source.handler,
                event: source.name(),
                expected: source.shape,
            });
        }

        debug!(target: "events", "Subscribed callback to {}.{}", source.handler, source.name());
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(*source)
            .or_default()
            .push(callback);
        Ok(())
    }

    fn unsubscribe(&self, source: &EventSourceDescriptor, callback: &EventCallback) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(callbacks) = handlers.get_mut(source) else {
            return false;
        };

        let before = callbacks.len();
        callbacks.retain(|installed| !installed.same_as(callback));
        let removed = callbacks.len() != before;
        if callbacks.is_empty() {
            handlers.remove(source);
        }

        if removed {
            debug!(target: "events", "Unsubscribed callback from {}.{}", source.handler, source.name());
        }
        removed
    }
}
