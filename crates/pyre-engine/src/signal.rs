//! The emitter death signal.
//!
//! The engine announces exactly one kind of event: an emitter finished dying.
//! Listeners register plain closures; there is no event bus, no topic
//! strings, and no payloads beyond the emitter's identity. Anything richer
//! belongs to the embedding application.

use std::fmt;

use tracing::debug;

// ---------------------------------------------------------------------------
// EmitterDeath
// ---------------------------------------------------------------------------

/// Payload delivered when an emitter dies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitterDeath {
    /// The dead emitter's identifier.
    pub emitter_id: String,
}

// ---------------------------------------------------------------------------
// DeadSignal
// ---------------------------------------------------------------------------

/// Listener registry for [`EmitterDeath`] notifications.
///
/// Dispatch happens synchronously, on the thread driving the update, after
/// the dying emitter has released its particles. The signal fires exactly
/// once per death; a restarted emitter can die (and fire) again.
#[derive(Default)]
pub struct DeadSignal {
    listeners: Vec<Box<dyn FnMut(&EmitterDeath) + Send>>,
}

impl DeadSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Listeners are called in registration order.
    pub fn connect(&mut self, listener: impl FnMut(&EmitterDeath) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Drop all listeners.
    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn dispatch(&mut self, event: &EmitterDeath) {
        debug!(emitter = %event.emitter_id, listeners = self.listeners.len(), "emitter died");
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl fmt::Debug for DeadSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeadSignal")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
