//! The event dispatcher: maps each event kind to an ordered handler chain
//! and folds an event through that chain.
//!
//! Handlers are pure `(event, state) -> state` transforms. Each handler in a
//! chain is guarded on its own: a handler that fails leaves the accumulated
//! state exactly as it was before that handler ran, is reported in the
//! [`DispatchOutcome`], and never stops the handlers after it.

use std::collections::BTreeMap;

use groundops_types::{SimulationEvent, SimulationEventType, WorldState};
use tracing::{trace, warn};

use crate::handlers;

/// Errors a handler can report instead of a new state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The event names an entity the world does not contain.
    #[error("unknown {kind}: {key}")]
    UnknownEntity {
        /// Entity kind (`aircraft`, `vehicle`, `runway`).
        kind: &'static str,
        /// The id or callsign the event used.
        key: String,
    },

    /// The handler was registered for a kind whose payload it cannot read.
    #[error("handler expected a {expected} payload, got {actual}")]
    PayloadMismatch {
        /// Kind the handler understands.
        expected: SimulationEventType,
        /// Kind of the event it was given.
        actual: SimulationEventType,
    },

    /// Any other handler-specific failure.
    #[error("{reason}")]
    Failed {
        /// What went wrong.
        reason: String,
    },
}

/// A state transform for one event kind.
pub trait EventHandler: Send {
    /// Name used in logs and error reports.
    fn name(&self) -> &'static str;

    /// Produce the state after applying `event` to `state`.
    ///
    /// # Errors
    ///
    /// Returns a [`HandlerError`] when the event cannot be applied; the
    /// dispatcher then keeps `state` unchanged.
    fn apply(&self, event: &SimulationEvent, state: &WorldState)
    -> Result<WorldState, HandlerError>;
}

/// A handler that failed during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    /// Name of the failing handler.
    pub handler: &'static str,
    /// The reported error.
    pub error: HandlerError,
}

/// Result of folding one event through its handler chain.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    /// The state after every successful handler ran.
    pub state: WorldState,
    /// Number of handlers invoked (successful or not).
    pub handlers_run: usize,
    /// Handlers that failed, in chain order.
    pub failures: Vec<HandlerFailure>,
}

impl DispatchOutcome {
    /// Whether at least one handler changed nothing because it failed.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Whether any handler in the chain succeeded.
    pub fn applied(&self) -> bool {
        self.handlers_run > self.failures.len()
    }
}

/// Registry of handler chains keyed by event kind.
pub struct Dispatcher {
    chains: BTreeMap<SimulationEventType, Vec<Box<dyn EventHandler>>>,
}

impl core::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let chains: BTreeMap<&str, Vec<&str>> = self
            .chains
            .iter()
            .map(|(kind, chain)| (kind.as_str(), chain.iter().map(|h| h.name()).collect()))
            .collect();
        f.debug_struct("Dispatcher").field("chains", &chains).finish()
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_builtin_handlers()
    }
}

impl Dispatcher {
    /// A dispatcher with no handlers at all.
    pub const fn empty() -> Self {
        Self {
            chains: BTreeMap::new(),
        }
    }

    /// A dispatcher with one built-in handler per event kind.
    pub fn with_builtin_handlers() -> Self {
        let mut dispatcher = Self::empty();
        for kind in SimulationEventType::ALL {
            dispatcher.register(kind, handlers::builtin(kind));
        }
        dispatcher
    }

    /// Append `handler` to the chain for `kind`.
    pub fn register(&mut self, kind: SimulationEventType, handler: Box<dyn EventHandler>) {
        trace!(event_type = kind.as_str(), handler = handler.name(), "Handler registered");
        self.chains.entry(kind).or_default().push(handler);
    }

    /// Names of the handlers registered for `kind`, in chain order.
    pub fn handler_names(&self, kind: SimulationEventType) -> Vec<&'static str> {
        self.chains
            .get(&kind)
            .map(|chain| chain.iter().map(|h| h.name()).collect())
            .unwrap_or_default()
    }

    /// Fold `event` through the chain registered for its kind.
    ///
    /// An event kind with no handlers is a warning and a no-op.
    pub fn dispatch(&self, event: &SimulationEvent, state: &WorldState) -> DispatchOutcome {
        let kind = event.event_type();
        let Some(chain) = self.chains.get(&kind).filter(|c| !c.is_empty()) else {
            warn!(event_id = %event.id, event_type = kind.as_str(), "No handler registered");
            return DispatchOutcome {
                state: state.clone(),
                handlers_run: 0,
                failures: Vec::new(),
            };
        };

        let mut current = state.clone();
        let mut failures = Vec::new();
        for handler in chain {
            match handler.apply(event, &current) {
                Ok(next) => current = next,
                Err(error) => failures.push(HandlerFailure {
                    handler: handler.name(),
                    error,
                }),
            }
        }

        DispatchOutcome {
            state: current,
            handlers_run: chain.len(),
            failures,
        }
    }
}
