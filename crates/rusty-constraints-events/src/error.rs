// File: rusty-constraints-events/src/error.rs
// Purpose: Listener registration errors

/// Listener bookkeeping mistakes. These are programmer errors and are never
/// swallowed by the emitter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitterError {
    #[error("listener already registered for event {event}")]
    DuplicateListener { event: String },

    #[error("unknown event {event}")]
    UnknownEvent { event: String },

    #[error("listener not found for event {event}")]
    ListenerNotFound { event: String },
}
