// File: rusty-constraints-events/src/lib.rs
// Purpose: Main entry point for rusty-constraints-events

//! # rusty-constraints-events
//!
//! A small named-event emitter. Each owner keeps one emitter per capability
//! (validate, did-validate, reset, ...) instead of stacking emitter layers.
//!
//! ```rust
//! use std::sync::Arc;
//! use rusty_constraints_events::{SyncEmitter, SyncListener};
//!
//! let emitter: SyncEmitter<&'static str, u32, u32> = SyncEmitter::new();
//! let double: Arc<SyncListener<u32, u32>> = Arc::new(|n: &u32| n * 2);
//! emitter.add_listener("tick", double).unwrap();
//!
//! assert_eq!(emitter.emit_sync(&"tick", &21), vec![42]);
//! assert!(emitter.emit_sync(&"unknown", &1).is_empty());
//! ```

pub mod emitter;
pub mod error;

pub use emitter::{AsyncEmitter, AsyncListener, EventEmitter, SyncEmitter, SyncListener};
pub use error::EmitterError;
