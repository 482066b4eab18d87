// File: rusty-constraints-events/src/emitter.rs
// Purpose: Named-event listener registry with sync and sequential async emission

use futures::future::BoxFuture;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::EmitterError;

/// Listener called synchronously with a borrowed argument
pub type SyncListener<A, R> = dyn Fn(&A) -> R + Send + Sync;

/// Listener returning a future; awaited before the next listener runs
pub type AsyncListener<A, R> = dyn Fn(A) -> BoxFuture<'static, R> + Send + Sync;

pub type SyncEmitter<E, A, R = ()> = EventEmitter<E, SyncListener<A, R>>;
pub type AsyncEmitter<E, A, R = ()> = EventEmitter<E, AsyncListener<A, R>>;

/// Registry of listeners grouped by event key, kept in registration order.
///
/// Listener identity is the identity of the `Arc` handed to
/// [`add_listener`](Self::add_listener); keep that `Arc` around to remove it later.
pub struct EventEmitter<E, L: ?Sized> {
    listeners: Mutex<HashMap<E, Vec<Arc<L>>>>,
}

impl<E, L: ?Sized> EventEmitter<E, L>
where
    E: Eq + Hash + Clone + fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<E, Vec<Arc<L>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a listener for an event
    ///
    /// Registering the same listener twice for one event is an error.
    pub fn add_listener(&self, event: E, listener: Arc<L>) -> Result<(), EmitterError> {
        let mut listeners = self.lock();
        let registered = listeners.entry(event.clone()).or_default();

        if registered.iter().any(|l| Arc::ptr_eq(l, &listener)) {
            return Err(EmitterError::DuplicateListener {
                event: format!("{:?}", event),
            });
        }

        registered.push(listener);
        Ok(())
    }

    /// Remove one registration of a listener
    pub fn remove_listener(&self, event: &E, listener: &Arc<L>) -> Result<(), EmitterError> {
        let mut listeners = self.lock();

        let registered = listeners
            .get_mut(event)
            .ok_or_else(|| EmitterError::UnknownEvent {
                event: format!("{:?}", event),
            })?;

        let index = registered
            .iter()
            .position(|l| Arc::ptr_eq(l, listener))
            .ok_or_else(|| EmitterError::ListenerNotFound {
                event: format!("{:?}", event),
            })?;

        registered.remove(index);

        if registered.is_empty() {
            listeners.remove(event);
        }

        Ok(())
    }

    /// Snapshot of the listeners for an event, in registration order
    pub fn listeners(&self, event: &E) -> Vec<Arc<L>> {
        self.lock().get(event).cloned().unwrap_or_default()
    }

    pub fn listener_count(&self, event: &E) -> usize {
        self.lock().get(event).map_or(0, Vec::len)
    }

    /// Number of events with at least one listener
    pub fn event_count(&self) -> usize {
        self.lock().len()
    }
}

impl<E, A, R> EventEmitter<E, SyncListener<A, R>>
where
    E: Eq + Hash + Clone + fmt::Debug,
{
    /// Call every listener of `event` in registration order and collect the results
    ///
    /// An event without listeners yields an empty list.
    pub fn emit_sync(&self, event: &E, args: &A) -> Vec<R> {
        let listeners = self.listeners(event);
        tracing::trace!("emit_sync {:?} to {} listener(s)", event, listeners.len());

        listeners.iter().map(|listener| listener(args)).collect()
    }
}

impl<E, A, R> EventEmitter<E, AsyncListener<A, R>>
where
    E: Eq + Hash + Clone + fmt::Debug,
    A: Clone,
{
    /// Call every listener of `event` one at a time, awaiting each before the next
    ///
    /// Listeners may mutate shared state that later listeners read, so they are
    /// never run concurrently.
    pub async fn emit_async(&self, event: &E, args: A) -> Vec<R> {
        let listeners = self.listeners(event);
        tracing::trace!("emit_async {:?} to {} listener(s)", event, listeners.len());

        let mut results = Vec::with_capacity(listeners.len());
        for listener in listeners {
            results.push(listener(args.clone()).await);
        }
        results
    }
}

impl<E, L: ?Sized> Default for EventEmitter<E, L>
where
    E: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<E, L: ?Sized> fmt::Debug for EventEmitter<E, L>
where
    E: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.lock();
        let mut map = f.debug_map();
        for (event, registered) in listeners.iter() {
            map.entry(event, &registered.len());
        }
        map.finish()
    }
}
