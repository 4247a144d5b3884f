use std::{
    collections::HashMap,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use crate::scope::Scope;

/// Tag carried by one in-flight search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub scope: Scope,
    pub seq: u64,
}

/// Tracks the most recently issued search per scope so that a response
/// arriving after a newer search was started can be discarded.
#[derive(Default)]
pub struct SearchSequence {
    next: AtomicU64,
    latest: Mutex<HashMap<Scope, u64>>,
}

impl SearchSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&self, scope: &Scope) -> SearchTicket {
        let seq = self.next.fetch_add(1, Ordering::SeqCst) + 1;

        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);
        latest.insert(scope.clone(), seq);

        SearchTicket {
            scope: scope.clone(),
            seq,
        }
    }

    pub fn is_latest(&self, ticket: &SearchTicket) -> bool {
        let latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);

        latest.get(&ticket.scope) == Some(&ticket.seq)
    }

    /// Forgets the scope once its latest search is done. A superseded
    /// ticket leaves the newer entry in place.
    pub fn finish(&self, ticket: &SearchTicket) {
        let mut latest = self.latest.lock().unwrap_or_else(PoisonError::into_inner);

        if latest.get(&ticket.scope) == Some(&ticket.seq) {
            latest.remove(&ticket.scope);
        }
    }

    pub fn in_flight(&self) -> usize {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
