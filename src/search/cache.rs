use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::{
    scope::{SEARCH_FILTERS_KEY, Scope},
    storage::KeyValueStorage,
};

use super::model::{SearchFilterSnapshot, SearchFilters};

pub const DEFAULT_TTL_MINUTES: i64 = 30;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Last executed search per scope, dropped once older than the TTL.
#[derive(Clone)]
pub struct SearchStateCache {
    storage: Arc<dyn KeyValueStorage>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SearchStateCache {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_clock(
            storage,
            Arc::new(SystemClock),
            Duration::minutes(DEFAULT_TTL_MINUTES),
        )
    }

    pub fn with_clock(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>, ttl: Duration) -> Self {
        Self {
            storage,
            clock,
            ttl,
        }
    }

    /// Expired or unreadable records are removed as a side effect.
    #[tracing::instrument(name = "load search snapshot", skip(self))]
    pub fn load_snapshot(&self, scope: &Scope) -> Option<SearchFilterSnapshot> {
        let key = scope.storage_key(SEARCH_FILTERS_KEY);

        let raw = match self.storage.get(&key) {
            Ok(raw) => raw?,
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Search snapshot read failed");
                return None;
            }
        };

        let snapshot: SearchFilterSnapshot = match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::warn!(err.msg = %error, "Search snapshot is malformed, purging");
                self.purge(&key);
                return None;
            }
        };

        if self.clock.now() - snapshot.timestamp >= self.ttl {
            tracing::debug!(captured_at = %snapshot.timestamp, "Search snapshot expired, purging");
            self.purge(&key);
            return None;
        }

        Some(snapshot)
    }

    /// Replaces whatever was cached for the scope. Returns false when the
    /// write did not go through.
    #[tracing::instrument(name = "save search snapshot", skip(self, filters))]
    pub fn save_snapshot(&self, scope: &Scope, filters: &SearchFilters) -> bool {
        let snapshot = SearchFilterSnapshot {
            filters: filters.clone(),
            timestamp: self.clock.now(),
        };

        let result = serde_json::to_string(&snapshot)
            .map_err(crate::storage::StorageError::from)
            .and_then(|raw| self.storage.set(&scope.storage_key(SEARCH_FILTERS_KEY), raw));

        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, "Search snapshot write failed");
                false
            }
        }
    }

    #[tracing::instrument(name = "clear search snapshot", skip(self))]
    pub fn clear_snapshot(&self, scope: &Scope) {
        self.purge(&scope.storage_key(SEARCH_FILTERS_KEY));
    }

    fn purge(&self, key: &str) {
        if let Err(error) = self.storage.remove(key) {
            tracing::warn!(err.msg = %error, err.details = ?error, key, "Search snapshot removal failed");
        }
    }
}
