use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    progress::{ProgressStore, ReadSet},
    scope::Scope,
    search::{SearchFilterSnapshot, SearchFilters, SearchStateCache},
};

/// Current signed-in identity, if any, with change subscription.
pub struct IdentityProvider {
    tx: watch::Sender<Option<String>>,
}

impl Default for IdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityProvider {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx }
    }

    #[tracing::instrument(name = "sign in", skip_all)]
    pub fn sign_in(&self, user_id: impl Into<String>) {
        let user_id = user_id.into();
        let next = (!user_id.is_empty()).then_some(user_id);
        self.replace(next);
    }

    #[tracing::instrument(name = "sign out", skip_all)]
    pub fn sign_out(&self) {
        self.replace(None);
    }

    pub fn current(&self) -> Option<String> {
        self.tx.borrow().clone()
    }

    pub fn current_scope(&self) -> Scope {
        Scope::from_identity(self.tx.borrow().as_deref())
    }

    /// Receivers observe a change only when the identity actually differs.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.tx.subscribe()
    }

    fn replace(&self, next: Option<String>) {
        self.tx.send_if_modified(|current| {
            if *current == next {
                return false;
            }
            *current = next;
            true
        });
    }
}

/// Stores bound to whichever identity is current at call time.
#[derive(Clone)]
pub struct ReadingSession {
    identity: Arc<IdentityProvider>,
    progress: ProgressStore,
    search: SearchStateCache,
}

impl ReadingSession {
    pub fn new(
        identity: Arc<IdentityProvider>,
        progress: ProgressStore,
        search: SearchStateCache,
    ) -> Self {
        Self {
            identity,
            progress,
            search,
        }
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn scope(&self) -> Scope {
        self.identity.current_scope()
    }

    pub fn read_chapters(&self) -> ReadSet {
        self.progress.read_chapters(&self.scope())
    }

    pub fn mark_chapter_as_read(&self, chapter_id: &str) -> bool {
        self.progress.mark_chapter_as_read(&self.scope(), chapter_id)
    }

    pub fn currently_reading(&self, manga_id: &str) -> Option<String> {
        self.progress.currently_reading(&self.scope(), manga_id)
    }

    pub fn set_currently_reading(&self, manga_id: &str, chapter_id: &str) -> bool {
        self.progress
            .set_currently_reading(&self.scope(), manga_id, chapter_id)
    }

    pub fn remove_currently_reading(&self, manga_id: &str) -> bool {
        self.progress.remove_currently_reading(&self.scope(), manga_id)
    }

    pub fn load_search(&self) -> Option<SearchFilterSnapshot> {
        self.search.load_snapshot(&self.scope())
    }

    pub fn save_search(&self, filters: &SearchFilters) -> bool {
        self.search.save_snapshot(&self.scope(), filters)
    }

    pub fn clear_search(&self) {
        self.search.clear_snapshot(&self.scope())
    }
}
