use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::broadcast;

use crate::{
    notify::{ChangeKind, ChangeNotifier, ProgressChange},
    scope::{CURRENTLY_READING_KEY, READ_CHAPTERS_KEY, Scope},
    storage::KeyValueStorage,
};

pub type ReadSet = BTreeSet<String>;
pub type CurrentlyReadingMap = BTreeMap<String, String>;

/// Read and in-progress chapters per identity scope.
///
/// Storage failures never leave this type: reads fall back to empty
/// structures and mutations report `false` without notifying. A chapter in
/// the read set is never the in-progress chapter of any manga in the same
/// scope.
///
/// Mutations are read-modify-write against the shared storage without a
/// lock, so two writers on the same scope race with last write wins.
#[derive(Clone)]
pub struct ProgressStore {
    storage: Arc<dyn KeyValueStorage>,
    notifier: ChangeNotifier,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, notifier: ChangeNotifier) -> Self {
        Self { storage, notifier }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.notifier.subscribe()
    }

    #[tracing::instrument(name = "get read chapters", skip(self))]
    pub fn read_chapters(&self, scope: &Scope) -> ReadSet {
        self.load(&scope.storage_key(READ_CHAPTERS_KEY))
    }

    #[tracing::instrument(name = "mark chapter as read", skip(self))]
    pub fn mark_chapter_as_read(&self, scope: &Scope, chapter_id: &str) -> bool {
        if chapter_id.is_empty() {
            return false;
        }

        let mut read = self.read_chapters(scope);
        if !read.insert(chapter_id.to_string()) {
            return false;
        }

        let mut reading = self.currently_reading_all(scope);
        let cleared: Vec<String> = reading
            .iter()
            .filter(|(_, chapter)| *chapter == chapter_id)
            .map(|(manga_id, _)| manga_id.clone())
            .collect();
        reading.retain(|_, chapter| chapter != chapter_id);

        // the in-progress marker goes first so a failed second write can
        // never leave a read chapter marked as in progress
        if !cleared.is_empty()
            && !self.persist(&scope.storage_key(CURRENTLY_READING_KEY), &reading)
        {
            return false;
        }
        if !self.persist(&scope.storage_key(READ_CHAPTERS_KEY), &read) {
            // the cleared markers are gone for good even though the chapter
            // did not make it into the read set
            for manga_id in cleared {
                self.notifier.notify(ProgressChange {
                    scope: scope.clone(),
                    kind: ChangeKind::ReadingRemoved { manga_id },
                });
            }
            return false;
        }

        self.notifier.notify(ProgressChange {
            scope: scope.clone(),
            kind: ChangeKind::ChapterRead {
                chapter_id: chapter_id.to_string(),
            },
        });

        true
    }

    pub fn currently_reading(&self, scope: &Scope, manga_id: &str) -> Option<String> {
        self.currently_reading_all(scope).remove(manga_id)
    }

    #[tracing::instrument(name = "get currently reading", skip(self))]
    pub fn currently_reading_all(&self, scope: &Scope) -> CurrentlyReadingMap {
        self.load(&scope.storage_key(CURRENTLY_READING_KEY))
    }

    #[tracing::instrument(name = "set currently reading", skip(self))]
    pub fn set_currently_reading(&self, scope: &Scope, manga_id: &str, chapter_id: &str) -> bool {
        if manga_id.is_empty() || chapter_id.is_empty() {
            return false;
        }

        if self.read_chapters(scope).contains(chapter_id) {
            tracing::debug!("Chapter already read, not marking as in progress");
            return false;
        }

        let mut reading = self.currently_reading_all(scope);
        if reading.get(manga_id).map(String::as_str) == Some(chapter_id) {
            return false;
        }

        reading.insert(manga_id.to_string(), chapter_id.to_string());
        if !self.persist(&scope.storage_key(CURRENTLY_READING_KEY), &reading) {
            return false;
        }

        self.notifier.notify(ProgressChange {
            scope: scope.clone(),
            kind: ChangeKind::ReadingSet {
                manga_id: manga_id.to_string(),
                chapter_id: chapter_id.to_string(),
            },
        });

        true
    }

    /// Notifies even when nothing was stored for `manga_id`. Returns whether
    /// an entry was actually removed.
    #[tracing::instrument(name = "remove currently reading", skip(self))]
    pub fn remove_currently_reading(&self, scope: &Scope, manga_id: &str) -> bool {
        if manga_id.is_empty() {
            return false;
        }

        let mut reading = self.currently_reading_all(scope);
        let removed = reading.remove(manga_id).is_some();

        if !self.persist(&scope.storage_key(CURRENTLY_READING_KEY), &reading) {
            return false;
        }

        self.notifier.notify(ProgressChange {
            scope: scope.clone(),
            kind: ChangeKind::ReadingRemoved {
                manga_id: manga_id.to_string(),
            },
        });

        removed
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let raw = match self.storage.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return T::default(),
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, key, "Progress read failed");
                return T::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|error| {
            tracing::warn!(err.msg = %error, key, "Progress value is malformed, ignoring");
            T::default()
        })
    }

    fn persist<T: Serialize>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(crate::storage::StorageError::from)
            .and_then(|raw| self.storage.set(key, raw));

        match result {
            Ok(()) => true,
            Err(error) => {
                tracing::warn!(err.msg = %error, err.details = ?error, key, "Progress write failed");
                false
            }
        }
    }
}
