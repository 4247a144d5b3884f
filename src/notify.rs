use tokio::sync::broadcast;

use crate::scope::Scope;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChangeKind {
    ChapterRead { chapter_id: String },
    ReadingSet { manga_id: String, chapter_id: String },
    ReadingRemoved { manga_id: String },
}

/// Emitted after a progress mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ProgressChange {
    pub scope: Scope,
    #[serde(flatten)]
    pub kind: ChangeKind,
}

/// Fire-and-forget fan out of progress changes. Senders never know who, if
/// anyone, is listening.
#[derive(Clone)]
pub struct ChangeNotifier {
    tx: broadcast::Sender<ProgressChange>,
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressChange> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn notify(&self, change: ProgressChange) {
        // no receivers is not a failure
        let _ = self.tx.send(change);
    }
}
