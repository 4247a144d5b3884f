use std::sync::Arc;

use anyhow::Context;
use chrono::TimeDelta;

use crate::{
    config::Config,
    content::ContentClient,
    notify::ChangeNotifier,
    progress::ProgressStore,
    search::{SearchSequence, SearchStateCache, SystemClock},
    storage::{FileStorage, KeyValueStorage, MemoryStorage},
    telemetry::spawn_blocking_with_tracing,
};

#[derive(Clone)]
pub struct AppState {
    pub progress: ProgressStore,
    pub search: SearchStateCache,
    pub search_sequence: Arc<SearchSequence>,
    pub content: ContentClient,
    pub config: Config,
}

pub type SharedAppState = Arc<AppState>;

impl AppState {
    pub async fn init(config: Config) -> Result<Self, anyhow::Error> {
        let storage: Arc<dyn KeyValueStorage> = match config.storage.path.clone() {
            Some(path) => {
                tracing::info!(path = %path.display(), "Opening storage profile");

                let storage = spawn_blocking_with_tracing(move || FileStorage::open(path))
                    .await
                    .context("open storage profile")?
                    .context("Failed to open storage profile.")?;
                Arc::new(storage)
            }
            None => {
                tracing::warn!("No storage path configured, progress is kept in memory");
                Arc::new(MemoryStorage::new())
            }
        };

        Self::with_storage(config, storage)
    }

    pub fn with_storage(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
    ) -> Result<Self, anyhow::Error> {
        let content = ContentClient::new(&config.content).context("Failed to build content client.")?;

        let ttl_minutes = config.storage.search_ttl_minutes;
        if ttl_minutes <= 0 {
            anyhow::bail!("search_ttl_minutes must be positive, got {}", ttl_minutes);
        }
        let ttl = TimeDelta::try_minutes(ttl_minutes)
            .with_context(|| format!("search_ttl_minutes {} is out of range", ttl_minutes))?;

        let search = SearchStateCache::with_clock(storage.clone(), Arc::new(SystemClock), ttl);

        Ok(AppState {
            progress: ProgressStore::new(storage, ChangeNotifier::new()),
            search,
            search_sequence: Arc::new(SearchSequence::new()),
            content,
            config,
        })
    }
}
