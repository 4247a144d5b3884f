#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("Storage io error")]
    Io(#[from] std::io::Error),
    #[error("Storage serialization error")]
    Serialization(#[from] serde_json::Error),
    #[error("Storage quota exceeded: {used} of {quota} bytes")]
    QuotaExceeded { used: usize, quota: usize },
    #[error("Storage lock poisoned")]
    Poisoned,
}
