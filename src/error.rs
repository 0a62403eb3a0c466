use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("Private Key Cannot Be Empty")]
    EmptyPrivateKey,

    #[error("Invalid Import Strategy: {0}")]
    InvalidImportStrategy(String),

    #[error("Session not initialized")]
    NotInitialized,

    #[error("Engine error: {0}")]
    Engine(String),

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
