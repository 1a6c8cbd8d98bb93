use shiftgrid_config::ConfigError;
use shiftgrid_core::CoreError;
use shiftgrid_remote::RemoteError;
use shiftgrid_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("core error: {0}")]
    Core(#[from] CoreError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// Bad client input, rejected before anything is sent.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The remote store refused the request.
    #[error("{message}")]
    Application { message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("remote store not configured: {0}")]
    Unconfigured(String),

    #[error("no grid loaded for {0}")]
    GridNotLoaded(String),

    #[error("scope {active} is being edited; save or cancel first")]
    ScopeLocked { active: String },
}

impl From<RemoteError> for EngineError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::Network(msg) => EngineError::Network(msg),
            RemoteError::Application { message } => EngineError::Application { message },
            RemoteError::Unconfigured(msg) => EngineError::Unconfigured(msg),
        }
    }
}
