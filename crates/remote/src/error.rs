use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// Transport failure: connect, timeout, bad status, undecodable body.
    #[error("network error: {0}")]
    Network(String),

    /// The backend understood the request and refused it.
    #[error("{message}")]
    Application { message: String },

    #[error("remote store not configured: {0}")]
    Unconfigured(String),
}

impl RemoteError {
    pub fn application(message: impl Into<String>) -> Self {
        RemoteError::Application {
            message: message.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, RemoteError::Network(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RemoteError::Network("request timeout".to_string())
        } else {
            RemoteError::Network(e.to_string())
        }
    }
}
