use thiserror::Error;

pub type Result<T> = std::result::Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    /// Badge absent, or present in the wrong mode for the request.
    #[error("{guidance}")]
    NotConnected { guidance: String },

    #[error("{0}")]
    PrerequisiteMissing(String),

    #[error("App already exists: {0}")]
    AlreadyExists(String),

    #[error("App not found: {0}")]
    NotFound(String),

    #[error("Cannot remove system app: {0}")]
    Protected(String),

    #[error("invalid app name: {0:?}")]
    InvalidName(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} failed: {detail}")]
    Command { program: String, detail: String },
}

impl BridgeError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        BridgeError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn not_connected(guidance: impl Into<String>) -> Self {
        BridgeError::NotConnected {
            guidance: guidance.into(),
        }
    }

    /// Stable identifier reported to envelope consumers.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::NotConnected { .. } => "not_connected",
            BridgeError::PrerequisiteMissing(_) => "prerequisite_missing",
            BridgeError::AlreadyExists(_) => "already_exists",
            BridgeError::NotFound(_) => "not_found",
            BridgeError::Protected(_) => "protected",
            BridgeError::InvalidName(_) => "invalid_name",
            BridgeError::Io { .. } => "io",
            BridgeError::Command { .. } => "command",
        }
    }
}
