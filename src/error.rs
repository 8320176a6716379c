use thiserror::Error;

/// Main error type for the log-capture subsystem
#[derive(Debug, Error)]
pub enum ProcLogError {
    // Request errors
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("No such stream: log destination keeps no history")]
    NoSuchStream,

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid configuration file: {0}")]
    InvalidConfig(String),

    #[error("Configuration validation failed: {0}")]
    ConfigValidationError(String),

    // IO errors (automatically converted from std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Coarse classification of a [`ProcLogError`], suitable for mapping to
/// fault codes on an RPC surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArguments,
    NoSuchStream,
    Unsupported,
    IoFailure,
    Config,
}

impl ProcLogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProcLogError::InvalidArguments(_) => ErrorKind::InvalidArguments,
            ProcLogError::NoSuchStream => ErrorKind::NoSuchStream,
            ProcLogError::Unsupported(_) => ErrorKind::Unsupported,
            ProcLogError::Io(_) => ErrorKind::IoFailure,
            ProcLogError::ConfigError(_)
            | ProcLogError::InvalidConfig(_)
            | ProcLogError::ConfigValidationError(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for log-capture operations
pub type Result<T> = std::result::Result<T, ProcLogError>;
