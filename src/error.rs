use std::fmt;

/// Error type for context store operations
#[derive(Debug)]
pub enum CtxError {
    /// Context or TLS file does not exist
    NotFound(String),
    /// A context with the requested name already exists
    AlreadyExists(String),
    /// Context name is empty or reserved
    InvalidName(String),
    /// Request rejected before any mutation (orchestrator, host, endpoint shape)
    Validation(String),
    /// Corrupt metadata, unknown endpoint type or malformed bundle
    Decode(String),
    /// Disk or stream failure
    Io {
        context: String,
        source: std::io::Error,
    },
    /// HTTP transport failure
    Http(reqwest::Error),
    /// Remote API answered with an error status
    Api { status: u16, message: String },
    /// Static configuration error (duplicate registry entries, bad CLI config)
    Config(String),
}

impl CtxError {
    /// Wrap an I/O error with a description of what was being done
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        CtxError::Io {
            context: context.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CtxError::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, CtxError::AlreadyExists(_))
    }

    pub fn is_invalid_name(&self) -> bool {
        matches!(self, CtxError::InvalidName(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, CtxError::Validation(_))
    }

    pub fn is_decode(&self) -> bool {
        matches!(self, CtxError::Decode(_))
    }

    /// Remote API refused the request (HTTP 403)
    pub fn is_forbidden(&self) -> bool {
        matches!(self, CtxError::Api { status: 403, .. })
    }

    /// True for disk and transport failures
    pub fn is_io(&self) -> bool {
        matches!(self, CtxError::Io { .. } | CtxError::Http(_))
    }
}

impl fmt::Display for CtxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtxError::NotFound(msg) => write!(f, "{}", msg),
            CtxError::AlreadyExists(msg) => write!(f, "{}", msg),
            CtxError::InvalidName(msg) => write!(f, "{}", msg),
            CtxError::Validation(msg) => write!(f, "{}", msg),
            CtxError::Decode(msg) => write!(f, "decode error: {}", msg),
            CtxError::Io { context, source } => write!(f, "{}: {}", context, source),
            CtxError::Http(e) => write!(f, "HTTP request failed: {}", e),
            CtxError::Api { status, message } => {
                write!(f, "API error (status {}): {}", status, message)
            }
            CtxError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for CtxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CtxError::Io { source, .. } => Some(source),
            CtxError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for CtxError {
    fn from(err: reqwest::Error) -> Self {
        CtxError::Http(err)
    }
}

impl From<serde_json::Error> for CtxError {
    fn from(err: serde_json::Error) -> Self {
        CtxError::Decode(err.to_string())
    }
}

impl From<serde_yml::Error> for CtxError {
    fn from(err: serde_yml::Error) -> Self {
        CtxError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for CtxError {
    fn from(err: std::io::Error) -> Self {
        CtxError::Io {
            context: "I/O error".to_string(),
            source: err,
        }
    }
}

/// Result type alias for context operations
pub type Result<T> = std::result::Result<T, CtxError>;
