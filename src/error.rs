use std::fmt;

/// Errors surfaced by the snapshot codec, the durable writer and the
/// checkout state store.
#[derive(Debug)]
pub enum Error {
    /// Malformed, truncated or unversioned SNAPSHOT bytes
    Format(String),
    /// An operation that makes no sense against the recorded state
    State(String),
    /// Filesystem failure, after any retries were exhausted
    Io(std::io::Error),
    Toml(toml::de::Error),
    Json(serde_json::Error),
    Json5(json5::Error),
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_format(&self) -> bool {
        matches!(self, Error::Format(_))
    }

    pub fn is_state(&self) -> bool {
        matches!(self, Error::State(_))
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Error::Io(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Format(msg) => write!(f, "Snapshot format error: {}", msg),
            Error::State(msg) => write!(f, "Checkout state error: {}", msg),
            Error::Io(e) => write!(f, "IO error: {}", e),
            Error::Toml(e) => write!(f, "TOML error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::Json5(e) => write!(f, "JSON error: {}", e),
            Error::Config(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Toml(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::Json5(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Toml(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<json5::Error> for Error {
    fn from(e: json5::Error) -> Self {
        Error::Json5(e)
    }
}
