//! Centralized error handling for richstyle
//!
//! Errors come in two tiers. Data-dependent failures (configuration files,
//! markup decoding) are ordinary values carried by [`Error`] and
//! [`DecodeError`]. Programmer misuse, such as referencing a style key that
//! was never configured, is described by [`StyleError`]; the panicking entry
//! points (`StyleStateMachine::toggle`) surface it immediately, while the
//! `try_*` variants hand it back as a `Result`.

use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Custom Result Type Alias
// ─────────────────────────────────────────────────────────────────────────────

/// A specialized `Result` type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The centralized error type for the crate.
#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // File I/O Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Generic I/O error wrapper
    Io(io::Error),

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to load a style configuration file
    ConfigLoad {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to save a style configuration file
    ConfigSave {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse configuration (invalid JSON/TOML)
    ConfigParse {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration directory not found or inaccessible
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Engine Errors
    // ─────────────────────────────────────────────────────────────────────────
    /// A style key or rule was misused
    Style(StyleError),

    /// Markup could not be decoded
    Decode(DecodeError),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::ConfigParse {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<StyleError> for Error {
    fn from(err: StyleError) -> Self {
        Error::Style(err)
    }
}

impl From<DecodeError> for Error {
    fn from(err: DecodeError) -> Self {
        Error::Decode(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),

            Error::ConfigLoad { path, source } => {
                write!(
                    f,
                    "Failed to load style configuration from '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigSave { path, source } => {
                write!(
                    f,
                    "Failed to save style configuration to '{}': {}",
                    path.display(),
                    source
                )
            }
            Error::ConfigParse { message, .. } => {
                write!(f, "Invalid configuration format: {}", message)
            }
            Error::ConfigDirNotFound => {
                write!(f, "Configuration directory not found")
            }

            Error::Style(err) => write!(f, "{}", err),
            Error::Decode(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::ConfigLoad { source, .. } => Some(source.as_ref()),
            Error::ConfigSave { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_ref()
                .map(|s| s.as_ref() as &(dyn std::error::Error + 'static)),
            Error::Style(err) => Some(err),
            Error::Decode(err) => Some(err),
            Error::ConfigDirNotFound => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Style Errors (programmer misuse)
// ─────────────────────────────────────────────────────────────────────────────

/// Misuse of the style vocabulary.
///
/// These indicate a configuration or integration bug rather than bad data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleError {
    /// A style key was referenced that is not part of the configuration
    UnknownKey(String),
    /// A conflict policy returned a partition naming a key that does not exist
    UnknownPartitionKey { toggled: String, key: String },
}

impl fmt::Display for StyleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StyleError::UnknownKey(key) => write!(f, "Unknown style key '{}'", key),
            StyleError::UnknownPartitionKey { toggled, key } => write!(
                f,
                "Conflict policy for '{}' referenced unknown style key '{}'",
                toggled, key
            ),
        }
    }
}

impl std::error::Error for StyleError {}

// ─────────────────────────────────────────────────────────────────────────────
// Decode Errors (markup data)
// ─────────────────────────────────────────────────────────────────────────────

/// Reasons a markup string could not be turned into a styled buffer.
///
/// Offsets are byte offsets into the markup input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// A `<` that does not start a well-formed tag
    MalformedTag { offset: usize },
    /// A tag that is neither a style tag nor accepted by the resolver hook
    UnknownTag { tag: String, offset: usize },
    /// A closing tag that does not match the innermost open tag
    MismatchedClose {
        expected: String,
        found: String,
        offset: usize,
    },
    /// A closing tag with nothing open
    UnexpectedClose { tag: String, offset: usize },
    /// Input ended with tags still open
    UnterminatedTag { tag: String },
    /// The decode worker went away before producing a result
    Cancelled,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::MalformedTag { offset } => {
                write!(f, "Malformed tag at offset {}", offset)
            }
            DecodeError::UnknownTag { tag, offset } => {
                write!(f, "Unknown tag <{}> at offset {}", tag, offset)
            }
            DecodeError::MismatchedClose {
                expected,
                found,
                offset,
            } => write!(
                f,
                "Expected </{}> but found </{}> at offset {}",
                expected, found, offset
            ),
            DecodeError::UnexpectedClose { tag, offset } => {
                write!(f, "Unexpected </{}> at offset {}", tag, offset)
            }
            DecodeError::UnterminatedTag { tag } => write!(f, "Unterminated tag <{}>", tag),
            DecodeError::Cancelled => write!(f, "Decode was cancelled"),
        }
    }
}

impl std::error::Error for DecodeError {}

// ─────────────────────────────────────────────────────────────────────────────
// Graceful Degradation Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Extension trait for Result to support graceful degradation.
pub trait ResultExt<T> {
    /// If the result is an error, log it at warning level and return the provided default.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                warn!("{}: {}. Using default.", context, err);
                default
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
