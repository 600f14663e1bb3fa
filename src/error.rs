//! Error handling types and utilities.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for rustdoc-implementors operations.
///
/// This is an alias for `anyhow::Result` with context added via `.context()` and
/// `.with_context()` methods throughout the codebase.
pub type Result<T> = anyhow::Result<T>;

/// Error returned when a fragment script cannot be read as an implementors payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FragmentError {
    /// The script never declares the `implementors` variable.
    #[error("fragment does not declare an `implementors` variable")]
    MissingDeclaration,
    /// A string literal runs to the end of the input.
    #[error("unterminated string literal starting at byte {offset}")]
    UnterminatedString { offset: usize },
    /// A backslash escape the codec does not understand.
    #[error("invalid escape sequence at byte {offset}")]
    InvalidEscape { offset: usize },
    /// Any other character the grammar does not allow at this position.
    #[error("expected {expected} at byte {offset}, found {found:?}")]
    Unexpected {
        expected: &'static str,
        found: Option<char>,
        offset: usize,
    },
}

/// Error returned by the registration gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `initialize` was called on a registry that already has a capability installed.
    #[error("registry is already initialized")]
    AlreadyInitialized,
}

/// Error returned when the configuration file cannot be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`crate::config::Config`].
    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
