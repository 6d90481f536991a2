use std::{io, path::StripPrefixError};

use regex::Error as RegexError;
use serde::{Deserialize, Serialize};
use serde_json::Error as JsonError;
use thiserror::Error;
use tokio::sync::mpsc::error::SendError as TokioSendError;

use crate::event::IndexEvent;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum RefIndexError {
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Event channel error: {0}")]
    Channel(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("File System error: {0}")]
    Io(String),
    #[error("Item Not Found: {0}")]
    NotFound(String),
    #[error("You do not have permission to access this resource")]
    PermissionDenied,
    #[error("(De)Serialization error: {0}")]
    Serialization(String),
}

impl RefIndexError {
    /// Data-absence errors are absorbed into empty results by the core. Everything else is a
    /// contract or environment failure that callers should see.
    pub fn is_missing_data(&self) -> bool {
        matches!(self, RefIndexError::NotFound(_))
    }
}

impl From<StripPrefixError> for RefIndexError {
    fn from(src: StripPrefixError) -> RefIndexError {
        RefIndexError::NotFound(format!("Strip prefix failed for path. Error: {src}"))
    }
}

impl From<toml::de::Error> for RefIndexError {
    fn from(src: toml::de::Error) -> RefIndexError {
        RefIndexError::Serialization(format!("Toml deserialization error: {src}"))
    }
}

impl From<toml::ser::Error> for RefIndexError {
    fn from(src: toml::ser::Error) -> RefIndexError {
        RefIndexError::Serialization(format!("Toml serialization error: {src}"))
    }
}

impl From<JsonError> for RefIndexError {
    fn from(src: JsonError) -> RefIndexError {
        RefIndexError::Serialization(format!("JSON (de)serialization error: {src}"))
    }
}

impl From<io::Error> for RefIndexError {
    fn from(x: io::Error) -> Self {
        match x.kind() {
            io::ErrorKind::NotFound => RefIndexError::NotFound(format!("{x}")),
            io::ErrorKind::PermissionDenied => RefIndexError::PermissionDenied,
            _ => RefIndexError::Io(format!("IOError: {}", x.kind())),
        }
    }
}

impl From<walkdir::Error> for RefIndexError {
    fn from(x: walkdir::Error) -> Self {
        match x.into_io_error() {
            Some(io_error) => RefIndexError::from(io_error),
            None => RefIndexError::Io("directory walk hit a filesystem loop".to_string()),
        }
    }
}

impl From<RegexError> for RefIndexError {
    fn from(x: RegexError) -> Self {
        RefIndexError::Config(format!("Regex parse failed: {x}"))
    }
}

impl From<TokioSendError<IndexEvent>> for RefIndexError {
    fn from(x: TokioSendError<IndexEvent>) -> Self {
        RefIndexError::Channel(format!(
            "Channel send Error, could not transmit index event {:?}",
            x.0
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_io_error_mapping() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
        assert!(RefIndexError::from(not_found).is_missing_data());

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        assert_eq!(RefIndexError::from(denied), RefIndexError::PermissionDenied);

        let other = io::Error::new(io::ErrorKind::Interrupted, "eintr");
        assert!(matches!(RefIndexError::from(other), RefIndexError::Io(_)));
    }

    #[test]
    fn test_regex_errors_are_config_errors() {
        let err = regex::Regex::new("(unclosed").unwrap_err();
        assert!(matches!(RefIndexError::from(err), RefIndexError::Config(_)));
    }
}
