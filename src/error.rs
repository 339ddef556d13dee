//! Error types for credential resolution.
//!
//! Every variant carries the config document location so a misconfigured
//! document is identifiable from the message alone. Errors are `Clone`
//! because a loader replays its first outcome to every caller.

use std::sync::Arc;
use thiserror::Error;
use url::Url;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while loading credential config documents.
///
/// A URL that no source matches is not an error; lookups return `Ok(None)`.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The document could not be read.
    #[error("failed to read credential config {location}: {source}")]
    ConfigFetch {
        location: Url,
        #[source]
        source: Arc<std::io::Error>,
    },

    /// The document is not valid JSON.
    #[error("failed to parse credential config {location}: {source}")]
    ConfigParse {
        location: Url,
        #[source]
        source: Arc<serde_json::Error>,
    },

    /// The document parsed but does not have the expected shape.
    #[error("invalid credential config {location}: {reason}")]
    ConfigValidation {
        location: Url,
        reason: ValidationFailure,
    },
}

/// Why a config document failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// `v` is absent or not the supported schema version.
    #[error("unsupported version {found:?}, expected {expected}")]
    UnsupportedVersion { found: Option<i64>, expected: i64 },

    #[error("missing `prefixes`")]
    MissingPrefixes,

    #[error("`prefixes` is not an array")]
    PrefixesNotArray,

    /// An entry of `prefixes` is not a usable credential descriptor.
    #[error("entry {index} of `prefixes` is invalid: {message}")]
    InvalidEntry { index: usize, message: String },
}

impl Error {
    pub fn fetch(location: &Url, source: std::io::Error) -> Self {
        Error::ConfigFetch {
            location: location.clone(),
            source: Arc::new(source),
        }
    }

    pub fn parse(location: &Url, source: serde_json::Error) -> Self {
        Error::ConfigParse {
            location: location.clone(),
            source: Arc::new(source),
        }
    }

    pub fn validation(location: &Url, reason: ValidationFailure) -> Self {
        Error::ConfigValidation {
            location: location.clone(),
            reason,
        }
    }

    /// The config document location this error refers to.
    pub fn location(&self) -> &Url {
        match self {
            Error::ConfigFetch { location, .. }
            | Error::ConfigParse { location, .. }
            | Error::ConfigValidation { location, .. } => location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_include_location() {
        let location: Url = "s3://cfg/creds.json".parse().unwrap();
        let err = Error::validation(&location, ValidationFailure::MissingPrefixes);
        assert!(err.to_string().contains("s3://cfg/creds.json"));
        assert_eq!(err.location(), &location);

        let err = Error::fetch(&location, std::io::Error::other("boom"));
        assert!(err.to_string().contains("s3://cfg/creds.json"));
        assert!(err.to_string().contains("boom"));
    }
}
