//! Versioned credential config documents and their fetch-once loader.
//!
//! Wire format:
//!
//! ```json
//! {
//!   "v": 2,
//!   "prefixes": [
//!     { "prefix": "s3://bucket-b/", "roleArn": "arn:aws:iam::123456789012:role/B" },
//!     { "prefix": "s3://bucket-c/", "roleArn": "arn:aws:iam::123456789012:role/C",
//!       "externalId": "c-ext", "roleSessionDuration": 900, "type": "s3" }
//!   ]
//! }
//! ```

use super::CredentialDescriptor;
use crate::error::{Error, Result, ValidationFailure};
use crate::fetch::FileReader;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

/// The only `v` accepted in a config document.
pub const SUPPORTED_VERSION: i64 = 2;

/// A validated credential config document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    pub prefixes: Vec<CredentialDescriptor>,
}

impl ConfigDocument {
    /// Parses and validates raw document bytes read from `location`.
    ///
    /// The whole document is rejected if any part of it is malformed.
    pub fn from_slice(location: &Url, bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| Error::parse(location, e))?;
        Self::from_value(location, value)
    }

    fn from_value(location: &Url, value: Value) -> Result<Self> {
        let version = value.get("v").and_then(Value::as_i64);
        if version != Some(SUPPORTED_VERSION) {
            return Err(Error::validation(
                location,
                ValidationFailure::UnsupportedVersion {
                    found: version,
                    expected: SUPPORTED_VERSION,
                },
            ));
        }

        let entries = match value.get("prefixes") {
            None | Some(Value::Null) => {
                return Err(Error::validation(location, ValidationFailure::MissingPrefixes));
            }
            Some(Value::Array(entries)) => entries,
            Some(_) => {
                return Err(Error::validation(location, ValidationFailure::PrefixesNotArray));
            }
        };

        let prefixes = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                parse_entry(entry).map_err(|message| {
                    Error::validation(location, ValidationFailure::InvalidEntry { index, message })
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { prefixes })
    }

    /// First entry, in document order, whose prefix matches `url`.
    pub fn find(&self, url: &Url) -> Option<&CredentialDescriptor> {
        self.prefixes.iter().find(|descriptor| descriptor.matches(url))
    }
}

fn parse_entry(entry: &Value) -> std::result::Result<CredentialDescriptor, String> {
    let descriptor = CredentialDescriptor::deserialize(entry).map_err(|e| e.to_string())?;
    if descriptor.prefix.is_empty() {
        return Err("`prefix` is empty".to_string());
    }
    if descriptor.role_arn.is_empty() {
        return Err("`roleArn` is empty".to_string());
    }
    Ok(descriptor)
}

/// Lazily loads one config document and shares the outcome.
///
/// The first lookup triggers the read. Lookups arriving while it is in
/// flight wait on the same read, and every later lookup gets the stored
/// result. Failures are stored too: a document that failed once keeps
/// failing with the same error for the lifetime of the loader.
pub struct ConfigDocumentLoader {
    location: Url,
    reader: Arc<dyn FileReader>,
    document: OnceCell<Result<Arc<ConfigDocument>>>,
}

impl ConfigDocumentLoader {
    pub fn new(location: Url, reader: Arc<dyn FileReader>) -> Self {
        Self {
            location,
            reader,
            document: OnceCell::new(),
        }
    }

    pub fn location(&self) -> &Url {
        &self.location
    }

    /// Returns the document, reading it on first use.
    pub async fn document(&self) -> Result<Arc<ConfigDocument>> {
        self.document.get_or_init(|| self.load()).await.clone()
    }

    /// Returns the first descriptor in the document matching `url`.
    pub async fn find_credential(&self, url: &Url) -> Result<Option<CredentialDescriptor>> {
        let document = self.document().await?;
        Ok(document.find(url).cloned())
    }

    #[tracing::instrument(skip(self), fields(location = %self.location))]
    async fn load(&self) -> Result<Arc<ConfigDocument>> {
        debug!("Fetching credential config");

        let result = match self.reader.read(&self.location).await {
            Ok(bytes) => ConfigDocument::from_slice(&self.location, &bytes).map(Arc::new),
            Err(e) => Err(Error::fetch(&self.location, e)),
        };

        match &result {
            Ok(document) => info!(entries = document.prefixes.len(), "Credential config loaded"),
            Err(e) => warn!(error = %e, "Credential config failed to load"),
        }
        result
    }
}

impl fmt::Debug for ConfigDocumentLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDocumentLoader")
            .field("location", &self.location.as_str())
            .field("loaded", &self.document.initialized())
            .finish()
    }
}
