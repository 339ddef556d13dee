//! Credential descriptors and the registry that resolves URLs to them.
//!
//! A [`CredentialDescriptor`] names the role to assume for every URL that
//! starts with its `prefix`. Descriptors come either from inline
//! registrations or from versioned JSON documents read through a
//! [`FileReader`](crate::fetch::FileReader).

pub mod document;
pub mod registry;

pub use document::{ConfigDocument, ConfigDocumentLoader, SUPPORTED_VERSION};
pub use registry::{CredentialRegistry, CredentialSource};

use serde::{Deserialize, Serialize};
use url::Url;

/// Discriminates descriptor variants. Only S3 roles exist today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialKind {
    #[default]
    #[serde(rename = "s3")]
    S3Role,
}

/// Role and session settings for one URL prefix.
///
/// Serialized with the field names used in config documents
/// (`prefix`, `roleArn`, `externalId`, `roleSessionDuration`, `type`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDescriptor {
    pub prefix: String,
    pub role_arn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    /// Session lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_session_duration: Option<u64>,
    #[serde(rename = "type", default)]
    pub kind: CredentialKind,
}

impl CredentialDescriptor {
    /// Plain textual starts-with test against the URL's full string form.
    ///
    /// Not path-segment aware: `s3://bucket` also matches `s3://bucket-2/x`.
    pub fn matches(&self, url: &Url) -> bool {
        url.as_str().starts_with(&self.prefix)
    }
}

/// An inline registration: a descriptor without its kind tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineCredential {
    pub prefix: String,
    pub role_arn: String,
    pub external_id: Option<String>,
    pub role_session_duration: Option<u64>,
}

impl InlineCredential {
    pub fn new(prefix: impl Into<String>, role_arn: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            role_arn: role_arn.into(),
            ..Default::default()
        }
    }

    pub fn external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn role_session_duration(mut self, seconds: u64) -> Self {
        self.role_session_duration = Some(seconds);
        self
    }
}

impl From<InlineCredential> for CredentialDescriptor {
    fn from(inline: InlineCredential) -> Self {
        CredentialDescriptor {
            prefix: inline.prefix,
            role_arn: inline.role_arn,
            external_id: inline.external_id,
            role_session_duration: inline.role_session_duration,
            kind: CredentialKind::S3Role,
        }
    }
}
