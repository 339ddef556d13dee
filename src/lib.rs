//! Per-URL AWS role resolution and role-scoped S3 client caching.
//!
//! Callers register credential sources, either inline descriptors or
//! versioned JSON documents at some URL, and then ask a [`ClientCache`] for
//! the client that serves a given resource URL. The first matching source
//! decides the role, and each distinct role configuration gets exactly one
//! cached client.

pub mod clients;
pub mod config;
pub mod credentials;
pub mod error;
pub mod fetch;

pub use clients::{AssumeRoleClientFactory, ClientCache, ClientFactory, S3ClientCache};
pub use config::Settings;
pub use credentials::{CredentialDescriptor, CredentialKind, CredentialRegistry, InlineCredential};
pub use error::{Error, Result, ValidationFailure};
