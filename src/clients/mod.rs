//! Role-scoped client construction and caching.

pub mod cache;
pub mod factory;

pub use cache::{ClientCache, ClientObserver, IdentityKey, S3ClientCache};
pub use factory::{AssumeRoleClientFactory, ClientFactory, session_duration, session_name};
