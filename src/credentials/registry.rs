use super::{ConfigDocumentLoader, CredentialDescriptor, InlineCredential};
use crate::error::Result;
use crate::fetch::FileReader;
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// One entry in the registry's ordered source list.
#[derive(Debug)]
pub enum CredentialSource {
    Inline(CredentialDescriptor),
    Document(ConfigDocumentLoader),
}

/// Ordered list of credential sources.
///
/// Lookups walk the sources in registration order and stop at the first
/// match, so callers control precedence by the order they register in.
#[derive(Debug, Default)]
pub struct CredentialRegistry {
    sources: Vec<CredentialSource>,
}

impl CredentialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an inline descriptor.
    pub fn register(&mut self, credential: InlineCredential) {
        self.sources.push(CredentialSource::Inline(credential.into()));
    }

    /// Appends a config document source. Nothing is read until a lookup
    /// reaches it.
    pub fn register_config_document(&mut self, location: Url, reader: Arc<dyn FileReader>) {
        self.sources
            .push(CredentialSource::Document(ConfigDocumentLoader::new(location, reader)));
    }

    pub fn sources(&self) -> &[CredentialSource] {
        &self.sources
    }

    /// Resolves `url` to the first matching descriptor.
    ///
    /// A config document that fails to load fails the whole lookup, even if
    /// a later source would have matched.
    pub async fn find_credentials(&self, url: &Url) -> Result<Option<CredentialDescriptor>> {
        for source in &self.sources {
            match source {
                CredentialSource::Inline(descriptor) => {
                    if descriptor.matches(url) {
                        debug!(prefix = %descriptor.prefix, "Matched inline credential");
                        return Ok(Some(descriptor.clone()));
                    }
                }
                CredentialSource::Document(loader) => {
                    if let Some(descriptor) = loader.find_credential(url).await? {
                        debug!(
                            prefix = %descriptor.prefix,
                            location = %loader.location(),
                            "Matched credential from config document"
                        );
                        return Ok(Some(descriptor));
                    }
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::io;

    struct StaticReader(&'static str);

    #[async_trait]
    impl FileReader for StaticReader {
        async fn read(&self, _url: &Url) -> io::Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct UnreadableReader;

    #[async_trait]
    impl FileReader for UnreadableReader {
        async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::NotFound, url.to_string()))
        }
    }

    fn url(s: &str) -> Url {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_inline_prefix_lookup() {
        let mut registry = CredentialRegistry::new();
        registry.register(InlineCredential::new("s3://bucket-a/", "role-A"));

        let found = registry.find_credentials(&url("s3://bucket-a/key.txt")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "role-A");

        let missing = registry.find_credentials(&url("s3://bucket-b/key.txt")).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_first_registered_wins() {
        let mut registry = CredentialRegistry::new();
        registry.register(InlineCredential::new("s3://bucket/team/", "narrow"));
        registry.register(InlineCredential::new("s3://bucket/", "broad"));

        let found = registry.find_credentials(&url("s3://bucket/team/x")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "narrow");

        let mut registry = CredentialRegistry::new();
        registry.register(InlineCredential::new("s3://bucket/", "broad"));
        registry.register(InlineCredential::new("s3://bucket/team/", "narrow"));

        let found = registry.find_credentials(&url("s3://bucket/team/x")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "broad");
    }

    #[tokio::test]
    async fn test_document_before_inline() {
        let mut registry = CredentialRegistry::new();
        registry.register_config_document(
            url("s3://cfg/creds.json"),
            Arc::new(StaticReader(
                r#"{"v":2,"prefixes":[{"prefix":"s3://bucket/","roleArn":"from-doc"}]}"#,
            )),
        );
        registry.register(InlineCredential::new("s3://bucket/", "inline"));
        registry.register(InlineCredential::new("s3://other/", "other"));

        let found = registry.find_credentials(&url("s3://bucket/x")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "from-doc");

        let found = registry.find_credentials(&url("s3://other/x")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "other");
    }

    #[tokio::test]
    async fn test_document_failure_aborts_lookup() {
        let mut registry = CredentialRegistry::new();
        registry.register_config_document(url("s3://cfg/missing.json"), Arc::new(UnreadableReader));
        registry.register(InlineCredential::new("s3://bucket/", "fallback"));

        let err = registry.find_credentials(&url("s3://bucket/x")).await.unwrap_err();
        assert!(matches!(err, Error::ConfigFetch { .. }));
        assert_eq!(err.location().as_str(), "s3://cfg/missing.json");
    }

    #[tokio::test]
    async fn test_inline_match_skips_later_documents() {
        let mut registry = CredentialRegistry::new();
        registry.register(InlineCredential::new("s3://bucket/", "inline"));
        registry.register_config_document(url("s3://cfg/missing.json"), Arc::new(UnreadableReader));

        let found = registry.find_credentials(&url("s3://bucket/x")).await.unwrap();
        assert_eq!(found.unwrap().role_arn, "inline");
    }
}
