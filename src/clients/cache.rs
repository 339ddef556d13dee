use super::factory::{AssumeRoleClientFactory, ClientFactory};
use crate::credentials::{CredentialDescriptor, CredentialRegistry, InlineCredential};
use crate::error::Result;
use crate::fetch::FileReader;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Cache key for a constructed client.
///
/// Descriptors that differ only in `prefix` resolve to the same key and
/// share one client.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IdentityKey {
    role_arn: String,
    external_id: Option<String>,
    role_session_duration: Option<u64>,
}

impl From<&CredentialDescriptor> for IdentityKey {
    fn from(descriptor: &CredentialDescriptor) -> Self {
        Self {
            role_arn: descriptor.role_arn.clone(),
            external_id: descriptor.external_id.clone(),
            role_session_duration: descriptor.role_session_duration,
        }
    }
}

/// Called right after a new client is stored.
pub type ClientObserver<C> = Arc<dyn Fn(&CredentialDescriptor, &Arc<C>) + Send + Sync>;

/// Resolves URLs to role-scoped clients, building each client once per
/// [`IdentityKey`] and keeping it for the life of the cache.
///
/// Construction is not single-flight. Two lookups that miss on the same
/// key at the same time both build a client; the later write replaces the
/// earlier one and each caller gets the client it built. Entries are never
/// evicted.
pub struct ClientCache<F: ClientFactory> {
    registry: CredentialRegistry,
    factory: F,
    clients: RwLock<HashMap<IdentityKey, Arc<F::Client>>>,
    on_client_created: Option<ClientObserver<F::Client>>,
}

/// Cache of S3 clients built through STS `AssumeRole`.
pub type S3ClientCache = ClientCache<AssumeRoleClientFactory>;

impl<F: ClientFactory> ClientCache<F> {
    pub fn new(factory: F) -> Self {
        Self::with_registry(CredentialRegistry::new(), factory)
    }

    pub fn with_registry(registry: CredentialRegistry, factory: F) -> Self {
        Self {
            registry,
            factory,
            clients: RwLock::new(HashMap::new()),
            on_client_created: None,
        }
    }

    /// Installs an observer invoked with each newly built client.
    pub fn on_client_created(
        mut self,
        observer: impl Fn(&CredentialDescriptor, &Arc<F::Client>) + Send + Sync + 'static,
    ) -> Self {
        self.on_client_created = Some(Arc::new(observer));
        self
    }

    pub fn register(&mut self, credential: InlineCredential) {
        self.registry.register(credential);
    }

    pub fn register_config_document(&mut self, location: Url, reader: Arc<dyn FileReader>) {
        self.registry.register_config_document(location, reader);
    }

    pub fn registry(&self) -> &CredentialRegistry {
        &self.registry
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of distinct identities with a cached client.
    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }

    /// Returns the client for `url`, or `None` when no source matches.
    ///
    /// Config document errors are returned unchanged.
    #[tracing::instrument(skip(self, url), fields(url = %url))]
    pub async fn find(&self, url: &Url) -> Result<Option<Arc<F::Client>>> {
        let Some(descriptor) = self.registry.find_credentials(url).await? else {
            debug!("No credential matched");
            return Ok(None);
        };

        let key = IdentityKey::from(&descriptor);
        let cached = self.clients.read().get(&key).cloned();
        if let Some(client) = cached {
            debug!(role_arn = %descriptor.role_arn, "Using cached client");
            return Ok(Some(client));
        }

        let client = Arc::new(self.factory.build(&descriptor).await);
        self.clients.write().insert(key, client.clone());
        info!(
            role_arn = %descriptor.role_arn,
            prefix = %descriptor.prefix,
            "Created role-scoped client"
        );

        if let Some(observer) = &self.on_client_created {
            observer(&descriptor, &client);
        }
        Ok(Some(client))
    }
}
