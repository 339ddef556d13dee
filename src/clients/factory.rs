use crate::config::Settings;
use crate::credentials::CredentialDescriptor;
use async_trait::async_trait;
use aws_config::sts::AssumeRoleProvider;
use aws_smithy_async::rt::sleep::default_async_sleep;
use aws_smithy_async::time::{SharedTimeSource, SystemTimeSource};
use chrono::Utc;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// STS limits role session names to 64 characters.
const MAX_SESSION_NAME_LEN: usize = 64;
const SESSION_NAME_PREFIX: &str = "fsa-";
const SESSION_SUFFIX_LEN: usize = 8;

/// Builds a role-scoped client for a credential descriptor.
///
/// Implementations must be cheap to repeat: the cache may build more than
/// one client for the same role when lookups race.
#[async_trait]
pub trait ClientFactory: Send + Sync {
    type Client: Send + Sync + 'static;

    async fn build(&self, descriptor: &CredentialDescriptor) -> Self::Client;
}

/// Builds S3 clients that authenticate through STS `AssumeRole`.
///
/// Source credentials, region and HTTP client come from the base
/// [`aws_config::SdkConfig`]. No STS call is made here; the provider
/// assumes the role on the client's first request and renews the session
/// on its own.
#[derive(Clone)]
pub struct AssumeRoleClientFactory {
    base: aws_config::SdkConfig,
    settings: Settings,
}

impl AssumeRoleClientFactory {
    /// A base config without a time source or sleep implementation gets
    /// the system clock and the tokio sleep, which the STS provider needs.
    pub fn new(base: aws_config::SdkConfig, settings: Settings) -> Self {
        Self {
            base: with_runtime_defaults(base),
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

#[async_trait]
impl ClientFactory for AssumeRoleClientFactory {
    type Client = aws_sdk_s3::Client;

    async fn build(&self, descriptor: &CredentialDescriptor) -> aws_sdk_s3::Client {
        let session_name = session_name(&self.settings.version_tag);
        let session_length = session_duration(descriptor, &self.settings);
        debug!(
            role_arn = %descriptor.role_arn,
            %session_name,
            session_secs = session_length.map(|d| d.as_secs()),
            "Configuring assume-role provider"
        );

        let mut provider = AssumeRoleProvider::builder(&descriptor.role_arn)
            .session_name(session_name)
            .configure(&self.base);
        if let Some(external_id) = &descriptor.external_id {
            provider = provider.external_id(external_id);
        }
        if let Some(length) = session_length {
            provider = provider.session_length(length);
        }
        let provider = provider.build().await;

        let config = aws_sdk_s3::config::Builder::from(&self.base)
            .credentials_provider(provider)
            .build();
        aws_sdk_s3::Client::from_conf(config)
    }
}

fn with_runtime_defaults(base: aws_config::SdkConfig) -> aws_config::SdkConfig {
    if base.time_source().is_some() && base.sleep_impl().is_some() {
        return base;
    }

    let time_source = base
        .time_source()
        .unwrap_or_else(|| SharedTimeSource::new(SystemTimeSource::new()));
    let sleep_impl = base.sleep_impl().or_else(default_async_sleep);

    let mut builder = base.to_builder();
    builder.set_time_source(Some(time_source));
    builder.set_sleep_impl(sleep_impl);
    builder.build()
}

/// Session lifetime for a descriptor: its own value, then the configured
/// default. `None` leaves the STS default in place.
pub fn session_duration(descriptor: &CredentialDescriptor, settings: &Settings) -> Option<Duration> {
    descriptor
        .role_session_duration
        .or(settings.default_session_duration)
        .map(Duration::from_secs)
}

/// Generates `fsa-<version-tag>-<epoch-millis>-<random-suffix>`.
///
/// Characters STS rejects in session names are replaced with `-`. A tag
/// too long for the 64 character limit is shortened; the prefix, millis
/// and suffix are always kept.
pub fn session_name(version_tag: &str) -> String {
    let millis = Utc::now().timestamp_millis().to_string();
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..SESSION_SUFFIX_LEN];

    let tag_budget = MAX_SESSION_NAME_LEN
        .saturating_sub(SESSION_NAME_PREFIX.len() + 1 + millis.len() + 1 + SESSION_SUFFIX_LEN);
    let tag: String = version_tag
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "_+=,.@-".contains(c) {
                c
            } else {
                '-'
            }
        })
        .take(tag_budget)
        .collect();

    format!("{SESSION_NAME_PREFIX}{tag}-{millis}-{suffix}")
}
