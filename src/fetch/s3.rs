use super::reader::FileReader;
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use std::io;
use tracing::debug;
use url::Url;

/// Splits an `s3://bucket/key` URL into its bucket and key.
pub fn parse_s3_location(url: &Url) -> io::Result<(String, String)> {
    if url.scheme() != "s3" {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{url} is not an s3:// location"),
        ));
    }

    let bucket = url.host_str().unwrap_or_default();
    let key = url.path().trim_start_matches('/');
    if bucket.is_empty() || key.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{url} must name both a bucket and a key"),
        ));
    }

    Ok((bucket.to_string(), key.to_string()))
}

/// Reads `s3://bucket/key` locations with `GetObject`.
///
/// Uses whatever credentials the wrapped client was built with, typically
/// the ambient ones from `aws_config::load_from_env`.
#[derive(Clone)]
pub struct S3FileReader {
    client: aws_sdk_s3::Client,
}

impl S3FileReader {
    pub fn new(client: aws_sdk_s3::Client) -> Self {
        Self { client }
    }

    pub fn from_conf(config: &aws_config::SdkConfig) -> Self {
        Self::new(aws_sdk_s3::Client::new(config))
    }
}

#[async_trait]
impl FileReader for S3FileReader {
    async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
        let (bucket, key) = parse_s3_location(url)?;
        debug!(%bucket, %key, "GetObject");

        let resp = self
            .client
            .get_object()
            .bucket(&bucket)
            .key(&key)
            .send()
            .await
            .map_err(|e| {
                let kind = match e.as_service_error() {
                    Some(service) if service.is_no_such_key() => io::ErrorKind::NotFound,
                    _ => io::ErrorKind::Other,
                };
                io::Error::new(kind, DisplayErrorContext(&e).to_string())
            })?;

        let body = resp.body.collect().await.map_err(io::Error::other)?;
        Ok(body.into_bytes().to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_s3_location() {
        let url: Url = "s3://cfg/teams/creds.json".parse().unwrap();
        let (bucket, key) = parse_s3_location(&url).unwrap();
        assert_eq!(bucket, "cfg");
        assert_eq!(key, "teams/creds.json");
    }

    #[test]
    fn test_parse_s3_location_requires_key() {
        let url: Url = "s3://cfg/".parse().unwrap();
        let err = parse_s3_location(&url).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[test]
    fn test_parse_s3_location_rejects_other_schemes() {
        let url: Url = "https://example.com/creds.json".parse().unwrap();
        assert!(parse_s3_location(&url).is_err());
    }
}
