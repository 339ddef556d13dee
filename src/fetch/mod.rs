//! Readers for credential config documents.
//!
//! [`FileReader`] is the seam the credential registry reads through.
//! [`SchemeFileReader`] picks a concrete reader from the URL scheme.

mod http;
mod local;
mod reader;
mod s3;

pub use http::HttpFileReader;
pub use local::LocalFileReader;
pub use reader::FileReader;
pub use s3::{S3FileReader, parse_s3_location};

use async_trait::async_trait;
use std::io;
use url::Url;

/// Dispatches to a reader based on the URL scheme.
///
/// `s3://` needs an S3 client; without one those locations fail to read.
pub struct SchemeFileReader {
    local: LocalFileReader,
    http: HttpFileReader,
    s3: Option<S3FileReader>,
}

impl SchemeFileReader {
    pub fn new(s3: Option<S3FileReader>) -> Self {
        Self {
            local: LocalFileReader,
            http: HttpFileReader::new(),
            s3,
        }
    }
}

#[async_trait]
impl FileReader for SchemeFileReader {
    async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
        match url.scheme() {
            "file" => self.local.read(url).await,
            "http" | "https" => self.http.read(url).await,
            "s3" => match &self.s3 {
                Some(reader) => reader.read(url).await,
                None => Err(io::Error::new(
                    io::ErrorKind::Unsupported,
                    format!("no S3 client configured to read {url}"),
                )),
            },
            scheme => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("unsupported scheme `{scheme}` in {url}"),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_url_reads_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"v":2,"prefixes":[]}"#).unwrap();

        let reader = SchemeFileReader::new(None);
        let url = Url::from_file_path(file.path()).unwrap();
        let bytes = reader.read(&url).await.unwrap();
        assert_eq!(bytes, br#"{"v":2,"prefixes":[]}"#);
    }

    #[tokio::test]
    async fn test_s3_without_client_is_unsupported() {
        let reader = SchemeFileReader::new(None);
        let url: Url = "s3://cfg/creds.json".parse().unwrap();
        let err = reader.read(&url).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    }

    #[tokio::test]
    async fn test_unknown_scheme_is_unsupported() {
        let reader = SchemeFileReader::new(None);
        let url: Url = "gs://cfg/creds.json".parse().unwrap();
        let err = reader.read(&url).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Unsupported);
        assert!(err.to_string().contains("gs"));
    }
}
