use super::reader::FileReader;
use async_trait::async_trait;
use std::io;
use url::Url;

/// Reads `http://` and `https://` locations with a GET request.
pub struct HttpFileReader(reqwest::Client);

impl HttpFileReader {
    pub fn new() -> Self {
        Self(reqwest::Client::new())
    }
}

impl Default for HttpFileReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FileReader for HttpFileReader {
    async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
        let resp = self
            .0
            .get(url.clone())
            .send()
            .await
            .map_err(io::Error::other)?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("GET {url} returned {status}"),
            ));
        }
        if !status.is_success() {
            return Err(io::Error::other(format!("GET {url} returned {status}")));
        }

        Ok(resp.bytes().await.map_err(io::Error::other)?.to_vec())
    }
}
