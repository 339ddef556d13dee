use async_trait::async_trait;
use url::Url;

/// Reads the raw bytes behind a URL.
///
/// Used to pull credential config documents from wherever they are kept.
/// Any access or read failure is reported as an I/O error.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn read(&self, url: &Url) -> std::io::Result<Vec<u8>>;
}
