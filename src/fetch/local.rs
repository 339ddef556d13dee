use super::reader::FileReader;
use async_trait::async_trait;
use std::io;
use url::Url;

/// Reads `file://` locations from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileReader;

#[async_trait]
impl FileReader for LocalFileReader {
    async fn read(&self, url: &Url) -> io::Result<Vec<u8>> {
        let path = url.to_file_path().map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{url} is not a local file path"),
            )
        })?;
        tokio::fs::read(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_reads_file_url() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"v":2,"prefixes":[]}"#).unwrap();

        let url = Url::from_file_path(file.path()).unwrap();
        let bytes = LocalFileReader.read(&url).await.unwrap();
        assert_eq!(bytes, br#"{"v":2,"prefixes":[]}"#);
    }

    #[tokio::test]
    async fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let url = Url::from_file_path(dir.path().join("absent.json")).unwrap();
        let err = LocalFileReader.read(&url).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_rejects_non_file_url() {
        let url: Url = "s3://bucket/key".parse().unwrap();
        let err = LocalFileReader.read(&url).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
