use super::ImageSource;
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Image stored on the local filesystem
pub struct LocalFileSource {
    path: PathBuf,
}

impl LocalFileSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImageSource for LocalFileSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .with_context(|| format!("Cannot open {}", self.path.display()))?;
        if !metadata.is_file() {
            bail!("{} is not a file", self.path.display());
        }

        let bytes = tokio::fs::read(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(bytes)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let source = LocalFileSource::new(file.path());
        assert_eq!(source.fetch().await.unwrap(), b"\x89PNG fake");
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalFileSource::new(dir.path().join("missing.png"));
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("Cannot open"));
    }

    #[tokio::test]
    async fn directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = LocalFileSource::new(dir.path());
        assert!(source.fetch().await.is_err());
    }
}
