mod http;
mod local;

pub use http::HttpImageSource;
pub use local::LocalFileSource;

use anyhow::Result;
use async_trait::async_trait;

/// Trait for loading the raw bytes of a source image
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Fetch the complete encoded image
    async fn fetch(&self) -> Result<Vec<u8>>;

    /// Human-readable location, used in messages
    fn describe(&self) -> String;
}

/// Whether `input` names an HTTP(S) resource rather than a local path.
pub fn is_http_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Pick the source implementation for a path or URL.
pub fn open_source(input: &str) -> Result<Box<dyn ImageSource>> {
    if is_http_url(input) {
        Ok(Box::new(HttpImageSource::new(input.to_string())?))
    } else {
        Ok(Box::new(LocalFileSource::new(input)))
    }
}
