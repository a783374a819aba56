use async_trait::async_trait;
use log::warn;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use super::ImageSource;
use anyhow::{Result, bail};

/// Image served over HTTP(S)
pub struct HttpImageSource {
    client: Client,
    url: String,
    transferred_bytes: AtomicU64,
    max_retry: u32,
}

impl HttpImageSource {
    pub fn new(url: String) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            url,
            transferred_bytes: AtomicU64::new(0),
            max_retry: 10,
        })
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }
}

/// Whether a `Content-Type` value may carry image data.
///
/// Servers that do not know the type send `application/octet-stream`;
/// anything else that is not `image/*` (an HTML error page, say) is refused
/// before it reaches the decoder.
fn is_image_content_type(value: &str) -> bool {
    let mime = value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("image/") || mime == "application/octet-stream"
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self) -> Result<Vec<u8>> {
        let mut retry_count = 0;

        loop {
            match self.client.get(&self.url).send().await {
                Ok(resp) => {
                    if !resp.status().is_success() {
                        bail!("HTTP request failed with status: {}", resp.status());
                    }

                    if let Some(content_type) = resp
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|v| v.to_str().ok())
                        && !is_image_content_type(content_type)
                    {
                        bail!("Remote resource is not an image (content-type: {content_type})");
                    }

                    let bytes = resp.bytes().await?;
                    self.transferred_bytes
                        .fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    return Ok(bytes.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        bail!("Max retries exceeded: {e}");
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_image_content_types() {
        assert!(is_image_content_type("image/png"));
        assert!(is_image_content_type("IMAGE/JPEG"));
        assert!(is_image_content_type("image/svg+xml; charset=utf-8"));
        assert!(is_image_content_type("application/octet-stream"));
    }

    #[test]
    fn rejects_other_content_types() {
        assert!(!is_image_content_type("text/html; charset=utf-8"));
        assert!(!is_image_content_type("application/json"));
        assert!(!is_image_content_type(""));
    }

    #[test]
    fn starts_with_no_transfer() {
        let source = HttpImageSource::new("https://example.com/logo.png".to_string()).unwrap();
        assert_eq!(source.transferred_bytes(), 0);
        assert_eq!(source.describe(), "https://example.com/logo.png");
    }
}
