//! Fetching creative content out-of-band from the surface.

use crate::Result;
use futures::future::BoxFuture;

/// Source of creative bytes for the renderer.
///
/// Both operations resolve once, with the document text or with the image
/// being ready for display. Implementations must not panic on network
/// failure; the renderer turns errors into a blank, failed surface.
pub trait CreativeFetcher: Send + Sync {
    /// Fetch an HTML creative as text
    fn fetch_document<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<String>>;

    /// Load an image creative so it can be shown without further waiting
    fn preload_image<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<()>>;
}

/// Image format recognized from the leading bytes of a response body.
///
/// A declared `Content-Type` that is neither `image/*` nor a generic binary
/// type vetoes the body outright, matching a browser image that errors on a
/// soft-404 page or a JSON error.
pub fn sniff_image(content_type: Option<&str>, body: &[u8]) -> Option<&'static str> {
    let essence = content_type
        .and_then(|ct| ct.split(';').next())
        .map(|ct| ct.trim().to_ascii_lowercase());
    if let Some(essence) = &essence {
        if !essence.starts_with("image/") && essence != "application/octet-stream" {
            return None;
        }
    }

    const SIGNATURES: &[(&[u8], &str)] = &[
        (b"\x89PNG\r\n\x1a\n", "png"),
        (b"\xff\xd8\xff", "jpeg"),
        (b"GIF87a", "gif"),
        (b"GIF89a", "gif"),
        (b"BM", "bmp"),
        (b"\x00\x00\x01\x00", "ico"),
    ];
    if let Some(&(_, format)) = SIGNATURES.iter().find(|(magic, _)| body.starts_with(magic)) {
        return Some(format);
    }
    if body.len() >= 12 && &body[..4] == b"RIFF" && &body[8..12] == b"WEBP" {
        return Some("webp");
    }
    if body.len() >= 12 && &body[4..8] == b"ftyp" && matches!(&body[8..12], b"avif" | b"avis") {
        return Some("avif");
    }

    // SVG is text; look for the root element near the top
    let head = String::from_utf8_lossy(&body[..body.len().min(1024)]).to_ascii_lowercase();
    let head = head.trim_start_matches('\u{feff}').trim_start();
    let svg_typed = essence.as_deref() == Some("image/svg+xml");
    let svg_root = head.starts_with("<svg") || head.starts_with("<?xml") || svg_typed;
    if svg_root && head.contains("<svg") {
        return Some("svg");
    }
    None
}

#[cfg(feature = "http")]
pub use http::HttpFetcher;

#[cfg(feature = "http")]
mod http {
    use super::{sniff_image, CreativeFetcher};
    use crate::{Error, RendererConfig, Result};
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use reqwest::Client;
    use std::time::Duration;
    use url::Url;

    /// Fetches creatives over HTTP(S), resolving relative addresses against
    /// the configured host origin.
    #[derive(Clone)]
    pub struct HttpFetcher {
        client: Client,
        host_origin: Url,
    }

    impl HttpFetcher {
        pub fn new(config: &RendererConfig) -> Result<Self> {
            let host_origin = config.host_url()?;
            let client = Client::builder()
                .user_agent(config.user_agent.clone())
                .timeout(Duration::from_millis(config.timeout_ms))
                .build()
                .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
            Ok(Self {
                client,
                host_origin,
            })
        }

        fn resolve(&self, address: &str) -> Result<Url> {
            self.host_origin
                .join(address)
                .map_err(|e| Error::LoadError(format!("Bad creative address {}: {}", address, e)))
        }

        async fn get(&self, address: &str) -> Result<reqwest::Response> {
            let url = self.resolve(address)?;
            let resp = self
                .client
                .get(url)
                .send()
                .await
                .map_err(|e| Error::NetworkError(format!("Failed to fetch {}: {}", address, e)))?;
            resp.error_for_status()
                .map_err(|e| Error::LoadError(format!("Failed to fetch {}: {}", address, e)))
        }
    }

    impl CreativeFetcher for HttpFetcher {
        fn fetch_document<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<String>> {
            async move {
                let resp = self.get(address).await?;
                resp.text()
                    .await
                    .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))
            }
            .boxed()
        }

        fn preload_image<'a>(&'a self, address: &'a str) -> BoxFuture<'a, Result<()>> {
            async move {
                let resp = self.get(address).await?;
                let content_type = resp
                    .headers()
                    .get(reqwest::header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let body = resp.bytes().await.map_err(|e| {
                    Error::LoadError(format!("Failed to read image {}: {}", address, e))
                })?;
                if body.is_empty() {
                    return Err(Error::LoadError(format!("Empty image body for {}", address)));
                }
                match sniff_image(content_type.as_deref(), &body) {
                    Some(format) => {
                        log::debug!("preloaded {} image {}", format, address);
                        Ok(())
                    }
                    None => Err(Error::LoadError(format!(
                        "Not an image: {} ({})",
                        address,
                        content_type.as_deref().unwrap_or("no content type")
                    ))),
                }
            }
            .boxed()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_common_image_formats() {
        assert_eq!(sniff_image(Some("image/png"), b"\x89PNG\r\n\x1a\n...."), Some("png"));
        assert_eq!(sniff_image(None, b"\xff\xd8\xff\xe0JFIF"), Some("jpeg"));
        assert_eq!(sniff_image(Some("image/gif"), b"GIF89a\x01\x00"), Some("gif"));
        assert_eq!(sniff_image(None, b"RIFF\x10\x00\x00\x00WEBPVP8 "), Some("webp"));
        assert_eq!(
            sniff_image(Some("application/octet-stream"), b"\x00\x00\x00\x1cftypavif"),
            Some("avif")
        );
        let svg = br#"<?xml version="1.0"?><svg xmlns="http://www.w3.org/2000/svg"/>"#;
        assert_eq!(sniff_image(Some("image/svg+xml; charset=utf-8"), svg), Some("svg"));
    }

    #[test]
    fn rejects_pages_served_in_place_of_images() {
        let page = b"<!DOCTYPE html><html><body>Not found</body></html>";
        assert_eq!(sniff_image(Some("text/html; charset=utf-8"), page), None);
        assert_eq!(sniff_image(None, page), None);
        assert_eq!(sniff_image(Some("image/png"), page), None);
        assert_eq!(sniff_image(Some("application/json"), b"{\"error\":\"gone\"}"), None);
        // a real PNG still fails when the server says it is HTML
        assert_eq!(sniff_image(Some("text/html"), b"\x89PNG\r\n\x1a\n"), None);
        assert_eq!(sniff_image(None, b""), None);
    }
}
