//! Ad Gallery core
//!
//! Layout and preview plumbing for a campaign-based gallery of advertising
//! creatives: a masonry packer that buckets variable-sized ad cards into
//! columns, and a renderer that shows each HTML or image creative inside an
//! isolated surface at its exact declared size.
//!
//! # Features
//!
//! - **Masonry packing**: greedy column bucketing that recomputes on resize
//! - **Sandboxed previews**: `<base>` rewriting, image wrapping, replay
//! - **Safe Defaults**: scripts and same-origin only, navigation is opt-in
//!
//! # Example
//!
//! ```no_run
//! use adgallery::masonry::{pack, LayoutItem};
//! use adgallery::renderer::{CreativeRef, HttpFetcher, MemorySurfaceFactory, Renderer};
//! use adgallery::RendererConfig;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let items = vec![LayoutItem::new("a", "300x250"), LayoutItem::new("b", "728x90")];
//! let layout = pack(&items, 1280, 10);
//! println!("{} columns", layout.column_count());
//!
//! let config = RendererConfig {
//!     host_origin: "https://gallery.example/".to_string(),
//!     ..Default::default()
//! };
//! let fetcher = Arc::new(HttpFetcher::new(&config)?);
//! let renderer = Renderer::new(config, fetcher, Arc::new(MemorySurfaceFactory::new()))?;
//! renderer
//!     .mount(CreativeRef::new("https://cdn.example/c1/index.html", "300x250"))
//!     .await;
//! println!("loading: {}", renderer.is_loading());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub use error::{Error, Result};

pub mod gallery;
pub mod masonry;
pub mod renderer;
pub mod size;

pub use masonry::{pack, Column, LayoutItem, LayoutResult, MasonryPacker};
pub use renderer::{CreativeRef, RenderState, Renderer, Sandbox};
pub use size::AdSize;

use url::Url;

/// Configuration for creative renderers
///
/// The defaults are conservative: surfaces may run scripts and reach their
/// own origin, but cannot navigate the host page.
///
/// # Examples
///
/// ```
/// let cfg = adgallery::RendererConfig::default();
/// assert!(cfg.user_agent.contains("AdGallery"));
/// assert!(!cfg.sandbox.allow_top_navigation_by_user_activation);
/// ```
#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// User agent string sent when fetching creatives
    pub user_agent: String,
    /// Timeout for creative fetches in milliseconds
    pub timeout_ms: u64,
    /// URL of the embedding page; relative creative addresses resolve here
    pub host_origin: String,
    /// Capabilities granted to each surface
    pub sandbox: Sandbox,
    /// Size used when a creative's size token does not parse
    pub fallback_size: AdSize,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AdGallery/0.1".to_string(),
            timeout_ms: 30000,
            host_origin: "http://localhost/".to_string(),
            sandbox: Sandbox::default(),
            fallback_size: AdSize::FALLBACK,
        }
    }
}

impl RendererConfig {
    /// Parsed `host_origin`
    pub fn host_url(&self) -> Result<Url> {
        Url::parse(&self.host_origin).map_err(|e| {
            Error::ConfigError(format!("host_origin {:?} is not a URL: {}", self.host_origin, e))
        })
    }
}

/// Configuration for a gallery view
#[derive(Debug, Clone)]
pub struct GalleryConfig {
    pub renderer: RendererConfig,
    /// Pixel spacing between cards
    pub gutter: u32,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            renderer: RendererConfig::default(),
            gutter: masonry::DEFAULT_GUTTER,
        }
    }
}
