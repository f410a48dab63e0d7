//! Sandboxed creative renderer.
//!
//! A [`Renderer`] owns at most one isolated surface and shows one creative
//! in it at the creative's declared size. HTML creatives are fetched as text
//! and get a `<base>` pointing at their own directory; images are preloaded
//! and wrapped in a small fixed-size document. Content is always injected
//! into the surface, never navigated to.
//!
//! Every mount bumps a generation counter kept next to the published state.
//! Continuations and load callbacks compare against it before touching
//! anything, so a slow fetch for an old creative can never land on a newer
//! surface.

pub mod document;
pub mod fetch;
pub mod surface;

pub use document::CreativeKind;
pub use fetch::{sniff_image, CreativeFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use surface::{
    LoadCallback, MemorySurface, MemorySurfaceFactory, MemorySurfaceHandle, RenderSurface,
    Sandbox, SurfaceFactory,
};

use crate::size::AdSize;
use crate::{RendererConfig, Result};
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use url::Url;

/// A creative to display: its address and declared `"WxH"` size
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CreativeRef {
    pub address: String,
    pub size: String,
}

impl CreativeRef {
    pub fn new(address: impl Into<String>, size: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            size: size.into(),
        }
    }

    pub fn kind(&self) -> CreativeKind {
        CreativeKind::from_address(&self.address)
    }
}

/// Lifecycle of a renderer's surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Unmounted,
    Loading,
    Ready,
    /// Terminal until the next mount; the surface stays blank
    Failed,
}

/// State published to observers, tagged with the mount it belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    pub generation: u64,
    pub state: RenderState,
}

#[derive(Default)]
struct Slot {
    creative: Option<CreativeRef>,
    surface: Option<Box<dyn RenderSurface>>,
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(|e| e.into_inner())
}

/// Move `generation` from `Loading` to `state`. No-op for stale generations.
fn settle(status: &watch::Sender<Status>, generation: u64, state: RenderState) -> bool {
    status.send_if_modified(|s| {
        if s.generation == generation && s.state == RenderState::Loading {
            s.state = state;
            true
        } else {
            false
        }
    })
}

/// Shows one creative at a time inside an isolated surface.
pub struct Renderer {
    config: RendererConfig,
    host_origin: Url,
    fetcher: Arc<dyn CreativeFetcher>,
    factory: Arc<dyn SurfaceFactory>,
    status: Arc<watch::Sender<Status>>,
    slot: Arc<Mutex<Slot>>,
}

impl Renderer {
    pub fn new(
        config: RendererConfig,
        fetcher: Arc<dyn CreativeFetcher>,
        factory: Arc<dyn SurfaceFactory>,
    ) -> Result<Self> {
        let host_origin = config.host_url()?;
        let (tx, _rx) = watch::channel(Status {
            generation: 0,
            state: RenderState::Unmounted,
        });
        Ok(Self {
            config,
            host_origin,
            fetcher,
            factory,
            status: Arc::new(tx),
            slot: Arc::new(Mutex::new(Slot::default())),
        })
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    pub fn state(&self) -> RenderState {
        self.status.borrow().state
    }

    /// True from the start of a mount until its surface loaded or failed
    pub fn is_loading(&self) -> bool {
        self.state() == RenderState::Loading
    }

    pub fn generation(&self) -> u64 {
        self.status.borrow().generation
    }

    /// Watch state transitions, e.g. to drop a loading placeholder
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.status.subscribe()
    }

    /// The creative currently mounted or loading
    pub fn creative(&self) -> Option<CreativeRef> {
        lock(&self.slot).creative.clone()
    }

    /// Content of the current surface, `None` while blank or unmounted
    pub fn content(&self) -> Option<String> {
        lock(&self.slot).surface.as_ref().and_then(|s| s.content())
    }

    /// Mount `creative`, discarding whatever was shown before.
    ///
    /// The old surface is destroyed and the new one created before this
    /// returns; the returned future performs the fetch. It resolves to the
    /// state this mount settled in, or `None` if a later mount or
    /// [`Renderer::unmount`] superseded it first.
    pub fn mount(
        &self,
        creative: CreativeRef,
    ) -> impl Future<Output = Option<RenderState>> + Send + 'static {
        let size = AdSize::parse_or(&creative.size, self.config.fallback_size);
        let kind = creative.kind();
        let address = creative.address.clone();
        let generation = self.begin(creative, size);

        log::info!(
            "mounting {:?} creative {} at {} (#{})",
            kind,
            address,
            size,
            generation
        );

        let base = document::base_href(&address, &self.host_origin);
        let src = document::image_src(&address, &base, &self.host_origin);
        let fetcher = self.fetcher.clone();
        let status = self.status.clone();
        let slot = self.slot.clone();

        async move {
            let content = match kind {
                CreativeKind::Document => fetcher
                    .fetch_document(&address)
                    .await
                    .map(|html| document::inject_base(&html, &base)),
                CreativeKind::Image => fetcher
                    .preload_image(&address)
                    .await
                    .map(|()| document::image_document(&src, size, &base)),
            };

            match content {
                Ok(content) => {
                    if !apply(&slot, &status, generation, content) {
                        log::debug!("discarding stale content for {} (#{})", address, generation);
                        return None;
                    }
                }
                Err(e) => {
                    log::warn!("failed to load creative {}: {}", address, e);
                    if !settle(&status, generation, RenderState::Failed) {
                        return None;
                    }
                }
            }

            let current = *status.borrow();
            (current.generation == generation).then_some(current.state)
        }
    }

    /// Restart the current creative by discarding its surface and mounting it
    /// again. Resolves to `None` right away when nothing is mounted.
    pub fn replay(&self) -> impl Future<Output = Option<RenderState>> + Send + 'static {
        let pending = self.creative().map(|creative| self.mount(creative));
        async move {
            match pending {
                Some(mount) => mount.await,
                None => None,
            }
        }
    }

    /// Destroy the surface and abandon any in-flight mount.
    pub fn unmount(&self) {
        let mut slot = lock(&self.slot);
        if let Some(mut surface) = slot.surface.take() {
            surface.destroy();
        }
        slot.creative = None;
        self.status.send_modify(|s| {
            s.generation += 1;
            s.state = RenderState::Unmounted;
        });
    }

    /// Synchronous half of a mount: swap in a fresh surface and publish
    /// `Loading` under a new generation.
    fn begin(&self, creative: CreativeRef, size: AdSize) -> u64 {
        let mut slot = lock(&self.slot);

        if let Some(mut old) = slot.surface.take() {
            old.destroy();
        }
        let mut generation = 0;
        self.status.send_modify(|s| {
            s.generation += 1;
            s.state = RenderState::Unmounted;
            generation = s.generation;
        });

        let mut surface = self.factory.create(self.config.sandbox);
        surface.set_size(size);
        let status = self.status.clone();
        surface.on_load(Box::new(move || {
            settle(&status, generation, RenderState::Ready);
        }));

        slot.creative = Some(creative);
        slot.surface = Some(surface);
        self.status.send_modify(|s| s.state = RenderState::Loading);
        generation
    }
}

/// Load `content` into the surface if `generation` is still current.
fn apply(
    slot: &Mutex<Slot>,
    status: &watch::Sender<Status>,
    generation: u64,
    content: String,
) -> bool {
    let mut slot = lock(slot);
    if status.borrow().generation != generation {
        return false;
    }
    match slot.surface.as_mut() {
        Some(surface) => {
            surface.mount(content);
            true
        }
        None => false,
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        if let Some(mut surface) = lock(&self.slot).surface.take() {
            surface.destroy();
        }
        self.status.send_modify(|s| {
            s.generation += 1;
            s.state = RenderState::Unmounted;
        });
    }
}
