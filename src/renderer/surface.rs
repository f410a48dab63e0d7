//! Isolated render surfaces.
//!
//! A surface is whatever the host uses to run creative content away from its
//! own page: a sandboxed iframe, an embedded webview, a child process. The
//! renderer only needs to hand it content, size it, hear when it finished
//! loading, and tear it down.

use crate::size::AdSize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Callback fired by a surface once its content finished loading
pub type LoadCallback = Box<dyn Fn() + Send + Sync>;

/// Capabilities granted to a surface.
///
/// Top-level navigation without user activation is never grantable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sandbox {
    /// Let the creative run its own scripts
    pub allow_scripts: bool,
    /// Needed for the creative's relative fetches under the injected base
    pub allow_same_origin: bool,
    /// Explicit opt-in for click-through navigation
    pub allow_top_navigation_by_user_activation: bool,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self {
            allow_scripts: true,
            allow_same_origin: true,
            allow_top_navigation_by_user_activation: false,
        }
    }
}

impl Sandbox {
    /// Space-separated token list in iframe `sandbox` attribute syntax
    pub fn to_attribute(&self) -> String {
        let mut tokens = Vec::new();
        if self.allow_scripts {
            tokens.push("allow-scripts");
        }
        if self.allow_same_origin {
            tokens.push("allow-same-origin");
        }
        if self.allow_top_navigation_by_user_activation {
            tokens.push("allow-top-navigation-by-user-activation");
        }
        tokens.join(" ")
    }
}

/// An isolated, script-capable display context owned by one renderer.
pub trait RenderSurface: Send {
    /// Replace the surface content. Content is injected directly; the surface
    /// never navigates to the creative's address.
    fn mount(&mut self, content: String);

    fn set_size(&mut self, size: AdSize);

    /// Register the load-complete callback, replacing any previous one.
    fn on_load(&mut self, cb: LoadCallback);

    /// Currently mounted content, `None` while blank
    fn content(&self) -> Option<String>;

    /// Tear the surface down and drop any pending callbacks
    fn destroy(&mut self);
}

/// Creates surfaces for a renderer.
pub trait SurfaceFactory: Send + Sync {
    /// A blank surface with the given capabilities; the renderer sizes it.
    fn create(&self, sandbox: Sandbox) -> Box<dyn RenderSurface>;
}

/// Observable state of a [`MemorySurface`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemorySurfaceState {
    pub size: Option<AdSize>,
    pub sandbox: Option<Sandbox>,
    pub content: Option<String>,
    pub loads: u32,
    pub destroyed: bool,
}

/// Shared view of a surface created by [`MemorySurfaceFactory`]
#[derive(Clone, Default)]
pub struct MemorySurfaceHandle {
    state: Arc<Mutex<MemorySurfaceState>>,
}

impl MemorySurfaceHandle {
    fn lock(&self) -> MutexGuard<'_, MemorySurfaceState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> MemorySurfaceState {
        self.lock().clone()
    }

    pub fn content(&self) -> Option<String> {
        self.lock().content.clone()
    }

    pub fn is_destroyed(&self) -> bool {
        self.lock().destroyed
    }
}

/// In-process surface that reports loaded as soon as content is mounted.
///
/// Used by the CLI and tests, and as a stand-in for hosts that render the
/// content elsewhere.
pub struct MemorySurface {
    handle: MemorySurfaceHandle,
    on_load: Option<LoadCallback>,
}

impl MemorySurface {
    pub fn new(sandbox: Sandbox) -> Self {
        let handle = MemorySurfaceHandle::default();
        handle.lock().sandbox = Some(sandbox);
        Self {
            handle,
            on_load: None,
        }
    }

    pub fn handle(&self) -> MemorySurfaceHandle {
        self.handle.clone()
    }
}

impl RenderSurface for MemorySurface {
    fn mount(&mut self, content: String) {
        {
            let mut s = self.handle.lock();
            if s.destroyed {
                return;
            }
            s.content = Some(content);
            s.loads += 1;
        }
        // fire outside the lock so the callback may inspect the handle
        if let Some(cb) = &self.on_load {
            cb();
        }
    }

    fn set_size(&mut self, size: AdSize) {
        self.handle.lock().size = Some(size);
    }

    fn on_load(&mut self, cb: LoadCallback) {
        self.on_load = Some(cb);
    }

    fn content(&self) -> Option<String> {
        self.handle.content()
    }

    fn destroy(&mut self) {
        self.on_load = None;
        let mut s = self.handle.lock();
        s.destroyed = true;
        s.content = None;
    }
}

/// Factory for [`MemorySurface`]s that remembers every surface it made.
#[derive(Clone, Default)]
pub struct MemorySurfaceFactory {
    created: Arc<Mutex<Vec<MemorySurfaceHandle>>>,
}

impl MemorySurfaceFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&self) -> Vec<MemorySurfaceHandle> {
        self.created.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last(&self) -> Option<MemorySurfaceHandle> {
        self.created().pop()
    }
}

impl SurfaceFactory for MemorySurfaceFactory {
    fn create(&self, sandbox: Sandbox) -> Box<dyn RenderSurface> {
        let surface = MemorySurface::new(sandbox);
        self.created
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(surface.handle());
        Box::new(surface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn default_sandbox_grants_scripts_and_same_origin_only() {
        let sb = Sandbox::default();
        assert_eq!(sb.to_attribute(), "allow-scripts allow-same-origin");
        let opt_in = Sandbox {
            allow_top_navigation_by_user_activation: true,
            ..Default::default()
        };
        assert_eq!(
            opt_in.to_attribute(),
            "allow-scripts allow-same-origin allow-top-navigation-by-user-activation"
        );
        assert!(!opt_in.to_attribute().contains("allow-top-navigation "));
    }

    #[test]
    fn memory_surface_fires_load_and_goes_blank_on_destroy() {
        let fired = Arc::new(AtomicU32::new(0));
        let mut surface = MemorySurface::new(Sandbox::default());
        let handle = surface.handle();
        surface.set_size(AdSize::new(300, 250));
        assert_eq!(handle.snapshot().size, Some(AdSize::new(300, 250)));
        let f = fired.clone();
        surface.on_load(Box::new(move || {
            f.fetch_add(1, Ordering::SeqCst);
        }));

        surface.mount("<p>ad</p>".into());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(surface.content().as_deref(), Some("<p>ad</p>"));

        surface.destroy();
        assert!(handle.is_destroyed());
        assert_eq!(handle.content(), None);
        surface.mount("late".into());
        assert_eq!(handle.content(), None);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn factory_tracks_created_surfaces() {
        let factory = MemorySurfaceFactory::new();
        let _a = factory.create(Sandbox::default());
        let mut b = factory.create(Sandbox::default());
        b.set_size(AdSize::new(160, 600));
        assert_eq!(factory.created().len(), 2);
        assert_eq!(factory.last().unwrap().snapshot().size, Some(AdSize::new(160, 600)));
    }
}
