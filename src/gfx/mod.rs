pub mod context;
pub mod texture;
pub mod uniforms;

pub use context::{WgpuContext, WgpuGraphics};
pub use texture::{PendingTexture, Texture, TextureLoader};
pub use uniforms::UniformRing;

use std::path::Path;

use glam::Mat4;

use crate::error::ContextError;
use crate::surface::SurfaceSize;

/// Pixel rectangle of the surface that subsequent draws land in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn full(size: SurfaceSize) -> Self {
        Self::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    /// Left and right halves of the surface, one per eye.
    pub fn stereo_halves(size: SurfaceSize) -> (Self, Self) {
        let half = size.width as f32 * 0.5;
        let height = size.height as f32;
        (
            Self::new(0.0, 0.0, half, height),
            Self::new(half, 0.0, half, height),
        )
    }

    pub fn aspect(&self) -> f32 {
        if self.height > 0.0 {
            self.width / self.height
        } else {
            1.0
        }
    }
}

/// Immediate-mode view of a rendering context: a frame is a `clear`, any
/// number of viewport changes and draws, then `present`.
pub trait RenderContext {
    fn size(&self) -> SurfaceSize;
    fn resize(&mut self, size: SurfaceSize);
    /// Starts a frame with the color and depth buffers cleared.
    fn clear(&mut self) -> Result<(), ContextError>;
    fn set_viewport(&mut self, viewport: Viewport);
    fn viewport(&self) -> Viewport;
    fn present(&mut self) -> Result<(), ContextError>;
}

pub trait StatsOverlay<C> {
    fn begin(&mut self);
    fn end(&mut self);
    /// Draws the overlay in screen space over the current viewport.
    fn render_ortho(&mut self, ctx: &mut C);
}

pub trait SceneRenderer<C, S> {
    fn render(&mut self, ctx: &mut C, projection: &Mat4, view: &Mat4, stats: &mut S, t: f64);
}

/// Factory for a rendering context and everything bound to it.
pub trait Graphics {
    type Context: RenderContext;
    type Stats: StatsOverlay<Self::Context>;
    type Scene: SceneRenderer<Self::Context, Self::Stats>;
    type Texture;

    fn create_context(
        &mut self,
        size: SurfaceSize,
        clear_color: [f64; 4],
    ) -> Result<Self::Context, ContextError>;
    /// Starts loading `path`; the returned handle resolves later.
    fn load_texture(&mut self, ctx: &Self::Context, path: &Path) -> Self::Texture;
    fn create_scene(&mut self, ctx: &Self::Context, texture: Self::Texture, grid_size: u32) -> Self::Scene;
    fn create_stats(&mut self, ctx: &Self::Context, perf_monitor: bool) -> Self::Stats;
}
