use crate::config::DemoConfig;
use crate::gfx::{Graphics, RenderContext};
use crate::vr::{DeviceSession, Eye, VrDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Displayed size of the window in logical units and its scale factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayMetrics {
    pub logical_width: f64,
    pub logical_height: f64,
    pub pixel_ratio: f64,
}

impl DisplayMetrics {
    pub fn new(logical_width: f64, logical_height: f64, pixel_ratio: f64) -> Self {
        Self {
            logical_width,
            logical_height,
            pixel_ratio,
        }
    }

    pub fn from_window(window: &winit::window::Window) -> Self {
        let pixel_ratio = window.scale_factor();
        let logical = window.inner_size().to_logical::<f64>(pixel_ratio);
        Self::new(logical.width, logical.height, pixel_ratio)
    }

    pub fn physical_size(&self) -> SurfaceSize {
        SurfaceSize::new(
            (self.logical_width * self.pixel_ratio).round() as u32,
            (self.logical_height * self.pixel_ratio).round() as u32,
        )
    }
}

/// Size the surface should have: both eyes side by side while presenting,
/// the displayed size otherwise.
pub fn surface_size<D: VrDisplay>(metrics: DisplayMetrics, session: Option<&DeviceSession<D>>) -> SurfaceSize {
    match session {
        Some(session) if session.is_presenting() => {
            let left = session.display().eye_parameters(Eye::Left);
            let right = session.display().eye_parameters(Eye::Right);
            SurfaceSize::new(
                left.render_width.max(right.render_width) * 2,
                left.render_height.max(right.render_height),
            )
        }
        _ => metrics.physical_size(),
    }
}

/// Everything bound to one rendering context. Held as a unit so the scene
/// and stats never outlive the context they were built on.
pub struct RenderResources<G: Graphics> {
    pub context: G::Context,
    pub scene: G::Scene,
    pub stats: G::Stats,
}

pub struct SurfaceManager<G: Graphics> {
    graphics: G,
    size: SurfaceSize,
    resources: Option<RenderResources<G>>,
}

impl<G: Graphics> SurfaceManager<G> {
    pub fn new(graphics: G, size: SurfaceSize) -> Self {
        Self {
            graphics,
            size,
            resources: None,
        }
    }

    /// Builds a fresh context and the objects bound to it. Returns false
    /// when no context could be created; rendering stays disabled.
    pub fn initialize(&mut self, config: &DemoConfig) -> bool {
        let context = match self.graphics.create_context(self.size, config.clear_color) {
            Ok(context) => context,
            Err(e) => {
                log::error!("Unable to create rendering context: {}", e);
                self.resources = None;
                return false;
            }
        };

        let texture = self.graphics.load_texture(&context, &config.texture_path);
        let scene = self.graphics.create_scene(&context, texture, config.grid_size);
        let stats = self.graphics.create_stats(&context, config.perf_monitor);

        self.resources = Some(RenderResources {
            context,
            scene,
            stats,
        });
        true
    }

    pub fn resize<D: VrDisplay>(&mut self, metrics: DisplayMetrics, session: Option<&DeviceSession<D>>) {
        let size = surface_size(metrics, session);
        if size != self.size {
            log::debug!("Surface resized to {}x{}", size.width, size.height);
        }
        self.size = size;
        if let Some(resources) = &mut self.resources {
            resources.context.resize(size);
        }
    }

    pub fn handle_context_lost(&mut self) {
        log::warn!("Rendering context lost");
        self.resources = None;
    }

    pub fn handle_context_restored(&mut self, config: &DemoConfig) -> bool {
        log::info!("Rendering context restored");
        self.initialize(config)
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    pub fn resources(&self) -> Option<&RenderResources<G>> {
        self.resources.as_ref()
    }

    pub fn resources_mut(&mut self) -> Option<&mut RenderResources<G>> {
        self.resources.as_mut()
    }

    pub fn graphics(&self) -> &G {
        &self.graphics
    }
}
