use glam::Mat4;

use crate::config::DemoConfig;
use crate::error::FrameError;
use crate::gfx::{Graphics, RenderContext, SceneRenderer, StatsOverlay, Viewport};
use crate::surface::{RenderResources, SurfaceManager};
use crate::vr::{DeviceSession, FrameData, VrDisplay};

/// Source of display-refresh ticks. Each request arms exactly one tick;
/// a tick that wants a successor has to request it again.
pub trait FrameScheduler {
    fn request_animation_frame(&mut self);
    fn is_frame_requested(&self) -> bool;
    /// Waits for the next refresh if a tick is armed and consumes it.
    fn poll_animation_frame(&mut self) -> bool;
}

/// The window's own refresh cadence: the event loop turns an armed tick
/// into a redraw request, presentation paces it.
#[derive(Debug, Default)]
pub struct RefreshScheduler {
    armed: bool,
}

impl RefreshScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FrameScheduler for RefreshScheduler {
    fn request_animation_frame(&mut self) {
        self.armed = true;
    }

    fn is_frame_requested(&self) -> bool {
        self.armed
    }

    fn poll_animation_frame(&mut self) -> bool {
        std::mem::take(&mut self.armed)
    }
}

/// Per-tick render path selection.
pub struct FrameDispatcher {
    frame_data: FrameData,
    projection: Mat4,
    view: Mat4,
    fov_y: f32,
    depth_near: f32,
    depth_far: f32,
}

impl FrameDispatcher {
    pub fn new(config: &DemoConfig) -> Self {
        Self {
            frame_data: FrameData::new(),
            projection: Mat4::IDENTITY,
            view: Mat4::IDENTITY,
            fov_y: config.fov_y,
            depth_near: config.depth_near,
            depth_far: config.depth_far,
        }
    }

    pub fn frame_data(&self) -> &FrameData {
        &self.frame_data
    }

    fn mono_projection(&mut self, viewport: Viewport) {
        self.projection = Mat4::perspective_rh(self.fov_y, viewport.aspect(), self.depth_near, self.depth_far);
    }

    pub fn on_animation_frame<G, D, P>(
        &mut self,
        t: f64,
        surface: &mut SurfaceManager<G>,
        session: Option<&mut DeviceSession<D>>,
        platform: &mut P,
    ) -> Result<(), FrameError>
    where
        G: Graphics,
        D: VrDisplay,
        P: FrameScheduler,
    {
        let size = surface.size();
        let Some(RenderResources { context, scene, stats }) = surface.resources_mut() else {
            return Ok(());
        };

        stats.begin();
        context.clear()?;

        match session {
            Some(session) => {
                session.display_mut().request_animation_frame();
                session.display_mut().get_frame_data(&mut self.frame_data)?;

                if session.is_presenting() {
                    let (left, right) = Viewport::stereo_halves(size);

                    context.set_viewport(left);
                    scene.render(
                        context,
                        &self.frame_data.left_projection,
                        &self.frame_data.left_view,
                        stats,
                        t,
                    );

                    context.set_viewport(right);
                    scene.render(
                        context,
                        &self.frame_data.right_projection,
                        &self.frame_data.right_view,
                        stats,
                        t,
                    );

                    session.display_mut().submit_frame()?;
                } else {
                    let viewport = Viewport::full(size);
                    context.set_viewport(viewport);
                    self.mono_projection(viewport);
                    scene.render(context, &self.projection, &self.frame_data.left_view, stats, t);
                    stats.render_ortho(context);
                }
            }
            None => {
                platform.request_animation_frame();

                let viewport = Viewport::full(size);
                context.set_viewport(viewport);
                self.mono_projection(viewport);
                self.view = Mat4::IDENTITY;
                scene.render(context, &self.projection, &self.view, stats, t);
                stats.render_ortho(context);
            }
        }

        stats.end();
        context.present()?;
        Ok(())
    }
}
