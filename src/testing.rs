//! Headless stand-ins for the graphics and display backends.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glam::{Mat4, Vec3};

use crate::error::{ContextError, DisplayError};
use crate::frame::FrameScheduler;
use crate::gfx::{Graphics, RenderContext, SceneRenderer, StatsOverlay, Viewport};
use crate::surface::SurfaceSize;
use crate::vr::{
    Capabilities, DisplayDiscovery, DisplayEvent, Eye, EyeParameters, FrameData, VrDisplay,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Resize(SurfaceSize),
    Clear,
    Viewport(Viewport),
    Render { projection: Mat4, view: Mat4, t: f64 },
    StatsBegin,
    StatsEnd,
    RenderOrtho,
    Present,
}

pub type CallLog = Rc<RefCell<Vec<Call>>>;

pub struct MockGraphics {
    pub log: CallLog,
    pub fail_context_creation: bool,
    pub textures: Vec<PathBuf>,
    next_context_id: u32,
}

impl MockGraphics {
    pub fn new() -> Self {
        Self {
            log: Rc::new(RefCell::new(Vec::new())),
            fail_context_creation: false,
            textures: Vec::new(),
            next_context_id: 0,
        }
    }
}

pub struct MockContext {
    pub id: u32,
    pub clear_color: [f64; 4],
    pub lose_on_clear: bool,
    pub timeout_on_clear: bool,
    size: SurfaceSize,
    viewport: Viewport,
    log: CallLog,
}

impl RenderContext for MockContext {
    fn size(&self) -> SurfaceSize {
        self.size
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        self.log.borrow_mut().push(Call::Resize(size));
    }

    fn clear(&mut self) -> Result<(), ContextError> {
        if self.lose_on_clear {
            return Err(ContextError::Lost);
        }
        if self.timeout_on_clear {
            return Err(ContextError::Surface(wgpu::SurfaceError::Timeout));
        }
        self.log.borrow_mut().push(Call::Clear);
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.log.borrow_mut().push(Call::Viewport(viewport));
    }

    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn present(&mut self) -> Result<(), ContextError> {
        self.log.borrow_mut().push(Call::Present);
        Ok(())
    }
}

pub struct MockScene {
    pub context_id: u32,
    pub texture: PathBuf,
    pub grid_size: u32,
    log: CallLog,
}

impl SceneRenderer<MockContext, MockStats> for MockScene {
    fn render(&mut self, _ctx: &mut MockContext, projection: &Mat4, view: &Mat4, _stats: &mut MockStats, t: f64) {
        self.log.borrow_mut().push(Call::Render {
            projection: *projection,
            view: *view,
            t,
        });
    }
}

pub struct MockStats {
    pub context_id: u32,
    pub perf_monitor: bool,
    log: CallLog,
}

impl StatsOverlay<MockContext> for MockStats {
    fn begin(&mut self) {
        self.log.borrow_mut().push(Call::StatsBegin);
    }

    fn end(&mut self) {
        self.log.borrow_mut().push(Call::StatsEnd);
    }

    fn render_ortho(&mut self, _ctx: &mut MockContext) {
        self.log.borrow_mut().push(Call::RenderOrtho);
    }
}

impl Graphics for MockGraphics {
    type Context = MockContext;
    type Stats = MockStats;
    type Scene = MockScene;
    type Texture = PathBuf;

    fn create_context(&mut self, size: SurfaceSize, clear_color: [f64; 4]) -> Result<MockContext, ContextError> {
        if self.fail_context_creation {
            return Err(ContextError::Unavailable("mock".to_string()));
        }
        self.next_context_id += 1;
        Ok(MockContext {
            id: self.next_context_id,
            clear_color,
            lose_on_clear: false,
            timeout_on_clear: false,
            size,
            viewport: Viewport::full(size),
            log: self.log.clone(),
        })
    }

    fn load_texture(&mut self, _ctx: &MockContext, path: &Path) -> PathBuf {
        self.textures.push(path.to_path_buf());
        path.to_path_buf()
    }

    fn create_scene(&mut self, ctx: &MockContext, texture: PathBuf, grid_size: u32) -> MockScene {
        MockScene {
            context_id: ctx.id,
            texture,
            grid_size,
            log: self.log.clone(),
        }
    }

    fn create_stats(&mut self, ctx: &MockContext, perf_monitor: bool) -> MockStats {
        MockStats {
            context_id: ctx.id,
            perf_monitor,
            log: self.log.clone(),
        }
    }
}

/// Display whose state is set directly by the test.
pub struct MockDisplay {
    pub name: String,
    pub capabilities: Capabilities,
    pub presenting: bool,
    /// Whether `request_present` succeeds and raises a present change.
    pub present_on_request: bool,
    pub left_eye: EyeParameters,
    pub right_eye: EyeParameters,
    pub depth: (f32, f32),
    pub frame_data: FrameData,
    pub events: VecDeque<DisplayEvent>,
    pub frame_requested: bool,
    /// Every `request_animation_frame`, armed already or not.
    pub frame_requests: u32,
    pub fail_frame_data: bool,
    pub fail_submit: bool,
    pub request_calls: u32,
    pub exit_calls: u32,
    pub submit_calls: u32,
}

impl MockDisplay {
    pub fn new(capabilities: Capabilities) -> Self {
        let mut frame_data = FrameData::new();
        frame_data.set_eye(
            Eye::Left,
            Mat4::perspective_rh(1.6, 0.9, 0.1, 1024.0),
            Mat4::from_translation(Vec3::new(0.032, -1.6, 0.0)),
        );
        frame_data.set_eye(
            Eye::Right,
            Mat4::perspective_rh(1.6, 0.9, 0.1, 1024.0) * Mat4::from_translation(Vec3::X * 0.01),
            Mat4::from_translation(Vec3::new(-0.032, -1.6, 0.0)),
        );

        Self {
            name: "Mock HMD".to_string(),
            capabilities,
            presenting: false,
            present_on_request: true,
            left_eye: EyeParameters::new(1000, 1200),
            right_eye: EyeParameters::new(1000, 1200),
            depth: (0.01, 10000.0),
            frame_data,
            events: VecDeque::new(),
            frame_requested: false,
            frame_requests: 0,
            fail_frame_data: false,
            fail_submit: false,
            request_calls: 0,
            exit_calls: 0,
            submit_calls: 0,
        }
    }
}

impl FrameScheduler for MockDisplay {
    fn request_animation_frame(&mut self) {
        self.frame_requested = true;
        self.frame_requests += 1;
    }

    fn is_frame_requested(&self) -> bool {
        self.frame_requested
    }

    fn poll_animation_frame(&mut self) -> bool {
        std::mem::take(&mut self.frame_requested)
    }
}

impl VrDisplay for MockDisplay {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn is_presenting(&self) -> bool {
        self.presenting
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth = (near, far);
    }

    fn depth_range(&self) -> (f32, f32) {
        self.depth
    }

    fn eye_parameters(&self, eye: Eye) -> EyeParameters {
        match eye {
            Eye::Left => self.left_eye,
            Eye::Right => self.right_eye,
        }
    }

    fn request_present(&mut self) -> Result<(), DisplayError> {
        self.request_calls += 1;
        if !self.capabilities.can_present {
            return Err(DisplayError::PresentUnsupported);
        }
        if self.present_on_request && !self.presenting {
            self.presenting = true;
            self.events.push_back(DisplayEvent::PresentChange);
        }
        Ok(())
    }

    fn exit_present(&mut self) -> Result<(), DisplayError> {
        self.exit_calls += 1;
        if self.presenting {
            self.presenting = false;
            self.events.push_back(DisplayEvent::PresentChange);
        }
        Ok(())
    }

    fn get_frame_data(&mut self, out: &mut FrameData) -> Result<(), DisplayError> {
        if self.fail_frame_data {
            return Err(DisplayError::NoSession);
        }
        *out = self.frame_data;
        Ok(())
    }

    fn submit_frame(&mut self) -> Result<(), DisplayError> {
        self.submit_calls += 1;
        if self.fail_submit {
            return Err(DisplayError::NoSession);
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<DisplayEvent> {
        self.events.pop_front()
    }
}

#[derive(Default)]
pub struct MockDiscovery {
    pub requests: u32,
}

impl DisplayDiscovery for MockDiscovery {
    fn request_displays(&mut self) {
        self.requests += 1;
    }
}
