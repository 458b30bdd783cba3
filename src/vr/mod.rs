pub mod frame;
pub mod math;
pub mod openxr;
pub mod session;
pub mod vulkan;

pub use frame::FrameData;
pub use self::openxr::{DiscoveredDisplay, OpenXrDiscovery, OpenXrDisplay};
pub use session::DeviceSession;

use crate::error::DisplayError;
use crate::frame::FrameScheduler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eye {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities {
    pub can_present: bool,
    pub has_external_display: bool,
}

/// Recommended per-eye render target size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EyeParameters {
    pub render_width: u32,
    pub render_height: u32,
}

impl EyeParameters {
    pub fn new(render_width: u32, render_height: u32) -> Self {
        Self {
            render_width,
            render_height,
        }
    }
}

/// Notifications a display raises outside of the frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayEvent {
    PresentChange,
    Activate,
    Deactivate,
}

/// A head-mounted display. The display doubles as the frame scheduler used
/// while it is known, so ticks follow its refresh rate.
pub trait VrDisplay: FrameScheduler {
    fn name(&self) -> &str;
    fn capabilities(&self) -> Capabilities;
    fn is_presenting(&self) -> bool;
    fn set_depth_range(&mut self, near: f32, far: f32);
    fn depth_range(&self) -> (f32, f32);
    fn eye_parameters(&self, eye: Eye) -> EyeParameters;
    fn request_present(&mut self) -> Result<(), DisplayError>;
    fn exit_present(&mut self) -> Result<(), DisplayError>;
    fn get_frame_data(&mut self, out: &mut FrameData) -> Result<(), DisplayError>;
    fn submit_frame(&mut self) -> Result<(), DisplayError>;
    fn poll_event(&mut self) -> Option<DisplayEvent>;
}

/// Asynchronous display enumeration. Results are delivered back to the
/// controller as an `AppEvent::DisplaysDiscovered`.
pub trait DisplayDiscovery {
    fn request_displays(&mut self);
}
