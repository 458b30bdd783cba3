//! Cube sea demo harness: a textured cube field rendered to the window in
//! mono, or side by side in stereo while an OpenXR headset is presenting.

pub mod app;
pub mod config;
pub mod error;
pub mod frame;
pub mod gfx;
pub mod scene;
pub mod stats;
pub mod surface;
pub mod ui;
pub mod vr;

#[cfg(test)]
mod testing;

pub use app::{App, AppEvent};
pub use config::{DemoConfig, MAX_GRID_SIZE};
pub use error::{ContextError, DisplayError, FrameError};
pub use frame::{FrameDispatcher, FrameScheduler, RefreshScheduler};
pub use gfx::{WgpuContext, WgpuGraphics};
pub use surface::{DisplayMetrics, SurfaceManager, SurfaceSize};
pub use ui::{ButtonBar, WindowUi};
pub use vr::{DiscoveredDisplay, OpenXrDiscovery, OpenXrDisplay};
