use openxr as xr;
use thiserror::Error;

/// Failures of the rendering context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("rendering context unavailable: {0}")]
    Unavailable(String),
    #[error("rendering context lost")]
    Lost,
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// Failures reported by a head-mounted display.
#[derive(Debug, Error)]
pub enum DisplayError {
    #[error("display cannot present")]
    PresentUnsupported,
    #[error("display has no running session")]
    NoSession,
    #[error("Vulkan binding failed: {0}")]
    Vulkan(String),
    #[error("OpenXR error: {0}")]
    Xr(#[from] xr::sys::Result),
}

#[derive(Debug, Error)]
pub enum FrameError {
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Display(#[from] DisplayError),
}

impl FrameError {
    pub fn is_context_lost(&self) -> bool {
        matches!(self, FrameError::Context(ContextError::Lost))
    }
}
