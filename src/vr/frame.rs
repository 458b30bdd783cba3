use glam::Mat4;

use super::Eye;

/// Per-eye projection and view matrices for the current tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameData {
    pub left_projection: Mat4,
    pub left_view: Mat4,
    pub right_projection: Mat4,
    pub right_view: Mat4,
}

impl FrameData {
    pub fn new() -> Self {
        Self {
            left_projection: Mat4::IDENTITY,
            left_view: Mat4::IDENTITY,
            right_projection: Mat4::IDENTITY,
            right_view: Mat4::IDENTITY,
        }
    }

    pub fn projection(&self, eye: Eye) -> &Mat4 {
        match eye {
            Eye::Left => &self.left_projection,
            Eye::Right => &self.right_projection,
        }
    }

    pub fn view(&self, eye: Eye) -> &Mat4 {
        match eye {
            Eye::Left => &self.left_view,
            Eye::Right => &self.right_view,
        }
    }

    pub fn set_eye(&mut self, eye: Eye, projection: Mat4, view: Mat4) {
        match eye {
            Eye::Left => {
                self.left_projection = projection;
                self.left_view = view;
            }
            Eye::Right => {
                self.right_projection = projection;
                self.right_view = view;
            }
        }
    }
}

impl Default for FrameData {
    fn default() -> Self {
        Self::new()
    }
}
