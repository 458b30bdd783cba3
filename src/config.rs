use std::f32::consts::PI;
use std::path::PathBuf;

/// Settings for one run of the demo. The binary fills the user-facing
/// fields from the command line; the rest are fixed by the scene.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub texture_path: PathBuf,
    pub grid_size: u32,
    pub perf_monitor: bool,
    pub discover_displays: bool,
    pub clear_color: [f64; 4],
    pub fov_y: f32,
    pub depth_near: f32,
    pub depth_far: f32,
    pub button_shortcut: char,
    pub button_icon: PathBuf,
}

/// Largest cube sea the scene will build.
pub const MAX_GRID_SIZE: u32 = 64;

pub const ENTER_VR_LABEL: &str = "Enter VR";
pub const EXIT_VR_LABEL: &str = "Exit VR";

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            texture_path: PathBuf::from("media/textures/cube-sea.png"),
            grid_size: 10,
            perf_monitor: false,
            discover_displays: true,
            clear_color: [0.1, 0.2, 0.3, 1.0],
            fov_y: PI * 0.4,
            depth_near: 0.1,
            depth_far: 1024.0,
            button_shortcut: 'E',
            button_icon: PathBuf::from("media/icons/cardboard64.png"),
        }
    }
}
