use std::collections::VecDeque;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use glam::Mat4;
use openxr as xr;

use super::math::{default_fov, projection_from_fov, view_matrix};
use super::vulkan::VulkanBinding;
use super::{Capabilities, DisplayDiscovery, DisplayEvent, Eye, EyeParameters, FrameData, VrDisplay};
use crate::error::DisplayError;
use crate::frame::FrameScheduler;

const VIEW_TYPE: xr::ViewConfigurationType = xr::ViewConfigurationType::PRIMARY_STEREO;
/// Tick interval while no session is running.
const IDLE_FRAME_INTERVAL: Duration = Duration::from_micros(11_111);

/// An OpenXR system found by discovery, not yet bound to the render loop.
pub struct DiscoveredDisplay {
    pub instance: xr::Instance,
    pub system: xr::SystemId,
    pub name: String,
    pub views: Vec<xr::ViewConfigurationView>,
    /// Whether the runtime can bind a session to Vulkan.
    pub vulkan: bool,
}

/// Looks for a head-mounted display through the OpenXR loader.
pub fn discover_displays() -> Result<Vec<DiscoveredDisplay>> {
    let entry = xr::Entry::linked();

    let available = entry
        .enumerate_extensions()
        .context("Failed to enumerate OpenXR extensions")?;

    let mut enabled = xr::ExtensionSet::default();
    enabled.khr_vulkan_enable2 = available.khr_vulkan_enable2;
    if !available.khr_vulkan_enable2 {
        log::warn!("OpenXR Vulkan support not available, presentation disabled");
    }

    let app_info = xr::ApplicationInfo {
        application_name: "cube-sea-vr",
        application_version: 0,
        engine_name: "cube-sea-vr",
        engine_version: 0,
    };

    let instance = entry
        .create_instance(&app_info, &enabled, &[])
        .context("Failed to create OpenXR instance")?;

    if let Ok(properties) = instance.properties() {
        log::info!(
            "OpenXR runtime: {} {}",
            properties.runtime_name,
            properties.runtime_version
        );
    }

    let system = match instance.system(xr::FormFactor::HEAD_MOUNTED_DISPLAY) {
        Ok(system) => system,
        Err(e) if e == xr::sys::Result::ERROR_FORM_FACTOR_UNAVAILABLE => {
            log::info!("No head-mounted display connected");
            return Ok(Vec::new());
        }
        Err(e) => return Err(e).context("Failed to get OpenXR system"),
    };

    let views = instance
        .enumerate_view_configuration_views(system, VIEW_TYPE)
        .context("Failed to get view configuration")?;

    let name = instance
        .system_properties(system)
        .map(|p| p.system_name)
        .unwrap_or_else(|_| "OpenXR HMD".to_string());

    Ok(vec![DiscoveredDisplay {
        instance,
        system,
        name,
        views,
        vulkan: available.khr_vulkan_enable2,
    }])
}

type DiscoveryCallback = Box<dyn FnOnce(Vec<DiscoveredDisplay>) + Send>;

/// Runs `discover_displays` on a worker thread and hands the result to
/// `on_discovered`. A failed discovery delivers nothing.
pub struct OpenXrDiscovery {
    on_discovered: Option<DiscoveryCallback>,
}

impl OpenXrDiscovery {
    pub fn new<F>(on_discovered: F) -> Self
    where
        F: FnOnce(Vec<DiscoveredDisplay>) + Send + 'static,
    {
        Self {
            on_discovered: Some(Box::new(on_discovered)),
        }
    }
}

impl DisplayDiscovery for OpenXrDiscovery {
    fn request_displays(&mut self) {
        let Some(on_discovered) = self.on_discovered.take() else {
            log::warn!("Display discovery already requested");
            return;
        };
        let spawned = thread::Builder::new()
            .name("openxr-discovery".to_string())
            .spawn(move || match discover_displays() {
                Ok(displays) => {
                    log::info!("Discovered {} VR display(s)", displays.len());
                    on_discovered(displays);
                }
                Err(e) => log::warn!("VR display discovery failed: {:#}", e),
            });

        if let Err(e) = spawned {
            log::error!("Failed to spawn display discovery: {}", e);
        }
    }
}

// Field order matters: the session drops before the Vulkan device it uses.
struct XrSession {
    session: xr::Session<xr::Vulkan>,
    frame_waiter: xr::FrameWaiter,
    frame_stream: xr::FrameStream<xr::Vulkan>,
    space: xr::Space,
    running: bool,
    /// Frame begun on the stream and not yet ended.
    frame: Option<xr::FrameState>,
    _vulkan: VulkanBinding,
}

impl XrSession {
    fn new(instance: &xr::Instance, system: xr::SystemId) -> Result<Self, DisplayError> {
        let vulkan = VulkanBinding::new(instance, system)?;
        // SAFETY: the handles stay valid until `_vulkan` drops, after the session.
        let (session, frame_waiter, frame_stream) =
            unsafe { instance.create_session::<xr::Vulkan>(system, &vulkan.session_create_info())? };
        let space = session.create_reference_space(xr::ReferenceSpaceType::LOCAL, xr::Posef::IDENTITY)?;

        Ok(Self {
            session,
            frame_waiter,
            frame_stream,
            space,
            running: false,
            frame: None,
            _vulkan: vulkan,
        })
    }

    fn wait_frame(&mut self) -> Result<(), DisplayError> {
        // A frame nobody submitted still has to be closed.
        self.end_frame()?;
        let state = self.frame_waiter.wait()?;
        self.frame_stream.begin()?;
        self.frame = Some(state);
        Ok(())
    }

    fn end_frame(&mut self) -> Result<(), DisplayError> {
        if let Some(state) = self.frame.take() {
            self.frame_stream
                .end(state.predicted_display_time, xr::EnvironmentBlendMode::OPAQUE, &[])?;
        }
        Ok(())
    }

    fn locate(&self, near: f32, far: f32, out: &mut FrameData) -> Result<bool, DisplayError> {
        let Some(state) = self.frame else {
            return Ok(false);
        };
        let (_, views) = self
            .session
            .locate_views(VIEW_TYPE, state.predicted_display_time, &self.space)?;
        Ok(frame_data_from_views(&views, near, far, out))
    }
}

/// Presentation state, head pose and frame cadence from an OpenXR session.
/// Frames are submitted without layers; the stereo image is shown on the
/// window.
pub struct OpenXrDisplay {
    instance: xr::Instance,
    system: xr::SystemId,
    name: String,
    views: Vec<xr::ViewConfigurationView>,
    capabilities: Capabilities,
    depth: (f32, f32),
    session: Option<XrSession>,
    pending_events: VecDeque<DisplayEvent>,
    frame_requested: bool,
    last_idle_tick: Instant,
}

impl OpenXrDisplay {
    pub fn new(discovered: DiscoveredDisplay) -> Self {
        Self {
            instance: discovered.instance,
            system: discovered.system,
            name: discovered.name,
            views: discovered.views,
            capabilities: Capabilities {
                can_present: discovered.vulkan,
                has_external_display: true,
            },
            depth: (0.1, 1000.0),
            session: None,
            pending_events: VecDeque::new(),
            frame_requested: false,
            last_idle_tick: Instant::now(),
        }
    }

    fn pump_events(&mut self) {
        let mut buffer = xr::EventDataBuffer::new();
        let mut states = Vec::new();
        loop {
            match self.instance.poll_event(&mut buffer) {
                Ok(Some(xr::Event::SessionStateChanged(e))) => states.push(e.state()),
                Ok(Some(xr::Event::InstanceLossPending(_))) => {
                    log::warn!("OpenXR instance loss pending");
                    self.pending_events.push_back(DisplayEvent::Deactivate);
                }
                Ok(Some(_)) => {}
                Ok(None) => break,
                Err(e) => {
                    log::error!("Failed to poll OpenXR events: {}", e);
                    break;
                }
            }
        }

        for state in states {
            self.on_session_state(state);
        }
    }

    fn on_session_state(&mut self, state: xr::SessionState) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        log::info!("OpenXR session state changed to {:?}", state);

        match state {
            xr::SessionState::READY => match session.session.begin(VIEW_TYPE) {
                Ok(_) => {
                    session.running = true;
                    self.pending_events.push_back(DisplayEvent::PresentChange);
                }
                Err(e) => log::error!("Failed to begin OpenXR session: {}", e),
            },
            xr::SessionState::STOPPING => {
                session.frame = None;
                if let Err(e) = session.session.end() {
                    log::error!("Failed to end OpenXR session: {}", e);
                }
                session.running = false;
                self.pending_events.push_back(DisplayEvent::PresentChange);
            }
            xr::SessionState::EXITING | xr::SessionState::LOSS_PENDING => {
                let was_running = session.running;
                self.session = None;
                if was_running {
                    self.pending_events.push_back(DisplayEvent::PresentChange);
                }
            }
            _ => {}
        }
    }

    fn pace_idle(&mut self) {
        let next = self.last_idle_tick + IDLE_FRAME_INTERVAL;
        let now = Instant::now();
        if next > now {
            thread::sleep(next - now);
        }
        self.last_idle_tick = Instant::now();
    }
}

impl FrameScheduler for OpenXrDisplay {
    fn request_animation_frame(&mut self) {
        self.frame_requested = true;
    }

    fn is_frame_requested(&self) -> bool {
        self.frame_requested
    }

    fn poll_animation_frame(&mut self) -> bool {
        if !std::mem::take(&mut self.frame_requested) {
            return false;
        }

        if self.is_presenting() {
            if let Some(session) = self.session.as_mut() {
                if let Err(e) = session.wait_frame() {
                    log::warn!("Failed to wait for OpenXR frame: {}", e);
                }
            }
        } else {
            self.pace_idle();
        }
        true
    }
}

impl VrDisplay for OpenXrDisplay {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn is_presenting(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.running)
    }

    fn set_depth_range(&mut self, near: f32, far: f32) {
        self.depth = (near, far);
    }

    fn depth_range(&self) -> (f32, f32) {
        self.depth
    }

    fn eye_parameters(&self, eye: Eye) -> EyeParameters {
        eye_parameters(&self.views, eye)
    }

    fn request_present(&mut self) -> Result<(), DisplayError> {
        if !self.capabilities.can_present {
            return Err(DisplayError::PresentUnsupported);
        }
        if self.session.is_some() {
            return Ok(());
        }
        log::info!("Starting OpenXR session on {}", self.name);
        self.session = Some(XrSession::new(&self.instance, self.system)?);
        Ok(())
    }

    fn exit_present(&mut self) -> Result<(), DisplayError> {
        match self.session.as_ref() {
            Some(session) if session.running => {
                session.session.request_exit()?;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn get_frame_data(&mut self, out: &mut FrameData) -> Result<(), DisplayError> {
        let (near, far) = self.depth;
        let located = match self.session.as_ref() {
            Some(session) if session.running => session.locate(near, far, out)?,
            _ => false,
        };
        if !located {
            fallback_frame_data(near, far, out);
        }
        Ok(())
    }

    fn submit_frame(&mut self) -> Result<(), DisplayError> {
        let session = self.session.as_mut().ok_or(DisplayError::NoSession)?;
        session.end_frame()
    }

    fn poll_event(&mut self) -> Option<DisplayEvent> {
        if self.pending_events.is_empty() {
            self.pump_events();
        }
        self.pending_events.pop_front()
    }
}

fn eye_parameters(views: &[xr::ViewConfigurationView], eye: Eye) -> EyeParameters {
    let index = match eye {
        Eye::Left => 0,
        Eye::Right => 1,
    };
    views
        .get(index)
        .map(|v| EyeParameters::new(v.recommended_image_rect_width, v.recommended_image_rect_height))
        .unwrap_or_default()
}

/// Fills `out` from located stereo views. Returns false if fewer than two
/// views came back.
fn frame_data_from_views(views: &[xr::View], near: f32, far: f32, out: &mut FrameData) -> bool {
    let [left, right, ..] = views else {
        return false;
    };
    out.set_eye(Eye::Left, projection_from_fov(&left.fov, near, far), view_matrix(&left.pose));
    out.set_eye(Eye::Right, projection_from_fov(&right.fov, near, far), view_matrix(&right.pose));
    true
}

/// Symmetric projections at the origin, used until the runtime locates
/// the eyes.
fn fallback_frame_data(near: f32, far: f32, out: &mut FrameData) {
    let projection = projection_from_fov(&default_fov(), near, far);
    out.set_eye(Eye::Left, projection, Mat4::IDENTITY);
    out.set_eye(Eye::Right, projection, Mat4::IDENTITY);
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn view_config(width: u32, height: u32) -> xr::ViewConfigurationView {
        xr::ViewConfigurationView {
            recommended_image_rect_width: width,
            max_image_rect_width: width * 2,
            recommended_image_rect_height: height,
            max_image_rect_height: height * 2,
            recommended_swapchain_sample_count: 1,
            max_swapchain_sample_count: 4,
        }
    }

    #[test]
    fn test_eye_parameters_from_view_configuration() {
        let views = [view_config(1440, 1600), view_config(1400, 1600)];
        assert_eq!(eye_parameters(&views, Eye::Left), EyeParameters::new(1440, 1600));
        assert_eq!(eye_parameters(&views, Eye::Right), EyeParameters::new(1400, 1600));
        assert_eq!(eye_parameters(&[], Eye::Right), EyeParameters::default());
    }

    #[test]
    fn test_frame_data_from_located_views() {
        let pose = |x: f32| xr::Posef {
            orientation: xr::Quaternionf::IDENTITY,
            position: xr::Vector3f { x, y: 1.6, z: 0.0 },
        };
        let views = [
            xr::View {
                pose: pose(-0.032),
                fov: default_fov(),
            },
            xr::View {
                pose: pose(0.032),
                fov: default_fov(),
            },
        ];

        let mut out = FrameData::new();
        assert!(frame_data_from_views(&views, 0.1, 1024.0, &mut out));

        let eye = out.left_view.inverse().transform_point3(glam::Vec3::ZERO);
        assert_relative_eq!(eye.x, -0.032, epsilon = 1e-5);
        assert_relative_eq!(eye.y, 1.6, epsilon = 1e-5);
        let eye = out.right_view.inverse().transform_point3(glam::Vec3::ZERO);
        assert_relative_eq!(eye.x, 0.032, epsilon = 1e-5);
    }

    #[test]
    fn test_missing_views_leave_frame_data_untouched() {
        let mut out = FrameData::new();
        assert!(!frame_data_from_views(&[], 0.1, 1024.0, &mut out));
        assert_eq!(out, FrameData::new());
    }

    #[test]
    fn test_fallback_frame_data_is_centred() {
        let mut out = FrameData::new();
        fallback_frame_data(0.1, 1024.0, &mut out);
        assert_eq!(out.left_view, Mat4::IDENTITY);
        assert_eq!(out.right_view, Mat4::IDENTITY);
        assert_eq!(out.left_projection, out.right_projection);
        assert_relative_eq!(out.left_projection.x_axis.x, 1.0, epsilon = 1e-5);
    }
}
