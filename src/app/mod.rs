use std::time::Instant;

use crate::config::DemoConfig;
use crate::error::FrameError;
use crate::frame::{FrameDispatcher, FrameScheduler};
use crate::gfx::Graphics;
use crate::surface::{DisplayMetrics, SurfaceManager};
use crate::ui::{ButtonAction, ButtonHandle, Ui};
use crate::vr::{DeviceSession, DisplayDiscovery, DisplayEvent, VrDisplay};

#[cfg(test)]
mod tests;

/// Everything the controller reacts to outside of frame ticks.
pub enum AppEvent<D> {
    ContextLost,
    ContextRestored,
    Resized(DisplayMetrics),
    DisplaysDiscovered(Vec<D>),
    ButtonClicked(ButtonHandle),
    Shortcut(char),
    Display(DisplayEvent),
}

pub struct App<G: Graphics, D: VrDisplay, U: Ui, P: FrameScheduler> {
    config: DemoConfig,
    surface: SurfaceManager<G>,
    session: Option<DeviceSession<D>>,
    dispatcher: FrameDispatcher,
    ui: U,
    platform: P,
    metrics: DisplayMetrics,
    display_listeners: bool,
    started: bool,
    epoch: Instant,
}

impl<G, D, U, P> App<G, D, U, P>
where
    G: Graphics,
    D: VrDisplay,
    U: Ui,
    P: FrameScheduler,
{
    pub fn new(config: DemoConfig, graphics: G, ui: U, platform: P, metrics: DisplayMetrics) -> Self {
        let dispatcher = FrameDispatcher::new(&config);
        Self {
            surface: SurfaceManager::new(graphics, metrics.physical_size()),
            session: None,
            dispatcher,
            ui,
            platform,
            metrics,
            display_listeners: false,
            started: false,
            epoch: Instant::now(),
            config,
        }
    }

    /// One-time startup: builds the rendering context, starts display
    /// discovery and arms the first tick on the platform scheduler.
    pub fn start<R: DisplayDiscovery>(&mut self, discovery: &mut R) {
        if self.started {
            log::warn!("App already started");
            return;
        }
        self.started = true;

        self.initialize_surface();

        if self.config.discover_displays {
            discovery.request_displays();
        } else {
            log::info!("Display discovery disabled, rendering mono only");
        }

        self.platform.request_animation_frame();
    }

    pub fn handle_event(&mut self, event: AppEvent<D>) {
        match event {
            AppEvent::ContextLost => self.surface.handle_context_lost(),
            AppEvent::ContextRestored => {
                if self.surface.handle_context_restored(&self.config) {
                    self.resize();
                }
                if !self.frame_pending() {
                    self.platform.request_animation_frame();
                }
            }
            AppEvent::Resized(metrics) => {
                self.metrics = metrics;
                self.resize();
            }
            AppEvent::DisplaysDiscovered(displays) => self.on_displays_discovered(displays),
            AppEvent::ButtonClicked(handle) => {
                if let Some(action) = self.ui.button_action(handle) {
                    self.perform(action);
                }
            }
            AppEvent::Shortcut(key) => {
                if let Some(handle) = self.ui.button_for_shortcut(key) {
                    self.handle_event(AppEvent::ButtonClicked(handle));
                }
            }
            AppEvent::Display(event) => {
                if !self.display_listeners {
                    return;
                }
                match event {
                    DisplayEvent::PresentChange => self.on_present_change(),
                    DisplayEvent::Activate => self.request_present(),
                    DisplayEvent::Deactivate => self.exit_present(),
                }
            }
        }
    }

    /// Drains events raised by the display since the last call.
    pub fn poll_display_events(&mut self) {
        if !self.display_listeners {
            return;
        }
        while let Some(event) = self.session.as_mut().and_then(|s| s.display_mut().poll_event()) {
            self.handle_event(AppEvent::Display(event));
        }
    }

    pub fn frame_pending(&self) -> bool {
        self.platform.is_frame_requested()
            || self
                .session
                .as_ref()
                .is_some_and(|s| s.display().is_frame_requested())
    }

    /// Runs the armed tick, if any. Returns whether a tick ran.
    pub fn run_pending_frame(&mut self) -> Result<bool, FrameError> {
        let fired = if self.platform.poll_animation_frame() {
            true
        } else if let Some(session) = self.session.as_mut() {
            session.display_mut().poll_animation_frame()
        } else {
            false
        };

        if !fired {
            return Ok(false);
        }

        let t = self.epoch.elapsed().as_secs_f64() * 1000.0;
        self.on_animation_frame(t)?;
        Ok(true)
    }

    pub fn on_animation_frame(&mut self, t: f64) -> Result<(), FrameError> {
        let result = self.dispatcher.on_animation_frame(
            t,
            &mut self.surface,
            self.session.as_mut(),
            &mut self.platform,
        );

        if let Err(e) = &result {
            if e.is_context_lost() {
                self.surface.handle_context_lost();
            } else {
                log::error!("Frame failed: {}", e);
                if !self.frame_pending() {
                    self.arm_next_frame();
                }
            }
        }
        result
    }

    fn arm_next_frame(&mut self) {
        match self.session.as_mut() {
            Some(session) => session.display_mut().request_animation_frame(),
            None => self.platform.request_animation_frame(),
        }
    }

    fn initialize_surface(&mut self) {
        if self.surface.initialize(&self.config) {
            self.resize();
        }
    }

    fn resize(&mut self) {
        self.surface.resize(self.metrics, self.session.as_ref());
    }

    fn on_displays_discovered(&mut self, mut displays: Vec<D>) {
        if self.session.is_some() {
            log::warn!("Ignoring repeated display discovery");
            return;
        }

        let Some(display) = displays.pop() else {
            log::warn!("No VR displays found");
            return;
        };

        self.session = Some(DeviceSession::configure(display, &self.config, &mut self.ui));
        self.display_listeners = true;
    }

    fn perform(&mut self, action: ButtonAction) {
        match action {
            ButtonAction::RequestPresent => self.request_present(),
            ButtonAction::ExitPresent => self.exit_present(),
        }
    }

    fn request_present(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.request_present() {
                log::error!("Failed to request presentation: {}", e);
            }
        }
    }

    fn exit_present(&mut self) {
        if let Some(session) = self.session.as_mut() {
            if let Err(e) = session.exit_present() {
                log::error!("Failed to exit presentation: {}", e);
            }
        }
    }

    fn on_present_change(&mut self) {
        self.resize();
        if let Some(session) = self.session.as_mut() {
            log::info!(
                "Display '{}' is {}",
                session.display().name(),
                if session.is_presenting() { "presenting" } else { "not presenting" }
            );
            session.update_controls(&mut self.ui);
        }
    }

    pub fn config(&self) -> &DemoConfig {
        &self.config
    }

    pub fn surface(&self) -> &SurfaceManager<G> {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut SurfaceManager<G> {
        &mut self.surface
    }

    pub fn session(&self) -> Option<&DeviceSession<D>> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Option<&mut DeviceSession<D>> {
        self.session.as_mut()
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn dispatcher(&self) -> &FrameDispatcher {
        &self.dispatcher
    }
}
