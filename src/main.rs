use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use winit::{
    dpi::LogicalSize,
    event::*,
    event_loop::{ControlFlow, EventLoopBuilder},
    keyboard::Key,
    window::WindowBuilder,
};

use cube_sea_vr::{
    App, AppEvent, DemoConfig, DiscoveredDisplay, DisplayMetrics, OpenXrDiscovery, OpenXrDisplay,
    RefreshScheduler, WgpuGraphics, WindowUi, MAX_GRID_SIZE,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force flat (non-VR) mode, skipping headset discovery
    #[arg(long)]
    flat: bool,

    /// Texture applied to every cube
    #[arg(long)]
    texture: Option<PathBuf>,

    /// Log frame timing once per second
    #[arg(long)]
    perf_monitor: bool,

    /// Cubes per side of the cube sea
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_GRID_SIZE)))]
    grid_size: Option<u32>,
}

impl Args {
    fn into_config(self) -> DemoConfig {
        let defaults = DemoConfig::default();
        DemoConfig {
            texture_path: self.texture.unwrap_or(defaults.texture_path.clone()),
            grid_size: self.grid_size.unwrap_or(defaults.grid_size),
            perf_monitor: self.perf_monitor,
            discover_displays: !self.flat,
            ..defaults
        }
    }
}

enum UserEvent {
    DisplaysDiscovered(Vec<DiscoveredDisplay>),
    ContextRestored,
}

const TITLE: &str = "Cube Sea";

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let config = Args::parse().into_config();

    let event_loop = EventLoopBuilder::<UserEvent>::with_user_event()
        .build()
        .context("Failed to create event loop")?;

    let window = Arc::new(
        WindowBuilder::new()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(1280.0, 720.0))
            .build(&event_loop)
            .context("Failed to create window")?,
    );

    let mut app: App<WgpuGraphics, OpenXrDisplay, WindowUi, RefreshScheduler> = App::new(
        config,
        WgpuGraphics::new(window.clone()),
        WindowUi::new(window.clone(), TITLE),
        RefreshScheduler::new(),
        DisplayMetrics::from_window(&window),
    );

    let discovery_proxy = event_loop.create_proxy();
    let mut discovery = OpenXrDiscovery::new(move |displays| {
        if discovery_proxy
            .send_event(UserEvent::DisplaysDiscovered(displays))
            .is_err()
        {
            log::warn!("Event loop closed before displays were delivered");
        }
    });
    app.start(&mut discovery);

    let proxy = event_loop.create_proxy();
    let mut suspended = false;

    event_loop.run(move |event, window_target| {
        window_target.set_control_flow(ControlFlow::Poll);

        match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => window_target.exit(),
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    app.handle_event(AppEvent::Resized(DisplayMetrics::from_window(&window)));
                }
                WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            logical_key: Key::Character(text),
                            state: ElementState::Pressed,
                            repeat: false,
                            ..
                        },
                    ..
                } => {
                    if let Some(key) = text.chars().next() {
                        app.handle_event(AppEvent::Shortcut(key));
                    }
                }
                WindowEvent::RedrawRequested => match app.run_pending_frame() {
                    Ok(_) => {}
                    Err(e) if e.is_context_lost() => {
                        log::warn!("Rendering context lost, recreating");
                        // Restoration is delivered like any other platform event.
                        if proxy.send_event(UserEvent::ContextRestored).is_err() {
                            window_target.exit();
                        }
                    }
                    Err(_) => {}
                },
                _ => {}
            },
            Event::UserEvent(UserEvent::DisplaysDiscovered(displays)) => {
                let displays = displays.into_iter().map(OpenXrDisplay::new).collect();
                app.handle_event(AppEvent::DisplaysDiscovered(displays));
            }
            Event::UserEvent(UserEvent::ContextRestored) => app.handle_event(AppEvent::ContextRestored),
            Event::Suspended => {
                suspended = true;
                app.handle_event(AppEvent::ContextLost);
            }
            Event::Resumed if suspended => {
                suspended = false;
                app.handle_event(AppEvent::ContextRestored);
            }
            Event::AboutToWait => {
                app.poll_display_events();
                if app.frame_pending() {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    })?;

    Ok(())
}
