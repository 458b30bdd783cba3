use super::*;
use crate::error::DisplayError;
use crate::frame::RefreshScheduler;
use crate::gfx::RenderContext;
use crate::surface::SurfaceSize;
use crate::testing::{Call, MockDiscovery, MockDisplay, MockGraphics};
use crate::ui::ButtonBar;
use crate::vr::Capabilities;
use glam::Mat4;

type TestApp = App<MockGraphics, MockDisplay, ButtonBar, RefreshScheduler>;

fn metrics() -> DisplayMetrics {
    DisplayMetrics::new(640.0, 360.0, 2.0)
}

fn started_app() -> TestApp {
    let mut app = App::new(
        DemoConfig::default(),
        MockGraphics::new(),
        ButtonBar::new(),
        RefreshScheduler::new(),
        metrics(),
    );
    let mut discovery = MockDiscovery::default();
    app.start(&mut discovery);
    assert_eq!(discovery.requests, 1);
    app
}

fn hmd() -> MockDisplay {
    MockDisplay::new(Capabilities {
        can_present: true,
        has_external_display: true,
    })
}

fn rendered_views(app: &TestApp) -> Vec<Mat4> {
    app.surface()
        .graphics()
        .log
        .borrow()
        .iter()
        .filter_map(|c| match c {
            Call::Render { view, .. } => Some(*view),
            _ => None,
        })
        .collect()
}

#[test]
fn test_start_initializes_and_arms_platform_tick() {
    let app = started_app();
    let resources = app.surface().resources().unwrap();
    assert_eq!(resources.context.clear_color, [0.1, 0.2, 0.3, 1.0]);
    assert_eq!(resources.scene.texture, DemoConfig::default().texture_path);
    assert_eq!(resources.context.size(), SurfaceSize::new(1280, 720));
    assert!(app.platform().is_frame_requested());
    assert!(app.session().is_none());
}

#[test]
fn test_start_is_not_reentrant() {
    let mut app = started_app();
    let mut discovery = MockDiscovery::default();
    app.start(&mut discovery);
    assert_eq!(discovery.requests, 0);
    assert_eq!(app.surface().resources().unwrap().context.id, 1);
}

#[test]
fn test_discovery_can_be_disabled() {
    let config = DemoConfig {
        discover_displays: false,
        ..DemoConfig::default()
    };
    let mut app: TestApp = App::new(config, MockGraphics::new(), ButtonBar::new(), RefreshScheduler::new(), metrics());
    let mut discovery = MockDiscovery::default();
    app.start(&mut discovery);
    assert_eq!(discovery.requests, 0);
    assert!(app.platform().is_frame_requested());
}

#[test]
fn test_last_discovered_display_is_selected() {
    let mut app = started_app();
    let mut first = hmd();
    first.name = "first".to_string();
    let mut last = hmd();
    last.name = "last".to_string();

    app.handle_event(AppEvent::DisplaysDiscovered(vec![first, last]));

    assert_eq!(app.session().unwrap().display().name(), "last");
}

#[test]
fn test_empty_discovery_stays_mono() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(Vec::new()));
    assert!(app.session().is_none());

    assert!(app.run_pending_frame().unwrap());
    assert!(app.platform().is_frame_requested());
    assert_eq!(rendered_views(&app), vec![Mat4::IDENTITY]);
}

#[test]
fn test_no_device_ticks_use_platform_scheduler() {
    let mut app = started_app();
    for _ in 0..3 {
        assert!(app.run_pending_frame().unwrap());
        assert!(app.platform().is_frame_requested());
    }
    assert_eq!(rendered_views(&app), vec![Mat4::IDENTITY; 3]);
}

#[test]
fn test_idle_device_ticks_use_device_scheduler() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    let device_view = app.session().unwrap().display().frame_data.left_view;

    // The tick armed at startup still comes from the platform.
    assert!(app.run_pending_frame().unwrap());
    assert!(!app.platform().is_frame_requested());
    assert!(app.session().unwrap().display().is_frame_requested());

    assert!(app.run_pending_frame().unwrap());
    assert!(!app.platform().is_frame_requested());
    assert!(app.session().unwrap().display().is_frame_requested());

    assert_eq!(rendered_views(&app), vec![device_view, device_view]);
    assert_eq!(app.session().unwrap().display().submit_calls, 0);
}

#[test]
fn test_enter_vr_scenario() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));

    let enter = app.session().unwrap().button().unwrap();
    assert_eq!(app.ui().button(enter).unwrap().label, "Enter VR");

    app.handle_event(AppEvent::ButtonClicked(enter));
    app.poll_display_events();

    let session = app.session().unwrap();
    assert!(session.is_presenting());
    assert_eq!(session.display().request_calls, 1);
    assert_eq!(app.surface().size(), SurfaceSize::new(2000, 1200));
    assert_eq!(
        app.surface().resources().unwrap().context.size(),
        SurfaceSize::new(2000, 1200)
    );

    let exit = session.button().unwrap();
    assert_ne!(exit, enter);
    assert_eq!(app.ui().buttons().len(), 1);
    assert_eq!(app.ui().button(exit).unwrap().label, "Exit VR");
    assert!(app.ui().presenting_message_visible());
}

#[test]
fn test_exit_vr_restores_mono_size() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.handle_event(AppEvent::Shortcut('e'));
    app.poll_display_events();
    assert!(app.session().unwrap().is_presenting());

    app.handle_event(AppEvent::Shortcut('E'));
    app.poll_display_events();

    let session = app.session().unwrap();
    assert!(!session.is_presenting());
    assert_eq!(session.display().exit_calls, 1);
    assert_eq!(app.surface().size(), SurfaceSize::new(1280, 720));
    assert_eq!(app.ui().button(session.button().unwrap()).unwrap().label, "Enter VR");
    assert!(!app.ui().presenting_message_visible());
}

#[test]
fn test_deactivate_when_not_presenting_is_noop() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    let button = app.session().unwrap().button();

    app.handle_event(AppEvent::Display(DisplayEvent::Deactivate));
    app.poll_display_events();

    let session = app.session().unwrap();
    assert_eq!(session.display().exit_calls, 0);
    assert!(!session.is_presenting());
    assert_eq!(session.button(), button);
    assert_eq!(app.surface().size(), SurfaceSize::new(1280, 720));
}

#[test]
fn test_activate_requests_present() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.session_mut().unwrap().display_mut().events.push_back(DisplayEvent::Activate);

    app.poll_display_events();

    assert!(app.session().unwrap().is_presenting());
    assert_eq!(app.surface().size(), SurfaceSize::new(2000, 1200));
}

#[test]
fn test_display_events_ignored_before_discovery() {
    let mut app = started_app();
    app.handle_event(AppEvent::Display(DisplayEvent::PresentChange));
    app.handle_event(AppEvent::Display(DisplayEvent::Activate));
    assert!(app.session().is_none());
    assert_eq!(app.surface().size(), SurfaceSize::new(1280, 720));
}

#[test]
fn test_present_without_external_display_keeps_button() {
    let mut app = started_app();
    let display = MockDisplay::new(Capabilities {
        can_present: true,
        has_external_display: false,
    });
    app.handle_event(AppEvent::DisplaysDiscovered(vec![display]));
    let enter = app.session().unwrap().button().unwrap();

    app.handle_event(AppEvent::ButtonClicked(enter));
    app.poll_display_events();

    assert!(app.session().unwrap().is_presenting());
    assert_eq!(app.surface().size(), SurfaceSize::new(2000, 1200));
    assert_eq!(app.session().unwrap().button(), Some(enter));
    assert_eq!(app.ui().button(enter).unwrap().label, "Enter VR");
}

#[test]
fn test_display_without_present_capability_has_no_button() {
    let mut app = started_app();
    let display = MockDisplay::new(Capabilities {
        can_present: false,
        has_external_display: true,
    });
    app.handle_event(AppEvent::DisplaysDiscovered(vec![display]));
    assert!(app.session().unwrap().button().is_none());
    assert!(app.ui().buttons().is_empty());
}

#[test]
fn test_context_loss_and_restore() {
    let mut app = started_app();
    let first = app.surface().resources().unwrap().context.id;

    app.handle_event(AppEvent::ContextLost);
    assert!(app.surface().resources().is_none());

    // Ticks are no-ops while the context is gone and do not re-arm.
    assert!(app.run_pending_frame().unwrap());
    assert!(!app.frame_pending());
    assert!(rendered_views(&app).is_empty());

    app.handle_event(AppEvent::ContextRestored);
    let resources = app.surface().resources().unwrap();
    assert_ne!(resources.context.id, first);
    assert_eq!(resources.scene.context_id, resources.context.id);
    assert_eq!(resources.stats.context_id, resources.context.id);
    assert_eq!(resources.context.size(), SurfaceSize::new(1280, 720));
    assert!(app.platform().is_frame_requested());

    assert!(app.run_pending_frame().unwrap());
    assert_eq!(rendered_views(&app), vec![Mat4::IDENTITY]);
}

#[test_log::test]
fn test_context_lost_during_tick_tears_down() {
    let mut app = started_app();
    app.surface_mut().resources_mut().unwrap().context.lose_on_clear = true;

    let err = app.run_pending_frame().unwrap_err();
    assert!(err.is_context_lost());
    assert!(app.surface().resources().is_none());
    assert!(!app.frame_pending());
}

#[test]
fn test_resize_tracks_metrics_when_not_presenting() {
    let mut app = started_app();
    app.handle_event(AppEvent::Resized(DisplayMetrics::new(500.0, 250.0, 1.5)));
    assert_eq!(app.surface().size(), SurfaceSize::new(750, 375));
}

#[test]
fn test_resize_while_presenting_keeps_stereo_size() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.handle_event(AppEvent::Shortcut('E'));
    app.poll_display_events();

    app.handle_event(AppEvent::Resized(DisplayMetrics::new(500.0, 250.0, 1.5)));
    assert_eq!(app.surface().size(), SurfaceSize::new(2000, 1200));
}

#[test]
fn test_presenting_tick_submits_to_device() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.handle_event(AppEvent::Shortcut('E'));
    app.poll_display_events();

    assert!(app.run_pending_frame().unwrap());
    assert!(app.run_pending_frame().unwrap());

    let session = app.session().unwrap();
    assert_eq!(session.display().submit_calls, 2);
    assert!(session.display().is_frame_requested());
    assert!(!app.platform().is_frame_requested());
    assert_eq!(rendered_views(&app).len(), 4);
}

#[test_log::test]
fn test_surface_timeout_rearms_platform_tick() {
    let mut app = started_app();
    app.surface_mut().resources_mut().unwrap().context.timeout_on_clear = true;

    let err = app.run_pending_frame().unwrap_err();
    assert!(!err.is_context_lost());
    assert!(app.surface().resources().is_some());
    assert!(app.platform().is_frame_requested());
    assert!(rendered_views(&app).is_empty());

    app.surface_mut().resources_mut().unwrap().context.timeout_on_clear = false;
    assert!(app.run_pending_frame().unwrap());
    assert_eq!(rendered_views(&app), vec![Mat4::IDENTITY]);
}

#[test_log::test]
fn test_failed_submit_leaves_one_device_tick() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.handle_event(AppEvent::Shortcut('E'));
    app.poll_display_events();
    app.session_mut().unwrap().display_mut().fail_submit = true;

    let err = app.run_pending_frame().unwrap_err();
    assert!(matches!(err, FrameError::Display(DisplayError::NoSession)));

    let display = app.session().unwrap().display();
    assert_eq!(display.submit_calls, 1);
    assert_eq!(display.frame_requests, 1);
    assert!(display.is_frame_requested());
    assert!(!app.platform().is_frame_requested());
    assert!(app.surface().resources().is_some());

    // The loop carries on from the device tick.
    app.session_mut().unwrap().display_mut().fail_submit = false;
    assert!(app.run_pending_frame().unwrap());
    assert_eq!(app.session().unwrap().display().frame_requests, 2);
    assert_eq!(app.session().unwrap().display().submit_calls, 2);
}

#[test]
fn test_failed_frame_data_keeps_device_tick() {
    let mut app = started_app();
    app.handle_event(AppEvent::DisplaysDiscovered(vec![hmd()]));
    app.session_mut().unwrap().display_mut().fail_frame_data = true;

    assert!(app.run_pending_frame().is_err());
    assert_eq!(app.session().unwrap().display().frame_requests, 1);
    assert!(app.session().unwrap().display().is_frame_requested());
    assert!(!app.platform().is_frame_requested());
    assert!(rendered_views(&app).is_empty());
}
