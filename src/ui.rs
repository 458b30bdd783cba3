use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::window::Window;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonHandle(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    RequestPresent,
    ExitPresent,
}

pub trait Ui {
    fn add_button(&mut self, label: &str, shortcut: char, icon: &Path, action: ButtonAction) -> ButtonHandle;
    fn remove_button(&mut self, handle: ButtonHandle);
    fn button_action(&self, handle: ButtonHandle) -> Option<ButtonAction>;
    fn button_for_shortcut(&self, key: char) -> Option<ButtonHandle>;
    fn set_presenting_message_visible(&mut self, visible: bool);
}

#[derive(Debug, Clone)]
pub struct Button {
    pub handle: ButtonHandle,
    pub label: String,
    pub shortcut: char,
    pub icon: PathBuf,
    pub action: ButtonAction,
}

/// Ordered set of on-screen buttons plus the "presenting" notice.
#[derive(Debug, Default)]
pub struct ButtonBar {
    buttons: Vec<Button>,
    next_id: u32,
    presenting_message: bool,
}

impl ButtonBar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buttons(&self) -> &[Button] {
        &self.buttons
    }

    pub fn button(&self, handle: ButtonHandle) -> Option<&Button> {
        self.buttons.iter().find(|b| b.handle == handle)
    }

    pub fn presenting_message_visible(&self) -> bool {
        self.presenting_message
    }

    /// One-line description, e.g. `[E] Enter VR`.
    pub fn describe(&self) -> String {
        let mut parts: Vec<String> = self
            .buttons
            .iter()
            .map(|b| format!("[{}] {}", b.shortcut, b.label))
            .collect();
        if self.presenting_message {
            parts.push("Presenting to headset".to_string());
        }
        parts.join("  ")
    }
}

impl Ui for ButtonBar {
    fn add_button(&mut self, label: &str, shortcut: char, icon: &Path, action: ButtonAction) -> ButtonHandle {
        let handle = ButtonHandle(self.next_id);
        self.next_id += 1;
        self.buttons.push(Button {
            handle,
            label: label.to_string(),
            shortcut: shortcut.to_ascii_uppercase(),
            icon: icon.to_path_buf(),
            action,
        });
        handle
    }

    fn remove_button(&mut self, handle: ButtonHandle) {
        self.buttons.retain(|b| b.handle != handle);
    }

    fn button_action(&self, handle: ButtonHandle) -> Option<ButtonAction> {
        self.button(handle).map(|b| b.action)
    }

    fn button_for_shortcut(&self, key: char) -> Option<ButtonHandle> {
        let key = key.to_ascii_uppercase();
        self.buttons.iter().find(|b| b.shortcut == key).map(|b| b.handle)
    }

    fn set_presenting_message_visible(&mut self, visible: bool) {
        self.presenting_message = visible;
    }
}

/// Shows the button bar in the window title; buttons are pressed through
/// their keyboard shortcut.
pub struct WindowUi {
    window: Arc<Window>,
    title: String,
    bar: ButtonBar,
}

impl WindowUi {
    pub fn new(window: Arc<Window>, title: impl Into<String>) -> Self {
        let ui = Self {
            window,
            title: title.into(),
            bar: ButtonBar::new(),
        };
        ui.refresh_title();
        ui
    }

    fn refresh_title(&self) {
        let description = self.bar.describe();
        if description.is_empty() {
            self.window.set_title(&self.title);
        } else {
            self.window.set_title(&format!("{} - {}", self.title, description));
        }
    }
}

impl Ui for WindowUi {
    fn add_button(&mut self, label: &str, shortcut: char, icon: &Path, action: ButtonAction) -> ButtonHandle {
        log::debug!("Adding button '{}' ({})", label, icon.display());
        let handle = self.bar.add_button(label, shortcut, icon, action);
        self.refresh_title();
        handle
    }

    fn remove_button(&mut self, handle: ButtonHandle) {
        self.bar.remove_button(handle);
        self.refresh_title();
    }

    fn button_action(&self, handle: ButtonHandle) -> Option<ButtonAction> {
        self.bar.button_action(handle)
    }

    fn button_for_shortcut(&self, key: char) -> Option<ButtonHandle> {
        self.bar.button_for_shortcut(key)
    }

    fn set_presenting_message_visible(&mut self, visible: bool) {
        self.bar.set_presenting_message_visible(visible);
        self.refresh_title();
    }
}
