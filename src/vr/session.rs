use crate::config::{DemoConfig, ENTER_VR_LABEL, EXIT_VR_LABEL};
use crate::error::DisplayError;
use crate::ui::{ButtonAction, ButtonHandle, Ui};

use super::VrDisplay;

/// The selected display plus the present/exit control bound to it.
pub struct DeviceSession<D> {
    display: D,
    button: Option<ButtonHandle>,
    shortcut: char,
    icon: std::path::PathBuf,
}

impl<D: VrDisplay> DeviceSession<D> {
    pub fn configure<U: Ui>(mut display: D, config: &DemoConfig, ui: &mut U) -> Self {
        display.set_depth_range(config.depth_near, config.depth_far);

        let capabilities = display.capabilities();
        log::info!(
            "Using display '{}' (can present: {}, external display: {})",
            display.name(),
            capabilities.can_present,
            capabilities.has_external_display
        );

        let button = if capabilities.can_present {
            Some(ui.add_button(
                ENTER_VR_LABEL,
                config.button_shortcut,
                &config.button_icon,
                ButtonAction::RequestPresent,
            ))
        } else {
            None
        };

        Self {
            display,
            button,
            shortcut: config.button_shortcut,
            icon: config.button_icon.clone(),
        }
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn button(&self) -> Option<ButtonHandle> {
        self.button
    }

    pub fn is_presenting(&self) -> bool {
        self.display.is_presenting()
    }

    pub fn request_present(&mut self) -> Result<(), DisplayError> {
        log::info!("Requesting presentation on '{}'", self.display.name());
        self.display.request_present()
    }

    /// Leaves presentation. Does nothing when the display is not presenting.
    pub fn exit_present(&mut self) -> Result<(), DisplayError> {
        if !self.display.is_presenting() {
            return Ok(());
        }
        log::info!("Exiting presentation on '{}'", self.display.name());
        self.display.exit_present()
    }

    /// Swaps the control to match the current presentation state. Only
    /// displays with an external display get their control swapped.
    pub fn update_controls<U: Ui>(&mut self, ui: &mut U) {
        if !self.display.capabilities().has_external_display {
            return;
        }

        let presenting = self.display.is_presenting();
        ui.set_presenting_message_visible(presenting);

        if let Some(button) = self.button.take() {
            ui.remove_button(button);
        }
        let (label, action) = if presenting {
            (EXIT_VR_LABEL, ButtonAction::ExitPresent)
        } else {
            (ENTER_VR_LABEL, ButtonAction::RequestPresent)
        };
        self.button = Some(ui.add_button(label, self.shortcut, &self.icon, action));
    }
}
