//! Lifecycle of the embedded audio player widget.
//!
//! The player is an external script that renders its own floating windows.
//! The dock only tracks whether an instance is being rendered or is ready,
//! and tells the binding what to do when the desktop icon is clicked.

use crate::config::AudioConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DockState {
    #[default]
    Idle,
    Rendering,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DockCommand {
    /// The player is on screen: stack it above all windows and unhide any
    /// sub-window the user collapsed.
    Raise,
    /// Build and render a fresh instance, disposing the old one first when
    /// `dispose_previous` is set.
    Render { dispose_previous: bool },
    /// A render is already in flight.
    Ignore,
}

#[derive(Debug, Clone)]
pub struct AudioDock {
    config: AudioConfig,
    state: DockState,
}

impl AudioDock {
    pub fn new(config: AudioConfig) -> Self {
        Self {
            config,
            state: DockState::Idle,
        }
    }

    pub fn config(&self) -> &AudioConfig {
        &self.config
    }

    pub fn state(&self) -> DockState {
        self.state
    }

    /// Handle a click on the player icon. `player_window_present` is whether
    /// the player's main window currently exists in the document.
    pub fn activate(&mut self, player_window_present: bool) -> DockCommand {
        if player_window_present {
            return DockCommand::Raise;
        }
        match self.state {
            DockState::Rendering => {
                tracing::debug!("audio player render already in flight");
                DockCommand::Ignore
            }
            previous => {
                self.state = DockState::Rendering;
                DockCommand::Render {
                    dispose_previous: previous == DockState::Ready,
                }
            }
        }
    }

    pub fn rendered(&mut self) {
        if self.state == DockState::Rendering {
            tracing::info!("audio player ready");
            self.state = DockState::Ready;
        }
    }

    /// Back to idle after a failed render. Returns the text to put in the
    /// player's container instead.
    pub fn render_failed(&mut self, reason: &str) -> &str {
        tracing::error!(reason, "audio player failed to render");
        self.state = DockState::Idle;
        &self.config.unavailable_text
    }
}
