mod accounts;
mod app;
mod buffer;
mod colors;
mod command;
mod component;
mod config_panel;
mod error;
mod event;
mod explorer;
mod installer;
mod keymap;
mod runtime;
mod setup;
mod status;
mod text_panel;
mod widgets;

#[cfg(test)]
mod testing;

pub use accounts::AccountsPanel;
pub use app::{AppController, Tab};
pub use buffer::{BlockBuffer, INITIAL_WINDOW, MAX_BLOCKS};
pub use colors::{ColorLevel, Theme, ThemeMode, ThemeSettings};
pub use command::{Command, EventFuture, Exit};
pub use component::{Component, Composite};
pub use config_panel::ConfigPanel;
pub use error::UiError;
pub use event::{Event, InstallUpdate, Outcome};
pub use explorer::{Explorer, ExplorerPhase, RETRY_DELAY};
pub use installer::{Installer, InstallerPhase, POLL_INTERVAL, READY_DELAY};
pub use keymap::{APP_KEYS, Action, Binding, INSTALLER_KEYS, KeyPattern};
pub use runtime::{Dispatch, dispatch, run};
pub use setup::{Connector, SHUTDOWN_DISPLAY, Setup, SetupMode, requestor_connector};
pub use status::{STATUS_INTERVAL, StatusPanel};
pub use text_panel::TextPanel;
