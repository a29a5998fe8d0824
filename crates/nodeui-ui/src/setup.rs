use crate::app::AppController;
use crate::component::Component;
use crate::installer::Installer;
use crate::keymap::{self, APP_KEYS, Action};
use crate::widgets::MessageScreen;
use crate::{Command, Event, Outcome, Theme, UiError};
use nodeui_client::{ClientError, NodeApi, Requestor};
use nodeui_core::{Address, ConnectionArgs, NodeConnectionConfig};
use nodeui_install::{InstalledDirs, NodeUiDirs};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

/// How long the result of stopping the node stays on screen.
pub const SHUTDOWN_DISPLAY: Duration = Duration::from_secs(5);

/// Builds a node client from a resolved connection.
pub type Connector =
    Arc<dyn Fn(&NodeConnectionConfig) -> Result<Arc<dyn NodeApi>, ClientError> + Send + Sync>;

#[must_use]
pub fn requestor_connector() -> Connector {
    Arc::new(|config: &NodeConnectionConfig| {
        let api: Arc<dyn NodeApi> = Arc::new(Requestor::new(config)?);
        Ok(api)
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupMode {
    Installer,
    App,
    Shutdown,
}

enum Mode {
    Installer(Installer),
    App {
        app: Box<AppController>,
        api: Arc<dyn NodeApi>,
    },
    Shutdown {
        message: String,
        detail: Option<String>,
    },
}

/// Top of the view tree: installer until a node is reachable, then the
/// dashboard, and finally the stop-node screen.
pub struct Setup {
    mode: Mode,
    connect: Connector,
    watch_list: Vec<Address>,
    config_root: Option<PathBuf>,
}

impl Setup {
    /// Start on the dashboard when `connection` is given, otherwise on the
    /// installer.
    ///
    /// # Errors
    /// Returns `UiError::Connect` if the node client cannot be built.
    pub fn new(
        connection: Option<&NodeConnectionConfig>,
        watch_list: Vec<Address>,
    ) -> Result<Self, UiError> {
        Self::with_connector(connection, watch_list, requestor_connector())
    }

    /// # Errors
    /// Returns `UiError::Connect` if `connect` fails for `connection`.
    pub fn with_connector(
        connection: Option<&NodeConnectionConfig>,
        watch_list: Vec<Address>,
        connect: Connector,
    ) -> Result<Self, UiError> {
        let mode = match connection {
            Some(config) => {
                let api = connect(config)?;
                info!("Connecting to {}", config.rest_url);
                Mode::App {
                    app: Box::new(AppController::new(Arc::clone(&api), watch_list.clone())),
                    api,
                }
            }
            None => {
                info!("No node configured, starting installer");
                Mode::Installer(Installer::new())
            }
        };

        Ok(Self {
            mode,
            connect,
            watch_list,
            config_root: None,
        })
    }

    /// Use `root` instead of the platform config directory.
    #[must_use]
    pub fn with_config_root(mut self, root: PathBuf) -> Self {
        self.config_root = Some(root);
        self
    }

    /// Replace the bundled provisioning script.
    #[must_use]
    pub fn with_install_script(mut self, script: impl Into<String>) -> Self {
        self.mode = match self.mode {
            Mode::Installer(installer) => Mode::Installer(installer.with_script(script)),
            other => other,
        };
        self
    }

    #[must_use]
    pub fn mode(&self) -> SetupMode {
        match self.mode {
            Mode::Installer(_) => SetupMode::Installer,
            Mode::App { .. } => SetupMode::App,
            Mode::Shutdown { .. } => SetupMode::Shutdown,
        }
    }

    fn ensure_config_dir(&self) -> Command {
        let root = self.config_root.clone();
        Command::perform("config dir", async move {
            let result = match root {
                Some(root) => std::fs::create_dir_all(&root)
                    .map(|()| root)
                    .map_err(|e| e.to_string()),
                None => NodeUiDirs::new()
                    .and_then(|dirs| dirs.ensure_config_dir())
                    .map_err(|e| e.to_string()),
            };
            Outcome::ConfigDir(result).into()
        })
    }

    fn connect_installed(&mut self, dirs: &InstalledDirs) -> Vec<Command> {
        let args = ConnectionArgs::from_data_dir(&dirs.data_dir);
        let config = match NodeConnectionConfig::resolve(&args) {
            Ok(Some(config)) => config,
            Ok(None) => {
                return vec![Command::fail(format!(
                    "No node connection found in {}",
                    dirs.data_dir.display()
                ))];
            }
            Err(e) => return vec![Command::fail(e.to_string())],
        };

        let api = match (self.connect)(&config) {
            Ok(api) => api,
            Err(e) => return vec![Command::fail(format!("Cannot reach node: {e}"))],
        };

        info!("Installed node is up at {}", config.rest_url);
        let mut app = Box::new(AppController::new(Arc::clone(&api), self.watch_list.clone()));
        let commands = app.init();
        self.mode = Mode::App { app, api };
        commands
    }

    fn stop_node(&mut self) -> Vec<Command> {
        let Mode::App { api, .. } = &self.mode else {
            return Vec::new();
        };
        let api = Arc::clone(api);
        info!("Stopping node");
        self.mode = Mode::Shutdown {
            message: "Stopping node…".to_string(),
            detail: None,
        };

        vec![Command::perform("shutdown", async move {
            Outcome::NodeStopped(api.shutdown().await.map_err(|e| e.to_string())).into()
        })]
    }
}

impl Component for Setup {
    fn init(&mut self) -> Vec<Command> {
        let mut commands = vec![self.ensure_config_dir()];
        match &mut self.mode {
            Mode::Installer(installer) => commands.extend(installer.init()),
            Mode::App { app, .. } => commands.extend(app.init()),
            Mode::Shutdown { .. } => {}
        }
        commands
    }

    fn update(&mut self, event: &Event) -> Vec<Command> {
        match (self.mode(), event) {
            (_, Event::Outcome(Outcome::ConfigDir(Err(e)))) => {
                error!("Config directory unavailable: {e}");
                vec![Command::fail(format!("Could not create config directory: {e}"))]
            }
            (SetupMode::Installer, Event::Outcome(Outcome::DataDirReady(dirs))) => {
                self.connect_installed(dirs)
            }
            (SetupMode::App, Event::Outcome(Outcome::StopNodeRequested)) => self.stop_node(),
            _ => match &mut self.mode {
                Mode::Installer(installer) => installer.update(event),
                Mode::App { app, .. } => app.update(event),
                Mode::Shutdown { message, detail } => update_shutdown(message, detail, event),
            },
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        match &self.mode {
            Mode::Installer(installer) => installer.render(area, buf, theme),
            Mode::App { app, .. } => app.render(area, buf, theme),
            Mode::Shutdown { message, detail } => MessageScreen {
                message,
                detail: detail.as_deref(),
                theme,
            }
            .render(area, buf),
        }
    }
}

fn update_shutdown(
    message: &mut String,
    detail: &mut Option<String>,
    event: &Event,
) -> Vec<Command> {
    match event {
        Event::Outcome(Outcome::NodeStopped(result)) => {
            match result {
                Ok(()) => *message = "Node stopped.".to_string(),
                Err(e) => {
                    error!("Stopping node failed: {e}");
                    *message = "Could not stop the node.".to_string();
                    *detail = Some(e.clone());
                }
            }
            vec![Command::emit(
                "shutdown complete",
                SHUTDOWN_DISPLAY,
                Outcome::ShutdownComplete.into(),
            )]
        }
        Event::Outcome(Outcome::ShutdownComplete) => vec![Command::quit()],
        Event::Key(key) => match keymap::lookup(APP_KEYS, key, |a| a == Action::Quit) {
            Some(_) => vec![Command::quit()],
            None => Vec::new(),
        },
        _ => Vec::new(),
    }
}
