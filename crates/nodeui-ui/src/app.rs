use crate::accounts::AccountsPanel;
use crate::component::{Component, Composite};
use crate::config_panel::ConfigPanel;
use crate::explorer::Explorer;
use crate::keymap::{self, APP_KEYS, Action};
use crate::status::StatusPanel;
use crate::text_panel::{HELP, TextPanel, UTILITIES};
use crate::widgets::{TabHeader, help_line};
use crate::{Command, Event, Outcome, Theme};
use nodeui_client::NodeApi;
use nodeui_core::Address;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    widgets::{Paragraph, Widget},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

const STATUS_HEIGHT: u16 = 6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tab {
    Explorer,
    Utilities,
    Accounts,
    Configuration,
    Help,
}

impl Tab {
    pub const ALL: [Self; 5] = [
        Self::Explorer,
        Self::Utilities,
        Self::Accounts,
        Self::Configuration,
        Self::Help,
    ];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Explorer => "EXPLORER",
            Self::Utilities => "UTILITIES",
            Self::Accounts => "ACCOUNTS",
            Self::Configuration => "CONFIGURATION",
            Self::Help => "HELP",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Notice {
    Info(String),
    Error(String),
}

/// The dashboard once a node connection exists: status header over tabs.
pub struct AppController {
    api: Arc<dyn NodeApi>,
    status: StatusPanel,
    tabs: Composite<Tab>,
    /// Network name from the genesis id, known after the first version query.
    network: Option<String>,
    notice: Option<Notice>,
}

impl AppController {
    #[must_use]
    pub fn new(api: Arc<dyn NodeApi>, watch_list: Vec<Address>) -> Self {
        let children = vec![
            child(Tab::Explorer, Explorer::new(Arc::clone(&api))),
            child(Tab::Utilities, TextPanel::new(" Utilities ", UTILITIES)),
            child(
                Tab::Accounts,
                AccountsPanel::new(Arc::clone(&api), watch_list),
            ),
            child(Tab::Configuration, ConfigPanel::new(Arc::clone(&api))),
            child(Tab::Help, TextPanel::new(" Help ", HELP)),
        ];

        Self {
            status: StatusPanel::new(Arc::clone(&api)),
            api,
            tabs: Composite::new(children),
            network: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn active_tab(&self) -> Option<Tab> {
        self.tabs.active()
    }

    fn global_enabled(&self, action: Action) -> bool {
        match action {
            Action::Quit | Action::Section | Action::Help => true,
            Action::Catchup | Action::AbortCatchup => self.network.is_some(),
            Action::StopNode => self.api.can_administer(),
            _ => false,
        }
    }

    fn catchup(&self, start: bool) -> Vec<Command> {
        let Some(network) = self.network.clone() else {
            return Vec::new();
        };
        let api = Arc::clone(&self.api);
        info!(network = %network, start, "Requesting fast catchup change");

        vec![Command::perform("catchup", async move {
            let result = if start {
                api.start_catchup(network)
                    .await
                    .map(|c| format!("Fast catchup started to {c}"))
            } else {
                api.abort_catchup(network)
                    .await
                    .map(|c| format!("Fast catchup to {c} aborted"))
            };
            Outcome::Catchup(result.map_err(|e| e.to_string())).into()
        })]
    }

    fn on_action(&mut self, action: Action) -> Vec<Command> {
        match action {
            Action::Quit => vec![Command::quit()],
            Action::Section => {
                self.tabs.next();
                Vec::new()
            }
            Action::Help => {
                self.tabs.select(Tab::Help);
                Vec::new()
            }
            Action::Catchup => self.catchup(true),
            Action::AbortCatchup => self.catchup(false),
            Action::StopNode => vec![Command::emit(
                "stop node",
                Duration::ZERO,
                Outcome::StopNodeRequested.into(),
            )],
            _ => Vec::new(),
        }
    }

    fn render_notice(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let (text, color) = match &self.notice {
            Some(Notice::Info(text)) => (text.as_str(), theme.success),
            Some(Notice::Error(text)) => (text.as_str(), theme.error),
            None => return,
        };
        Paragraph::new(text.replace('\n', " "))
            .style(Style::default().fg(color).bold())
            .render(area, buf);
    }
}

impl Component for AppController {
    fn init(&mut self) -> Vec<Command> {
        let mut commands = self.status.init();
        commands.extend(self.tabs.init());
        commands
    }

    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(key) => {
                match keymap::lookup(APP_KEYS, key, |a| self.global_enabled(a)) {
                    Some(action) => self.on_action(action),
                    None => self.tabs.update(event),
                }
            }
            Event::Outcome(Outcome::Catchup(result)) => {
                self.notice = Some(match result {
                    Ok(message) => Notice::Info(message.clone()),
                    Err(e) => Notice::Error(e.clone()),
                });
                Vec::new()
            }
            _ => {
                if let Event::Outcome(Outcome::Network(Ok(network))) = event {
                    self.network = Some(network.network().to_string());
                }
                let mut commands = self.status.update(event);
                commands.extend(self.tabs.update(event));
                commands
            }
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let [status, header, body, notice, help] = Layout::vertical([
            Constraint::Length(STATUS_HEIGHT),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(u16::from(self.notice.is_some())),
            Constraint::Length(1),
        ])
        .areas(area);

        self.status.render(status, buf, theme);

        let labels = Tab::ALL.map(Tab::label);
        let active = self
            .tabs
            .active()
            .and_then(|tab| Tab::ALL.iter().position(|t| *t == tab))
            .unwrap_or(0);
        TabHeader {
            labels: &labels,
            active,
            theme,
        }
        .render(header, buf);

        self.tabs.render_active(body, buf, theme);
        self.render_notice(notice, buf, theme);

        let entries = keymap::help_entries(APP_KEYS, |a| self.handles(a));
        help_line(theme, &entries).render(help, buf);
    }

    fn handles(&self, action: Action) -> bool {
        self.global_enabled(action) || self.tabs.active_handles(action)
    }
}

fn child(tab: Tab, component: impl Component + 'static) -> (Tab, Box<dyn Component>) {
    (tab, Box::new(component))
}
