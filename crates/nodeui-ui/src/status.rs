use crate::component::Component;
use crate::widgets::{format_duration, panel_block};
use crate::{Command, Event, Outcome, Theme};
use nodeui_client::{NetworkInfo, NodeApi, NodeStatus};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Style, Stylize},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

pub const STATUS_INTERVAL: Duration = Duration::from_secs(1);

/// Header panel: which network, which build, how far along.
pub struct StatusPanel {
    api: Arc<dyn NodeApi>,
    network: Option<NetworkInfo>,
    status: Option<NodeStatus>,
    error: Option<String>,
}

impl StatusPanel {
    #[must_use]
    pub fn new(api: Arc<dyn NodeApi>) -> Self {
        Self {
            api,
            network: None,
            status: None,
            error: None,
        }
    }

    #[must_use]
    pub fn status(&self) -> Option<&NodeStatus> {
        self.status.as_ref()
    }

    fn poll_status(&self, delay: Duration) -> Command {
        let api = Arc::clone(&self.api);
        Command::delayed("status", delay, async move {
            Outcome::Status(api.status().await.map_err(|e| e.to_string())).into()
        })
    }

    fn fetch_versions(&self, delay: Duration) -> Command {
        let api = Arc::clone(&self.api);
        Command::delayed("versions", delay, async move {
            Outcome::Network(api.versions().await.map_err(|e| e.to_string())).into()
        })
    }

    fn catchup_line(status: &NodeStatus) -> String {
        if status.is_fast_catchup() {
            format!(
                "fast catchup to {} (accounts {}/{}, blocks {}/{})",
                status.catchpoint.as_deref().unwrap_or_default(),
                status.catchpoint_processed_accounts.unwrap_or(0),
                status.catchpoint_total_accounts.unwrap_or(0),
                status.catchpoint_acquired_blocks.unwrap_or(0),
                status.catchpoint_total_blocks.unwrap_or(0),
            )
        } else if status.catchup_time > 0 {
            format!("catching up for {}", format_duration(status.catchup_time()))
        } else if status.stopped_at_unsupported_round {
            "stopped at unsupported round, upgrade the node".to_string()
        } else {
            "in sync".to_string()
        }
    }
}

impl Component for StatusPanel {
    fn init(&mut self) -> Vec<Command> {
        vec![
            self.fetch_versions(Duration::ZERO),
            self.poll_status(Duration::ZERO),
        ]
    }

    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Outcome(Outcome::Network(Ok(network))) => {
                self.network = Some(network.clone());
                Vec::new()
            }
            Event::Outcome(Outcome::Network(Err(e))) => {
                warn!("Version query failed: {e}");
                self.error = Some(e.clone());
                vec![self.fetch_versions(STATUS_INTERVAL)]
            }
            Event::Outcome(Outcome::Status(result)) => {
                match result {
                    Ok(status) => {
                        self.status = Some(status.clone());
                        self.error = None;
                    }
                    Err(e) => {
                        warn!("Status query failed: {e}");
                        self.error = Some(e.clone());
                    }
                }
                vec![self.poll_status(STATUS_INTERVAL)]
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = panel_block(theme, " Node ");
        let inner = block.inner(area);
        block.render(area, buf);

        let label = |text: &'static str| Span::styled(text, Style::default().fg(theme.dim));
        let value = |text: String| Span::styled(text, Style::default().fg(theme.fg).bold());

        let (network, version) = self.network.as_ref().map_or_else(
            || ("…".to_string(), "…".to_string()),
            |n| (n.genesis_id.clone(), n.node_version.clone()),
        );

        let mut lines = vec![Line::from(vec![
            label("Network: "),
            value(network),
            Span::raw("   "),
            label("Version: "),
            value(version),
        ])];

        match &self.status {
            Some(status) => {
                let since = status.time_since_last_round();
                lines.push(Line::from(vec![
                    label("Round: "),
                    value(status.last_round.to_string()),
                    Span::raw("   "),
                    label("Since last round: "),
                    value(format!("{}.{}s", since.as_secs(), since.subsec_millis() / 100)),
                ]));
                lines.push(Line::from(vec![
                    label("Sync: "),
                    value(Self::catchup_line(status)),
                ]));
            }
            None => lines.push(Line::from(label("Waiting for node status"))),
        }

        if let Some(error) = &self.error {
            lines.push(Line::from(Span::styled(
                error.replace('\n', " "),
                Style::default().fg(theme.error),
            )));
        }

        Paragraph::new(lines).render(inner, buf);
    }
}
