use crate::component::Component;
use crate::widgets::{format_algos, panel_block};
use crate::{Command, Event, Outcome, Theme};
use nodeui_client::{Balances, NodeApi};
use nodeui_core::Address;
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Style, Stylize},
    widgets::{Paragraph, Row, Table, Widget},
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Balances of the watch-list accounts, refreshed once per new round.
pub struct AccountsPanel {
    api: Arc<dyn NodeApi>,
    addresses: Vec<Address>,
    balances: Vec<(Address, Balances)>,
    shown_round: Option<u64>,
    pending: bool,
    error: Option<String>,
}

impl AccountsPanel {
    #[must_use]
    pub fn new(api: Arc<dyn NodeApi>, addresses: Vec<Address>) -> Self {
        Self {
            api,
            addresses,
            balances: Vec::new(),
            shown_round: None,
            pending: false,
            error: None,
        }
    }

    #[must_use]
    pub fn balances(&self) -> &[(Address, Balances)] {
        &self.balances
    }

    fn refresh(&mut self, round: u64) -> Command {
        self.pending = true;
        let api = Arc::clone(&self.api);
        let addresses = self.addresses.clone();
        debug!(round, accounts = addresses.len(), "Refreshing balances");

        Command::perform("accounts", async move {
            let mut result = Vec::with_capacity(addresses.len());
            for address in addresses {
                match api.account(address).await {
                    Ok(info) => result.push((address, info.balances())),
                    Err(e) => {
                        return Outcome::Accounts {
                            round,
                            result: Err(format!("{address}: {e}")),
                        }
                        .into();
                    }
                }
            }
            Outcome::Accounts {
                round,
                result: Ok(result),
            }
            .into()
        })
    }
}

impl Component for AccountsPanel {
    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Outcome(Outcome::Status(Ok(status))) => {
                let advanced = self.shown_round.is_none_or(|shown| status.last_round > shown);
                if self.addresses.is_empty() || self.pending || !advanced {
                    return Vec::new();
                }
                vec![self.refresh(status.last_round)]
            }
            Event::Outcome(Outcome::Accounts { round, result }) => {
                self.pending = false;
                if self.shown_round.is_some_and(|shown| *round < shown) {
                    return Vec::new();
                }
                match result {
                    Ok(balances) => {
                        self.balances = balances.clone();
                        self.shown_round = Some(*round);
                        self.error = None;
                    }
                    Err(e) => {
                        warn!("Balance refresh failed: {e}");
                        self.error = Some(e.clone());
                    }
                }
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let title = match self.shown_round {
            Some(round) => format!(" Accounts at round {round} "),
            None => " Accounts ".to_string(),
        };
        let block = panel_block(theme, &title);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.addresses.is_empty() {
            Paragraph::new("No watched accounts. Start with -w <ADDRESS> or set WATCH_LIST.")
                .style(Style::default().fg(theme.dim))
                .render(inner, buf);
            return;
        }

        let mut rows = Vec::new();
        if let Some(error) = &self.error {
            rows.push(
                Row::new(vec![error.replace('\n', " ")]).style(Style::default().fg(theme.error)),
            );
        }
        for (address, balances) in &self.balances {
            let algos = balances.get(&0).copied().unwrap_or(0);
            rows.push(Row::new(vec![
                address.to_string(),
                format!("{} ALGO", format_algos(algos)),
            ]));
            for (asset, amount) in balances.iter().filter(|(id, _)| **id != 0) {
                rows.push(
                    Row::new(vec![format!("  asset {asset}"), amount.to_string()])
                        .style(Style::default().fg(theme.dim)),
                );
            }
        }

        Table::new(rows, [Constraint::Length(60), Constraint::Min(12)])
            .header(
                Row::new(vec!["Address", "Balance"])
                    .style(Style::default().fg(theme.secondary).bold()),
            )
            .render(inner, buf);
    }
}
