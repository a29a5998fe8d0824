use crate::component::Component;
use crate::keymap::{self, APP_KEYS, Action};
use crate::widgets::panel_block;
use crate::{Command, Event, Theme};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Paragraph, Widget, Wrap},
};

pub const UTILITIES: &str = "\
Common goal commands, run against the node's data directory:

  goal node status -d $ALGORAND_DATA
      Last round, sync time and catchup state.

  goal node catchup <catchpoint> -d $ALGORAND_DATA
      Fast catchup to a catchpoint. Press f here to use the latest one.

  goal node stop -d $ALGORAND_DATA
  goal node start -d $ALGORAND_DATA
  goal node restart -d $ALGORAND_DATA

  goal account list -d $ALGORAND_DATA
      Accounts in the node's local wallets.

  goal account addpartkey -a <address> --roundFirstValid <r> --roundLastValid <r>
      Generate participation keys to take part in consensus.

Logs live in $ALGORAND_DATA/node.log; `carpenter -d $ALGORAND_DATA` follows them.
";

pub const HELP: &str = "\
nodeui watches a running algod node.

EXPLORER     newest blocks first. enter opens a block's transactions,
             enter again shows one transaction, esc goes back.
UTILITIES    goal commands worth knowing.
ACCOUNTS     balances of the accounts given with -w or WATCH_LIST,
             refreshed every round.
CONFIGURATION
             the node's config.json (needs -d or ALGORAND_DATA).

Fast catchup (f, a) and stop node (s) need the admin token, read from
algod.admin.token in the data directory or given with -a.

Connection: -u/-t (ALGOD_URL, ALGOD_TOKEN) or -d (ALGORAND_DATA).
Without either, nodeui offers to install a node.
";

/// Scrollable static text.
pub struct TextPanel {
    title: &'static str,
    content: &'static str,
    scroll: u16,
}

impl TextPanel {
    #[must_use]
    pub fn new(title: &'static str, content: &'static str) -> Self {
        Self {
            title,
            content,
            scroll: 0,
        }
    }

    fn max_scroll(&self) -> u16 {
        u16::try_from(self.content.lines().count().saturating_sub(1)).unwrap_or(u16::MAX)
    }
}

impl Component for TextPanel {
    fn update(&mut self, event: &Event) -> Vec<Command> {
        if let Event::Key(key) = event {
            match keymap::lookup(APP_KEYS, key, |a| self.handles(a)) {
                Some(Action::Up) => self.scroll = self.scroll.saturating_sub(1),
                Some(Action::Down) => self.scroll = (self.scroll + 1).min(self.max_scroll()),
                _ => {}
            }
        }
        Vec::new()
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let block = panel_block(theme, self.title);
        let inner = block.inner(area);
        block.render(area, buf);

        Paragraph::new(self.content)
            .style(Style::default().fg(theme.fg))
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(inner, buf);
    }

    fn handles(&self, action: Action) -> bool {
        matches!(action, Action::Up | Action::Down)
    }
}
