use crate::buffer::{BlockBuffer, INITIAL_WINDOW};
use crate::component::Component;
use crate::keymap::{self, APP_KEYS, Action};
use crate::widgets::{format_algos, panel_block, shorten, spinner_char};
use crate::{Command, Event, Outcome, Theme};
use nodeui_client::NodeApi;
use nodeui_core::{Block, SignedTxnInBlock};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Style, Stylize},
    text::Line,
    widgets::{Paragraph, Row, StatefulWidget, Table, TableState, Widget, Wrap},
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const RETRY_DELAY: Duration = Duration::from_secs(1);

const BANNER_HEIGHT: u16 = 3;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExplorerPhase {
    BlockList,
    Payset,
    Transaction,
}

/// Where the next fetch starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fetch {
    /// Ask for status, then fetch the window ending at the last round.
    Seed,
    Range { first: u64, last: u64 },
    /// Wait until the round exists, then fetch it.
    Next(u64),
}

pub struct Explorer {
    api: Arc<dyn NodeApi>,
    buffer: BlockBuffer,
    phase: ExplorerPhase,
    /// Row in the block table, counted from the newest block.
    selected_block: usize,
    payset_round: u64,
    payset: Vec<SignedTxnInBlock>,
    selected_txn: usize,
    txn_scroll: u16,
    /// Sequence number of the one fetch whose result will be applied.
    seq: u64,
    status_round: Option<u64>,
    errors: u64,
    last_error: Option<String>,
    tick: usize,
}

impl Explorer {
    #[must_use]
    pub fn new(api: Arc<dyn NodeApi>) -> Self {
        Self {
            api,
            buffer: BlockBuffer::new(),
            phase: ExplorerPhase::BlockList,
            selected_block: 0,
            payset_round: 0,
            payset: Vec::new(),
            selected_txn: 0,
            txn_scroll: 0,
            seq: 0,
            status_round: None,
            errors: 0,
            last_error: None,
            tick: 0,
        }
    }

    #[must_use]
    pub fn phase(&self) -> ExplorerPhase {
        self.phase
    }

    #[must_use]
    pub fn buffer(&self) -> &BlockBuffer {
        &self.buffer
    }

    #[must_use]
    pub fn payset(&self) -> &[SignedTxnInBlock] {
        &self.payset
    }

    #[must_use]
    pub fn errors(&self) -> u64 {
        self.errors
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn issue(&mut self, fetch: Fetch, delay: Duration) -> Command {
        self.seq += 1;
        let seq = self.seq;
        let api = Arc::clone(&self.api);
        debug!(seq, ?fetch, "Issuing block fetch");

        Command::delayed("blocks", delay, async move {
            let result = match fetch {
                Fetch::Seed => seed(api.as_ref()).await,
                Fetch::Range { first, last } => fetch_range(api.as_ref(), first, last).await,
                Fetch::Next(round) => fetch_next(api.as_ref(), round).await,
            };
            Outcome::Blocks { seq, result }.into()
        })
    }

    /// Target after a failure. Never behind the buffered frontier.
    fn recovery_target(&self) -> Fetch {
        if let Some(frontier) = self.buffer.frontier() {
            Fetch::Next(frontier + 1)
        } else if let Some(last) = self.status_round {
            Fetch::Range {
                first: last.saturating_sub(INITIAL_WINDOW),
                last,
            }
        } else {
            Fetch::Seed
        }
    }

    fn on_blocks(&mut self, seq: u64, result: &Result<Vec<Block>, String>) -> Vec<Command> {
        if seq != self.seq {
            debug!(seq, expected = self.seq, "Discarding superseded block result");
            return Vec::new();
        }

        match result {
            Ok(blocks) => {
                let appended = self.buffer.merge(blocks.clone());
                debug!(appended, frontier = ?self.buffer.frontier(), "Merged blocks");
                self.last_error = None;
                self.clamp_selection();
                match self.buffer.frontier() {
                    Some(frontier) => vec![self.issue(Fetch::Next(frontier + 1), Duration::ZERO)],
                    None => vec![self.issue(Fetch::Seed, RETRY_DELAY)],
                }
            }
            Err(message) => {
                self.errors += 1;
                warn!(errors = self.errors, "Block fetch failed: {message}");
                self.last_error = Some(message.clone());
                let target = self.recovery_target();
                vec![self.issue(target, RETRY_DELAY)]
            }
        }
    }

    fn clamp_selection(&mut self) {
        let len = self.buffer.len();
        if self.selected_block >= len {
            self.selected_block = len.saturating_sub(1);
        }
    }

    fn rows(&self) -> usize {
        match self.phase {
            ExplorerPhase::BlockList => self.buffer.len(),
            ExplorerPhase::Payset => self.payset.len(),
            ExplorerPhase::Transaction => 0,
        }
    }

    fn on_action(&mut self, action: Action) {
        match (self.phase, action) {
            (ExplorerPhase::BlockList, Action::Forward) => {
                if let Some(block) = self.buffer.newest(self.selected_block) {
                    self.payset_round = block.round;
                    self.payset = block.payset().to_vec();
                    self.selected_txn = 0;
                    self.phase = ExplorerPhase::Payset;
                }
            }
            (ExplorerPhase::Payset, Action::Forward) => {
                if !self.payset.is_empty() {
                    self.txn_scroll = 0;
                    self.phase = ExplorerPhase::Transaction;
                }
            }
            (ExplorerPhase::Payset, Action::Back) => {
                self.payset.clear();
                self.selected_txn = 0;
                self.phase = ExplorerPhase::BlockList;
            }
            (ExplorerPhase::Transaction, Action::Back) => {
                self.phase = ExplorerPhase::Payset;
            }
            (ExplorerPhase::BlockList, Action::Up) => {
                self.selected_block = self.selected_block.saturating_sub(1);
            }
            (ExplorerPhase::BlockList, Action::Down) => {
                if self.selected_block + 1 < self.buffer.len() {
                    self.selected_block += 1;
                }
            }
            (ExplorerPhase::Payset, Action::Up) => {
                self.selected_txn = self.selected_txn.saturating_sub(1);
            }
            (ExplorerPhase::Payset, Action::Down) => {
                if self.selected_txn + 1 < self.payset.len() {
                    self.selected_txn += 1;
                }
            }
            (ExplorerPhase::Transaction, Action::Up) => {
                self.txn_scroll = self.txn_scroll.saturating_sub(1);
            }
            (ExplorerPhase::Transaction, Action::Down) => {
                self.txn_scroll = self.txn_scroll.saturating_add(1);
            }
            _ => {}
        }
    }

    fn render_banner(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let text = self
            .last_error
            .as_deref()
            .unwrap_or_default()
            .replace(['\n', '\r'], "");
        let [banner, _] =
            Layout::vertical([Constraint::Length(BANNER_HEIGHT), Constraint::Min(0)]).areas(area);

        Paragraph::new(Line::from(format!("Error({}): {text}", self.errors)))
            .style(Style::default().fg(theme.error).bold())
            .wrap(Wrap { trim: true })
            .render(banner, buf);
    }

    fn render_blocks(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if self.buffer.is_empty() {
            Paragraph::new(format!("{} Waiting for blocks", spinner_char(self.tick)))
                .style(Style::default().fg(theme.dim))
                .render(area, buf);
            return;
        }

        let rows = self.buffer.blocks().iter().rev().map(|block| {
            Row::new(vec![
                block.round.to_string(),
                block.payset().len().to_string(),
                shorten(&block.payload.proto, 12),
                format_clock(block.payload.timestamp),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(12),
                Constraint::Length(6),
                Constraint::Length(28),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["Round", "Txns", "Protocol", "Time (UTC)"]).style(header(theme)))
        .row_highlight_style(selected(theme));

        let mut state = TableState::default().with_selected(Some(self.selected_block));
        StatefulWidget::render(table, area, buf, &mut state);
    }

    fn render_payset(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        if self.payset.is_empty() {
            Paragraph::new(format!("Round {} has no transactions", self.payset_round))
                .style(Style::default().fg(theme.dim))
                .render(area, buf);
            return;
        }

        let rows = self.payset.iter().map(|stxn| {
            let txn = &stxn.txn;
            Row::new(vec![
                txn.kind.clone(),
                shorten(&txn.sender, 6),
                txn.receiver().map(|r| shorten(r, 6)).unwrap_or_default(),
                txn.amount().map(|a| a.to_string()).unwrap_or_default(),
                format_algos(txn.fee),
            ])
        });
        let table = Table::new(
            rows,
            [
                Constraint::Length(8),
                Constraint::Length(15),
                Constraint::Length(15),
                Constraint::Length(16),
                Constraint::Min(10),
            ],
        )
        .header(
            Row::new(vec!["Type", "Sender", "Receiver", "Amount", "Fee"]).style(header(theme)),
        )
        .row_highlight_style(selected(theme));

        let mut state = TableState::default().with_selected(Some(self.selected_txn));
        StatefulWidget::render(table, area, buf, &mut state);
    }

    fn render_transaction(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let json = self
            .payset
            .get(self.selected_txn)
            .map(SignedTxnInBlock::to_pretty_json)
            .unwrap_or_default();
        Paragraph::new(json)
            .style(Style::default().fg(theme.fg))
            .scroll((self.txn_scroll, 0))
            .render(area, buf);
    }
}

impl Component for Explorer {
    fn init(&mut self) -> Vec<Command> {
        vec![self.issue(Fetch::Seed, Duration::ZERO)]
    }

    fn update(&mut self, event: &Event) -> Vec<Command> {
        match event {
            Event::Key(key) => {
                if let Some(action) = keymap::lookup(APP_KEYS, key, |a| self.handles(a)) {
                    self.on_action(action);
                }
                Vec::new()
            }
            Event::Tick => {
                self.tick = self.tick.wrapping_add(1);
                Vec::new()
            }
            Event::Outcome(Outcome::Blocks { seq, result }) => self.on_blocks(*seq, result),
            Event::Outcome(Outcome::Status(Ok(status))) => {
                self.status_round = Some(status.last_round);
                Vec::new()
            }
            Event::Resize { .. } | Event::Outcome(_) => Vec::new(),
        }
    }

    fn render(&self, area: Rect, buf: &mut Buffer, theme: &Theme) {
        let title = match self.phase {
            ExplorerPhase::BlockList => " Blocks ".to_string(),
            ExplorerPhase::Payset => format!(" Round {} ", self.payset_round),
            ExplorerPhase::Transaction => format!(" Round {} transaction ", self.payset_round),
        };
        let block = panel_block(theme, &title);
        let inner = block.inner(area);
        block.render(area, buf);

        if self.last_error.is_some() {
            self.render_banner(inner, buf, theme);
            return;
        }

        match self.phase {
            ExplorerPhase::BlockList => self.render_blocks(inner, buf, theme),
            ExplorerPhase::Payset => self.render_payset(inner, buf, theme),
            ExplorerPhase::Transaction => self.render_transaction(inner, buf, theme),
        }
    }

    fn handles(&self, action: Action) -> bool {
        match action {
            Action::Up | Action::Down => {
                self.phase == ExplorerPhase::Transaction || self.rows() > 0
            }
            Action::Forward => self.rows() > 0 && self.phase != ExplorerPhase::Transaction,
            Action::Back => self.phase != ExplorerPhase::BlockList,
            _ => false,
        }
    }
}

fn header(theme: &Theme) -> Style {
    Style::default().fg(theme.secondary).bold()
}

fn selected(theme: &Theme) -> Style {
    if theme.is_monochrome() {
        Style::default().reversed()
    } else {
        Style::default().bg(theme.highlight).fg(theme.fg)
    }
}

/// Unix seconds as a UTC wall-clock time.
fn format_clock(timestamp: i64) -> String {
    let secs = timestamp.rem_euclid(86_400);
    format!(
        "{:02}:{:02}:{:02}",
        secs / 3600,
        (secs % 3600) / 60,
        secs % 60
    )
}

async fn seed(api: &dyn NodeApi) -> Result<Vec<Block>, String> {
    let status = api.status().await.map_err(|e| e.to_string())?;
    let last = status.last_round;
    fetch_range(api, last.saturating_sub(INITIAL_WINDOW), last).await
}

async fn fetch_range(api: &dyn NodeApi, first: u64, last: u64) -> Result<Vec<Block>, String> {
    let mut blocks = Vec::new();
    for round in (first..=last).rev() {
        blocks.push(api.block(round).await.map_err(|e| e.to_string())?);
    }
    Ok(blocks)
}

async fn fetch_next(api: &dyn NodeApi, round: u64) -> Result<Vec<Block>, String> {
    api.wait_for_round(round)
        .await
        .map_err(|e| e.to_string())?;
    let block = api.block(round).await.map_err(|e| e.to_string())?;
    Ok(vec![block])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeNode, buffer_text, key, resolve};
    use crossterm::event::KeyCode;
    use nodeui_client::NodeStatus;

    fn rounds(explorer: &Explorer) -> Vec<u64> {
        explorer.buffer().blocks().iter().map(|b| b.round).collect()
    }

    async fn seeded(node: &Arc<FakeNode>) -> (Explorer, Command) {
        let mut explorer = Explorer::new(Arc::clone(node) as Arc<dyn NodeApi>);
        let mut commands = explorer.init();
        assert_eq!(commands.len(), 1);
        let event = resolve(commands.remove(0)).await;
        let mut next = explorer.update(&event);
        assert_eq!(next.len(), 1);
        (explorer, next.remove(0))
    }

    #[tokio::test]
    async fn test_seed_fetches_window_ending_at_last_round() {
        let node = Arc::new(FakeNode::new(100));
        let (explorer, next) = seeded(&node).await;

        assert_eq!(rounds(&explorer), (75..=100).collect::<Vec<_>>());
        assert_eq!(next.delay(), Duration::ZERO);
        assert!(explorer.last_error().is_none());
    }

    #[tokio::test]
    async fn test_next_round_is_appended_after_wait() {
        let node = Arc::new(FakeNode::new(100));
        let (mut explorer, next) = seeded(&node).await;

        let event = resolve(next).await;
        let commands = explorer.update(&event);

        assert_eq!(explorer.buffer().frontier(), Some(101));
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].delay(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_retry_converges_after_k_failures() {
        let node = Arc::new(FakeNode::new(100));
        let (mut explorer, mut next) = seeded(&node).await;
        node.fail_blocks(3);

        let mut retries = 0;
        loop {
            let event = resolve(next).await;
            let mut commands = explorer.update(&event);
            assert_eq!(commands.len(), 1);
            next = commands.remove(0);
            if explorer.last_error().is_none() {
                break;
            }
            assert_eq!(next.delay(), RETRY_DELAY);
            retries += 1;
        }

        assert_eq!(retries, 3);
        assert_eq!(explorer.errors(), 3);
        assert_eq!(explorer.buffer().frontier(), Some(101));
        let r = rounds(&explorer);
        assert!(r.windows(2).all(|w| w[0] < w[1]));
    }

    #[tokio::test]
    async fn test_failed_seed_retries_from_cached_status_round() {
        let node = Arc::new(FakeNode::new(40));
        node.fail_blocks(1);
        let mut explorer = Explorer::new(Arc::clone(&node) as Arc<dyn NodeApi>);
        let mut commands = explorer.init();

        explorer.update(&Outcome::Status(Ok(NodeStatus {
            last_round: 30,
            ..NodeStatus::default()
        }))
        .into());

        let event = resolve(commands.remove(0)).await;
        let mut retry = explorer.update(&event);
        assert_eq!(explorer.errors(), 1);

        let event = resolve(retry.remove(0)).await;
        explorer.update(&event);
        assert_eq!(rounds(&explorer), (5..=30).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_superseded_result_is_ignored() {
        let node = Arc::new(FakeNode::new(100));
        let mut explorer = Explorer::new(Arc::clone(&node) as Arc<dyn NodeApi>);
        let mut first = explorer.init();
        let stale = resolve(first.remove(0)).await;

        // A second request supersedes the first.
        let mut second = explorer.init();
        let current = resolve(second.remove(0)).await;

        assert!(explorer.update(&stale).is_empty());
        assert!(explorer.buffer().is_empty());

        assert_eq!(explorer.update(&current).len(), 1);
        assert_eq!(explorer.buffer().len(), 26);
    }

    #[tokio::test]
    async fn test_lower_round_result_does_not_mutate_buffer() {
        let node = Arc::new(FakeNode::new(100));
        let (mut explorer, _next) = seeded(&node).await;
        let before = rounds(&explorer);

        let old = node.make_block(80);
        let seq = explorer.seq;
        explorer.update(&Outcome::Blocks { seq, result: Ok(vec![old]) }.into());

        assert_eq!(rounds(&explorer), before);
    }

    #[tokio::test]
    async fn test_navigation_round_trip() {
        let node = Arc::new(FakeNode::new(100));
        let (mut explorer, _next) = seeded(&node).await;
        let before = rounds(&explorer);

        explorer.update(&key(KeyCode::Enter));
        assert_eq!(explorer.phase(), ExplorerPhase::Payset);
        assert_eq!(explorer.payset().len(), 2);

        explorer.update(&key(KeyCode::Down));
        explorer.update(&key(KeyCode::Enter));
        assert_eq!(explorer.phase(), ExplorerPhase::Transaction);

        explorer.update(&key(KeyCode::Esc));
        assert_eq!(explorer.phase(), ExplorerPhase::Payset);
        explorer.update(&key(KeyCode::Left));
        assert_eq!(explorer.phase(), ExplorerPhase::BlockList);

        assert!(explorer.payset().is_empty());
        assert_eq!(rounds(&explorer), before);
    }

    #[tokio::test]
    async fn test_every_phase_answers_every_event() {
        let node = Arc::new(FakeNode::new(10));
        let (mut explorer, _next) = seeded(&node).await;

        let events = || {
            vec![
                key(KeyCode::Up),
                key(KeyCode::Down),
                key(KeyCode::Char('x')),
                key(KeyCode::Char('q')),
                Event::Resize {
                    width: 40,
                    height: 10,
                },
                Event::Tick,
                Outcome::Blocks {
                    seq: 0,
                    result: Err("stale".into()),
                }
                .into(),
                Outcome::ConfigFile(Ok(String::new())).into(),
                Outcome::StopNodeRequested.into(),
            ]
        };

        for phase in [
            ExplorerPhase::BlockList,
            ExplorerPhase::Payset,
            ExplorerPhase::Transaction,
        ] {
            for event in events() {
                let commands = explorer.update(&event);
                assert!(commands.is_empty(), "{phase:?} issued work for {event:?}");
                assert_eq!(explorer.phase(), phase);
            }
            explorer.update(&key(KeyCode::Enter));
        }
        assert_eq!(explorer.errors(), 0);
    }

    #[tokio::test]
    async fn test_fetches_continue_while_drilled_down() {
        let node = Arc::new(FakeNode::new(100));
        let (mut explorer, next) = seeded(&node).await;

        explorer.update(&key(KeyCode::Enter));
        assert_eq!(explorer.phase(), ExplorerPhase::Payset);
        let payset = explorer.payset().to_vec();

        let event = resolve(next).await;
        let mut commands = explorer.update(&event);
        assert_eq!(commands.len(), 1);
        assert_eq!(explorer.buffer().frontier(), Some(101));
        assert_eq!(explorer.phase(), ExplorerPhase::Payset);
        assert_eq!(explorer.payset(), payset.as_slice());
        assert_eq!(explorer.payset_round, 100);

        explorer.update(&key(KeyCode::Down));
        explorer.update(&key(KeyCode::Enter));
        assert_eq!(explorer.phase(), ExplorerPhase::Transaction);

        node.fail_blocks(1);
        let event = resolve(commands.remove(0)).await;
        let mut commands = explorer.update(&event);
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].delay(), RETRY_DELAY);
        assert_eq!(explorer.errors(), 1);
        assert_eq!(explorer.buffer().frontier(), Some(101));
        assert_eq!(explorer.phase(), ExplorerPhase::Transaction);
        assert_eq!(explorer.payset(), payset.as_slice());
        assert_eq!(explorer.selected_txn, 1);

        let event = resolve(commands.remove(0)).await;
        explorer.update(&event);
        assert!(explorer.last_error().is_none());
        assert_eq!(explorer.buffer().frontier(), Some(102));
        assert_eq!(explorer.phase(), ExplorerPhase::Transaction);
        assert_eq!(explorer.payset_round, 100);
    }

    #[tokio::test]
    async fn test_error_banner_replaces_table() {
        let node = Arc::new(FakeNode::new(100));
        node.fail_blocks(1);
        let mut explorer = Explorer::new(Arc::clone(&node) as Arc<dyn NodeApi>);
        let mut commands = explorer.init();
        let event = resolve(commands.remove(0)).await;
        explorer.update(&event);

        let text = buffer_text(&explorer, 80, 10);
        assert!(text.contains("Error(1): Node returned HTTP 500: block unavailableretry later"));
        assert!(!text.contains("Round"));
    }

    #[tokio::test]
    async fn test_block_table_lists_newest_first() {
        let node = Arc::new(FakeNode::new(100));
        let (explorer, _next) = seeded(&node).await;

        let text = buffer_text(&explorer, 80, 8);
        let newest = text.find("100").unwrap();
        let older = text.find("99").unwrap();
        assert!(newest < older);
    }

    #[test]
    fn test_format_clock() {
        assert_eq!(format_clock(0), "00:00:00");
        assert_eq!(format_clock(1_700_000_000), "22:13:20");
    }
}
