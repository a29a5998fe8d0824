use crate::component::Component;
use crate::{Command, Event, Theme};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use nodeui_client::{
    AccountInformation, ApiResult, AssetHolding, ClientError, NetworkInfo, NodeApi, NodeStatus,
};
use nodeui_core::{Address, Block, BlockPayload, SignedTxnInBlock, Transaction};
use ratatui::{buffer::Buffer, layout::Rect};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

/// In-memory node: every block exists, `wait_for_round` returns at once.
pub struct FakeNode {
    last_round: AtomicU64,
    failing_blocks: AtomicUsize,
    admin: bool,
    config: Option<String>,
    stopped: AtomicBool,
    requests: Mutex<Vec<String>>,
}

impl FakeNode {
    pub fn new(last_round: u64) -> Self {
        Self {
            last_round: AtomicU64::new(last_round),
            failing_blocks: AtomicUsize::new(0),
            admin: false,
            config: Some("{\n  \"Archival\": true\n}".to_string()),
            stopped: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_admin(mut self) -> Self {
        self.admin = true;
        self
    }

    pub fn without_data_dir(mut self) -> Self {
        self.config = None;
        self
    }

    /// The next `count` block requests fail.
    pub fn fail_blocks(&self, count: usize) {
        self.failing_blocks.store(count, Ordering::SeqCst);
    }

    pub fn stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn make_block(&self, round: u64) -> Block {
        let txn = |kind: &str, sender: &str| SignedTxnInBlock {
            txn: Transaction {
                kind: kind.to_string(),
                sender: sender.to_string(),
                fee: 1000,
                ..Transaction::default()
            },
            ..SignedTxnInBlock::default()
        };
        Block {
            round,
            payload: BlockPayload {
                round,
                proto: "future".to_string(),
                payset: vec![txn("pay", "ALICE"), txn("axfer", "BOB")],
                ..BlockPayload::default()
            },
        }
    }

    fn record(&self, request: impl Into<String>) {
        self.requests.lock().unwrap().push(request.into());
    }

    fn status_now(&self) -> NodeStatus {
        NodeStatus {
            last_round: self.last_round.load(Ordering::SeqCst),
            last_version: "future".to_string(),
            ..NodeStatus::default()
        }
    }

    fn admin_check(&self, op: &'static str) -> Result<(), ClientError> {
        if self.admin {
            Ok(())
        } else {
            Err(ClientError::AdminTokenRequired(op))
        }
    }
}

impl NodeApi for FakeNode {
    fn status(&self) -> ApiResult<'_, NodeStatus> {
        Box::pin(async move {
            self.record("status");
            Ok(self.status_now())
        })
    }

    fn wait_for_round(&self, round: u64) -> ApiResult<'_, NodeStatus> {
        Box::pin(async move {
            self.record(format!("wait {round}"));
            self.last_round.fetch_max(round, Ordering::SeqCst);
            Ok(self.status_now())
        })
    }

    fn block(&self, round: u64) -> ApiResult<'_, Block> {
        Box::pin(async move {
            self.record(format!("block {round}"));
            let failing = self
                .failing_blocks
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(ClientError::Status {
                    status: 500,
                    body: "block unavailable\nretry later".to_string(),
                });
            }
            Ok(self.make_block(round))
        })
    }

    fn versions(&self) -> ApiResult<'_, NetworkInfo> {
        Box::pin(async move {
            self.record("versions");
            Ok(NetworkInfo {
                genesis_id: "testnet-v1.0".to_string(),
                genesis_hash: [7; 32],
                node_version: "stable 3.26.0 (abc123)".to_string(),
            })
        })
    }

    fn account(&self, address: Address) -> ApiResult<'_, AccountInformation> {
        Box::pin(async move {
            self.record(format!("account {address}"));
            Ok(AccountInformation {
                address: address.to_string(),
                amount: 5_250_000,
                assets: vec![AssetHolding {
                    asset_id: 31_566_704,
                    amount: 42,
                }],
            })
        })
    }

    fn start_catchup(&self, network: String) -> ApiResult<'_, String> {
        Box::pin(async move {
            self.admin_check("fast catchup")?;
            self.record(format!("catchup {network}"));
            Ok(format!("1000#{network}"))
        })
    }

    fn abort_catchup(&self, network: String) -> ApiResult<'_, String> {
        Box::pin(async move {
            self.admin_check("abort catchup")?;
            self.record(format!("abort {network}"));
            Ok(format!("1000#{network}"))
        })
    }

    fn shutdown(&self) -> ApiResult<'_, ()> {
        Box::pin(async move {
            self.admin_check("shutdown")?;
            self.record("shutdown");
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        })
    }

    fn config_file(&self) -> ApiResult<'_, String> {
        Box::pin(async move { self.config.clone().ok_or(ClientError::NoDataDir) })
    }

    fn can_administer(&self) -> bool {
        self.admin
    }
}

/// Run a command's future to completion, skipping its delay.
pub async fn resolve(command: Command) -> Event {
    match command {
        Command::Task { future, .. } => future.await,
        Command::Quit(exit) => panic!("expected a task, got quit({exit:?})"),
    }
}

pub fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
}

pub fn ctrl(c: char) -> Event {
    Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL))
}

/// Render into an off-screen buffer and return its rows joined by newlines.
pub fn buffer_text(component: &dyn Component, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    let mut buf = Buffer::empty(area);
    component.render(area, &mut buf, &Theme::default());
    rows(&buf)
}

pub fn rows(buf: &Buffer) -> String {
    let area = buf.area;
    (area.top()..area.bottom())
        .map(|y| {
            (area.left()..area.right())
                .map(|x| buf[(x, y)].symbol())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub const ADDRESS: &str = "AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAY5HFKQ";
