use crossterm::event::KeyEvent;
use nodeui_client::{Balances, NetworkInfo, NodeStatus};
use nodeui_core::{Address, Block};
use nodeui_install::{InstalledDirs, NetworkEntry, ProvisionState, Provisioning};
use std::path::PathBuf;

/// Everything the dispatch loop reacts to.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Resize { width: u16, height: u16 },
    Tick,
    Outcome(Outcome),
}

/// Results of commands, tagged by the subsystem that asked for them.
///
/// Errors are carried as display strings; they are only ever shown to the
/// user or logged.
#[derive(Debug, Clone)]
pub enum Outcome {
    ConfigDir(Result<PathBuf, String>),
    NetworksScanned(Vec<NetworkEntry>),
    Network(Result<NetworkInfo, String>),
    Status(Result<NodeStatus, String>),
    /// `seq` identifies the explorer request this answers.
    Blocks {
        seq: u64,
        result: Result<Vec<Block>, String>,
    },
    Accounts {
        round: u64,
        result: Result<Vec<(Address, Balances)>, String>,
    },
    ConfigFile(Result<String, String>),
    Catchup(Result<String, String>),
    Install(InstallUpdate),
    DataDirReady(InstalledDirs),
    StopNodeRequested,
    NodeStopped(Result<(), String>),
    ShutdownComplete,
}

#[derive(Debug, Clone)]
pub enum InstallUpdate {
    Started(Result<Provisioning, String>),
    Progress(ProvisionState),
}

impl From<Outcome> for Event {
    fn from(outcome: Outcome) -> Self {
        Self::Outcome(outcome)
    }
}
