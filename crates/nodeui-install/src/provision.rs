use crate::{InstallError, InstallationTarget};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{error, info, warn};

pub const SCRIPT_NAME: &str = "update.sh";
pub const UPDATE_SCRIPT: &str = include_str!("../scripts/update.sh");

const CHANNEL: &str = "stable";

/// Directories of a node that finished provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDirs {
    pub bin_dir: PathBuf,
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionState {
    Running {
        output: String,
    },
    Finished {
        dirs: InstalledDirs,
        output: String,
    },
    Failed {
        message: String,
        output: String,
    },
}

impl ProvisionState {
    #[must_use]
    pub fn output(&self) -> &str {
        match self {
            Self::Running { output }
            | Self::Finished { output, .. }
            | Self::Failed { output, .. } => output,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    fn output_mut(&mut self) -> &mut String {
        match self {
            Self::Running { output }
            | Self::Finished { output, .. }
            | Self::Failed { output, .. } => output,
        }
    }

    fn push_line(&mut self, line: &str) {
        let output = self.output_mut();
        output.push_str(line);
        output.push('\n');
    }
}

/// Handle on an in-flight provisioning run.
#[derive(Debug, Clone)]
pub struct Provisioning {
    rx: watch::Receiver<ProvisionState>,
}

impl Provisioning {
    /// Current progress. Cheap enough to poll every few milliseconds.
    #[must_use]
    pub fn snapshot(&self) -> ProvisionState {
        self.rx.borrow().clone()
    }
}

/// Runs the bundled update script to install and start a node.
#[derive(Debug, Clone)]
pub struct Provisioner {
    root: PathBuf,
    script: String,
}

impl Provisioner {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            script: UPDATE_SCRIPT.to_string(),
        }
    }

    /// Replace the bundled script, e.g. with a stub in tests.
    #[must_use]
    pub fn with_script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    #[must_use]
    pub fn target(&self, network: &str, present: bool) -> InstallationTarget {
        InstallationTarget::new(&self.root, network, present)
    }

    /// Create the target directories, write the script and start it.
    ///
    /// Output of the script is collected in the background; poll the
    /// returned handle for progress.
    ///
    /// # Errors
    /// Returns `InstallError` if a directory, the script or the process cannot
    /// be created.
    pub async fn launch(&self, target: &InstallationTarget) -> Result<Provisioning, InstallError> {
        create_dir(&target.data_dir, "data").await?;
        create_dir(&target.bin_dir, "bin").await?;

        let script_path = target.bin_dir.join(SCRIPT_NAME);
        write_script(&script_path, &self.script).await?;

        let mut child = Command::new(&script_path)
            .args(["-c", CHANNEL, "-p"])
            .arg(&target.bin_dir)
            .arg("-d")
            .arg(&target.data_dir)
            .args(["-g", target.network.as_str(), "-i"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| InstallError::Spawn {
                path: script_path.clone(),
                source,
            })?;

        info!(
            "Provisioning {} node into {}",
            target.network,
            target.bin_dir.display()
        );

        let (tx, rx) = watch::channel(ProvisionState::Running {
            output: String::new(),
        });
        let tx = Arc::new(tx);

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let dirs = InstalledDirs {
            bin_dir: target.bin_dir.clone(),
            data_dir: target.data_dir.clone(),
        };

        tokio::spawn(async move {
            let out = stdout.map(|s| tokio::spawn(pump_lines(s, Arc::clone(&tx))));
            let err = stderr.map(|s| tokio::spawn(pump_lines(s, Arc::clone(&tx))));

            let status = child.wait().await;
            for pump in [out, err].into_iter().flatten() {
                let _ = pump.await;
            }

            tx.send_modify(|state| {
                let output = std::mem::take(state.output_mut());
                *state = match status {
                    Ok(status) if status.success() => {
                        info!("Provisioning finished");
                        ProvisionState::Finished { dirs, output }
                    }
                    Ok(status) => {
                        error!("{SCRIPT_NAME} failed: {status}");
                        ProvisionState::Failed {
                            message: format!("{SCRIPT_NAME} failed: {status}"),
                            output,
                        }
                    }
                    Err(e) => {
                        error!("Waiting for {SCRIPT_NAME} failed: {e}");
                        ProvisionState::Failed {
                            message: format!("Waiting for {SCRIPT_NAME} failed: {e}"),
                            output,
                        }
                    }
                };
            });
        });

        Ok(Provisioning { rx })
    }
}

async fn create_dir(path: &Path, what: &'static str) -> Result<(), InstallError> {
    tokio::fs::create_dir_all(path)
        .await
        .map_err(|source| InstallError::CreateDir {
            what,
            path: path.to_path_buf(),
            source,
        })
}

async fn write_script(path: &Path, contents: &str) -> Result<(), InstallError> {
    let wrap = |source| InstallError::ScriptWrite {
        path: path.to_path_buf(),
        source,
    };

    tokio::fs::write(path, contents).await.map_err(wrap)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .await
            .map_err(wrap)?;
    }

    Ok(())
}

async fn pump_lines<R>(reader: R, tx: Arc<watch::Sender<ProvisionState>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut raw = Vec::new();
    loop {
        raw.clear();
        match reader.read_until(b'\n', &mut raw).await {
            Ok(0) => break,
            Ok(_) => {
                let clean = strip_ansi_escapes::strip(&raw);
                let line = String::from_utf8_lossy(&clean);
                tx.send_modify(|state| state.push_line(line.trim_end_matches(['\n', '\r'])));
            }
            Err(e) => {
                warn!("Reading {SCRIPT_NAME} output failed: {e}");
                // Keep the pipe open until the script exits.
                let _ = tokio::io::copy(&mut reader, &mut tokio::io::sink()).await;
                break;
            }
        }
    }
}
