use std::path::{Path, PathBuf};

pub const BIN_DIR: &str = "algod_bin";
pub const DATA_DIR: &str = "algod_data";

/// Networks the installer can provision, with their picker descriptions.
pub const NETWORKS: [(&str, &str); 3] = [
    ("mainnet", "Top banana."),
    ("testnet", "Assessment arena."),
    ("betanet", "Where bugs vacation."),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEntry {
    pub name: &'static str,
    pub description: &'static str,
    /// A `root/<name>` directory exists from an earlier install.
    pub present: bool,
}

/// List the network catalog, marking networks already installed under `root`.
#[must_use]
pub fn scan_networks(root: &Path) -> Vec<NetworkEntry> {
    NETWORKS
        .iter()
        .map(|&(name, description)| NetworkEntry {
            name,
            description,
            present: root.join(name).is_dir(),
        })
        .collect()
}

/// Where a network's binaries and data live once provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallationTarget {
    pub network: String,
    pub present: bool,
    pub bin_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl InstallationTarget {
    #[must_use]
    pub fn new(root: &Path, network: &str, present: bool) -> Self {
        let base = root.join(network);
        Self {
            network: network.to_string(),
            present,
            bin_dir: base.join(BIN_DIR),
            data_dir: base.join(DATA_DIR),
        }
    }

    #[must_use]
    pub fn for_entry(root: &Path, entry: &NetworkEntry) -> Self {
        Self::new(root, entry.name, entry.present)
    }

    /// Command the user can run to stop the node outside the UI.
    #[must_use]
    pub fn stop_hint(&self) -> String {
        format!(
            "{} node stop -d {}",
            self.bin_dir.join("goal").display(),
            self.data_dir.display()
        )
    }
}
