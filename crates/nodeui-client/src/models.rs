use crate::ClientError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Subset of `/v2/status` the dashboard uses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct NodeStatus {
    pub last_round: u64,
    #[serde(default)]
    pub last_version: String,
    #[serde(default)]
    pub time_since_last_round: u64,
    #[serde(default)]
    pub catchup_time: u64,
    #[serde(default)]
    pub stopped_at_unsupported_round: bool,
    #[serde(default)]
    pub catchpoint: Option<String>,
    #[serde(default)]
    pub catchpoint_total_accounts: Option<u64>,
    #[serde(default)]
    pub catchpoint_processed_accounts: Option<u64>,
    #[serde(default)]
    pub catchpoint_total_blocks: Option<u64>,
    #[serde(default)]
    pub catchpoint_acquired_blocks: Option<u64>,
}

impl NodeStatus {
    #[must_use]
    pub fn time_since_last_round(&self) -> Duration {
        Duration::from_nanos(self.time_since_last_round)
    }

    #[must_use]
    pub fn catchup_time(&self) -> Duration {
        Duration::from_nanos(self.catchup_time)
    }

    #[must_use]
    pub fn is_fast_catchup(&self) -> bool {
        self.catchpoint.as_deref().is_some_and(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuildVersion {
    #[serde(default)]
    pub major: u64,
    #[serde(default)]
    pub minor: u64,
    #[serde(default)]
    pub build_number: u64,
    #[serde(default)]
    pub commit_hash: String,
    #[serde(default)]
    pub channel: String,
}

/// Body of `/versions`.
#[derive(Debug, Clone, Deserialize)]
pub struct Version {
    pub build: BuildVersion,
    pub genesis_id: String,
    pub genesis_hash_b64: String,
}

/// What network the node follows and what software it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub node_version: String,
}

impl NetworkInfo {
    /// Convert a `/versions` response, checking the genesis hash length.
    ///
    /// # Errors
    /// Returns `ClientError::GenesisHash` if the hash does not decode to 32 bytes.
    pub fn from_version(version: &Version) -> Result<Self, ClientError> {
        let bytes = STANDARD
            .decode(version.genesis_hash_b64.as_bytes())
            .map_err(|_| ClientError::GenesisHash(0))?;
        let genesis_hash: [u8; 32] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| ClientError::GenesisHash(bytes.len()))?;

        let build = &version.build;
        Ok(Self {
            genesis_id: version.genesis_id.clone(),
            genesis_hash,
            node_version: format!(
                "{} {}.{}.{} ({})",
                build.channel, build.major, build.minor, build.build_number, build.commit_hash
            ),
        })
    }

    /// Network name derived from the genesis id, e.g. `testnet` for `testnet-v1.0`.
    #[must_use]
    pub fn network(&self) -> &str {
        self.genesis_id
            .split('-')
            .next()
            .unwrap_or(self.genesis_id.as_str())
    }

    #[must_use]
    pub fn genesis_hash_b64(&self) -> String {
        STANDARD.encode(self.genesis_hash)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct AssetHolding {
    pub asset_id: u64,
    pub amount: u64,
}

/// Subset of `/v2/accounts/{address}`.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountInformation {
    pub address: String,
    pub amount: u64,
    #[serde(default)]
    pub assets: Vec<AssetHolding>,
}

/// Asset id to amount, with algos (in microalgos) at id 0.
pub type Balances = BTreeMap<u64, u64>;

impl AccountInformation {
    #[must_use]
    pub fn balances(&self) -> Balances {
        let mut balances = Balances::new();
        balances.insert(0, self.amount);
        for holding in &self.assets {
            balances.insert(holding.asset_id, holding.amount);
        }
        balances
    }
}
