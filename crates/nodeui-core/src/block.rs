use crate::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A decoded block tagged with the round it was requested for.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub round: u64,
    pub payload: BlockPayload,
}

impl Block {
    #[must_use]
    pub fn payset(&self) -> &[SignedTxnInBlock] {
        &self.payload.payset
    }
}

/// Block header fields the dashboard shows. Anything else the node sends is
/// kept in `extra` so new wire fields never fail a decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockPayload {
    #[serde(rename = "rnd", default)]
    pub round: u64,
    #[serde(rename = "ts", default)]
    pub timestamp: i64,
    #[serde(rename = "gen", default)]
    pub genesis_id: String,
    #[serde(default)]
    pub proto: String,
    #[serde(rename = "tc", default)]
    pub txn_counter: u64,
    #[serde(rename = "txns", default)]
    pub payset: Vec<SignedTxnInBlock>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignedTxnInBlock {
    #[serde(default)]
    pub txn: Transaction,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SignedTxnInBlock {
    /// Full record as indented JSON, including fields the model does not name.
    #[must_use]
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unprintable: {e}>"))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(rename = "snd", default)]
    pub sender: String,
    #[serde(default)]
    pub fee: u64,
    #[serde(rename = "fv", default)]
    pub first_valid: u64,
    #[serde(rename = "lv", default)]
    pub last_valid: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Transaction {
    /// Payment amount in microalgos, or asset amount for asset transfers.
    #[must_use]
    pub fn amount(&self) -> Option<u64> {
        self.extra
            .get("amt")
            .or_else(|| self.extra.get("aamt"))
            .and_then(Value::as_u64)
    }

    #[must_use]
    pub fn receiver(&self) -> Option<&str> {
        self.extra
            .get("rcv")
            .or_else(|| self.extra.get("arcv"))
            .and_then(Value::as_str)
    }
}

#[derive(Deserialize)]
struct BlockResponse {
    block: BlockPayload,
}

/// Decode a `/v2/blocks/{round}?format=json` body, tolerating unknown fields.
///
/// # Errors
/// Returns `CoreError::BlockDecode` if the body is not a block document.
pub fn decode_block(round: u64, body: &[u8]) -> Result<Block, CoreError> {
    let response: BlockResponse =
        serde_json::from_slice(body).map_err(|source| CoreError::BlockDecode { round, source })?;

    Ok(Block {
        round,
        payload: response.block,
    })
}
