use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Unable to read {what} from file ({}): {source}", path.display())]
    CredentialFile {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file is empty: {}", .0.display())]
    EmptyCredential(PathBuf),

    #[error("Failed to decode address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("{} watch-list address(es) failed to decode", .0.len())]
    InvalidWatchList(Vec<CoreError>),

    #[error("Failed to decode block {round}: {source}")]
    BlockDecode {
        round: u64,
        #[source]
        source: serde_json::Error,
    },
}
