use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Node returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Decode(#[from] nodeui_core::CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Admin token required for {0}")]
    AdminTokenRequired(&'static str),

    #[error("Unexpected genesis hash, wrong number of bytes ({0})")]
    GenesisHash(usize),

    #[error("Data directory not set")]
    NoDataDir,
}
