use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum UiError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Cannot reach node: {0}")]
    Connect(#[from] nodeui_client::ClientError),
}
