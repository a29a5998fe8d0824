mod address;
mod block;
mod config;
mod error;

pub use address::*;
pub use block::*;
pub use config::*;
pub use error::*;
