mod dirs;
mod error;
mod network;
mod provision;

pub use dirs::*;
pub use error::*;
pub use network::*;
pub use provision::*;
