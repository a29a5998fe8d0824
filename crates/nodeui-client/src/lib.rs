mod api;
mod error;
mod models;
mod requestor;

pub use api::*;
pub use error::*;
pub use models::*;
pub use requestor::*;
