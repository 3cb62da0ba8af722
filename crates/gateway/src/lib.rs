mod client;
mod error;
mod types;

pub use crate::client::*;
pub use crate::error::*;
pub use crate::types::*;
