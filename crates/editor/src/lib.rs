mod projection;
mod session;
mod toolbar;

pub use crate::projection::*;
pub use crate::session::*;
pub use crate::toolbar::*;
