mod commands;
mod document;
mod engine;
mod marks;
mod ops;
mod schema;
mod selection;
mod value;

pub use crate::commands::*;
pub use crate::document::*;
pub use crate::engine::*;
pub use crate::marks::*;
pub use crate::ops::*;
pub use crate::schema::*;
pub use crate::selection::*;
pub use crate::value::*;
