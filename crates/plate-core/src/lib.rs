mod commands;
mod core;
mod editor;
mod error;
mod ops;
mod query;
mod schema;
mod serde_value;
mod storage;
mod transforms;

pub use crate::commands::*;
pub use crate::core::*;
pub use crate::editor::*;
pub use crate::error::*;
pub use crate::ops::*;
pub use crate::query::{FindOptions, MatchMode, NodeEntry, QueryResult, find_nodes, nodes};
pub use crate::schema::*;
pub use crate::serde_value::*;
pub use crate::storage::*;
pub use crate::transforms::*;
