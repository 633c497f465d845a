//! Match-3 resolution engine (workspace facade crate).
//!
//! Exposes `match3::{core, adapter, types}` while the implementation lives in
//! dedicated crates under `crates/`.

pub use match3_adapter as adapter;
pub use match3_core as core;
pub use match3_types as types;
