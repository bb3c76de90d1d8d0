//! # herald-entity
//!
//! Domain entity models for Herald. Every struct in this crate represents a
//! stored record, a value object returned by a collaborator lookup, or a
//! frame of the live wire protocol. All entities derive `Debug`, `Clone`,
//! `Serialize`, and `Deserialize`.

pub mod content;
pub mod notification;
pub mod preference;
pub mod protocol;
