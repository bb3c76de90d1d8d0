//! # herald-database
//!
//! Durable-store access for Herald: the store traits the real-time engine
//! depends on, their PostgreSQL implementations, and an in-memory
//! implementation for single-node development and tests.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::connect_pool;
pub use memory::MemoryStore;
pub use store::{ContentLookup, NotificationStore, PreferenceStore, Stores};
