//!
//! State and simulation layer of the stock-tracking dashboard.
//!
//! This crate wires five building blocks together:
//! - `storage`: persistent key-value store (`auth_*` / `user_*` key
//!   families) with directory-backed and in-memory implementations.
//! - `accounts`: registration and login against stored credentials.
//! - `profile`: per-user subscription set, persisted on every change.
//! - `market`: the process-wide `MarketFeed` that owns the price
//!   table, walks it every tick on a clock thread, and broadcasts to
//!   identity-keyed listeners.
//! - `session`: per-login view state fed by one listener: latest
//!   prices plus a rolling 20-sample history per ticker.
//!
//! The app crate consumes this as: register/login via `accounts`, open
//! a [`Session`] with the loaded [`Profile`], then drain the session's
//! update channel and render.
#![warn(missing_docs)]
pub mod accounts;
pub mod market;
pub mod profile;
pub mod session;
pub mod storage;

pub use market::MarketFeed;
pub use profile::Profile;
pub use session::Session;
pub use storage::{DirStore, KeyValueStore, MemoryStore};
