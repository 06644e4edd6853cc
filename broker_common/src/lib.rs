//!
//! Common types shared by the broker engine and the dashboard app.
//!
//! This crate aggregates:
//! - `error`: unified error type `BrokerError` used across the workspace.
//! - `result`: handy `Result<T, BrokerError>` alias.
//! - `tickers`: the fixed ticker universe and its opening prices.
//! - `prices`: price table, broadcast payload, history samples and the
//!   simulation constants that govern them.
#![warn(missing_docs)]
pub mod error;
pub mod result;
pub mod tickers;
pub mod prices;

pub use error::BrokerError;
pub use result::Result;
pub use tickers::Ticker;
pub use prices::{PriceTable, PriceUpdate};
