//! Price table, broadcast payload and history sample types, together
//! with the constants that govern the simulated price stream.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::tickers::Ticker;

/// Default interval between simulation ticks, in milliseconds.
pub const DEFAULT_TICK_MS: u64 = 2000;

/// Smallest tick interval the app accepts from the command line.
///
/// `--tick-ms` values below this are raised to the floor.
pub const MIN_TICK_MS: u64 = 100;

/// Lowest price the simulation will ever emit for any symbol.
///
/// Each tick clamps the walked price to this floor, so a long run of
/// negative deltas can never push a symbol to zero or below.
pub const PRICE_FLOOR: f64 = 10.0;

/// Largest per-tick price movement, in absolute currency units.
///
/// Each tick adds a delta sampled uniformly from
/// `[-MAX_TICK_DELTA, +MAX_TICK_DELTA)` to the current price.
pub const MAX_TICK_DELTA: f64 = 2.5;

/// Number of history samples retained per ticker.
///
/// The per-ticker buffer is a sliding window: once full, appending a
/// new sample drops the oldest one.
pub const HISTORY_CAPACITY: usize = 20;

/// Current price of every symbol in the universe, keyed by ticker.
///
/// A `BTreeMap` keeps iteration order stable so broadcasts and renders
/// always walk the symbols the same way.
pub type PriceTable = BTreeMap<Ticker, f64>;

/// One broadcast from the market feed: a timestamp and the full table.
#[derive(Debug, Clone)]
pub struct PriceUpdate {
    /// Moment the table was produced.
    pub at: DateTime<Utc>,
    /// The complete price table as of `at`.
    pub prices: PriceTable,
}

impl PriceUpdate {
    /// Wrap a price table with the current wall-clock timestamp.
    pub fn now(prices: PriceTable) -> Self {
        PriceUpdate {
            at: Utc::now(),
            prices,
        }
    }
}

/// One retained observation in a ticker's history buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct HistorySample {
    /// Local time of day the sample was taken, formatted `HH:MM:SS`.
    pub time: String,
    /// Price observed at that time.
    pub price: f64,
}
