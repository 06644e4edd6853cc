//! The fixed ticker universe tracked by the dashboard.
//!
//! The set is closed: these five symbols are the only ones the market
//! feed simulates and the only ones a user can subscribe to. Each
//! symbol carries a documented opening price used to seed the price
//! table at startup.

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::prices::PriceTable;

/// Set of supported ticker symbols.
#[allow(missing_docs)]
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
)]
#[strum(ascii_case_insensitive)]
pub enum Ticker {
    GOOG,
    TSLA,
    AMZN,
    META,
    NVDA,
}

impl Ticker {
    /// Every supported symbol, in presentation order.
    pub const ALL: [Ticker; 5] = [
        Ticker::GOOG,
        Ticker::TSLA,
        Ticker::AMZN,
        Ticker::META,
        Ticker::NVDA,
    ];

    /// Opening price for the symbol, used to seed the simulation.
    pub fn initial_price(self) -> f64 {
        match self {
            Ticker::GOOG => 140.50,
            Ticker::TSLA => 242.80,
            Ticker::AMZN => 178.30,
            Ticker::META => 485.20,
            Ticker::NVDA => 495.60,
        }
    }

    /// Build the full opening price table for the universe.
    pub fn opening_prices() -> PriceTable {
        Self::ALL.iter().map(|t| (*t, t.initial_price())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("tsla".parse::<Ticker>().unwrap(), Ticker::TSLA);
        assert_eq!("Goog".parse::<Ticker>().unwrap(), Ticker::GOOG);
        assert_eq!("NVDA".parse::<Ticker>().unwrap(), Ticker::NVDA);
        assert!("AAPL".parse::<Ticker>().is_err());
    }

    #[test]
    fn displays_as_symbol() {
        assert_eq!(Ticker::META.to_string(), "META");
    }

    #[test]
    fn opening_prices_cover_the_whole_universe() {
        let table = Ticker::opening_prices();
        assert_eq!(table.len(), Ticker::ALL.len());
        assert_eq!(table[&Ticker::GOOG], 140.50);
        assert_eq!(table[&Ticker::TSLA], 242.80);
        assert_eq!(table[&Ticker::AMZN], 178.30);
        assert_eq!(table[&Ticker::META], 485.20);
        assert_eq!(table[&Ticker::NVDA], 495.60);
    }
}
