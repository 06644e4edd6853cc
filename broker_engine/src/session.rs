//! Per-login session state: listener registration, local price copy,
//! and rolling per-ticker history.
//!
//! A session is created after a successful login and torn down on
//! logout: dropping it detaches its listener, and the local price
//! table, the history buffers and the in-memory profile go with it.
//! On creation the session seeds itself from a feed snapshot so the
//! dashboard has data before the first tick arrives.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::Local;
use crossbeam_channel::Receiver;
use log::warn;

use broker_common::prices::{HistorySample, HISTORY_CAPACITY};
use broker_common::{PriceTable, PriceUpdate, Result, Ticker};

use crate::market::{ListenerId, MarketFeed};
use crate::profile::Profile;
use crate::storage::KeyValueStore;

/// In-memory state of one logged-in user.
#[derive(Debug)]
pub struct Session {
    profile: Profile,
    feed: Arc<MarketFeed>,
    listener_id: ListenerId,
    updates: Receiver<PriceUpdate>,
    prices: PriceTable,
    history: HashMap<Ticker, VecDeque<HistorySample>>,
}

impl Session {
    /// Attach to the feed and seed local state from the attach-time
    /// snapshot. The first update on the channel is the tick after the
    /// seed, so no sample is ever recorded twice.
    pub fn open(feed: Arc<MarketFeed>, profile: Profile) -> Result<Session> {
        let (listener_id, updates, seed) = feed.attach()?;
        let mut session = Session {
            profile,
            feed,
            listener_id,
            updates,
            prices: PriceTable::new(),
            history: HashMap::new(),
        };
        session.apply_update(seed);
        Ok(session)
    }

    /// Normalized email of the logged-in user.
    pub fn email(&self) -> &str {
        &self.profile.email
    }

    /// The user's profile, including the ordered subscription list.
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Channel on which the feed pushes price updates for this session.
    pub fn updates(&self) -> &Receiver<PriceUpdate> {
        &self.updates
    }

    /// Latest local copy of the price table.
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Fold one broadcast into local state.
    ///
    /// Copies the table and appends a history sample for every symbol
    /// in it, trimming each buffer to the newest
    /// [`HISTORY_CAPACITY`] samples (oldest out first). History is
    /// kept for the whole universe, not just current subscriptions, so
    /// a chart is already populated when a ticker is subscribed later.
    pub fn apply_update(&mut self, update: PriceUpdate) {
        let stamp = update.at.with_timezone(&Local).format("%H:%M:%S").to_string();
        for (ticker, price) in &update.prices {
            let buffer = self.history.entry(*ticker).or_default();
            if buffer.len() >= HISTORY_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(HistorySample {
                time: stamp.clone(),
                price: *price,
            });
        }
        self.prices = update.prices;
    }

    /// Retained history for `ticker`, oldest first.
    pub fn history(&self, ticker: Ticker) -> Option<&VecDeque<HistorySample>> {
        self.history.get(&ticker)
    }

    /// Current price of `ticker`, if an update has been seen.
    pub fn price_of(&self, ticker: Ticker) -> Option<f64> {
        self.prices.get(&ticker).copied()
    }

    /// Absolute change of the current price against the oldest retained
    /// sample. Zero until at least two samples exist.
    pub fn price_change(&self, ticker: Ticker) -> f64 {
        let Some(current) = self.price_of(ticker) else {
            return 0.0;
        };
        match self.history.get(&ticker) {
            Some(buffer) if buffer.len() >= 2 => current - buffer[0].price,
            _ => 0.0,
        }
    }

    /// Percent change of the current price against the oldest retained
    /// sample. Zero until at least two samples exist.
    pub fn percent_change(&self, ticker: Ticker) -> f64 {
        let Some(current) = self.price_of(ticker) else {
            return 0.0;
        };
        match self.history.get(&ticker) {
            Some(buffer) if buffer.len() >= 2 => {
                (current - buffer[0].price) / buffer[0].price * 100.0
            }
            _ => 0.0,
        }
    }

    /// Subscribe the user to `ticker` and persist the profile.
    pub fn subscribe(&mut self, store: &impl KeyValueStore, ticker: Ticker) -> Result<()> {
        self.profile.subscribe(store, ticker)
    }

    /// Unsubscribe the user from `ticker` and persist the profile.
    pub fn unsubscribe(&mut self, store: &impl KeyValueStore, ticker: Ticker) -> Result<()> {
        self.profile.unsubscribe(store, ticker)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.feed.detach(self.listener_id) {
            warn!("Failed to detach listener {}: {}", self.listener_id, e);
        }
    }
}
