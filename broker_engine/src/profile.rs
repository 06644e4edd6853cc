//! Per-user subscription profile, persisted under `user_<email>`.
//!
//! The subscription list is an ordered, duplicate-free subset of the
//! ticker universe. Every successful mutation writes the whole profile
//! back to the store, so the persisted set always equals the in-memory
//! set; if the write fails, the in-memory change is rolled back before
//! the error is returned.

use serde::{Deserialize, Serialize};

use broker_common::{BrokerError, Result, Ticker};

use crate::storage::{profile_key, KeyValueStore};

/// A user's stored profile: identity plus watched tickers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Normalized email this profile belongs to.
    pub email: String,
    /// Watched tickers in subscription order.
    pub subscriptions: Vec<Ticker>,
}

impl Profile {
    /// Empty profile for a user with no stored record yet.
    pub fn fresh(email: &str) -> Self {
        Profile {
            email: email.to_string(),
            subscriptions: Vec::new(),
        }
    }

    /// Read the stored profile for `email`, if one exists.
    ///
    /// `Ok(None)` means no record; an error means the record exists but
    /// could not be read or parsed.
    pub fn load(store: &impl KeyValueStore, email: &str) -> Result<Option<Profile>> {
        match store.get(&profile_key(email))? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Read the stored profile for `email`, or a fresh one if absent.
    ///
    /// A corrupt record still surfaces as an error so the caller can
    /// log it and decide to start fresh.
    pub fn load_or_default(store: &impl KeyValueStore, email: &str) -> Result<Profile> {
        Ok(Self::load(store, email)?.unwrap_or_else(|| Profile::fresh(email)))
    }

    /// Persist the profile under its `user_<email>` key.
    pub fn save(&self, store: &impl KeyValueStore) -> Result<()> {
        store.put(&profile_key(&self.email), &serde_json::to_string(self)?)
    }

    /// Whether the user currently watches `ticker`.
    pub fn is_subscribed(&self, ticker: Ticker) -> bool {
        self.subscriptions.contains(&ticker)
    }

    /// Add `ticker` to the watched set and persist.
    ///
    /// Fails with [`BrokerError::AlreadySubscribed`] if the ticker is
    /// already watched; the stored set never gains a duplicate.
    pub fn subscribe(&mut self, store: &impl KeyValueStore, ticker: Ticker) -> Result<()> {
        if self.is_subscribed(ticker) {
            return Err(BrokerError::AlreadySubscribed(ticker));
        }
        self.subscriptions.push(ticker);
        if let Err(e) = self.save(store) {
            self.subscriptions.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Remove `ticker` from the watched set and persist.
    ///
    /// Removing a ticker that is not watched is not an error; the
    /// profile is still written back.
    pub fn unsubscribe(&mut self, store: &impl KeyValueStore, ticker: Ticker) -> Result<()> {
        match self.subscriptions.iter().position(|t| *t == ticker) {
            Some(idx) => {
                self.subscriptions.remove(idx);
                if let Err(e) = self.save(store) {
                    self.subscriptions.insert(idx, ticker);
                    return Err(e);
                }
                Ok(())
            }
            None => self.save(store),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn stored(store: &MemoryStore, email: &str) -> Profile {
        let raw = store.get(&profile_key(email)).unwrap().expect("profile saved");
        serde_json::from_str(&raw).unwrap()
    }

    #[test]
    fn load_is_none_for_unknown_user() {
        let store = MemoryStore::default();
        assert_eq!(Profile::load(&store, "a@b.com").unwrap(), None);
        let fresh = Profile::load_or_default(&store, "a@b.com").unwrap();
        assert!(fresh.subscriptions.is_empty());
    }

    #[test]
    fn load_or_default_surfaces_corrupt_records() {
        let store = MemoryStore::default();
        store.put(&profile_key("a@b.com"), "not json at all").unwrap();
        assert!(Profile::load_or_default(&store, "a@b.com").is_err());
    }

    #[test]
    fn subscribe_rejects_duplicates_and_never_stores_them() {
        let store = MemoryStore::default();
        let mut profile = Profile::fresh("a@b.com");

        profile.subscribe(&store, Ticker::TSLA).unwrap();
        assert!(matches!(
            profile.subscribe(&store, Ticker::TSLA),
            Err(BrokerError::AlreadySubscribed(Ticker::TSLA))
        ));

        assert_eq!(profile.subscriptions, vec![Ticker::TSLA]);
        assert_eq!(stored(&store, "a@b.com").subscriptions, vec![Ticker::TSLA]);
    }

    #[test]
    fn persisted_set_tracks_in_memory_set() {
        let store = MemoryStore::default();
        let mut profile = Profile::fresh("a@b.com");

        profile.subscribe(&store, Ticker::GOOG).unwrap();
        profile.subscribe(&store, Ticker::NVDA).unwrap();
        assert_eq!(stored(&store, "a@b.com").subscriptions, profile.subscriptions);

        profile.unsubscribe(&store, Ticker::GOOG).unwrap();
        assert_eq!(profile.subscriptions, vec![Ticker::NVDA]);
        assert_eq!(stored(&store, "a@b.com").subscriptions, profile.subscriptions);
    }

    #[test]
    fn unsubscribe_missing_ticker_is_a_no_op_write() {
        let store = MemoryStore::default();
        let mut profile = Profile::fresh("a@b.com");
        profile.unsubscribe(&store, Ticker::AMZN).unwrap();
        assert!(profile.subscriptions.is_empty());
        assert!(stored(&store, "a@b.com").subscriptions.is_empty());
    }

    #[test]
    fn profile_round_trips_through_the_store() {
        let store = MemoryStore::default();
        let mut profile = Profile::fresh("a@b.com");
        profile.subscribe(&store, Ticker::META).unwrap();

        let reloaded = Profile::load(&store, "a@b.com").unwrap().unwrap();
        assert_eq!(reloaded, profile);
    }
}
