//! Process-wide market feed: owned price table, clock thread, and
//! listener broadcasting.
//!
//! The feed is the single driver of the simulation. It owns the price
//! table, advances it on a fixed interval from one background clock
//! thread, and pushes every new table to all registered listeners via
//! `crossbeam_channel` senders. Listeners are identity-keyed so they
//! can be detached by id; senders whose receiver has gone away are
//! pruned during broadcast.
//!
//! Lifecycle: `start` spawns the clock, `shutdown` stops and joins it
//! (and also runs on drop). The feed runs for the life of the process,
//! independent of any logged-in session.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{select, tick, unbounded, Receiver, Sender};
use log::{debug, error, info, warn};
use rand::Rng;

use broker_common::prices::{MAX_TICK_DELTA, PRICE_FLOOR};
use broker_common::{PriceTable, PriceUpdate, Result, Ticker};

/// Identity of one attached listener, unique for the feed's lifetime.
pub type ListenerId = u64;

/// Calculate the next price for a symbol using a bounded random walk.
///
/// The change is sampled uniformly from
/// `[-MAX_TICK_DELTA, +MAX_TICK_DELTA)` and the result is clamped to
/// [`PRICE_FLOOR`] so prices never collapse to zero or go negative.
pub fn next_price(current: f64, rng: &mut impl Rng) -> f64 {
    let change: f64 = rng.random_range(-MAX_TICK_DELTA..MAX_TICK_DELTA);
    (current + change).max(PRICE_FLOOR)
}

/// Advance every symbol in the table by one tick of the random walk.
fn advance_table(prices: &mut PriceTable, rng: &mut impl Rng) {
    for price in prices.values_mut() {
        *price = next_price(*price, rng);
    }
}

/// Simulated exchange feed that broadcasts price updates to listeners.
#[derive(Debug)]
pub struct MarketFeed {
    prices: Arc<Mutex<PriceTable>>,
    listeners: Arc<Mutex<HashMap<ListenerId, Sender<PriceUpdate>>>>,
    next_listener: AtomicU64,
    tick_interval: Duration,

    /// Background clock thread, present while running.
    clock: Mutex<Option<JoinHandle<()>>>,
    /// Sender used to stop the clock thread.
    stop_tx: Mutex<Option<Sender<()>>>,
}

impl MarketFeed {
    /// Create a feed seeded with the universe's opening prices.
    ///
    /// The clock does not run until [`MarketFeed::start`] is called.
    pub fn new(tick_interval: Duration) -> Self {
        MarketFeed {
            prices: Arc::new(Mutex::new(Ticker::opening_prices())),
            listeners: Arc::new(Mutex::new(HashMap::new())),
            next_listener: AtomicU64::new(0),
            tick_interval,
            clock: Mutex::new(None),
            stop_tx: Mutex::new(None),
        }
    }

    /// Start the clock thread. Calling `start` on a running feed is a no-op.
    pub fn start(&self) -> Result<()> {
        let mut clock = self.clock.lock()?;
        if clock.is_some() {
            warn!("Market feed clock already running");
            return Ok(());
        }

        let (stop_tx, stop_rx) = unbounded::<()>();
        let prices = Arc::clone(&self.prices);
        let listeners = Arc::clone(&self.listeners);
        let interval = self.tick_interval;

        let handle = thread::spawn(move || {
            info!("Market feed clock started, tick every {:?}", interval);
            let mut rng = rand::rng();
            let ticks = tick(interval);

            loop {
                select! {
                    recv(stop_rx) -> _ => break,
                    recv(ticks) -> _ => {
                        // Registry lock before price lock, same order as
                        // `attach`. Holding it across advance and send keeps
                        // a listener's seed and its queue from overlapping.
                        let mut subscribers = match listeners.lock() {
                            Ok(subscribers) => subscribers,
                            Err(e) => {
                                error!("Listener registry lock poisoned: {}", e);
                                break;
                            }
                        };
                        let update = match prices.lock() {
                            Ok(mut table) => {
                                advance_table(&mut table, &mut rng);
                                PriceUpdate::now(table.clone())
                            }
                            Err(e) => {
                                error!("Price table lock poisoned: {}", e);
                                break;
                            }
                        };
                        let before = subscribers.len();
                        subscribers.retain(|_, tx| tx.send(update.clone()).is_ok());
                        let dropped = before - subscribers.len();
                        if dropped > 0 {
                            debug!("Pruned {} disconnected listener(s)", dropped);
                        }
                    }
                }
            }
            info!("Market feed clock stopped");
        });

        *clock = Some(handle);
        *self.stop_tx.lock()? = Some(stop_tx);
        Ok(())
    }

    /// Stop the clock thread and wait for it to finish.
    ///
    /// Safe to call more than once; later calls are no-ops.
    pub fn shutdown(&self) {
        if let Ok(mut stop) = self.stop_tx.lock() {
            if let Some(tx) = stop.take() {
                let _ = tx.send(());
            }
        }
        if let Ok(mut clock) = self.clock.lock() {
            if let Some(handle) = clock.take() {
                if handle.join().is_err() {
                    warn!("Market feed clock thread panicked");
                }
            }
        }
    }

    /// Register a listener and return its id, the update channel, and a
    /// seed snapshot of the price table.
    ///
    /// The listener receives one [`PriceUpdate`] per tick until it is
    /// detached or drops its receiver. Snapshot and registration share
    /// the registry lock with the broadcast path, so the first update
    /// on the channel is always the tick after the seed, never the
    /// seed again and never a later one.
    pub fn attach(&self) -> Result<(ListenerId, Receiver<PriceUpdate>, PriceUpdate)> {
        let id = self.next_listener.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = unbounded();
        let mut listeners = self.listeners.lock()?;
        let seed = PriceUpdate::now(self.prices.lock()?.clone());
        listeners.insert(id, tx);
        info!("Listener {} attached. Total listeners: {}", id, listeners.len());
        Ok((id, rx, seed))
    }

    /// Remove a listener from the registry by id.
    pub fn detach(&self, id: ListenerId) -> Result<()> {
        let mut listeners = self.listeners.lock()?;
        if listeners.remove(&id).is_none() {
            warn!("Attempted to detach unknown listener {}", id);
        } else {
            info!("Listener {} detached. Total listeners: {}", id, listeners.len());
        }
        Ok(())
    }

    /// Number of listeners currently registered.
    pub fn listener_count(&self) -> Result<usize> {
        Ok(self.listeners.lock()?.len())
    }
}

impl Drop for MarketFeed {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Instant;

    #[test]
    fn next_price_never_breaks_the_floor() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut price = PRICE_FLOOR;
        for _ in 0..1000 {
            price = next_price(price, &mut rng);
            assert!(price >= PRICE_FLOOR, "price fell to {}", price);
        }
    }

    #[test]
    fn next_price_moves_at_most_the_tick_delta() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut price = 100.0;
        for _ in 0..1000 {
            let next = next_price(price, &mut rng);
            assert!((next - price).abs() <= MAX_TICK_DELTA);
            price = next;
        }
    }

    #[test]
    fn advance_table_touches_every_symbol() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut table = Ticker::opening_prices();
        advance_table(&mut table, &mut rng);
        assert_eq!(table.len(), Ticker::ALL.len());
        for ticker in Ticker::ALL {
            assert!(table[&ticker] >= PRICE_FLOOR);
        }
    }

    #[test]
    fn attach_returns_a_seed_with_an_empty_queue() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        let (_id, rx, seed) = feed.attach().unwrap();
        assert_eq!(seed.prices, Ticker::opening_prices());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn listeners_receive_ticks_while_running() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();
        let (_id, rx, _seed) = feed.attach().unwrap();

        let update = rx.recv_timeout(Duration::from_secs(2)).expect("tick arrives");
        assert_eq!(update.prices.len(), Ticker::ALL.len());
        for (_, price) in &update.prices {
            assert!(*price >= PRICE_FLOOR);
        }
        feed.shutdown();
    }

    #[test]
    fn first_update_is_the_tick_after_the_seed() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();

        // Attach repeatedly while the clock runs; the seed table must
        // never come back as the first queued update.
        for _ in 0..10 {
            let (id, rx, seed) = feed.attach().unwrap();
            let update = rx.recv_timeout(Duration::from_secs(2)).expect("tick arrives");
            assert_ne!(update.prices, seed.prices);
            feed.detach(id).unwrap();
        }
        feed.shutdown();
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();
        feed.start().unwrap();
        feed.shutdown();
    }

    #[test]
    fn detach_removes_the_listener() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        let (id, _rx, _seed) = feed.attach().unwrap();
        assert_eq!(feed.listener_count().unwrap(), 1);
        feed.detach(id).unwrap();
        assert_eq!(feed.listener_count().unwrap(), 0);
        // Detaching again only logs.
        feed.detach(id).unwrap();
    }

    #[test]
    fn detached_listeners_stop_receiving_ticks() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();
        let (id, rx, _seed) = feed.attach().unwrap();
        rx.recv_timeout(Duration::from_secs(2)).expect("feed is ticking");

        // Detach drops the registry's sender, closing the channel.
        feed.detach(id).unwrap();
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
        feed.shutdown();
    }

    #[test]
    fn dropped_receivers_are_pruned_on_broadcast() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();
        let (_id, rx, _seed) = feed.attach().unwrap();
        drop(rx);

        let deadline = Instant::now() + Duration::from_secs(2);
        while feed.listener_count().unwrap() > 0 {
            assert!(Instant::now() < deadline, "listener was never pruned");
            thread::sleep(Duration::from_millis(5));
        }
        feed.shutdown();
    }

    #[test]
    fn no_ticks_arrive_after_shutdown() {
        let feed = MarketFeed::new(Duration::from_millis(10));
        feed.start().unwrap();
        let (_id, rx, _seed) = feed.attach().unwrap();
        rx.recv_timeout(Duration::from_secs(2)).expect("feed is ticking");

        feed.shutdown();
        // Drain whatever was in flight, then expect silence.
        while rx.try_recv().is_ok() {}
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }
}
