//! StockBroker Pro — a terminal dashboard for simulated stock prices. Users
//! register and log in with an email and password, subscribe to tickers from
//! a fixed five-symbol universe, and watch a random walk reprice them every
//! two seconds with a rolling price history chart.
//!
//! Usage example (CLI):
//! ```bash
//! broker_app --data-dir ./broker_data --tick-ms 2000
//! ```
//!
//! Commands are typed at the prompt; `help` prints the full list. Account
//! and subscription records are stored as JSON files under the data
//! directory.
#![warn(missing_docs)]
mod args;
mod command;
mod dashboard;

use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::Parser;
use crossbeam_channel::{select, unbounded, Receiver, RecvTimeoutError};
use log::{error, info, warn};

use broker_common::prices::{PriceUpdate, MIN_TICK_MS};
use broker_common::{BrokerError, Result, Ticker};
use broker_engine::{accounts, DirStore, MarketFeed, Profile, Session};

use crate::args::Args;
use crate::command::ReplCommand;

/// How long one event-loop pass waits before rechecking the shutdown flag.
const IDLE_WAIT: Duration = Duration::from_millis(250);

/// One iteration's worth of event-loop input.
enum LoopEvent {
    /// A line typed by the user.
    Input(String),
    /// A price tick from the market feed.
    Update(PriceUpdate),
    /// Stdin reached end of file.
    InputClosed,
    /// The feed channel disconnected while a session was open.
    FeedStalled,
    /// Nothing arrived within the wait window.
    Idle,
}

/// State the command handlers operate on.
struct App {
    store: DirStore,
    feed: Arc<MarketFeed>,
    session: Option<Session>,
    expanded: Option<Ticker>,
}

impl App {
    /// Handles one input line. Returns `false` when the user quits.
    fn handle_line(&mut self, line: &str) -> bool {
        let command = match command::parse(line) {
            Ok(Some(command)) => command,
            Ok(None) => return true,
            Err(error) => {
                println!("{error}");
                return true;
            }
        };
        match command {
            ReplCommand::Register { email, password } => self.handle_register(&email, &password),
            ReplCommand::Login { email, password } => self.handle_login(&email, &password),
            ReplCommand::Logout => self.handle_logout(),
            ReplCommand::Subscribe(ticker) => self.handle_subscribe(ticker),
            ReplCommand::Unsubscribe(ticker) => self.handle_unsubscribe(ticker),
            ReplCommand::View(ticker) => self.handle_view(ticker),
            ReplCommand::ViewOff => self.handle_view_off(),
            ReplCommand::Dashboard => self.print_screen(),
            ReplCommand::Help => print!("{}", dashboard::render_help()),
            ReplCommand::Quit => {
                println!("Goodbye.");
                return false;
            }
        }
        true
    }

    fn handle_register(&mut self, email: &str, password: &str) {
        if let Some(session) = &self.session {
            println!("Already logged in as {}. Use 'logout' first.", session.email());
            return;
        }
        match accounts::register(&self.store, email, password) {
            Ok(_) => println!("Account created successfully! Please login."),
            Err(error) if is_storage_error(&error) => {
                error!("Registration error: {error}");
                println!("Registration failed. Please try again.");
            }
            Err(error) => println!("{error}"),
        }
    }

    fn handle_login(&mut self, email: &str, password: &str) {
        if let Some(session) = &self.session {
            println!("Already logged in as {}. Use 'logout' first.", session.email());
            return;
        }
        let email = match accounts::login(&self.store, email, password) {
            Ok(email) => email,
            Err(error) if is_storage_error(&error) => {
                error!("Login error: {error}");
                println!("Login failed. Please try again.");
                return;
            }
            Err(error) => {
                println!("{error}");
                return;
            }
        };

        // A corrupt profile record is not a reason to refuse login.
        let profile = match Profile::load_or_default(&self.store, &email) {
            Ok(profile) => profile,
            Err(error) => {
                error!("Error loading user data: {error}");
                println!("Failed to load your saved data. Starting fresh.");
                Profile::fresh(&email)
            }
        };
        match Session::open(Arc::clone(&self.feed), profile) {
            Ok(session) => {
                self.session = Some(session);
                self.expanded = None;
                println!("Login successful!");
                self.print_screen();
            }
            Err(error) => {
                error!("Error opening session: {error}");
                println!("Login failed. Please try again.");
            }
        }
    }

    fn handle_logout(&mut self) {
        // Dropping the session detaches its feed listener.
        if self.session.take().is_some() {
            self.expanded = None;
            print!("{}", dashboard::render_auth_screen());
        } else {
            println!("Not logged in.");
        }
    }

    fn handle_subscribe(&mut self, ticker: Ticker) {
        let Some(session) = self.session.as_mut() else {
            println!("Please login first.");
            return;
        };
        match session.subscribe(&self.store, ticker) {
            Ok(()) => {
                println!("Successfully subscribed to {ticker}!");
                self.print_screen();
            }
            Err(error) if is_storage_error(&error) => {
                error!("Error subscribing: {error}");
                println!("Failed to subscribe. Please try again.");
            }
            Err(error) => println!("{error}"),
        }
    }

    fn handle_unsubscribe(&mut self, ticker: Ticker) {
        let Some(session) = self.session.as_mut() else {
            println!("Please login first.");
            return;
        };
        match session.unsubscribe(&self.store, ticker) {
            Ok(()) => {
                println!("Unsubscribed from {ticker}");
                if self.expanded == Some(ticker) {
                    self.expanded = None;
                }
                self.print_screen();
            }
            Err(error) if is_storage_error(&error) => {
                error!("Error unsubscribing: {error}");
                println!("Failed to unsubscribe. Please try again.");
            }
            Err(error) => println!("{error}"),
        }
    }

    fn handle_view(&mut self, ticker: Ticker) {
        let Some(session) = self.session.as_ref() else {
            println!("Please login first.");
            return;
        };
        if !session.profile().is_subscribed(ticker) {
            println!("You are not subscribed to {ticker}. Subscribe first with 'subscribe {ticker}'.");
            return;
        }
        self.expanded = Some(ticker);
        self.print_screen();
    }

    fn handle_view_off(&mut self) {
        if self.session.is_none() {
            println!("Please login first.");
            return;
        }
        self.expanded = None;
        self.print_screen();
    }

    /// Folds a price tick into the session and prints the update line.
    fn handle_update(&mut self, update: PriceUpdate) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.apply_update(update);
        if let Some(line) = dashboard::render_ticker_line(session, self.expanded) {
            println!("{line}");
        }
    }

    /// Redraws whichever screen matches the login state.
    fn print_screen(&self) {
        match &self.session {
            Some(session) => print!("{}", dashboard::render_dashboard(session, self.expanded)),
            None => print!("{}", dashboard::render_auth_screen()),
        }
    }
}

/// Storage and lock failures are logged and answered with a generic
/// retry message; validation failures are shown to the user verbatim.
fn is_storage_error(error: &BrokerError) -> bool {
    matches!(
        error,
        BrokerError::Io(_) | BrokerError::SerdeJson(_) | BrokerError::MutexLock(_)
    )
}

/// Waits for the next thing the event loop should react to.
///
/// While logged in this multiplexes stdin with the session's price
/// updates; logged out it only watches stdin. Both paths time out so
/// the caller can poll the Ctrl+C flag.
fn next_event(input: &Receiver<String>, session: Option<&Session>) -> LoopEvent {
    match session {
        Some(session) => select! {
            recv(input) -> line => match line {
                Ok(line) => LoopEvent::Input(line),
                Err(_) => LoopEvent::InputClosed,
            },
            recv(session.updates()) -> update => match update {
                Ok(update) => LoopEvent::Update(update),
                Err(_) => LoopEvent::FeedStalled,
            },
            default(IDLE_WAIT) => LoopEvent::Idle,
        },
        None => match input.recv_timeout(IDLE_WAIT) {
            Ok(line) => LoopEvent::Input(line),
            Err(RecvTimeoutError::Timeout) => LoopEvent::Idle,
            Err(RecvTimeoutError::Disconnected) => LoopEvent::InputClosed,
        },
    }
}

/// Forwards stdin lines to a channel so the event loop can multiplex
/// them with price updates.
fn spawn_input_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    error!("Failed to read input: {error}");
                    break;
                }
            }
        }
    });
    rx
}

fn main() -> Result<()> {
    init_logger();
    let args = Args::parse();

    let tick_ms = args.tick_ms.max(MIN_TICK_MS);
    if tick_ms != args.tick_ms {
        warn!(
            "--tick-ms={} is below the {} ms floor. Using {} ms.",
            args.tick_ms, MIN_TICK_MS, tick_ms
        );
    }

    let store = DirStore::open(&args.data_dir)?;
    info!("Storing account data under: {}", store.root().display());

    let feed = Arc::new(MarketFeed::new(Duration::from_millis(tick_ms)));
    feed.start()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || {
            info!("Ctrl+C received. Shutting down dashboard...");
            shutdown.store(true, Ordering::SeqCst);
        })
        .expect("Error setting Ctrl+C handler");
    }

    let input = spawn_input_reader();
    print!("{}", dashboard::render_auth_screen());
    info!("Dashboard is running. Press Ctrl+C or type 'quit' to exit.");

    let mut app = App {
        store,
        feed: Arc::clone(&feed),
        session: None,
        expanded: None,
    };
    while !shutdown.load(Ordering::Relaxed) {
        match next_event(&input, app.session.as_ref()) {
            LoopEvent::Input(line) => {
                if !app.handle_line(&line) {
                    break;
                }
            }
            LoopEvent::Update(update) => app.handle_update(update),
            LoopEvent::InputClosed => {
                info!("Input closed. Shutting down...");
                break;
            }
            LoopEvent::FeedStalled => {
                warn!("Price feed stopped while a session was open.");
                println!("Price updates stopped. You have been logged out.");
                app.session = None;
                app.expanded = None;
            }
            LoopEvent::Idle => {}
        }
    }

    // Detach the session listener before stopping the clock.
    app.session = None;
    feed.shutdown();
    info!("Dashboard closed.");
    Ok(())
}

fn init_logger() {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
}
