//! Error types shared between the engine and the app.
//!
//! The `BrokerError` enum unifies the failure cases of the whole
//! workspace: I/O and serialization problems from the key-value store,
//! lock poisoning, and the user-input validation failures whose
//! `#[error]` strings double as the messages shown on the dashboard.
use std::io;
use std::sync::PoisonError;

use thiserror::Error;

use crate::tickers::Ticker;

/// Unified error type shared by the engine and the app.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// I/O error originating from the standard library or the data directory.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure while encoding/decoding a stored JSON record via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// Error indicating a poisoned mutex/lock was encountered.
    #[error("Mutex Lock Poisoned: {0}")]
    MutexLock(String),

    /// Registration/login attempted with a blank email field.
    #[error("Please enter your email address")]
    EmailMissing,

    /// Email is missing the `@` or `.` the validator insists on.
    #[error("Please enter a valid email address")]
    EmailInvalid,

    /// Registration attempted with a blank password field.
    #[error("Please enter a password")]
    PasswordMissing,

    /// Login attempted with a blank password field.
    #[error("Please enter your password")]
    LoginPasswordMissing,

    /// Registration rejected because the password is shorter than the minimum.
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    /// Registration rejected because the email already has a credential record.
    #[error("An account with this email already exists. Please login.")]
    AccountExists,

    /// Login rejected because no credential record exists for the email.
    #[error("No account found with this email. Please register first.")]
    AccountNotFound,

    /// Login rejected because the stored password does not match.
    #[error("Incorrect password. Please try again.")]
    PasswordMismatch,

    /// Subscribe rejected because the ticker is already in the user's set.
    #[error("You are already subscribed to {0}")]
    AlreadySubscribed(Ticker),

    /// A command that needs a ticker argument was given none.
    #[error("Please select a stock to subscribe")]
    TickerMissing,

    /// A ticker argument did not parse as one of the supported symbols.
    #[error("Unknown ticker symbol: {0}")]
    UnknownTicker(String),

    /// A line of input did not parse as a dashboard command.
    #[error("Invalid command: {0}")]
    Command(String),
}

impl<T> From<PoisonError<T>> for BrokerError {
    fn from(err: PoisonError<T>) -> Self {
        BrokerError::MutexLock(err.to_string())
    }
}
