//! Text commands typed at the dashboard prompt.
//!
//! Each input line is split on whitespace and the first token selects the
//! command. Verbs and ticker symbols are both case-insensitive, so
//! `SUBSCRIBE tsla` and `subscribe TSLA` mean the same thing.
use broker_common::{BrokerError, Result, Ticker};

/// A single parsed line of user input.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    /// Create a new account from an email and password.
    Register {
        /// Email address as typed. Normalized during registration.
        email: String,
        /// Password as typed.
        password: String,
    },
    /// Log into an existing account.
    Login {
        /// Email address as typed.
        email: String,
        /// Password as typed.
        password: String,
    },
    /// End the current session.
    Logout,
    /// Start tracking a ticker.
    Subscribe(Ticker),
    /// Stop tracking a ticker.
    Unsubscribe(Ticker),
    /// Expand the chart for one subscribed ticker.
    View(Ticker),
    /// Collapse the expanded chart back to the card overview.
    ViewOff,
    /// Redraw the current screen.
    Dashboard,
    /// Print the command reference.
    Help,
    /// Exit the program.
    Quit,
}

/// Parses one input line. Blank lines yield `Ok(None)`.
pub fn parse(line: &str) -> Result<Option<ReplCommand>> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some(verb) = tokens.first() else {
        return Ok(None);
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "register" => {
            let (email, password) = credential_args(&tokens, "register")?;
            ReplCommand::Register { email, password }
        }
        "login" => {
            let (email, password) = credential_args(&tokens, "login")?;
            ReplCommand::Login { email, password }
        }
        "logout" => ReplCommand::Logout,
        "subscribe" | "sub" => ReplCommand::Subscribe(ticker_arg(&tokens, "subscribe")?),
        "unsubscribe" | "unsub" => ReplCommand::Unsubscribe(ticker_arg(&tokens, "unsubscribe")?),
        "view" => match tokens.get(1) {
            Some(arg) if arg.eq_ignore_ascii_case("off") => ReplCommand::ViewOff,
            _ => ReplCommand::View(ticker_arg(&tokens, "view")?),
        },
        "dashboard" | "dash" => ReplCommand::Dashboard,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => {
            return Err(BrokerError::Command(format!(
                "'{other}'. Type 'help' for the command list."
            )));
        }
    };
    Ok(Some(command))
}

/// Extracts `<email> <password>` for `register` and `login`.
///
/// The arity is strict. A password containing spaces would otherwise be
/// silently truncated at the first space.
fn credential_args(tokens: &[&str], verb: &str) -> Result<(String, String)> {
    match tokens {
        [_, email, password] => Ok((String::from(*email), String::from(*password))),
        _ => Err(BrokerError::Command(format!(
            "{verb} needs exactly two arguments: {verb} <email> <password>"
        ))),
    }
}

/// Extracts the ticker argument for `subscribe`, `unsubscribe` and `view`.
///
/// A missing symbol after `subscribe` keeps the dashboard form's own
/// wording; the other verbs name themselves.
fn ticker_arg(tokens: &[&str], verb: &str) -> Result<Ticker> {
    let Some(symbol) = tokens.get(1) else {
        if verb == "subscribe" {
            return Err(BrokerError::TickerMissing);
        }
        return Err(BrokerError::Command(format!(
            "{verb} needs a ticker symbol: {verb} <ticker>"
        )));
    };
    symbol
        .parse::<Ticker>()
        .map_err(|_| BrokerError::UnknownTicker(String::from(*symbol)))
}
