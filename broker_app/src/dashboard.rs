//! Terminal rendering for the auth screen and the dashboard.
//!
//! Every function here is a pure function from session state to a
//! `String`; nothing in this module mutates the session. The dashboard
//! has two shapes: the card overview for all subscribed tickers, and an
//! expanded single-ticker view with a price history chart.
use broker_common::prices::HistorySample;
use broker_common::Ticker;
use broker_engine::Session;

/// Application name shown in every header.
pub const PRODUCT_NAME: &str = "StockBroker Pro";

/// Width of the framed panels, in characters.
const PANEL_WIDTH: usize = 56;

/// Rows in the expanded price history chart.
const CHART_HEIGHT: usize = 8;

/// Sparkline glyphs from lowest to highest price level.
const SPARK_GLYPHS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Screen shown while nobody is logged in.
pub fn render_auth_screen() -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(PANEL_WIDTH));
    lines.push(format!("  {PRODUCT_NAME}"));
    lines.push(String::from("  Real-time stock tracking dashboard"));
    lines.push("=".repeat(PANEL_WIDTH));
    lines.push(String::from("  register <email> <password>   create an account"));
    lines.push(String::from("  login <email> <password>      open your dashboard"));
    lines.push(String::from("  help                          list every command"));
    lines.push(String::new());
    lines.join("\n")
}

/// Full command reference.
pub fn render_help() -> String {
    let mut lines = Vec::new();
    lines.push(String::from("Commands:"));
    lines.push(String::from("  register <email> <password>   create a new account"));
    lines.push(String::from("  login <email> <password>      log in"));
    lines.push(String::from("  logout                        end the current session"));
    lines.push(String::from("  subscribe <ticker>            start tracking a stock"));
    lines.push(String::from("  unsubscribe <ticker>          stop tracking a stock"));
    lines.push(String::from("  view <ticker>                 expand one stock's chart"));
    lines.push(String::from("  view off                      back to the card overview"));
    lines.push(String::from("  dashboard                     redraw the current screen"));
    lines.push(String::from("  quit                          exit"));
    lines.push(format!("Symbols: {}", symbol_list(Ticker::ALL.iter().copied())));
    lines.push(String::new());
    lines.join("\n")
}

/// Dashboard for a logged-in session.
///
/// With `expanded` set, renders the single-ticker chart view instead of
/// the card overview.
pub fn render_dashboard(session: &Session, expanded: Option<Ticker>) -> String {
    match expanded {
        Some(ticker) => render_expanded(session, ticker),
        None => render_cards(session),
    }
}

/// One compact line per price update, printed between commands.
///
/// Covers the subscribed tickers, or only the expanded one while a
/// chart view is open. `None` when there is nothing to report.
pub fn render_ticker_line(session: &Session, expanded: Option<Ticker>) -> Option<String> {
    let watched: Vec<Ticker> = match expanded {
        Some(ticker) => vec![ticker],
        None => session.profile().subscriptions.clone(),
    };
    let stamp = watched
        .first()
        .and_then(|&ticker| session.history(ticker))
        .and_then(|buffer| buffer.back())
        .map(|sample| sample.time.clone())?;

    let cells: Vec<String> = watched
        .iter()
        .filter_map(|&ticker| {
            let price = session.price_of(ticker)?;
            Some(format!(
                "{ticker} ₹{price:.2} ({:.2}%)",
                session.percent_change(ticker)
            ))
        })
        .collect();
    if cells.is_empty() {
        return None;
    }
    Some(format!("[{stamp}] {}", cells.join("  ")))
}

fn render_cards(session: &Session) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(PANEL_WIDTH));
    lines.push(format!("  {PRODUCT_NAME} | {}", session.email()));
    lines.push("=".repeat(PANEL_WIDTH));

    let available: Vec<Ticker> = Ticker::ALL
        .iter()
        .copied()
        .filter(|&ticker| !session.profile().is_subscribed(ticker))
        .collect();
    if !available.is_empty() {
        lines.push(format!(
            "  Subscribe to Stocks: {}   (subscribe <ticker>)",
            symbol_list(available.into_iter())
        ));
        lines.push("-".repeat(PANEL_WIDTH));
    }

    if session.profile().subscriptions.is_empty() {
        lines.push(String::from("  No Subscriptions Yet"));
        lines.push(String::from(
            "  Subscribe to stocks above to start tracking prices",
        ));
    } else {
        for &ticker in &session.profile().subscriptions {
            lines.push(render_card(session, ticker));
        }
        lines.push("-".repeat(PANEL_WIDTH));
        lines.push(String::from(
            "  view <ticker> expands a chart. 'help' lists commands.",
        ));
    }
    lines.push(String::new());
    lines.join("\n")
}

fn render_card(session: &Session, ticker: Ticker) -> String {
    let price = session
        .price_of(ticker)
        .unwrap_or(ticker.initial_price());
    let change = session.price_change(ticker);
    let change_cell = format!(
        "{} ({:.2}%)",
        signed_currency(change),
        session.percent_change(ticker)
    );
    let spark = session
        .history(ticker)
        .map(|buffer| sparkline(&buffer.iter().map(|s| s.price).collect::<Vec<_>>()))
        .unwrap_or_default();
    format!("  {ticker:<6} ₹{price:>9.2}  {change_cell:<19} {spark}")
}

fn render_expanded(session: &Session, ticker: Ticker) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(PANEL_WIDTH));
    lines.push(format!("  {ticker} | {}", session.email()));
    lines.push("=".repeat(PANEL_WIDTH));

    let price = session
        .price_of(ticker)
        .unwrap_or(ticker.initial_price());
    let change = session.price_change(ticker);
    lines.push(format!(
        "  ₹{price:.2}   {} ({:.2}%)",
        signed_currency(change),
        session.percent_change(ticker)
    ));

    let samples: Vec<HistorySample> = session
        .history(ticker)
        .map(|buffer| buffer.iter().cloned().collect())
        .unwrap_or_default();
    if samples.len() > 1 {
        lines.push(String::new());
        lines.push(String::from("  Price History"));
        lines.extend(render_chart(&samples));
        let start = samples[0].price;
        lines.push(String::new());
        lines.push(format!(
            "  Current Price ₹{price:.2} | Starting Price ₹{start:.2} | Total Change {}",
            signed_currency(change)
        ));
    } else {
        lines.push(String::from("  Collecting price history..."));
    }
    lines.push(String::from("  'view off' returns to the dashboard."));
    lines.push(String::new());
    lines.join("\n")
}

/// Plots samples as one column per tick, low prices at the bottom.
fn render_chart(samples: &[HistorySample]) -> Vec<String> {
    let prices: Vec<f64> = samples.iter().map(|s| s.price).collect();
    let Some((&first, rest)) = prices.split_first() else {
        return Vec::new();
    };
    let low = rest.iter().copied().fold(first, f64::min);
    let high = rest.iter().copied().fold(first, f64::max);
    // A flat history still needs a non-zero span to land on one row.
    let span = (high - low).max(f64::EPSILON);

    let mut rows = vec![vec![' '; prices.len()]; CHART_HEIGHT];
    for (col, price) in prices.iter().enumerate() {
        let level = ((price - low) / span * (CHART_HEIGHT - 1) as f64).round() as usize;
        rows[CHART_HEIGHT - 1 - level][col] = '*';
    }

    let gutter = " ".repeat(9);
    let mut lines = Vec::with_capacity(CHART_HEIGHT + 2);
    for (index, row) in rows.iter().enumerate() {
        let label = if index == 0 {
            format!("{high:>9.2}")
        } else if index == CHART_HEIGHT - 1 {
            format!("{low:>9.2}")
        } else {
            gutter.clone()
        };
        lines.push(format!("  {label} |{}", row.iter().collect::<String>()));
    }
    lines.push(format!("  {gutter} +{}", "-".repeat(prices.len())));
    if let (Some(oldest), Some(newest)) = (samples.first(), samples.last()) {
        lines.push(format!("  {gutter}  {} .. {}", oldest.time, newest.time));
    }
    lines
}

/// One glyph per sample, scaled to the buffer's own min/max.
fn sparkline(prices: &[f64]) -> String {
    let Some((&first, rest)) = prices.split_first() else {
        return String::new();
    };
    let low = rest.iter().copied().fold(first, f64::min);
    let high = rest.iter().copied().fold(first, f64::max);
    let span = high - low;
    prices
        .iter()
        .map(|&price| {
            if span < f64::EPSILON {
                SPARK_GLYPHS[3]
            } else {
                let level = ((price - low) / span * 7.0).round() as usize;
                SPARK_GLYPHS[level]
            }
        })
        .collect()
}

/// `+₹1.23` / `-₹1.23`, matching the card and stats cells.
fn signed_currency(value: f64) -> String {
    let sign = if value >= 0.0 { "+" } else { "-" };
    format!("{sign}₹{:.2}", value.abs())
}

fn symbol_list(tickers: impl Iterator<Item = Ticker>) -> String {
    tickers
        .map(|ticker| ticker.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
