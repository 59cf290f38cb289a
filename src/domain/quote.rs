//! Raw daily quote as delivered by the data vendor.

use chrono::NaiveDate;

/// Buy/sell signal token carried on a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    /// Parse a vendor token. Anything other than `Buy`/`Sell` means no signal.
    pub fn from_token(token: Option<&str>) -> Option<Signal> {
        match token.map(str::trim) {
            Some("Buy") => Some(Signal::Buy),
            Some("Sell") => Some(Signal::Sell),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Buy => "Buy",
            Signal::Sell => "Sell",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trend classification token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Trend {
    Uptrend,
    Downtrend,
    #[default]
    Other,
}

impl Trend {
    pub fn from_token(token: Option<&str>) -> Trend {
        match token.map(str::trim) {
            Some("Uptrend") => Trend::Uptrend,
            Some("Downtrend") => Trend::Downtrend,
            _ => Trend::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Uptrend => "Uptrend",
            Trend::Downtrend => "Downtrend",
            Trend::Other => "Other",
        }
    }
}

impl std::fmt::Display for Trend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exponential moving averages of the close price.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CloseEmas {
    pub ema5: f64,
    pub ema10: f64,
    pub ema20: f64,
    pub ema50: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawQuote {
    pub symbol: String,
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
    /// Oscillator 0-100, 0 = max fear, 100 = max greed.
    pub heatmap: f64,
    /// Net-weighted heatmap of the sector, as reported on the stock's own quote.
    pub sector_heatmap: f64,
    pub signal: Option<Signal>,
    pub trend: Trend,
    pub close_emas: CloseEmas,
}

impl RawQuote {
    pub fn has_signal(&self, kind: Signal) -> bool {
        self.signal == Some(kind)
    }

    pub fn is_in_uptrend(&self) -> bool {
        self.trend == Trend::Uptrend
    }

    /// Buy signal on this day while in uptrend.
    pub fn is_bullish(&self) -> bool {
        self.has_signal(Signal::Buy) && self.is_in_uptrend()
    }
}
