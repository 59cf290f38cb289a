//! Entry strategies: named predicates over an enriched stock-day.

use crate::domain::enriched::EnrichedStockQuote;
use crate::domain::error::TrendscanError;

/// Days before the quote date in which a buy signal still counts as fresh.
pub const BUY_SIGNAL_WINDOW_DAYS: i64 = 2;

pub trait EntryStrategy {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn test(&self, quote: &EnrichedStockQuote) -> bool;

    /// Clause-by-clause breakdown of `test`. Strategies without named clauses
    /// report a single overall check.
    fn factors(&self, quote: &EnrichedStockQuote) -> Vec<FactorCheck> {
        vec![FactorCheck::new("strategy matches", self.test(quote))]
    }
}

pub type BoxedStrategy = Box<dyn EntryStrategy + Send + Sync>;

/// One clause of a strategy and whether a quote passed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactorCheck {
    pub label: &'static str,
    pub passed: bool,
}

impl FactorCheck {
    pub fn new(label: &'static str, passed: bool) -> Self {
        Self { label, passed }
    }
}

/// Stock, sector, benchmark and full market all lined up behind a fresh buy
/// signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NineFactorEntryStrategy;

impl NineFactorEntryStrategy {
    pub const NAME: &'static str = "nine-factor";
}

impl EntryStrategy for NineFactorEntryStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Uptrend stock with a buy signal in the last 2 days, rising heatmap, \
         sector in uptrend and getting greedier, benchmark on buy and in uptrend, \
         full market in uptrend"
    }

    fn test(&self, quote: &EnrichedStockQuote) -> bool {
        self.factors(quote).iter().all(|f| f.passed)
    }

    /// Every clause, in order. All nine are always computed.
    fn factors(&self, quote: &EnrichedStockQuote) -> Vec<FactorCheck> {
        vec![
            FactorCheck::new("stock in uptrend", quote.is_in_uptrend()),
            FactorCheck::new("has last buy signal", quote.last_buy_signal.is_some()),
            FactorCheck::new(
                "buy signal within 2 days",
                quote.buy_signal_within(BUY_SIGNAL_WINDOW_DAYS),
            ),
            FactorCheck::new("stock getting greedier", quote.is_getting_greedier()),
            FactorCheck::new("sector in uptrend", quote.sector_is_in_uptrend),
            FactorCheck::new("sector getting greedier", quote.sector_is_getting_greedier()),
            FactorCheck::new("benchmark buy signal", quote.has_benchmark_buy_signal()),
            FactorCheck::new("benchmark in uptrend", quote.benchmark_is_in_uptrend),
            FactorCheck::new("market in uptrend", quote.market_is_in_uptrend),
        ]
    }
}

/// Uptrend stock whose most recent signal is a buy.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuySignalUptrendEntryStrategy;

impl BuySignalUptrendEntryStrategy {
    pub const NAME: &'static str = "buy-signal-uptrend";
}

impl EntryStrategy for BuySignalUptrendEntryStrategy {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Uptrend stock whose last buy signal is newer than its last sell signal"
    }

    fn test(&self, quote: &EnrichedStockQuote) -> bool {
        quote.is_in_uptrend() && quote.buy_signal_is_current()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    All,
    Any,
}

pub struct CompositeEntryStrategy {
    name: String,
    description: String,
    combinator: Combinator,
    parts: Vec<BoxedStrategy>,
}

impl CompositeEntryStrategy {
    pub fn new(name: impl Into<String>, combinator: Combinator, parts: Vec<BoxedStrategy>) -> Self {
        let joiner = match combinator {
            Combinator::All => " and ",
            Combinator::Any => " or ",
        };
        let description = parts
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(joiner);
        Self {
            name: name.into(),
            description,
            combinator,
            parts,
        }
    }

    pub fn combinator(&self) -> Combinator {
        self.combinator
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

impl EntryStrategy for CompositeEntryStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn test(&self, quote: &EnrichedStockQuote) -> bool {
        if self.parts.is_empty() {
            return false;
        }
        match self.combinator {
            Combinator::All => self.parts.iter().all(|p| p.test(quote)),
            Combinator::Any => self.parts.iter().any(|p| p.test(quote)),
        }
    }

    fn factors(&self, quote: &EnrichedStockQuote) -> Vec<FactorCheck> {
        self.parts.iter().flat_map(|p| p.factors(quote)).collect()
    }
}

/// Names and descriptions of every registered strategy.
pub fn available_strategies() -> Vec<(String, String)> {
    let builtins: [BoxedStrategy; 2] = [
        Box::new(NineFactorEntryStrategy),
        Box::new(BuySignalUptrendEntryStrategy),
    ];
    builtins
        .iter()
        .map(|s| (s.name().to_string(), s.description().to_string()))
        .collect()
}

/// Look up a registered strategy by name (case-insensitive).
pub fn strategy_by_name(name: &str) -> Result<BoxedStrategy, TrendscanError> {
    match name.trim().to_lowercase().as_str() {
        NineFactorEntryStrategy::NAME => Ok(Box::new(NineFactorEntryStrategy)),
        BuySignalUptrendEntryStrategy::NAME => Ok(Box::new(BuySignalUptrendEntryStrategy)),
        other => Err(TrendscanError::InvalidInput {
            reason: format!("unknown strategy '{}'", other),
        }),
    }
}
