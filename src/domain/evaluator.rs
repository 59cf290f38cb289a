//! Filters enriched quotes through an entry strategy.

use crate::domain::enriched::EnrichedStockQuote;
use crate::domain::strategy::EntryStrategy;
use chrono::NaiveDate;

/// Quotes accepted by `strategy`, in their original order.
pub fn matching<'q, S>(quotes: &'q [EnrichedStockQuote], strategy: &S) -> Vec<&'q EnrichedStockQuote>
where
    S: EntryStrategy + ?Sized,
{
    quotes.iter().filter(|q| strategy.test(q)).collect()
}

/// Inclusive date window applied to reported matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|s| date >= s) && self.end.is_none_or(|e| date <= e)
    }
}

/// `matching`, restricted to quotes dated inside `window`.
pub fn matching_within<'q, S>(
    quotes: &'q [EnrichedStockQuote],
    strategy: &S,
    window: &DateWindow,
) -> Vec<&'q EnrichedStockQuote>
where
    S: EntryStrategy + ?Sized,
{
    quotes
        .iter()
        .filter(|q| window.contains(q.date) && strategy.test(q))
        .collect()
}
