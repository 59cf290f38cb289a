//! Date-indexed quote series for a single stock, sector market or benchmark.
//!
//! Quotes keep the order they were supplied in. Lookup indexes are built once
//! at construction:
//! - `date_index`: date -> position, for point lookups
//! - `ordered`: positions sorted by date, for nearest-prior lookups
//! - `buy_dates` / `sell_dates`: sorted signal dates, for last-signal queries

use crate::domain::error::TrendscanError;
use crate::domain::quote::{RawQuote, Signal};
use chrono::NaiveDate;
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct QuoteSeries {
    symbol: String,
    quotes: Vec<RawQuote>,
    date_index: HashMap<NaiveDate, usize>,
    ordered: Vec<usize>,
    buy_dates: Vec<NaiveDate>,
    sell_dates: Vec<NaiveDate>,
}

impl QuoteSeries {
    /// Build a series. Fails with `InvalidInput` if two quotes share a date.
    pub fn new(symbol: impl Into<String>, quotes: Vec<RawQuote>) -> Result<Self, TrendscanError> {
        let symbol = symbol.into();
        let mut date_index = HashMap::with_capacity(quotes.len());
        for (i, quote) in quotes.iter().enumerate() {
            if date_index.insert(quote.date, i).is_some() {
                return Err(TrendscanError::InvalidInput {
                    reason: format!("duplicate quote date {} in series {}", quote.date, symbol),
                });
            }
        }

        let mut ordered: Vec<usize> = (0..quotes.len()).collect();
        ordered.sort_by_key(|&i| quotes[i].date);

        let signal_dates = |kind: Signal| -> Vec<NaiveDate> {
            ordered
                .iter()
                .map(|&i| &quotes[i])
                .filter(|q| q.has_signal(kind))
                .map(|q| q.date)
                .collect()
        };
        let buy_dates = signal_dates(Signal::Buy);
        let sell_dates = signal_dates(Signal::Sell);

        Ok(Self {
            symbol,
            quotes,
            date_index,
            ordered,
            buy_dates,
            sell_dates,
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Quotes in their original order.
    pub fn quotes(&self) -> &[RawQuote] {
        &self.quotes
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.ordered.first().map(|&i| self.quotes[i].date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.ordered.last().map(|&i| self.quotes[i].date)
    }

    pub fn quote_on(&self, date: NaiveDate) -> Option<&RawQuote> {
        self.date_index.get(&date).map(|&i| &self.quotes[i])
    }

    /// The stored quote with the largest date strictly before `date`.
    ///
    /// Gaps (weekends, holidays) are skipped: this walks the stored ordering,
    /// it does not subtract a calendar day.
    pub fn previous_quote(&self, date: NaiveDate) -> Option<&RawQuote> {
        let pos = self
            .ordered
            .partition_point(|&i| self.quotes[i].date < date);
        if pos == 0 {
            return None;
        }
        Some(&self.quotes[self.ordered[pos - 1]])
    }

    /// Quote on `date` is bullish and its heatmap is above the quote on the
    /// calendar day before.
    ///
    /// Unlike [`previous_quote`](Self::previous_quote) this does not skip
    /// gaps: with no quote on exactly `date - 1` the answer is `false`.
    pub fn is_quote_bullish_on(&self, date: NaiveDate) -> bool {
        let Some(current) = self.quote_on(date) else {
            return false;
        };
        let Some(previous) = date.pred_opt().and_then(|day| self.quote_on(day)) else {
            return false;
        };
        current.is_bullish() && current.heatmap > previous.heatmap
    }

    /// Latest date on or before `date` whose quote carries `kind`.
    pub fn most_recent_signal_date_on_or_before(
        &self,
        date: NaiveDate,
        kind: Signal,
    ) -> Option<NaiveDate> {
        let dates = match kind {
            Signal::Buy => &self.buy_dates,
            Signal::Sell => &self.sell_dates,
        };
        let pos = dates.partition_point(|&d| d <= date);
        if pos == 0 { None } else { Some(dates[pos - 1]) }
    }

    /// The prevailing signal as of `date`.
    ///
    /// The later of the last buy and last sell wins. A missing date loses to
    /// any real date, and when neither exists the result is `Sell`.
    pub fn current_signal_on(&self, date: NaiveDate) -> Signal {
        let last_buy = self.most_recent_signal_date_on_or_before(date, Signal::Buy);
        let last_sell = self.most_recent_signal_date_on_or_before(date, Signal::Sell);
        match (last_buy, last_sell) {
            (Some(buy), Some(sell)) if buy >= sell => Signal::Buy,
            (Some(_), None) => Signal::Buy,
            _ => Signal::Sell,
        }
    }
}
