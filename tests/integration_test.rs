//! End-to-end enrichment, evaluation and scanning over in-memory data.
//!
//! Tests cover:
//! - The nine-factor match on 2025-06-05 and its removal when the full
//!   market leaves its uptrend
//! - Empty series and missing breadth series
//! - Batch scans: skipping, ordering, windows and fatal errors
//! - Property tests over series lookups

mod common;

use approx::assert_relative_eq;
use common::*;
use proptest::prelude::*;
use trendscan::domain::breadth::{BreadthBook, BreadthSeries};
use trendscan::domain::enricher::{enrich, EnrichOptions, MissingSeriesPolicy, SignalEnricher};
use trendscan::domain::error::TrendscanError;
use trendscan::domain::evaluator::{matching, DateWindow};
use trendscan::domain::quote_series::QuoteSeries;
use trendscan::domain::scan::{scan_universe, ScanConfig, SkipReason};
use trendscan::domain::strategy::{
    BuySignalUptrendEntryStrategy, EntryStrategy, NineFactorEntryStrategy,
};

fn book(sector_bull: f64, market: Vec<BreadthQuote>) -> BreadthBook {
    BreadthBook::new()
        .with_series(BreadthSeries::new("XLK", breadth_days("XLK", sector_bull)).unwrap())
        .with_series(BreadthSeries::new("FULLSTOCK", market).unwrap())
}

fn nvda() -> QuoteSeries {
    QuoteSeries::new("NVDA", nvda_quotes()).unwrap()
}

fn spy() -> QuoteSeries {
    QuoteSeries::new("SPY", spy_quotes()).unwrap()
}

mod end_to_end {
    use super::*;

    #[test]
    fn nine_factor_matches_2025_06_05() {
        let breadth = book(UPTREND_BULL, breadth_days("FULLSTOCK", UPTREND_BULL));
        let enriched = enrich(&nvda(), "XLK", &breadth, &spy()).unwrap();

        let june_5 = enriched.iter().find(|q| q.date == date(2025, 6, 5)).unwrap();
        assert_relative_eq!(june_5.heatmap, 13.4);
        assert_relative_eq!(june_5.previous_heatmap, 10.0);
        assert_eq!(june_5.last_buy_signal, Some(date(2025, 6, 3)));
        assert_eq!(june_5.last_sell_signal, Some(date(2025, 6, 2)));
        assert_eq!(june_5.benchmark_signal, Signal::Buy);
        assert!(june_5.sector_is_in_uptrend);
        assert!(june_5.benchmark_is_in_uptrend);
        assert!(june_5.market_is_in_uptrend);

        let matched: Vec<_> = matching(&enriched, &NineFactorEntryStrategy)
            .into_iter()
            .map(|q| q.date)
            .collect();
        assert_eq!(matched, vec![date(2025, 6, 5)]);
    }

    #[test]
    fn full_market_leaving_uptrend_removes_match() {
        let mut market = breadth_days("FULLSTOCK", UPTREND_BULL);
        market[3].bull_percentage = DOWNTREND_BULL;
        let breadth = book(UPTREND_BULL, market);

        let enriched = enrich(&nvda(), "XLK", &breadth, &spy()).unwrap();
        let june_5 = enriched.iter().find(|q| q.date == date(2025, 6, 5)).unwrap();
        assert!(!june_5.market_is_in_uptrend);
        assert!(matching(&enriched, &NineFactorEntryStrategy).is_empty());

        let factors = NineFactorEntryStrategy.factors(june_5);
        let failed: Vec<_> = factors.iter().filter(|f| !f.passed).map(|f| f.label).collect();
        assert_eq!(failed, vec!["market in uptrend"]);
    }

    #[test]
    fn bull_percentage_equal_to_ema10_is_not_uptrend() {
        // make_breadth pins ema10 at 40.0
        let breadth = book(40.0, breadth_days("FULLSTOCK", UPTREND_BULL));
        let enriched = enrich(&nvda(), "XLK", &breadth, &spy()).unwrap();
        assert!(enriched.iter().all(|q| !q.sector_is_in_uptrend));
        assert!(matching(&enriched, &NineFactorEntryStrategy).is_empty());
    }

    #[test]
    fn looser_strategy_matches_every_uptrend_day_after_the_buy() {
        let breadth = book(UPTREND_BULL, breadth_days("FULLSTOCK", UPTREND_BULL));
        let enriched = enrich(&nvda(), "XLK", &breadth, &spy()).unwrap();
        let matched: Vec<_> = matching(&enriched, &BuySignalUptrendEntryStrategy)
            .into_iter()
            .map(|q| q.date)
            .collect();
        assert_eq!(matched, vec![date(2025, 6, 4), date(2025, 6, 5)]);
    }

    #[test]
    fn empty_series_yields_no_matches() {
        let empty = QuoteSeries::new("NVDA", vec![]).unwrap();
        let enriched = enrich(&empty, "XLK", &BreadthBook::new(), &spy()).unwrap();
        assert!(enriched.is_empty());
        assert!(matching(&enriched, &NineFactorEntryStrategy).is_empty());
        assert!(matching(&enriched, &BuySignalUptrendEntryStrategy).is_empty());
    }

    #[test]
    fn missing_sector_series_fails_by_default() {
        let breadth = BreadthBook::new().with_series(
            BreadthSeries::new("FULLSTOCK", breadth_days("FULLSTOCK", UPTREND_BULL)).unwrap(),
        );
        let err = enrich(&nvda(), "XLK", &breadth, &spy()).unwrap_err();
        assert!(matches!(err, TrendscanError::MissingSeries { symbol } if symbol == "XLK"));
    }

    #[test]
    fn missing_sector_series_can_be_assumed_down() {
        let breadth = BreadthBook::new().with_series(
            BreadthSeries::new("FULLSTOCK", breadth_days("FULLSTOCK", UPTREND_BULL)).unwrap(),
        );
        let options = EnrichOptions {
            missing_series: MissingSeriesPolicy::AssumeNotInUptrend,
            ..EnrichOptions::default()
        };
        let benchmark = spy();
        let enricher = SignalEnricher::new(&breadth, &benchmark, options);
        let stock = enricher.enrich_stock(&nvda(), "XLK").unwrap();

        assert_eq!(stock.sector_symbol, "XLK");
        assert_eq!(stock.quotes.len(), 4);
        assert!(stock.quotes.iter().all(|q| !q.sector_is_in_uptrend));
        assert!(stock.quotes_matching(&NineFactorEntryStrategy).is_empty());
    }
}

mod batch_scan {
    use super::*;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn renamed(symbol: &str) -> Vec<RawQuote> {
        nvda_quotes()
            .into_iter()
            .map(|q| RawQuote {
                symbol: symbol.to_string(),
                ..q
            })
            .collect()
    }

    #[test]
    fn scan_reports_the_match() {
        let source = matching_market();
        let outcome = scan_universe(
            &source,
            &symbols(&["NVDA"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks.len(), 1);
        assert_eq!(outcome.stocks[0].quote_count, 4);
        assert_eq!(outcome.stocks[0].sector_symbol, "XLK");
        assert_eq!(outcome.match_count(), 1);
        let first = outcome.matches().next().unwrap();
        assert_eq!((first.symbol.as_str(), first.date), ("NVDA", date(2025, 6, 5)));
        assert!(outcome.skipped.is_empty());
    }

    #[test]
    fn results_follow_input_order() {
        let source = matching_market()
            .with_stock("AAPL", "XLK", renamed("AAPL"))
            .with_stock("MSFT", "XLK", renamed("MSFT"));
        let order = symbols(&["MSFT", "NVDA", "AAPL"]);
        let outcome =
            scan_universe(&source, &order, &ScanConfig::default(), &NineFactorEntryStrategy)
                .unwrap();

        let scanned: Vec<_> = outcome.stocks.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(scanned, vec!["MSFT", "NVDA", "AAPL"]);
        assert_eq!(outcome.match_count(), 3);
    }

    #[test]
    fn stock_with_missing_sector_series_is_skipped() {
        let source = matching_market().with_stock("META", "XLC", renamed("META"));
        let outcome = scan_universe(
            &source,
            &symbols(&["META", "NVDA"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks.len(), 1);
        assert_eq!(outcome.stocks[0].symbol, "NVDA");
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].symbol, "META");
        assert_eq!(
            outcome.skipped[0].reason,
            SkipReason::MissingSeries {
                symbol: "XLC".to_string()
            }
        );
    }

    #[test]
    fn unreadable_stock_is_skipped() {
        let source = matching_market()
            .with_stock("AMD", "XLK", renamed("AMD"))
            .with_error("AMD", "corrupt file");
        let outcome = scan_universe(
            &source,
            &symbols(&["AMD", "NVDA"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks.len(), 1);
        assert!(matches!(
            &outcome.skipped[0].reason,
            SkipReason::DataUnavailable { reason } if reason == "corrupt file"
        ));
    }

    #[test]
    fn unreadable_sector_series_skips_its_stocks() {
        let source = matching_market()
            .with_stock("META", "XLC", renamed("META"))
            .with_breadth("XLC", breadth_days("XLC", UPTREND_BULL))
            .with_error("XLC", "truncated");
        let outcome = scan_universe(
            &source,
            &symbols(&["NVDA", "META"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks.len(), 1);
        assert_eq!(outcome.skipped[0].symbol, "META");
        assert!(matches!(
            outcome.skipped[0].reason,
            SkipReason::DataUnavailable { .. }
        ));
    }

    #[test]
    fn every_stock_skipped_is_an_error() {
        let source = matching_market().with_stock("META", "XLC", renamed("META"));
        let err = scan_universe(
            &source,
            &symbols(&["META"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap_err();
        assert!(matches!(err, TrendscanError::DataUnavailable { symbol, .. } if symbol == "all"));
    }

    #[test]
    fn missing_benchmark_aborts_the_scan() {
        let source = MockQuotePort::new()
            .with_stock("NVDA", "XLK", nvda_quotes())
            .with_breadth("XLK", breadth_days("XLK", UPTREND_BULL))
            .with_breadth("FULLSTOCK", breadth_days("FULLSTOCK", UPTREND_BULL));
        let err = scan_universe(
            &source,
            &symbols(&["NVDA"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap_err();
        assert!(matches!(err, TrendscanError::DataUnavailable { symbol, .. } if symbol == "SPY"));
    }

    #[test]
    fn duplicate_dates_abort_the_scan() {
        let mut quotes = nvda_quotes();
        quotes.push(quotes[0].clone());
        let source = matching_market().with_stock("NVDA", "XLK", quotes);
        let err = scan_universe(
            &source,
            &symbols(&["NVDA"]),
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap_err();
        assert!(matches!(err, TrendscanError::InvalidInput { .. }));
    }

    #[test]
    fn empty_symbol_list_is_invalid() {
        let err = scan_universe(
            &matching_market(),
            &[],
            &ScanConfig::default(),
            &NineFactorEntryStrategy,
        )
        .unwrap_err();
        assert!(matches!(err, TrendscanError::InvalidInput { .. }));
    }

    #[test]
    fn window_limits_reported_matches_only() {
        let config = ScanConfig {
            window: DateWindow {
                start: Some(date(2025, 6, 1)),
                end: Some(date(2025, 6, 4)),
            },
            ..ScanConfig::default()
        };
        let outcome = scan_universe(
            &matching_market(),
            &symbols(&["NVDA"]),
            &config,
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks[0].quote_count, 4);
        assert_eq!(outcome.match_count(), 0);
    }

    #[test]
    fn assume_policy_keeps_stocks_with_missing_sector() {
        let source = matching_market().with_stock("META", "XLC", renamed("META"));
        let config = ScanConfig {
            missing_series: MissingSeriesPolicy::AssumeNotInUptrend,
            ..ScanConfig::default()
        };
        let outcome = scan_universe(
            &source,
            &symbols(&["META", "NVDA"]),
            &config,
            &NineFactorEntryStrategy,
        )
        .unwrap();

        assert_eq!(outcome.stocks.len(), 2);
        assert!(outcome.stocks[0].matches.is_empty());
        assert_eq!(outcome.stocks[1].matches.len(), 1);
        assert!(outcome.skipped.is_empty());
    }
}

mod series_properties {
    use super::*;
    use std::collections::BTreeSet;

    fn series_from_offsets(offsets: &BTreeSet<i64>, buy_every: i64) -> QuoteSeries {
        let base = date(2025, 1, 1);
        // Insert in reverse so lookups cannot rely on input order
        let quotes = offsets
            .iter()
            .rev()
            .map(|&o| {
                let signal = (o % buy_every == 0).then_some(Signal::Buy);
                make_quote("TEST", base + chrono::Duration::days(o), 50.0, signal, Trend::Uptrend)
            })
            .collect();
        QuoteSeries::new("TEST", quotes).unwrap()
    }

    proptest! {
        #[test]
        fn quote_on_never_fabricates(
            offsets in prop::collection::btree_set(0i64..90, 0..30),
            query in 0i64..100,
        ) {
            let series = series_from_offsets(&offsets, 3);
            let day = date(2025, 1, 1) + chrono::Duration::days(query);
            match series.quote_on(day) {
                Some(q) => {
                    prop_assert!(offsets.contains(&query));
                    prop_assert_eq!(q.date, day);
                }
                None => prop_assert!(!offsets.contains(&query)),
            }
        }

        #[test]
        fn previous_quote_is_nearest_earlier(
            offsets in prop::collection::btree_set(0i64..90, 0..30),
            query in 0i64..100,
        ) {
            let series = series_from_offsets(&offsets, 3);
            let base = date(2025, 1, 1);
            let expected = offsets.range(..query).next_back().map(|&o| base + chrono::Duration::days(o));
            let actual = series.previous_quote(base + chrono::Duration::days(query)).map(|q| q.date);
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn last_signal_is_maximal_on_or_before(
            offsets in prop::collection::btree_set(0i64..90, 0..30),
            buy_every in 1i64..7,
            query in 0i64..100,
        ) {
            let series = series_from_offsets(&offsets, buy_every);
            let base = date(2025, 1, 1);
            let expected = offsets
                .range(..=query)
                .rev()
                .find(|&&o| o % buy_every == 0)
                .map(|&o| base + chrono::Duration::days(o));
            let actual = series.most_recent_signal_date_on_or_before(
                base + chrono::Duration::days(query),
                Signal::Buy,
            );
            prop_assert_eq!(actual, expected);
            prop_assert_eq!(
                series.most_recent_signal_date_on_or_before(base + chrono::Duration::days(query), Signal::Sell),
                None
            );
        }
    }
}
