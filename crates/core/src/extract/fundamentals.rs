use crate::domain::snapshot::{FundamentalsSnapshot, Section, TimeTable};
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::extract::{require_provider, ExtractorKind, MetricExtractor};
use crate::ingest::types::{DividendEvent, HistoryPeriod, PriceBar};
use crate::ingest::MarketDataProvider;
use std::collections::BTreeMap;

/// Rows kept from the trailing price and dividend series.
const TRAILING_ROWS: usize = 5;

#[derive(Debug, Clone, Copy, Default)]
pub struct FundamentalsExtractor;

#[async_trait::async_trait]
impl MetricExtractor for FundamentalsExtractor {
    type Output = FundamentalsSnapshot;

    fn section(&self) -> Section {
        Section::Fundamentals
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Live
    }

    async fn extract(
        &self,
        ticker: &TickerSymbol,
        provider: Option<&dyn MarketDataProvider>,
    ) -> Result<FundamentalsSnapshot, SignalError> {
        let provider = require_provider(provider, ticker, Section::Fundamentals)?;
        let unavailable = |err: anyhow::Error| {
            SignalError::data_unavailable(ticker, Section::Fundamentals, provider, &err)
        };

        let financials = provider
            .fetch_financials(ticker)
            .await
            .map_err(unavailable)?;
        let history = provider
            .fetch_history_with_dividends(ticker, HistoryPeriod::FiveYears)
            .await
            .map_err(unavailable)?;
        if history.bars.is_empty() {
            return Err(SignalError::DataUnavailable {
                ticker: ticker.to_string(),
                section: Section::Fundamentals,
                detail: "price history is empty".to_string(),
            });
        }

        Ok(FundamentalsSnapshot {
            valuation: financials.valuation,
            profitability: financials.profitability,
            dividends: financials.dividends,
            financials: financials.statements,
            dividend_history: dividend_table(&history.dividends),
            price_history: price_table(&history.bars),
        })
    }
}

fn price_table(bars: &[PriceBar]) -> TimeTable {
    let start = bars.len().saturating_sub(TRAILING_ROWS);
    bars[start..]
        .iter()
        .map(|bar| {
            let row = BTreeMap::from([
                ("open".to_string(), bar.open),
                ("high".to_string(), bar.high),
                ("low".to_string(), bar.low),
                ("close".to_string(), bar.close),
                ("volume".to_string(), bar.volume),
            ]);
            (bar.date, row)
        })
        .collect()
}

fn dividend_table(events: &[DividendEvent]) -> TimeTable {
    let start = events.len().saturating_sub(TRAILING_ROWS);
    events[start..]
        .iter()
        .map(|ev| {
            let row = BTreeMap::from([("dividends".to_string(), Some(ev.amount))]);
            (ev.date, row)
        })
        .collect()
}

/// Orders snapshots by trailing P/E, cheapest first; missing P/E sorts last.
pub fn rank_by_pe<T>(items: &mut [(T, FundamentalsSnapshot)]) {
    items.sort_by(|(_, a), (_, b)| {
        let a = a.valuation.pe_ratio.unwrap_or(f64::INFINITY);
        let b = b.valuation.pe_ratio.unwrap_or(f64::INFINITY);
        a.total_cmp(&b)
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::{StockProfile, Valuation};
    use crate::ingest::types::{EarningsCalendar, Financials, Interval, PriceHistory};
    use crate::ingest::InMemoryProvider;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn bar(date: NaiveDate, close: f64) -> PriceBar {
        PriceBar {
            date,
            open: Some(close - 1.0),
            high: Some(close + 1.0),
            low: Some(close - 2.0),
            close: Some(close),
            volume: Some(1_000.0),
        }
    }

    #[tokio::test]
    async fn keeps_trailing_rows_only() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let start = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let bars: Vec<_> = start
            .iter_days()
            .take(8)
            .enumerate()
            .map(|(i, d)| bar(d, 100.0 + i as f64))
            .collect();
        let dividends = vec![
            DividendEvent {
                date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                amount: 0.2,
            },
            DividendEvent {
                date: NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
                amount: 0.25,
            },
        ];
        let financials = Financials {
            valuation: Valuation {
                pe_ratio: Some(15.2),
                ..Default::default()
            },
            ..Default::default()
        };
        let provider = InMemoryProvider::new()
            .with_financials(&ticker, financials)
            .with_prices(&ticker, bars)
            .with_dividends(&ticker, dividends);

        let snap = FundamentalsExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap();

        assert_eq!(snap.valuation.pe_ratio, Some(15.2));
        assert_eq!(snap.profitability.roe, None);
        assert_eq!(snap.price_history.len(), 5);
        let first = snap.price_history.keys().next().copied().unwrap();
        assert_eq!(first, NaiveDate::from_ymd_opt(2025, 3, 4).unwrap());
        assert_eq!(snap.price_history[&first]["close"], Some(103.0));
        assert_eq!(snap.dividend_history.len(), 2);
    }

    #[tokio::test]
    async fn empty_price_history_is_data_unavailable() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let provider = InMemoryProvider::new()
            .with_financials(&ticker, Financials::default())
            .with_prices(&ticker, vec![]);
        let err = FundamentalsExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::DataUnavailable {
                section: Section::Fundamentals,
                ..
            }
        ));
    }

    /// Counts upstream history requests made through it.
    struct Counting {
        inner: InMemoryProvider,
        history_calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for Counting {
        fn provider_name(&self) -> &'static str {
            "counting"
        }

        async fn fetch_profile(&self, ticker: &TickerSymbol) -> anyhow::Result<StockProfile> {
            self.inner.fetch_profile(ticker).await
        }

        async fn fetch_financials(&self, ticker: &TickerSymbol) -> anyhow::Result<Financials> {
            self.inner.fetch_financials(ticker).await
        }

        async fn fetch_price_history(
            &self,
            ticker: &TickerSymbol,
            period: HistoryPeriod,
            interval: Interval,
        ) -> anyhow::Result<Vec<PriceBar>> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_price_history(ticker, period, interval).await
        }

        async fn fetch_history_with_dividends(
            &self,
            ticker: &TickerSymbol,
            period: HistoryPeriod,
        ) -> anyhow::Result<PriceHistory> {
            self.history_calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_history_with_dividends(ticker, period).await
        }

        async fn fetch_earnings_calendar(
            &self,
            ticker: &TickerSymbol,
        ) -> anyhow::Result<EarningsCalendar> {
            self.inner.fetch_earnings_calendar(ticker).await
        }
    }

    #[tokio::test]
    async fn bars_and_dividends_come_from_one_request() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let day = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let provider = Counting {
            inner: InMemoryProvider::new()
                .with_financials(&ticker, Financials::default())
                .with_prices(&ticker, vec![bar(day, 50.0)])
                .with_dividends(
                    &ticker,
                    vec![DividendEvent {
                        date: day,
                        amount: 0.1,
                    }],
                ),
            history_calls: AtomicUsize::new(0),
        };

        let snap = FundamentalsExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap();
        assert_eq!(provider.history_calls.load(Ordering::SeqCst), 1);
        assert_eq!(snap.dividend_history[&day]["dividends"], Some(0.1));
        assert_eq!(snap.price_history[&day]["close"], Some(50.0));
    }

    #[test]
    fn rank_by_pe_puts_missing_last() {
        let with_pe = |pe: Option<f64>| FundamentalsSnapshot {
            valuation: Valuation {
                pe_ratio: pe,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut items = vec![
            ("C", with_pe(None)),
            ("A", with_pe(Some(30.0))),
            ("B", with_pe(Some(12.0))),
        ];
        rank_by_pe(&mut items);
        let order: Vec<_> = items.iter().map(|(t, _)| *t).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
    }
}
