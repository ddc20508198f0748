use crate::domain::snapshot::{RiskSnapshot, Section};
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::extract::{require_provider, ExtractorKind, MetricExtractor};
use crate::ingest::types::{HistoryPeriod, Interval};
use crate::ingest::MarketDataProvider;

/// Drawdown over one year of daily closes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DrawdownRiskExtractor;

#[async_trait::async_trait]
impl MetricExtractor for DrawdownRiskExtractor {
    type Output = RiskSnapshot;

    fn section(&self) -> Section {
        Section::Risk
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Live
    }

    async fn extract(
        &self,
        ticker: &TickerSymbol,
        provider: Option<&dyn MarketDataProvider>,
    ) -> Result<RiskSnapshot, SignalError> {
        let provider = require_provider(provider, ticker, Section::Risk)?;
        let bars = provider
            .fetch_price_history(ticker, HistoryPeriod::OneYear, Interval::Daily)
            .await
            .map_err(|err| SignalError::data_unavailable(ticker, Section::Risk, provider, &err))?;

        // Gaps and non-positive prints (e.g. negative futures settlements) are dropped.
        let closes: Vec<f64> = bars
            .iter()
            .filter_map(|b| b.close)
            .filter(|c| c.is_finite() && *c > 0.0)
            .collect();

        if closes.len() < 2 {
            return Err(SignalError::InsufficientHistory {
                ticker: ticker.to_string(),
                points: closes.len(),
            });
        }

        let max_drawdown = max_drawdown(&closes).ok_or_else(|| SignalError::DataUnavailable {
            ticker: ticker.to_string(),
            section: Section::Risk,
            detail: "peak close is not positive".to_string(),
        })?;

        Ok(RiskSnapshot { max_drawdown })
    }
}

/// `(max - min) / max`, rounded to 3 decimals.
///
/// `None` for fewer than two closes or a non-positive peak.
pub fn max_drawdown(closes: &[f64]) -> Option<f64> {
    if closes.len() < 2 {
        return None;
    }
    let max = closes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = closes.iter().copied().fold(f64::INFINITY, f64::min);
    if max <= 0.0 {
        return None;
    }
    Some(round3((max - min) / max))
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::PriceBar;
    use crate::ingest::InMemoryProvider;
    use chrono::NaiveDate;

    fn bars(closes: &[Option<f64>]) -> Vec<PriceBar> {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        closes
            .iter()
            .zip(start.iter_days())
            .map(|(close, date)| PriceBar {
                date,
                open: None,
                high: None,
                low: None,
                close: *close,
                volume: None,
            })
            .collect()
    }

    #[test]
    fn drawdown_is_range_over_peak() {
        assert_eq!(max_drawdown(&[100.0, 80.0, 120.0, 90.0]), Some(0.333));
        assert_eq!(max_drawdown(&[50.0, 50.0]), Some(0.0));
        assert_eq!(max_drawdown(&[42.0]), None);
        assert_eq!(max_drawdown(&[0.0, 0.0]), None);
    }

    #[tokio::test]
    async fn drops_gaps_and_is_deterministic() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let provider = InMemoryProvider::new().with_prices(
            &ticker,
            bars(&[Some(100.0), None, Some(82.0), Some(f64::NAN), Some(95.0)]),
        );

        let first = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap();
        let second = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap();
        assert_eq!(first.max_drawdown, 0.18);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn single_valid_point_is_insufficient_history() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let provider =
            InMemoryProvider::new().with_prices(&ticker, bars(&[None, Some(10.0), None]));

        let err = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientHistory { points: 1, .. }
        ));
    }

    #[tokio::test]
    async fn provider_failure_is_data_unavailable() {
        let ticker = TickerSymbol::parse("ACME").unwrap();
        let provider = InMemoryProvider::new();
        let err = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap_err();
        match err {
            SignalError::DataUnavailable { section, detail, .. } => {
                assert_eq!(section, Section::Risk);
                assert!(detail.starts_with("in_memory: "), "{detail}");
            }
            other => panic!("expected DataUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_positive_closes_are_dropped() {
        let ticker = TickerSymbol::parse("CL=F").unwrap();
        let provider = InMemoryProvider::new().with_prices(
            &ticker,
            bars(&[Some(20.0), Some(-37.6), Some(0.0), Some(10.0), Some(16.0)]),
        );

        let risk = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap();
        assert_eq!(risk.max_drawdown, 0.5);
        assert!((0.0..=1.0).contains(&risk.max_drawdown));

        let provider = InMemoryProvider::new()
            .with_prices(&ticker, bars(&[Some(-5.0), Some(12.0), Some(-1.0)]));
        let err = DrawdownRiskExtractor
            .extract(&ticker, Some(&provider))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SignalError::InsufficientHistory { points: 1, .. }
        ));
    }
}
