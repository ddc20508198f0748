use crate::domain::snapshot::{EarningsForecast, Section};
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::extract::placeholders::UNKNOWN_EARNINGS_DATE;
use crate::extract::{require_provider, ExtractorKind, MetricExtractor};
use crate::ingest::MarketDataProvider;

/// Next earnings date and consensus EPS from the provider's calendar.
#[derive(Debug, Clone, Copy, Default)]
pub struct CalendarEarningsExtractor;

#[async_trait::async_trait]
impl MetricExtractor for CalendarEarningsExtractor {
    type Output = EarningsForecast;

    fn section(&self) -> Section {
        Section::Earnings
    }

    fn kind(&self) -> ExtractorKind {
        ExtractorKind::Live
    }

    async fn extract(
        &self,
        ticker: &TickerSymbol,
        provider: Option<&dyn MarketDataProvider>,
    ) -> Result<EarningsForecast, SignalError> {
        let provider = require_provider(provider, ticker, Section::Earnings)?;
        let calendar = provider
            .fetch_earnings_calendar(ticker)
            .await
            .map_err(|err| SignalError::data_unavailable(ticker, Section::Earnings, provider, &err))?;

        Ok(EarningsForecast {
            next_earnings_date: calendar
                .next_earnings_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| UNKNOWN_EARNINGS_DATE.to_string()),
            eps_forecast: calendar.eps_forecast,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::EarningsCalendar;
    use crate::ingest::InMemoryProvider;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn formats_date_or_falls_back_to_placeholder() {
        let known = TickerSymbol::parse("ACME").unwrap();
        let unknown = TickerSymbol::parse("NEWCO").unwrap();
        let provider = InMemoryProvider::new()
            .with_calendar(
                &known,
                EarningsCalendar {
                    next_earnings_date: NaiveDate::from_ymd_opt(2026, 11, 3),
                    eps_forecast: Some(1.42),
                },
            )
            .with_calendar(&unknown, EarningsCalendar::default());

        let e = CalendarEarningsExtractor
            .extract(&known, Some(&provider))
            .await
            .unwrap();
        assert_eq!(e.next_earnings_date, "2026-11-03");
        assert_eq!(e.eps_forecast, Some(1.42));

        let e = CalendarEarningsExtractor
            .extract(&unknown, Some(&provider))
            .await
            .unwrap();
        assert_eq!(e.next_earnings_date, "TBD");
        assert_eq!(e.eps_forecast, None);
    }
}
