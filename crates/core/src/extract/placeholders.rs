//! Fixed stand-ins for sections without a live source yet.

use crate::domain::snapshot::{
    EarningsForecast, PeerComparison, Section, SentimentLabel, SentimentSnapshot,
    TechnicalsSnapshot,
};
use crate::extract::Fixed;

pub const UNKNOWN_EARNINGS_DATE: &str = "TBD";

pub fn technicals() -> Fixed<TechnicalsSnapshot> {
    Fixed::new(
        Section::Technicals,
        TechnicalsSnapshot {
            price_above_ma200: true,
            macd_bullish: true,
            rsi: 50.0,
            bollinger_lower_touch: false,
        },
    )
}

pub fn sentiment() -> Fixed<SentimentSnapshot> {
    Fixed::new(
        Section::Sentiment,
        SentimentSnapshot {
            avg_score: 0.5,
            label: SentimentLabel::Neutral,
        },
    )
}

// Peer set selection is not implemented; both ranks sit at the median.
pub fn peers() -> Fixed<PeerComparison> {
    Fixed::new(
        Section::Peers,
        PeerComparison {
            pe_rank: 0.5,
            roe_rank: 0.5,
        },
    )
}

pub fn earnings() -> Fixed<EarningsForecast> {
    Fixed::new(
        Section::Earnings,
        EarningsForecast {
            next_earnings_date: UNKNOWN_EARNINGS_DATE.to_string(),
            eps_forecast: None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ticker::TickerSymbol;
    use crate::extract::{ExtractorKind, MetricExtractor};

    #[tokio::test]
    async fn stubs_ignore_ticker_and_provider() {
        let a = TickerSymbol::parse("AAA").unwrap();
        let b = TickerSymbol::parse("BBB").unwrap();
        let extractor = sentiment();
        assert_eq!(extractor.kind(), ExtractorKind::Stub);
        assert_eq!(
            extractor.extract(&a, None).await.unwrap(),
            extractor.extract(&b, None).await.unwrap()
        );

        let e = earnings().extract(&a, None).await.unwrap();
        assert_eq!(e.next_earnings_date, "TBD");
        assert_eq!(e.eps_forecast, None);
    }
}
