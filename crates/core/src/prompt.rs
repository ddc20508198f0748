use crate::domain::snapshot::StructuredSnapshot;
use crate::error::SignalError;

/// Sent as the system message to every text-generation provider.
pub const SYSTEM_INSTRUCTION: &str = "You are a disciplined long-term investment analyst. \
Return ONLY a single valid JSON object matching the requested schema. \
Do not wrap it in markdown. Do not add prose, comments or trailing commas.";

/// Canonical JSON text of a snapshot. Field order follows the struct
/// definitions and every table is a `BTreeMap`, so output is stable.
pub fn snapshot_json(snapshot: &StructuredSnapshot) -> Result<String, SignalError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

pub fn render_prompt(
    snapshot: &StructuredSnapshot,
    available_funds: Option<f64>,
) -> Result<String, SignalError> {
    let stock_data = snapshot_json(snapshot)?;
    let funds = match available_funds {
        Some(f) => format!("{f:.2}"),
        None => "not mentioned".to_string(),
    };

    Ok(format!(
        "You are a disciplined LONG-TERM INVESTMENT ANALYST and PORTFOLIO STRATEGIST focused on \
maximizing risk-adjusted returns over multi-year horizons.

You will receive structured data for publicly listed stocks, including:
- Fundamental metrics (valuation, profitability, dividends, growth)
- Technical indicators (trend, momentum, volatility)
- Sentiment scores (news-based polarity)
- Risk metrics (drawdown, volatility)
- Peer comparison ranks (valuation, profitability)
- Earnings forecast (next report date, EPS estimate)

Your task is to evaluate each stock independently and return a structured investment recommendation.
Size allocation_pct against the available funds when they are given; use null when not buying.

STOCK DATA:
Ticker: {ticker}
Available funds: {funds}
{stock_data}

Respond ONLY in valid JSON format matching this schema:

{{
  \"reasoning\": \"<overall investment thesis and summary>\",
  \"investment_decisions\": [
    {{
      \"asset\": \"<ticker symbol>\",
      \"action\": \"buy | hold | avoid\",
      \"confidence\": <float between 0 and 1>,
      \"allocation_pct\": <float between 0 and 100 or null>,
      \"rationale\": \"<brief explanation citing key metrics>\"
    }}
  ]
}}

Do not include any extra commentary, formatting or Markdown. Only emit valid JSON.
",
        ticker = snapshot.ticker,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{aggregate, tests::sample_sections};
    use crate::domain::ticker::TickerSymbol;
    use chrono::NaiveDate;

    fn snapshot() -> StructuredSnapshot {
        aggregate(
            &TickerSymbol::parse("ACME").unwrap(),
            NaiveDate::from_ymd_opt(2025, 11, 12).unwrap(),
            sample_sections(),
        )
    }

    #[test]
    fn embeds_ticker_funds_and_snapshot() {
        let snap = snapshot();
        let prompt = render_prompt(&snap, Some(10_000.0)).unwrap();
        assert!(prompt.contains("Ticker: ACME"));
        assert!(prompt.contains("Available funds: 10000.00"));
        assert!(prompt.contains(&snapshot_json(&snap).unwrap()));

        let prompt = render_prompt(&snap, None).unwrap();
        assert!(prompt.contains("Available funds: not mentioned"));
    }

    #[test]
    fn snapshot_json_round_trips() {
        let snap = snapshot();
        let text = snapshot_json(&snap).unwrap();
        let back: StructuredSnapshot = serde_json::from_str(&text).unwrap();
        assert_eq!(back, snap);
        assert_eq!(snapshot_json(&back).unwrap(), text);
    }

    #[test]
    fn tables_serialize_as_plain_json_with_null_leaves() {
        let text = snapshot_json(&snapshot()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        let row = &v["fundamentals"]["price_history"]["2025-11-10"];
        assert_eq!(row["close"], 41.5);
        assert!(row["volume"].is_null());
        assert!(v["fundamentals"]["dividends"]["yield"].is_null());
        assert!(v["fundamentals"]["financials"]["cash_flow"].as_object().unwrap().is_empty());
    }
}
