use crate::config::Settings;
use crate::domain::snapshot::{
    Dividends, FinancialStatements, Profitability, StockProfile, TimeTable, Valuation,
};
use crate::domain::ticker::TickerSymbol;
use crate::ingest::provider::MarketDataProvider;
use crate::ingest::types::{
    DividendEvent, EarningsCalendar, Financials, HistoryPeriod, Interval, PriceBar, PriceHistory,
};
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::OnceCell;

const DEFAULT_BASE_URL: &str = "https://query2.finance.yahoo.com";
/// Hands out the session cookie that `getcrumb` and quoteSummary require.
const SESSION_URL: &str = "https://fc.yahoo.com";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                          AppleWebKit/537.36 (KHTML, like Gecko) \
                          Chrome/120.0.0.0 Safari/537.36";

const PROFILE_MODULES: &str = "assetProfile,price";
const FINANCIALS_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,\
                                  incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory";
const CALENDAR_MODULES: &str = "calendarEvents";

/// Yahoo Finance chart (v8) and quote summary (v10) endpoints.
///
/// quoteSummary answers 401 "Invalid Crumb" without a session cookie and the
/// crumb bound to it, so both are obtained on first use and kept for the
/// lifetime of the provider.
#[derive(Debug)]
pub struct YahooFinanceProvider {
    http: reqwest::Client,
    base_url: String,
    session_url: String,
    crumb: OnceCell<String>,
}

impl YahooFinanceProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let base_url = settings
            .market_data_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let timeout_secs = settings
            .market_data_timeout_secs
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Self::new(base_url, Duration::from_secs(timeout_secs))
    }

    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .timeout(timeout)
            .build()
            .context("failed to build market data http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            session_url: SESSION_URL.to_string(),
            crumb: OnceCell::new(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json(&self, url: String, query: &[(&str, &str)]) -> Result<Value> {
        let res = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .with_context(|| format!("market data request failed: {url}"))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read market data response")?;
        if !status.is_success() {
            bail!("market data HTTP {status}: {text}");
        }

        serde_json::from_str::<Value>(&text)
            .with_context(|| format!("market data response is not valid JSON: {text}"))
    }

    async fn crumb(&self) -> Result<&str> {
        let crumb = self
            .crumb
            .get_or_try_init(|| async {
                // Only the Set-Cookie matters here; the page itself is a 404.
                self.http
                    .get(&self.session_url)
                    .send()
                    .await
                    .with_context(|| {
                        format!("market data session request failed: {}", self.session_url)
                    })?;

                let url = self.url("/v1/test/getcrumb");
                let res = self
                    .http
                    .get(&url)
                    .send()
                    .await
                    .with_context(|| format!("market data crumb request failed: {url}"))?;
                let status = res.status();
                let text = res
                    .text()
                    .await
                    .context("failed to read market data crumb")?;
                let crumb = parse_crumb(status, &text)?;
                tracing::debug!("market data session established");
                Ok::<_, anyhow::Error>(crumb)
            })
            .await?;
        Ok(crumb.as_str())
    }

    async fn quote_summary(&self, ticker: &TickerSymbol, modules: &str) -> Result<Value> {
        let crumb = self.crumb().await?;
        let url = self.url(&format!("/v10/finance/quoteSummary/{ticker}"));
        let raw = self.get_json(url, &summary_query(modules, crumb)).await?;
        first_result(&raw, "quoteSummary")
    }

    async fn chart(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<ChartData> {
        let url = self.url(&format!("/v8/finance/chart/{ticker}"));
        let raw = self
            .get_json(
                url,
                &[
                    ("range", period.as_range()),
                    ("interval", interval.as_str()),
                    ("events", "div"),
                ],
            )
            .await?;
        let result = first_result(&raw, "chart")?;
        serde_json::from_value::<ChartData>(result).context("failed to decode chart result")
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_profile(&self, ticker: &TickerSymbol) -> Result<StockProfile> {
        let summary = self.quote_summary(ticker, PROFILE_MODULES).await?;
        Ok(parse_profile(&summary))
    }

    async fn fetch_financials(&self, ticker: &TickerSymbol) -> Result<Financials> {
        let summary = self.quote_summary(ticker, FINANCIALS_MODULES).await?;
        Ok(parse_financials(&summary))
    }

    async fn fetch_price_history(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
        interval: Interval,
    ) -> Result<Vec<PriceBar>> {
        let chart = self.chart(ticker, period, interval).await?;
        Ok(chart.bars())
    }

    async fn fetch_history_with_dividends(
        &self,
        ticker: &TickerSymbol,
        period: HistoryPeriod,
    ) -> Result<PriceHistory> {
        let chart = self.chart(ticker, period, Interval::Daily).await?;
        Ok(PriceHistory {
            bars: chart.bars(),
            dividends: chart.dividends(),
        })
    }

    async fn fetch_earnings_calendar(&self, ticker: &TickerSymbol) -> Result<EarningsCalendar> {
        let summary = self.quote_summary(ticker, CALENDAR_MODULES).await?;
        Ok(parse_calendar(&summary))
    }
}

fn summary_query<'a>(modules: &'a str, crumb: &'a str) -> [(&'static str, &'a str); 2] {
    [("modules", modules), ("crumb", crumb)]
}

/// `getcrumb` answers with the bare crumb as plain text.
fn parse_crumb(status: StatusCode, text: &str) -> Result<String> {
    if !status.is_success() {
        bail!("market data crumb HTTP {status}: {text}");
    }
    let crumb = text.trim();
    if crumb.is_empty() || crumb.contains(|c: char| c == '<' || c.is_whitespace()) {
        bail!("market data crumb response is not a crumb: {text}");
    }
    Ok(crumb.to_string())
}

/// Unwraps `{"<root>": {"result": [first, ..], "error": ..}}`.
fn first_result(raw: &Value, root: &str) -> Result<Value> {
    let envelope = raw
        .get(root)
        .with_context(|| format!("missing `{root}` in market data response"))?;

    if let Some(err) = envelope.get("error").filter(|e| !e.is_null()) {
        bail!("market data error: {err}");
    }

    envelope
        .get("result")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .cloned()
        .with_context(|| format!("empty `{root}` result"))
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartData {
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
    #[serde(default)]
    events: ChartEvents,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ChartEvents {
    #[serde(default)]
    dividends: BTreeMap<String, RawDividend>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawDividend {
    amount: f64,
    date: i64,
}

impl ChartData {
    fn bars(&self) -> Vec<PriceBar> {
        let empty = QuoteSeries::default();
        let quote = self.indicators.quote.first().unwrap_or(&empty);
        let at = |series: &[Option<f64>], idx: usize| finite(series.get(idx).copied().flatten());

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(idx, ts)| {
                Some(PriceBar {
                    date: date_from_ts(*ts)?,
                    open: at(&quote.open, idx),
                    high: at(&quote.high, idx),
                    low: at(&quote.low, idx),
                    close: at(&quote.close, idx),
                    volume: at(&quote.volume, idx),
                })
            })
            .collect()
    }

    fn dividends(&self) -> Vec<DividendEvent> {
        let mut out: Vec<DividendEvent> = self
            .events
            .dividends
            .values()
            .filter(|d| d.amount.is_finite())
            .filter_map(|d| {
                Some(DividendEvent {
                    date: date_from_ts(d.date)?,
                    amount: d.amount,
                })
            })
            .collect();
        out.sort_by_key(|d| d.date);
        out
    }
}

fn parse_profile(summary: &Value) -> StockProfile {
    StockProfile {
        company: text(summary, "price", "longName")
            .or_else(|| text(summary, "price", "shortName")),
        sector: text(summary, "assetProfile", "sector"),
        industry: text(summary, "assetProfile", "industry"),
        country: text(summary, "assetProfile", "country"),
        exchange: text(summary, "price", "exchange"),
        currency: text(summary, "price", "currency"),
        market_cap: number(summary, "price", "marketCap"),
        website: text(summary, "assetProfile", "website"),
    }
}

fn parse_financials(summary: &Value) -> Financials {
    Financials {
        valuation: Valuation {
            market_cap: number(summary, "price", "marketCap"),
            pe_ratio: number(summary, "summaryDetail", "trailingPE"),
            pb_ratio: number(summary, "defaultKeyStatistics", "priceToBook"),
            peg_ratio: number(summary, "defaultKeyStatistics", "pegRatio"),
        },
        profitability: Profitability {
            roe: number(summary, "financialData", "returnOnEquity"),
            roa: number(summary, "financialData", "returnOnAssets"),
            operating_margin: number(summary, "financialData", "operatingMargins"),
        },
        dividends: Dividends {
            dividend_yield: number(summary, "summaryDetail", "dividendYield"),
            rate: number(summary, "summaryDetail", "dividendRate"),
            payout_ratio: number(summary, "summaryDetail", "payoutRatio"),
        },
        statements: FinancialStatements {
            income_statement: statement_table(
                summary,
                "incomeStatementHistory",
                "incomeStatementHistory",
            ),
            balance_sheet: statement_table(
                summary,
                "balanceSheetHistory",
                "balanceSheetStatements",
            ),
            cash_flow: statement_table(summary, "cashflowStatementHistory", "cashflowStatements"),
        },
    }
}

fn parse_calendar(summary: &Value) -> EarningsCalendar {
    let earnings = summary.get("calendarEvents").and_then(|c| c.get("earnings"));
    let next_earnings_date = earnings
        .and_then(|e| e.get("earningsDate"))
        .and_then(Value::as_array)
        .and_then(|dates| dates.iter().filter_map(unwrap_raw).next())
        .and_then(|ts| date_from_ts(ts as i64));
    let eps_forecast = earnings
        .and_then(|e| e.get("earningsAverage"))
        .and_then(unwrap_raw);

    EarningsCalendar {
        next_earnings_date,
        eps_forecast,
    }
}

/// One row per statement period, keyed by `endDate`.
fn statement_table(summary: &Value, module: &str, list_key: &str) -> TimeTable {
    let mut table = TimeTable::new();
    let Some(rows) = summary
        .get(module)
        .and_then(|m| m.get(list_key))
        .and_then(Value::as_array)
    else {
        return table;
    };

    for row in rows {
        let Some(obj) = row.as_object() else {
            continue;
        };
        let Some(date) = obj
            .get("endDate")
            .and_then(unwrap_raw)
            .and_then(|ts| date_from_ts(ts as i64))
        else {
            continue;
        };

        let fields = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "endDate" | "maxAge"))
            .filter(|(_, v)| v.is_number() || v.is_object())
            .map(|(k, v)| (k.clone(), unwrap_raw(v)))
            .collect();
        table.insert(date, fields);
    }

    table
}

fn number(summary: &Value, module: &str, key: &str) -> Option<f64> {
    summary.get(module)?.get(key).and_then(unwrap_raw)
}

fn text(summary: &Value, module: &str, key: &str) -> Option<String> {
    let s = summary.get(module)?.get(key)?.as_str()?.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Accepts a bare number or Yahoo's `{"raw": n, "fmt": ".."}` wrapper.
fn unwrap_raw(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::Object(o) => o.get("raw").and_then(Value::as_f64),
        _ => None,
    };
    finite(n)
}

fn finite(v: Option<f64>) -> Option<f64> {
    v.filter(|x| x.is_finite())
}

fn date_from_ts(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}
