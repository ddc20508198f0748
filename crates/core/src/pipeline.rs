use crate::aggregate::{aggregate, ExtractedSections};
use crate::config::Settings;
use crate::domain::recommendation::InferenceResponse;
use crate::domain::snapshot::StructuredSnapshot;
use crate::domain::ticker::TickerSymbol;
use crate::error::SignalError;
use crate::extract::{ExtractorSet, MetricExtractor};
use crate::ingest::{MarketDataProvider, YahooFinanceProvider};
use crate::llm::{self, LlmClient};
use crate::prompt;
use chrono::NaiveDate;
use std::sync::Arc;

/// Ticker in, validated recommendation out.
///
/// Stateless between calls: the only shared pieces are the provider, the
/// extractor choice and the model client, all fixed at construction.
pub struct SignalService {
    provider: Option<Arc<dyn MarketDataProvider>>,
    extractors: ExtractorSet,
    llm: Arc<dyn LlmClient>,
}

impl SignalService {
    pub fn new(
        provider: Option<Arc<dyn MarketDataProvider>>,
        extractors: ExtractorSet,
        llm: Arc<dyn LlmClient>,
    ) -> Self {
        Self {
            provider,
            extractors,
            llm,
        }
    }

    /// Fails with `Configuration` when the selected model's credential is absent.
    pub fn from_settings(settings: &Settings) -> Result<Self, SignalError> {
        let llm = llm::client_from_settings(settings)?;
        let provider = YahooFinanceProvider::from_settings(settings)
            .map_err(|e| SignalError::Configuration(format!("{e:#}")))?;
        let extractors = ExtractorSet::from_settings(settings)?;

        for (section, kind) in extractors.describe() {
            tracing::debug!(%section, ?kind, "extractor configured");
        }

        Ok(Self::new(Some(Arc::new(provider)), extractors, llm))
    }

    pub async fn get_signals(
        &self,
        ticker: &str,
        available_funds: Option<f64>,
    ) -> Result<InferenceResponse, SignalError> {
        let today = chrono::Utc::now().date_naive();
        self.get_signals_as_of(ticker, available_funds, today).await
    }

    pub async fn get_signals_as_of(
        &self,
        ticker: &str,
        available_funds: Option<f64>,
        as_of_date: NaiveDate,
    ) -> Result<InferenceResponse, SignalError> {
        let ticker = TickerSymbol::parse(ticker)?;
        if let Some(funds) = available_funds {
            if !funds.is_finite() || funds < 0.0 {
                return Err(SignalError::InvalidInput(format!(
                    "available_funds must be a non-negative number (got {funds})"
                )));
            }
        }

        let snapshot = self.snapshot(&ticker, as_of_date).await?;
        let rendered = prompt::render_prompt(&snapshot, available_funds)?;
        tracing::debug!(%ticker, prompt_bytes = rendered.len(), "prompt rendered");

        let raw = self.llm.complete(&rendered).await.inspect_err(|err| {
            tracing::warn!(%ticker, provider = ?self.llm.provider(), error = %err, "model call failed");
        })?;

        let response = llm::json::parse_response(&raw).inspect_err(|err| {
            tracing::warn!(%ticker, kind = err.kind(), error = %err, "model response rejected");
        })?;

        for warning in response.warnings() {
            tracing::warn!(%ticker, %warning, "suspicious model response");
        }
        tracing::info!(
            %ticker,
            %as_of_date,
            decisions = response.investment_decisions.len(),
            "signals generated"
        );

        Ok(response)
    }

    /// Runs every extractor in turn and aggregates. The first failure aborts.
    pub async fn snapshot(
        &self,
        ticker: &TickerSymbol,
        as_of_date: NaiveDate,
    ) -> Result<StructuredSnapshot, SignalError> {
        let ex = &self.extractors;
        let sections = ExtractedSections {
            profile: self.run(&*ex.profile, ticker).await?,
            fundamentals: self.run(&*ex.fundamentals, ticker).await?,
            technicals: self.run(&*ex.technicals, ticker).await?,
            sentiment: self.run(&*ex.sentiment, ticker).await?,
            risk: self.run(&*ex.risk, ticker).await?,
            peers: self.run(&*ex.peers, ticker).await?,
            earnings: self.run(&*ex.earnings, ticker).await?,
        };

        let snapshot = aggregate(ticker, as_of_date, sections);
        if tracing::enabled!(tracing::Level::DEBUG) {
            let json = prompt::snapshot_json(&snapshot)?;
            tracing::debug!(%ticker, snapshot = %json, "structured snapshot");
        }
        Ok(snapshot)
    }

    async fn run<T: Send>(
        &self,
        extractor: &dyn MetricExtractor<Output = T>,
        ticker: &TickerSymbol,
    ) -> Result<T, SignalError> {
        let section = extractor.section();
        tracing::debug!(%ticker, %section, kind = ?extractor.kind(), "running extractor");
        extractor
            .extract(ticker, self.provider.as_deref())
            .await
            .inspect_err(|err| {
                tracing::warn!(%ticker, %section, kind = err.kind(), error = %err, "extractor failed");
            })
    }
}
