use anyhow::Context;
use clap::Parser;
use signals_core::config::Settings;
use signals_core::domain::ticker::TickerSymbol;
use signals_core::SignalService;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "signals", about = "Buy/hold/avoid recommendation for one ticker")]
struct Args {
    /// Ticker symbol, e.g. AAPL or TCS.NS.
    ticker: String,

    /// Capital available for the position; lets the model size allocation_pct.
    #[arg(long)]
    available_funds: Option<f64>,

    /// Analysis date (YYYY-MM-DD). Defaults to today's UTC date.
    #[arg(long)]
    as_of_date: Option<String>,

    /// Print the structured snapshot and stop before calling the model.
    #[arg(long)]
    snapshot_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env();
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = run(&settings, &args).await;
    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(ticker = %args.ticker, error = %err, "signals run failed");
    }
    result
}

async fn run(settings: &Settings, args: &Args) -> anyhow::Result<()> {
    // Missing credentials stop the process here, before any data is fetched.
    let service = SignalService::from_settings(settings)?;

    let as_of_date =
        signals_core::time::resolve_as_of_date(args.as_of_date.as_deref(), chrono::Utc::now())
            .context("invalid --as-of-date")?;

    let output = if args.snapshot_only {
        let ticker = TickerSymbol::parse(&args.ticker)?;
        let snapshot = service.snapshot(&ticker, as_of_date).await?;
        serde_json::to_string_pretty(&snapshot)?
    } else {
        let response = service
            .get_signals_as_of(&args.ticker, args.available_funds, as_of_date)
            .await?;
        serde_json::to_string_pretty(&response)?
    };

    println!("{output}");
    Ok(())
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
