use coinwatch::api::binance::BinanceRest;
use coinwatch::api::fx::ExchangeRateApi;
use coinwatch::api::gemini::GeminiGenerator;
use coinwatch::api::telegram::TelegramTransport;
use coinwatch::api::NarrativeGenerator;
use coinwatch::config::AppConfig;
use coinwatch::console;
use coinwatch::engine::{AlertMonitor, NotificationDispatcher, RateSource, SummaryProvider};
use coinwatch::handlers::{SnapshotService, SnapshotSettings};
use coinwatch::model::Universe;
use coinwatch::store::{SqliteStore, SubscriptionRegistry};
use env_logger::Builder;
use log::{info, LevelFilter};
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

fn init_logger(level: &str) {
    let crate_level = match level.to_ascii_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    };
    Builder::new()
        .filter_level(LevelFilter::Info.min(crate_level))
        .filter_module("coinwatch", crate_level)
        .format(|buf, record| {
            let ts = chrono::Local::now().format("%H:%M:%S%.3f");
            writeln!(
                buf,
                "[{} {:<5} {}] {}",
                ts,
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_logger(&config.log_level);

    info!("Starting coinwatch...");

    let universe = Universe::new(&config.coins)?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()?;

    let store = Arc::new(SqliteStore::open(&config.db_path)?);
    let registry = SubscriptionRegistry::new(store, universe);

    let market = Arc::new(BinanceRest::new(http.clone(), &config.binance_base_url));
    let rates = Arc::new(RateSource::new(
        Arc::new(ExchangeRateApi::new(http.clone(), &config.fx_url)),
        Duration::from_secs(config.fx_ttl_secs),
    ));
    let dispatcher = NotificationDispatcher::new(
        Arc::new(TelegramTransport::new(http.clone(), &config.bot_token)),
        Duration::from_millis(config.send_delay_ms),
        Duration::from_secs(config.send_timeout_secs),
    );

    let generator: Option<Arc<dyn NarrativeGenerator>> = match config.gemini_key() {
        Some(key) => Some(Arc::new(GeminiGenerator::new(
            http.clone(),
            key,
            &config.gemini_model,
        )) as Arc<dyn NarrativeGenerator>),
        None => {
            info!("Gemini key not configured, forecasts use the rule-based verdict");
            None
        }
    };
    if generator.is_some() {
        info!("Narrative generator: {}", config.gemini_model);
    }
    let summary_ttl = Duration::from_secs(config.summary_ttl_secs);
    let summaries = Arc::new(SummaryProvider::new(generator, summary_ttl));

    let snapshots = Arc::new(SnapshotService::new(
        market.clone(),
        registry.clone(),
        rates.clone(),
        summaries,
        summary_ttl,
        SnapshotSettings {
            rsi_period: config.rsi_period,
            sma_period: config.sma_period,
            candle_timeframe: config.candle_timeframe.clone(),
            candle_limit: config.candle_limit,
        },
    ));

    let monitor = AlertMonitor::new(
        market,
        registry,
        rates,
        dispatcher,
        config.monitor_settings(),
    );
    let monitor_handle = tokio::spawn(monitor.run());
    if config.console {
        tokio::spawn(console::run(snapshots, config.console_user_id));
    }

    tokio::select! {
        _ = monitor_handle => {},
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received");
        },
    };

    info!("Shutdown complete");
    Ok(())
}
