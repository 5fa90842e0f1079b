//! Request-driven handlers sharing the monitor's caches and registry.
//!
//! Every handler returns user-facing text. Failures are logged with their
//! cause and answered with a generic message.

use crate::api::MarketData;
use crate::engine::cache::TtlCache;
use crate::engine::format::grouped;
use crate::engine::indicators::{compute_rsi, compute_sma};
use crate::engine::narrative::Verdict;
use crate::engine::rates::{convert, RateSource};
use crate::engine::summary::{MarketContext, SummaryProvider};
use crate::error::Result;
use crate::model::{AnalysisMode, Currency, Instrument, SubscriberId};
use crate::store::SubscriptionRegistry;
use log::error;
use std::sync::Arc;

pub const TRY_AGAIN_LATER: &str = "⚠️ Could not fetch market data, please try again later.";
pub const PAIR_NOT_FOUND: &str = "⚠️ Could not find this pair on the exchange.";
pub const UNKNOWN_CURRENCY: &str = "⚠️ Unknown currency. Choose one of: USD, RUB, EUR.";
const LOW_LIQUIDITY_VOLUME: f64 = 1_000_000.0;

#[derive(Debug, Clone)]
pub struct SnapshotSettings {
    pub rsi_period: usize,
    pub sma_period: usize,
    pub candle_timeframe: String,
    pub candle_limit: usize,
}

type ReportKey = (Instrument, Currency, AnalysisMode);

pub struct SnapshotService {
    market: Arc<dyn MarketData>,
    registry: SubscriptionRegistry,
    rates: Arc<RateSource>,
    summaries: Arc<SummaryProvider>,
    reports: TtlCache<ReportKey, String>,
    settings: SnapshotSettings,
}

impl SnapshotService {
    /// Rendered forecasts are cached for as long as generated summaries.
    pub fn new(
        market: Arc<dyn MarketData>,
        registry: SubscriptionRegistry,
        rates: Arc<RateSource>,
        summaries: Arc<SummaryProvider>,
        report_ttl: std::time::Duration,
        settings: SnapshotSettings,
    ) -> Self {
        Self {
            market,
            registry,
            rates,
            summaries,
            reports: TtlCache::new(report_ttl),
            settings,
        }
    }

    pub async fn forecast(&self, user: SubscriberId, pair: &str) -> String {
        match self.try_forecast(user, pair).await {
            Ok(text) => text,
            Err(e) => {
                error!("Forecast error {}: {}", pair, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    async fn try_forecast(&self, user: SubscriberId, pair: &str) -> Result<String> {
        let instrument = self.registry.universe().resolve(pair)?;
        let prefs = self.registry.prefs(user).await?;
        let key = (instrument.clone(), prefs.currency, prefs.analysis_mode);
        if let Some(cached) = self.reports.get(&key) {
            return Ok(cached);
        }

        let sample = self.market.fetch_last_price(&instrument).await?;
        let closes = self
            .market
            .fetch_recent_closes(
                &instrument,
                &self.settings.candle_timeframe,
                self.settings.candle_limit,
            )
            .await?;

        let price = sample.price;
        let rsi = compute_rsi(&closes, self.settings.rsi_period);
        let change_24h = sample.pct_change_24h.unwrap_or(0.0);
        let high = sample.high_24h.unwrap_or(price);
        let distance_from_high_pct = if high != 0.0 {
            (high - price) / high * 100.0
        } else {
            0.0
        };

        let rates = self.rates.get_rates().await;
        let price_str = convert(price, prefs.currency, &rates);

        let generated = match prefs.analysis_mode {
            AnalysisMode::Ai => {
                let ctx = MarketContext {
                    price,
                    rsi,
                    sma: compute_sma(&closes, self.settings.sma_period),
                    change_24h,
                    volume_24h: sample.volume_24h.unwrap_or(0.0),
                    distance_from_high_pct,
                    mode: prefs.analysis_mode,
                };
                self.summaries
                    .get_summary(&instrument, prefs.currency, &ctx)
                    .await
            }
            AnalysisMode::Algorithmic => None,
        };

        let report = match generated {
            Some(text) => {
                let rsi_label = rsi
                    .map(|v| format!("{}", v.trunc()))
                    .unwrap_or_else(|| "-".to_string());
                format!(
                    "🧠 AI forecast for {instrument}\n\n💰 Price: {price_str}\n\
                     RSI({period}): {rsi_label} | 24h: {change_24h:.2}%\n\n{text}",
                    period = self.settings.rsi_period,
                )
            }
            None => fallback_report(&instrument, &price_str, rsi),
        };

        self.reports.put(key, report.clone());
        Ok(report)
    }

    pub async fn stats(&self, user: SubscriberId, pair: &str) -> String {
        match self.try_stats(user, pair).await {
            Ok(text) => text,
            Err(e) => {
                error!("Stats error {}: {}", pair, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    async fn try_stats(&self, user: SubscriberId, pair: &str) -> Result<String> {
        let instrument = self.registry.universe().resolve(pair)?;
        let prefs = self.registry.prefs(user).await?;
        let sample = self.market.fetch_last_price(&instrument).await?;

        let price = sample.price;
        let change_pct = sample.pct_change_24h.unwrap_or(0.0);
        let abs_change = price - sample.open_24h.unwrap_or(price);
        let high = sample.high_24h.unwrap_or(price);
        let low = sample.low_24h.unwrap_or(price);
        let volume = sample.volume_24h.unwrap_or(0.0);

        let rates = self.rates.get_rates().await;
        let price_str = convert(price, prefs.currency, &rates);
        let sign = if change_pct >= 0.0 { "+" } else { "" };
        let liquidity = if volume < LOW_LIQUIDITY_VOLUME {
            "\n⚠️ Low liquidity. Spreads may be wide."
        } else {
            ""
        };
        let quote = instrument.quote();

        Ok(format!(
            "📊 24h stats: {instrument}\n\n\
             💰 Price: {price_str}\n\
             📈 Change: {sign}{change_pct:.2}% ({abs_change:+.4} {quote})\n\n\
             🔝 High 24h: {high:.4}\n\
             🔻 Low 24h: {low:.4}\n\
             💸 Volume: {volume} {quote}{liquidity}",
            volume = grouped(volume, 0),
        ))
    }

    /// Answers `"<amount> <SYMBOL>"` messages; `None` when the text is not one.
    pub async fn convert_amount(&self, text: &str) -> Option<String> {
        let (amount, symbol) = parse_amount(text)?;
        let reply = match self.try_convert(amount, &symbol).await {
            Ok(reply) => reply,
            Err(e) => {
                error!("Converter error {}: {}", symbol, e);
                PAIR_NOT_FOUND.to_string()
            }
        };
        Some(reply)
    }

    async fn try_convert(&self, amount: f64, symbol: &str) -> Result<String> {
        let instrument = Instrument::parse(&format!("{symbol}/USDT"))?;
        let sample = self.market.fetch_last_price(&instrument).await?;
        let total_usd = amount * sample.price;
        let rates = self.rates.get_rates().await;

        Ok(format!(
            "🧮 Converting {amount} {symbol}\n\n≈ {usd} USD\n≈ {rub} RUB\n≈ {eur} EUR",
            usd = grouped(total_usd, 2),
            rub = grouped(total_usd * rates.multiplier(Currency::Rub), 2),
            eur = grouped(total_usd * rates.multiplier(Currency::Eur), 2),
        ))
    }

    pub async fn toggle_subscription(&self, user: SubscriberId, pair: &str) -> String {
        let toggled = match self.registry.universe().resolve(pair) {
            Ok(instrument) => self.registry.toggle(user, &instrument).await,
            Err(e) => Err(e),
        };
        match toggled {
            Ok(true) => "Subscription enabled".to_string(),
            Ok(false) => "Subscription disabled".to_string(),
            Err(e) => {
                error!("Subscription toggle failed for {} {}: {}", user, pair, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    pub async fn subscriptions_overview(&self, user: SubscriberId) -> String {
        match self.registry.subscriptions(user).await {
            Ok(list) if list.is_empty() => "🔔 No active subscriptions".to_string(),
            Ok(list) => {
                let names: Vec<String> = list.iter().map(|i| i.to_string()).collect();
                format!("🔔 Subscriptions: {}", names.join(", "))
            }
            Err(e) => {
                error!("Subscription listing failed for {}: {}", user, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    pub async fn cycle_threshold(&self, user: SubscriberId) -> String {
        match self.registry.cycle_threshold(user).await {
            Ok(value) => format!("Sensitivity: {value:.1}%"),
            Err(e) => {
                error!("Threshold update failed for {}: {}", user, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    pub async fn toggle_mode(&self, user: SubscriberId) -> String {
        match self.registry.toggle_mode(user).await {
            Ok(AnalysisMode::Ai) => "Mode: AI".to_string(),
            Ok(AnalysisMode::Algorithmic) => "Mode: Algorithmic".to_string(),
            Err(e) => {
                error!("Mode update failed for {}: {}", user, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }

    pub async fn set_currency(&self, user: SubscriberId, code: &str) -> String {
        let Some(currency) = Currency::parse(code) else {
            return UNKNOWN_CURRENCY.to_string();
        };
        match self.registry.set_currency(user, currency).await {
            Ok(()) => format!("Display currency: {}", currency.code()),
            Err(e) => {
                error!("Currency update failed for {}: {}", user, e);
                TRY_AGAIN_LATER.to_string()
            }
        }
    }
}

pub fn fallback_report(instrument: &Instrument, price: &str, rsi: Option<f64>) -> String {
    let verdict = Verdict::from_rsi(rsi);
    format!(
        "🧠 Forecast for {instrument}\n\n💰 Price: {price}\n🌡 Market thermometer: {}\n\n🗣 {}\n\n⚖️ Verdict: {}",
        verdict.thermometer(),
        verdict.comment(),
        verdict.call(),
    )
}

/// Splits `"0.5 btc"` into `(0.5, "BTC")`. A comma is read as decimal point.
pub fn parse_amount(text: &str) -> Option<(f64, String)> {
    let mut parts = text.split_whitespace();
    let (amount, symbol) = (parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }
    let amount = amount.replace(',', ".");
    let numeric = amount.chars().all(|c| c.is_ascii_digit() || c == '.')
        && amount.chars().filter(|&c| c == '.').count() <= 1
        && amount.starts_with(|c: char| c.is_ascii_digit())
        && amount.ends_with(|c: char| c.is_ascii_digit());
    if !numeric || !symbol.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((amount.parse().ok()?, symbol.to_ascii_uppercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100 TON"), Some((100.0, "TON".to_string())));
        assert_eq!(parse_amount(" 0.5   btc "), Some((0.5, "BTC".to_string())));
        assert_eq!(parse_amount("2,5 eth"), Some((2.5, "ETH".to_string())));
        assert_eq!(parse_amount("TON 100"), None);
        assert_eq!(parse_amount("100"), None);
        assert_eq!(parse_amount("1.2.3 BTC"), None);
        assert_eq!(parse_amount(".5 BTC"), None);
        assert_eq!(parse_amount("5 BTC please"), None);
        assert_eq!(parse_amount("5 B2C"), None);
    }
}
