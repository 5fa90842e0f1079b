use crate::api::binance::rest::BINANCE_REST_URL;
use crate::api::fx::EXCHANGE_RATE_API_URL;
use crate::engine::indicators::{RSI_PERIOD, SMA_PERIOD};
use crate::engine::MonitorSettings;
use crate::error::{CoinwatchError, Result};
use crate::model::SubscriberId;
use log::{info, warn};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_COINS: [&str; 36] = [
    "BTC/USDT", "ETH/USDT", "BNB/USDT", "SOL/USDT", "TON/USDT", "NOT/USDT", "TRX/USDT",
    "XRP/USDT", "DOGE/USDT", "SHIB/USDT", "PEPE/USDT", "HMSTR/USDT", "LTC/USDT", "ADA/USDT",
    "AVAX/USDT", "DOT/USDT", "LINK/USDT", "ATOM/USDT", "NEAR/USDT", "MATIC/USDT", "UNI/USDT",
    "APT/USDT", "ARB/USDT", "OP/USDT", "VET/USDT", "RNDR/USDT", "IMX/USDT", "STX/USDT",
    "SUI/USDT", "TIA/USDT", "SEI/USDT", "FTM/USDT", "INJ/USDT", "LDO/USDT", "RUNE/USDT",
    "AR/USDT",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bot_token: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub db_path: String,
    pub coins: Vec<String>,

    pub rsi_period: usize,
    pub sma_period: usize,
    pub candle_timeframe: String,
    pub candle_limit: usize,

    pub summary_ttl_secs: u64,
    pub fx_ttl_secs: u64,

    pub alert_check_delay_secs: u64,
    pub instrument_delay_ms: u64,
    pub send_delay_ms: u64,
    pub send_timeout_secs: u64,
    pub http_timeout_secs: u64,

    pub binance_base_url: String,
    pub fx_url: String,
    pub log_level: String,

    pub console: bool,
    pub console_user_id: SubscriberId,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            gemini_api_key: String::new(),
            gemini_model: "gemini-2.5-flash".to_string(),
            db_path: "coinwatch.db".to_string(),
            coins: DEFAULT_COINS.iter().map(|c| c.to_string()).collect(),
            rsi_period: RSI_PERIOD,
            sma_period: SMA_PERIOD,
            candle_timeframe: "1h".to_string(),
            candle_limit: 50,
            summary_ttl_secs: 60,
            fx_ttl_secs: 3600,
            alert_check_delay_secs: 60,
            instrument_delay_ms: 1000,
            send_delay_ms: 50,
            send_timeout_secs: 10,
            http_timeout_secs: 10,
            binance_base_url: BINANCE_REST_URL.to_string(),
            fx_url: EXCHANGE_RATE_API_URL.to_string(),
            log_level: "info".to_string(),
            console: true,
            console_user_id: 0,
        }
    }
}

impl AppConfig {
    /// Defaults, then the JSON file named by `COINWATCH_CONFIG` if any, then
    /// environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match std::env::var("COINWATCH_CONFIG") {
            Ok(path) => Self::from_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            warn!("Config file {} not found, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        let config = serde_json::from_str(&content)?;
        info!("Configuration loaded from {}", path);
        Ok(config)
    }

    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("BOT_TOKEN") {
            self.bot_token = token;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini_api_key = key;
        }
        if let Some(db) = lookup("COINWATCH_DB") {
            self.db_path = db;
        }
        if let Some(level) = lookup("COINWATCH_LOG") {
            self.log_level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();
        if self.bot_token.trim().is_empty() {
            errors.push("bot_token is required (set BOT_TOKEN)");
        }
        if self.rsi_period == 0 || self.sma_period == 0 {
            errors.push("indicator periods must be positive");
        }
        if self.candle_limit <= self.rsi_period {
            warn!(
                "candle_limit {} cannot fill RSI({}), forecasts will lack RSI",
                self.candle_limit, self.rsi_period
            );
        }
        if self.summary_ttl_secs == 0 || self.fx_ttl_secs == 0 {
            errors.push("cache TTLs must be positive");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CoinwatchError::Config(errors.join("; ")))
        }
    }

    /// Gemini key, unless blank or still the placeholder.
    pub fn gemini_key(&self) -> Option<&str> {
        let key = self.gemini_api_key.trim();
        if key.is_empty() || key.starts_with("YOUR_") {
            None
        } else {
            Some(key)
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            instrument_delay: Duration::from_millis(self.instrument_delay_ms),
            cycle_delay: Duration::from_secs(self.alert_check_delay_secs),
        }
    }
}
