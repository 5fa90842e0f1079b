// Shared in-memory collaborators for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use coinwatch::api::{FxEndpoint, MarketData, NarrativeGenerator, NotificationTransport};
use coinwatch::model::{Instrument, PriceSample, SubscriberId, Universe};
use coinwatch::{CoinwatchError, DeliveryError, Result};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};

pub fn universe(pairs: &[&str]) -> Universe {
    Universe::new(pairs).unwrap()
}

pub fn down() -> CoinwatchError {
    CoinwatchError::UpstreamStatus {
        service: "test",
        status: 503,
    }
}

/// Serves queued tickers per pair; an exhausted queue is an upstream failure.
#[derive(Default)]
pub struct ScriptedMarket {
    tickers: Mutex<HashMap<String, VecDeque<Option<PriceSample>>>>,
    closes: Mutex<HashMap<String, Vec<f64>>>,
    ticker_calls: Mutex<usize>,
}

impl ScriptedMarket {
    pub fn push_price(&self, pair: &str, price: f64) {
        self.push_sample(pair, PriceSample::at(price));
    }

    pub fn push_sample(&self, pair: &str, sample: PriceSample) {
        self.tickers
            .lock()
            .entry(pair.to_string())
            .or_default()
            .push_back(Some(sample));
    }

    pub fn push_failure(&self, pair: &str) {
        self.tickers
            .lock()
            .entry(pair.to_string())
            .or_default()
            .push_back(None);
    }

    pub fn set_closes(&self, pair: &str, closes: Vec<f64>) {
        self.closes.lock().insert(pair.to_string(), closes);
    }

    pub fn ticker_calls(&self) -> usize {
        *self.ticker_calls.lock()
    }
}

#[async_trait]
impl MarketData for ScriptedMarket {
    async fn fetch_last_price(&self, instrument: &Instrument) -> Result<PriceSample> {
        *self.ticker_calls.lock() += 1;
        self.tickers
            .lock()
            .get_mut(&instrument.to_string())
            .and_then(|q| q.pop_front())
            .flatten()
            .ok_or_else(down)
    }

    async fn fetch_recent_closes(
        &self,
        instrument: &Instrument,
        _timeframe: &str,
        count: usize,
    ) -> Result<Vec<f64>> {
        let closes = self
            .closes
            .lock()
            .get(&instrument.to_string())
            .cloned()
            .ok_or_else(down)?;
        let skip = closes.len().saturating_sub(count);
        Ok(closes[skip..].to_vec())
    }
}

#[derive(Default)]
pub struct RecordingTransport {
    pub delivered: Mutex<Vec<(SubscriberId, String)>>,
    pub attempts: Mutex<Vec<SubscriberId>>,
    pub blocked: Mutex<HashSet<SubscriberId>>,
}

impl RecordingTransport {
    pub fn block(&self, id: SubscriberId) {
        self.blocked.lock().insert(id);
    }

    pub fn delivered(&self) -> Vec<(SubscriberId, String)> {
        self.delivered.lock().clone()
    }

    pub fn take(&self) -> Vec<(SubscriberId, String)> {
        std::mem::take(&mut *self.delivered.lock())
    }
}

#[async_trait]
impl NotificationTransport for RecordingTransport {
    async fn send_text(
        &self,
        recipient: SubscriberId,
        text: &str,
    ) -> std::result::Result<(), DeliveryError> {
        self.attempts.lock().push(recipient);
        if self.blocked.lock().contains(&recipient) {
            return Err(DeliveryError::Blocked);
        }
        self.delivered.lock().push((recipient, text.to_string()));
        Ok(())
    }
}

/// RUB 90, EUR 0.9 while `up`; failing otherwise.
pub struct FixedFx {
    pub up: Mutex<bool>,
}

impl FixedFx {
    pub fn up() -> Self {
        Self {
            up: Mutex::new(true),
        }
    }
}

#[async_trait]
impl FxEndpoint for FixedFx {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>> {
        if *self.up.lock() {
            Ok(HashMap::from([
                ("RUB".to_string(), 90.0),
                ("EUR".to_string(), 0.9),
            ]))
        } else {
            Err(down())
        }
    }
}

pub struct CannedGenerator {
    pub reply: Option<String>,
    pub prompts: Mutex<Vec<String>>,
}

impl CannedGenerator {
    pub fn new(reply: Option<&str>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl NarrativeGenerator for CannedGenerator {
    async fn generate(&self, prompt: &str) -> Result<Option<String>> {
        self.prompts.lock().push(prompt.to_string());
        self.reply.clone().map(Some).ok_or_else(down)
    }
}
