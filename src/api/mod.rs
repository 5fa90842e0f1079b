//! Remote collaborators the engine consumes, and their HTTP implementations.

pub mod binance;
pub mod fx;
pub mod gemini;
pub mod telegram;

use crate::error::{DeliveryError, Result};
use crate::model::{Instrument, PriceSample, SubscriberId};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait MarketData: Send + Sync {
    async fn fetch_last_price(&self, instrument: &Instrument) -> Result<PriceSample>;

    /// Close prices of the most recent `count` candles, oldest first.
    async fn fetch_recent_closes(
        &self,
        instrument: &Instrument,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<f64>>;
}

#[async_trait]
pub trait FxEndpoint: Send + Sync {
    /// Multipliers from one USD into each currency code.
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>>;
}

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait NotificationTransport: Send + Sync {
    async fn send_text(
        &self,
        recipient: SubscriberId,
        text: &str,
    ) -> std::result::Result<(), DeliveryError>;
}
