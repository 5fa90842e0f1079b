//! Subscriber persistence contract and the registry the engine reads through.

pub mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::model::{
    AnalysisMode, Currency, Instrument, Subscriber, SubscriberId, SubscriberPrefs, Universe,
};
use async_trait::async_trait;
use log::warn;
use std::sync::Arc;

pub const THRESHOLD_OPTIONS: [f64; 3] = [1.0, 3.0, 5.0];
pub const DEFAULT_THRESHOLD: f64 = 3.0;

/// Next value in the `1 → 3 → 5 → 1` sensitivity cycle; anything off the
/// cycle resets to the default.
pub fn next_threshold(current: f64) -> f64 {
    match THRESHOLD_OPTIONS.iter().position(|&t| t == current) {
        Some(i) => THRESHOLD_OPTIONS[(i + 1) % THRESHOLD_OPTIONS.len()],
        None => DEFAULT_THRESHOLD,
    }
}

#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    async fn list_subscribers(&self, pair: &str) -> Result<Vec<Subscriber>>;

    /// Preferences for `id`, registering the subscriber with defaults if unseen.
    async fn get_prefs(&self, id: SubscriberId) -> Result<SubscriberPrefs>;

    /// Flips the subscription and returns whether it is now active.
    async fn toggle_subscription(&self, id: SubscriberId, pair: &str) -> Result<bool>;

    async fn subscriptions(&self, id: SubscriberId) -> Result<Vec<String>>;

    async fn set_currency(&self, id: SubscriberId, currency: Currency) -> Result<()>;

    async fn set_analysis_mode(&self, id: SubscriberId, mode: AnalysisMode) -> Result<()>;

    async fn set_threshold(&self, id: SubscriberId, threshold_pct: f64) -> Result<()>;
}

/// Typed view over a [`SubscriptionStore`]; pairs cross the boundary as
/// validated [`Instrument`]s. Holds no subscriber state of its own, so every
/// read sees the store's current values.
#[derive(Clone)]
pub struct SubscriptionRegistry {
    store: Arc<dyn SubscriptionStore>,
    universe: Universe,
}

impl SubscriptionRegistry {
    pub fn new(store: Arc<dyn SubscriptionStore>, universe: Universe) -> Self {
        Self { store, universe }
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    pub async fn subscribers(&self, instrument: &Instrument) -> Result<Vec<Subscriber>> {
        self.store.list_subscribers(&instrument.to_string()).await
    }

    pub async fn prefs(&self, id: SubscriberId) -> Result<SubscriberPrefs> {
        self.store.get_prefs(id).await
    }

    pub async fn toggle(&self, id: SubscriberId, instrument: &Instrument) -> Result<bool> {
        self.store
            .toggle_subscription(id, &instrument.to_string())
            .await
    }

    /// Active subscriptions, dropping pairs that left the universe.
    pub async fn subscriptions(&self, id: SubscriberId) -> Result<Vec<Instrument>> {
        let pairs = self.store.subscriptions(id).await?;
        Ok(pairs
            .iter()
            .filter_map(|pair| match self.universe.resolve(pair) {
                Ok(instrument) => Some(instrument),
                Err(_) => {
                    warn!("Subscriber {} holds unknown pair {}", id, pair);
                    None
                }
            })
            .collect())
    }

    pub async fn cycle_threshold(&self, id: SubscriberId) -> Result<f64> {
        let prefs = self.store.get_prefs(id).await?;
        let next = next_threshold(prefs.threshold_pct);
        self.store.set_threshold(id, next).await?;
        Ok(next)
    }

    pub async fn toggle_mode(&self, id: SubscriberId) -> Result<AnalysisMode> {
        let prefs = self.store.get_prefs(id).await?;
        let next = prefs.analysis_mode.toggled();
        self.store.set_analysis_mode(id, next).await?;
        Ok(next)
    }

    pub async fn set_currency(&self, id: SubscriberId, currency: Currency) -> Result<()> {
        self.store.get_prefs(id).await?;
        self.store.set_currency(id, currency).await
    }
}
