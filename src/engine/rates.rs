use crate::api::FxEndpoint;
use crate::engine::cache::TtlCache;
use crate::engine::format;
use crate::model::Currency;
use log::{error, info};
use std::sync::Arc;
use std::time::Duration;

/// USD-relative multipliers for the supported display currencies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxRates {
    pub rub: f64,
    pub eur: f64,
}

impl Default for FxRates {
    /// Placeholder rates served until the first successful fetch.
    fn default() -> Self {
        Self { rub: 100.0, eur: 0.95 }
    }
}

impl FxRates {
    pub fn multiplier(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Usd => 1.0,
            Currency::Rub => self.rub,
            Currency::Eur => self.eur,
        }
    }
}

/// Renders a USD-quoted price in `currency` using the tiered display format.
pub fn convert(price_usd: f64, currency: Currency, rates: &FxRates) -> String {
    format::price(currency.symbol(), price_usd * rates.multiplier(currency))
}

/// FX rates behind a TTL cache. Never fails: a failed refresh serves the last
/// known rates, however old.
pub struct RateSource {
    endpoint: Arc<dyn FxEndpoint>,
    cache: TtlCache<(), FxRates>,
}

impl RateSource {
    pub fn new(endpoint: Arc<dyn FxEndpoint>, ttl: Duration) -> Self {
        Self {
            endpoint,
            cache: TtlCache::new(ttl),
        }
    }

    pub async fn get_rates(&self) -> FxRates {
        if let Some(rates) = self.cache.get(&()) {
            return rates;
        }
        let last = self.cache.get_stale(&()).unwrap_or_default();

        match self.endpoint.fetch_rates().await {
            Ok(fetched) => {
                let rates = FxRates {
                    rub: fetched.get(Currency::Rub.code()).copied().unwrap_or(last.rub),
                    eur: fetched.get(Currency::Eur.code()).copied().unwrap_or(last.eur),
                };
                self.cache.put((), rates);
                info!(
                    "Fiat rates updated: USD/RUB={}, USD/EUR={}",
                    rates.rub, rates.eur
                );
                rates
            }
            Err(e) => {
                error!("Fiat update error: {}", e);
                last
            }
        }
    }
}
