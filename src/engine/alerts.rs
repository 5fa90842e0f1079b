use crate::api::MarketData;
use crate::engine::dispatch::NotificationDispatcher;
use crate::engine::rates::{convert, FxRates, RateSource};
use crate::model::Instrument;
use crate::store::SubscriptionRegistry;
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct MonitorSettings {
    /// Pause after each instrument fetch.
    pub instrument_delay: Duration,
    /// Pause after a full pass over the universe.
    pub cycle_delay: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            instrument_delay: Duration::from_secs(1),
            cycle_delay: Duration::from_secs(60),
        }
    }
}

/// What one evaluation of an instrument did.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// Price or subscriber fetch failed; retried naturally next cycle.
    Skipped,
    /// First sighting, baseline recorded.
    Seeded { price: f64 },
    /// Baseline was not positive, no percentage could be computed.
    InvalidBaseline,
    /// No subscriber threshold crossed; baseline kept.
    Quiet { change_pct: f64 },
    /// At least one subscriber alerted; baseline reset to `price`.
    Alerted {
        change_pct: f64,
        price: f64,
        recipients: usize,
    },
}

pub fn format_alert(instrument: &Instrument, change_pct: f64, baseline: f64, price: &str) -> String {
    let arrow = if change_pct > 0.0 { "🚀" } else { "🔻" };
    format!(
        "🚨 Move on {instrument}\n{arrow} {change_pct:.2}% (from {baseline:.4})\nCurrent price: {price}"
    )
}

/// Polls every instrument of the universe and alerts subscribers whose
/// threshold is crossed relative to the instrument's baseline.
///
/// Baselines live only in this value and are mutated through `&mut self`, so
/// the monitor task is their sole owner. A baseline only moves when an alert
/// is sent; small moves accumulate until some threshold is met. The reset is
/// shared by all subscribers of the instrument.
pub struct AlertMonitor {
    market: Arc<dyn MarketData>,
    registry: SubscriptionRegistry,
    rates: Arc<RateSource>,
    dispatcher: NotificationDispatcher,
    settings: MonitorSettings,
    baselines: HashMap<Instrument, f64>,
}

impl AlertMonitor {
    pub fn new(
        market: Arc<dyn MarketData>,
        registry: SubscriptionRegistry,
        rates: Arc<RateSource>,
        dispatcher: NotificationDispatcher,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            market,
            registry,
            rates,
            dispatcher,
            settings,
            baselines: HashMap::new(),
        }
    }

    pub fn baseline(&self, instrument: &Instrument) -> Option<f64> {
        self.baselines.get(instrument).copied()
    }

    pub async fn evaluate(&mut self, instrument: &Instrument) -> Evaluation {
        let price = match self.market.fetch_last_price(instrument).await {
            Ok(sample) => sample.price,
            Err(e) => {
                error!("Monitor error {}: {}", instrument, e);
                return Evaluation::Skipped;
            }
        };

        let Some(baseline) = self.baseline(instrument) else {
            debug!("{}: baseline seeded at {}", instrument, price);
            self.baselines.insert(instrument.clone(), price);
            return Evaluation::Seeded { price };
        };
        if baseline <= 0.0 {
            debug!("{}: non-positive baseline {}, skipping", instrument, baseline);
            return Evaluation::InvalidBaseline;
        }

        let change_pct = (price - baseline) / baseline * 100.0;
        let subscribers = match self.registry.subscribers(instrument).await {
            Ok(subs) => subs,
            Err(e) => {
                error!("Subscriber lookup failed for {}: {}", instrument, e);
                return Evaluation::Skipped;
            }
        };

        let mut rates: Option<FxRates> = None;
        let mut recipients = 0;
        for sub in subscribers
            .iter()
            .filter(|s| change_pct.abs() >= s.threshold_pct)
        {
            let fx = match rates {
                Some(fx) => fx,
                None => {
                    let fetched = self.rates.get_rates().await;
                    rates = Some(fetched);
                    fetched
                }
            };
            let text = format_alert(
                instrument,
                change_pct,
                baseline,
                &convert(price, sub.currency, &fx),
            );
            self.dispatcher.send(sub.id, &text).await;
            recipients += 1;
        }

        if recipients == 0 {
            return Evaluation::Quiet { change_pct };
        }
        info!(
            "{}: {:+.2}% from {} alerted {} subscriber(s), baseline now {}",
            instrument, change_pct, baseline, recipients, price
        );
        self.baselines.insert(instrument.clone(), price);
        Evaluation::Alerted {
            change_pct,
            price,
            recipients,
        }
    }

    /// One pass over the universe in its configured order.
    pub async fn run_cycle(&mut self) {
        let instruments: Vec<Instrument> = self.registry.universe().iter().cloned().collect();
        for instrument in &instruments {
            self.evaluate(instrument).await;
            tokio::time::sleep(self.settings.instrument_delay).await;
        }
    }

    /// Runs until the task is dropped.
    pub async fn run(mut self) {
        info!(
            "Background monitor started over {} instruments",
            self.registry.universe().len()
        );
        loop {
            self.run_cycle().await;
            tokio::time::sleep(self.settings.cycle_delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Universe;

    #[test]
    fn test_alert_text_direction() {
        let universe = Universe::new(&["TON/USDT"]).unwrap();
        let ton = universe.resolve("TON/USDT").unwrap();

        let up = format_alert(&ton, 4.0, 100.0, "$104");
        assert_eq!(up, "🚨 Move on TON/USDT\n🚀 4.00% (from 100.0000)\nCurrent price: $104");

        let down = format_alert(&ton, -3.456, 2.5, "$2.41");
        assert!(down.contains("🔻 -3.46% (from 2.5000)"));
    }
}
