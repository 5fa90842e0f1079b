use crate::api::NarrativeGenerator;
use crate::engine::cache::TtlCache;
use crate::model::{AnalysisMode, Currency, Instrument};
use log::{error, warn};
use std::sync::Arc;
use std::time::Duration;

const SYSTEM_PROMPT: &str = "You are a seasoned crypto trader with a cynical but professional \
    voice. Analyse the technical data of the coin and give a short, blunt and clear verdict. \
    Do not use jargon without explaining it. Say plainly: buy, sell or wait. Use emoji.";

/// Numeric inputs embedded in the generator prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketContext {
    pub price: f64,
    pub rsi: Option<f64>,
    pub sma: Option<f64>,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub distance_from_high_pct: f64,
    pub mode: AnalysisMode,
}

pub fn build_prompt(instrument: &Instrument, ctx: &MarketContext) -> String {
    let rsi = ctx
        .rsi
        .map(|v| format!("{v:.2}"))
        .unwrap_or_else(|| "no data".to_string());
    let sma = ctx
        .sma
        .map(|v| format!("{v:.4}"))
        .unwrap_or_else(|| "no data".to_string());
    format!(
        "{SYSTEM_PROMPT}\n\n\
         Coin: {instrument}\n\
         Current price ({quote}): {price:.4}\n\
         RSI(14): {rsi}\n\
         SMA(20): {sma}\n\
         24h change (%): {change:.2}\n\
         24h volume ({quote}): {volume:.0}\n\
         Distance from 24h high (%): {distance:.2}\n\
         Analysis mode: {mode}\n\n\
         Write a short conclusion in 3-6 sentences.",
        quote = instrument.quote(),
        price = ctx.price,
        change = ctx.change_24h,
        volume = ctx.volume_24h,
        distance = ctx.distance_from_high_pct,
        mode = ctx.mode.code(),
    )
}

/// Generated narratives keyed by (instrument, display currency).
///
/// A cache hit is returned as-is even if the market moved inside the TTL.
pub struct SummaryProvider {
    generator: Option<Arc<dyn NarrativeGenerator>>,
    cache: TtlCache<(Instrument, Currency), String>,
}

impl SummaryProvider {
    pub fn new(generator: Option<Arc<dyn NarrativeGenerator>>, ttl: Duration) -> Self {
        Self {
            generator,
            cache: TtlCache::new(ttl),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.generator.is_some()
    }

    pub async fn get_summary(
        &self,
        instrument: &Instrument,
        currency: Currency,
        ctx: &MarketContext,
    ) -> Option<String> {
        let key = (instrument.clone(), currency);
        if let Some(text) = self.cache.get(&key) {
            return Some(text);
        }
        let generator = self.generator.as_ref()?;

        match generator.generate(&build_prompt(instrument, ctx)).await {
            Ok(Some(text)) => {
                self.cache.put(key, text.clone());
                Some(text)
            }
            Ok(None) => {
                warn!("Generator returned no text for {}", instrument);
                None
            }
            Err(e) => {
                error!("Generator error for {}: {}", instrument, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoinwatchError, Result};
    use crate::model::Universe;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct CountingGenerator {
        reply: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl NarrativeGenerator for CountingGenerator {
        async fn generate(&self, prompt: &str) -> Result<Option<String>> {
            self.prompts.lock().push(prompt.to_string());
            match self.reply {
                Some(text) => Ok(Some(text.to_string())),
                None => Err(CoinwatchError::UpstreamStatus {
                    service: "gemini",
                    status: 500,
                }),
            }
        }
    }

    fn generator(reply: Option<&'static str>) -> Arc<CountingGenerator> {
        Arc::new(CountingGenerator {
            reply,
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn btc() -> Instrument {
        Universe::new(&["BTC/USDT"]).unwrap().resolve("BTC/USDT").unwrap()
    }

    fn ctx(price: f64) -> MarketContext {
        MarketContext {
            price,
            rsi: Some(55.5),
            sma: None,
            change_24h: 1.25,
            volume_24h: 1_000_000.0,
            distance_from_high_pct: 2.0,
            mode: AnalysisMode::Ai,
        }
    }

    #[test]
    fn test_prompt_embeds_all_fields() {
        let prompt = build_prompt(&btc(), &ctx(64000.5));
        assert!(prompt.contains("Coin: BTC/USDT"));
        assert!(prompt.contains("Current price (USDT): 64000.5000"));
        assert!(prompt.contains("RSI(14): 55.50"));
        assert!(prompt.contains("SMA(20): no data"));
        assert!(prompt.contains("24h change (%): 1.25"));
        assert!(prompt.contains("24h volume (USDT): 1000000"));
        assert!(prompt.contains("Distance from 24h high (%): 2.00"));

        let no_rsi = MarketContext { rsi: None, ..ctx(1.0) };
        assert!(build_prompt(&btc(), &no_rsi).contains("RSI(14): no data"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_skips_generator_even_if_inputs_changed() {
        let gen = generator(Some("Wait."));
        let provider = SummaryProvider::new(Some(gen.clone()), Duration::from_secs(60));

        assert_eq!(provider.get_summary(&btc(), Currency::Usd, &ctx(100.0)).await.as_deref(), Some("Wait."));
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(provider.get_summary(&btc(), Currency::Usd, &ctx(250.0)).await.as_deref(), Some("Wait."));
        assert_eq!(gen.prompts.lock().len(), 1);

        // different currency is a different key
        provider.get_summary(&btc(), Currency::Eur, &ctx(100.0)).await;
        assert_eq!(gen.prompts.lock().len(), 2);

        tokio::time::advance(Duration::from_secs(31)).await;
        provider.get_summary(&btc(), Currency::Usd, &ctx(100.0)).await;
        assert_eq!(gen.prompts.lock().len(), 3);
    }

    #[tokio::test]
    async fn test_generator_error_is_absent_and_not_cached() {
        let gen = generator(None);
        let provider = SummaryProvider::new(Some(gen.clone()), Duration::from_secs(60));
        assert_eq!(provider.get_summary(&btc(), Currency::Usd, &ctx(1.0)).await, None);
        assert_eq!(provider.get_summary(&btc(), Currency::Usd, &ctx(1.0)).await, None);
        assert_eq!(gen.prompts.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_without_generator_is_absent() {
        let provider = SummaryProvider::new(None, Duration::from_secs(60));
        assert!(!provider.is_enabled());
        assert_eq!(provider.get_summary(&btc(), Currency::Usd, &ctx(1.0)).await, None);
    }
}
