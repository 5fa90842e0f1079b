use crate::error::{CoinwatchError, Result};
use std::collections::HashSet;
use std::fmt;

/// A base/quote pair from the configured coin universe, e.g. `BTC/USDT`.
///
/// Only obtainable through [`Universe`], so any `Instrument` in hand is known
/// to be monitored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Instrument {
    base: String,
    quote: String,
}

impl Instrument {
    /// Validates the `BASE/QUOTE` shape only; universe membership is checked
    /// by [`Universe`].
    pub(crate) fn parse(pair: &str) -> Result<Self> {
        let (base, quote) = pair
            .split_once('/')
            .ok_or_else(|| CoinwatchError::Config(format!("pair without '/': {pair:?}")))?;
        let valid = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric());
        if !valid(base) || !valid(quote) {
            return Err(CoinwatchError::Config(format!("malformed pair: {pair:?}")));
        }
        Ok(Self {
            base: base.to_ascii_uppercase(),
            quote: quote.to_ascii_uppercase(),
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Exchange symbol without separator, `BTCUSDT`.
    pub fn exchange_symbol(&self) -> String {
        format!("{}{}", self.base, self.quote)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// The fixed, ordered set of instruments known at startup.
#[derive(Debug, Clone)]
pub struct Universe {
    instruments: Vec<Instrument>,
}

impl Universe {
    pub fn new<S: AsRef<str>>(pairs: &[S]) -> Result<Self> {
        if pairs.is_empty() {
            return Err(CoinwatchError::Config("coin universe is empty".into()));
        }
        let mut seen = HashSet::new();
        let mut instruments = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let instrument = Instrument::parse(pair.as_ref())?;
            if !seen.insert(instrument.clone()) {
                return Err(CoinwatchError::Config(format!(
                    "duplicate pair in universe: {instrument}"
                )));
            }
            instruments.push(instrument);
        }
        Ok(Self { instruments })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instrument> {
        self.instruments.iter()
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }

    /// Looks up a pair by its display form, case-insensitively.
    pub fn resolve(&self, pair: &str) -> Result<Instrument> {
        let wanted = pair.trim().to_ascii_uppercase();
        self.instruments
            .iter()
            .find(|i| i.to_string() == wanted)
            .cloned()
            .ok_or(CoinwatchError::UnknownInstrument(wanted))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Currency {
    Usd,
    Rub,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Usd, Currency::Rub, Currency::Eur];

    /// Strict lookup for user input.
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
    }

    /// Lenient lookup for stored values: unrecognised codes degrade to USD,
    /// which renders the raw quote value.
    pub fn from_code(code: &str) -> Self {
        Self::parse(code).unwrap_or(Currency::Usd)
    }

    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Rub => "RUB",
            Currency::Eur => "EUR",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Rub => "₽",
            Currency::Eur => "€",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    Ai,
    Algorithmic,
}

impl AnalysisMode {
    pub fn from_code(code: &str) -> Self {
        if code.eq_ignore_ascii_case("ALG") {
            AnalysisMode::Algorithmic
        } else {
            AnalysisMode::Ai
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AnalysisMode::Ai => "AI",
            AnalysisMode::Algorithmic => "ALG",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AnalysisMode::Ai => AnalysisMode::Algorithmic,
            AnalysisMode::Algorithmic => AnalysisMode::Ai,
        }
    }
}

/// Ticker snapshot as observed at fetch time.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSample {
    pub price: f64,
    pub open_24h: Option<f64>,
    pub high_24h: Option<f64>,
    pub low_24h: Option<f64>,
    pub volume_24h: Option<f64>,
    pub pct_change_24h: Option<f64>,
}

impl PriceSample {
    pub fn at(price: f64) -> Self {
        Self {
            price,
            open_24h: None,
            high_24h: None,
            low_24h: None,
            volume_24h: None,
            pct_change_24h: None,
        }
    }
}

pub type SubscriberId = i64;

/// One row of the per-instrument subscriber listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub threshold_pct: f64,
    pub currency: Currency,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberPrefs {
    pub currency: Currency,
    pub analysis_mode: AnalysisMode,
    pub threshold_pct: f64,
}

impl Default for SubscriberPrefs {
    fn default() -> Self {
        Self {
            currency: Currency::Usd,
            analysis_mode: AnalysisMode::Ai,
            threshold_pct: 3.0,
        }
    }
}
