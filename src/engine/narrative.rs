/// Rule-based market read used whenever no generated summary is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Oversold,
    Overbought,
    Neutral,
    InsufficientData,
}

impl Verdict {
    pub fn from_rsi(rsi: Option<f64>) -> Self {
        match rsi {
            None => Verdict::InsufficientData,
            Some(v) if v < 30.0 => Verdict::Oversold,
            Some(v) if v > 70.0 => Verdict::Overbought,
            Some(_) => Verdict::Neutral,
        }
    }

    pub fn thermometer(&self) -> &'static str {
        match self {
            Verdict::Oversold => "🥶 Heavily oversold",
            Verdict::Overbought => "🌋 Overheated",
            Verdict::Neutral => "🌤 Balanced",
            Verdict::InsufficientData => "🌤 Normal",
        }
    }

    pub fn comment(&self) -> &'static str {
        match self {
            Verdict::Oversold => {
                "The price looks unreasonably low. The crowd is dumping the coin, \
                 but for patient buyers this can be a good entry point."
            }
            Verdict::Overbought => {
                "The hype is off the charts. Latecomers are buying the top, \
                 a correction looks very likely."
            }
            Verdict::Neutral => {
                "The market is calm with no clear skew. Holding the position \
                 and waiting for a stronger signal is reasonable."
            }
            Verdict::InsufficientData => {
                "Not enough data for RSI, go by price and momentum for now."
            }
        }
    }

    pub fn call(&self) -> &'static str {
        match self {
            Verdict::Oversold => "🟢 BUY / ACCUMULATE",
            Verdict::Overbought => "🔴 TAKE PROFIT / WAIT",
            Verdict::Neutral => "⚪️ HOLD",
            Verdict::InsufficientData => "⚪️ NEUTRAL",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_bands() {
        assert_eq!(Verdict::from_rsi(Some(29.99)), Verdict::Oversold);
        assert_eq!(Verdict::from_rsi(Some(30.0)), Verdict::Neutral);
        assert_eq!(Verdict::from_rsi(Some(70.0)), Verdict::Neutral);
        assert_eq!(Verdict::from_rsi(Some(70.01)), Verdict::Overbought);
        assert_eq!(Verdict::from_rsi(None), Verdict::InsufficientData);
    }

    #[test]
    fn test_calls_per_band() {
        assert!(Verdict::Oversold.call().contains("BUY"));
        assert!(Verdict::Overbought.call().contains("TAKE PROFIT"));
        assert!(Verdict::Neutral.call().contains("HOLD"));
        assert!(Verdict::InsufficientData.call().contains("NEUTRAL"));
    }
}
