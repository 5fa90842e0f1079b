use ta::{indicators::SimpleMovingAverage, Next};

pub const RSI_PERIOD: usize = 14;
pub const SMA_PERIOD: usize = 20;

/// Wilder RSI over closing prices, oldest first.
///
/// The first `period` deltas seed the average gain/loss; every later delta is
/// folded in with `(avg * (period - 1) + new) / period`. Returns `None` when
/// fewer than `period + 1` prices are available.
pub fn compute_rsi(prices: &[f64], period: usize) -> Option<f64> {
    if period == 0 || prices.len() < period + 1 {
        return None;
    }

    let deltas: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    let gain = |d: f64| if d > 0.0 { d } else { 0.0 };
    let loss = |d: f64| if d < 0.0 { -d } else { 0.0 };

    let n = period as f64;
    let mut avg_gain = deltas[..period].iter().map(|&d| gain(d)).sum::<f64>() / n;
    let mut avg_loss = deltas[..period].iter().map(|&d| loss(d)).sum::<f64>() / n;

    for &d in &deltas[period..] {
        avg_gain = (avg_gain * (n - 1.0) + gain(d)) / n;
        avg_loss = (avg_loss * (n - 1.0) + loss(d)) / n;
    }

    if avg_loss == 0.0 {
        // Flat series reads as neutral, pure gains as fully overbought
        return Some(if avg_gain > 0.0 { 100.0 } else { 50.0 });
    }
    let rs = avg_gain / avg_loss;
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Arithmetic mean of the trailing `period` prices.
pub fn compute_sma(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < period {
        return None;
    }
    let mut sma = SimpleMovingAverage::new(period).ok()?;
    prices[prices.len() - period..]
        .iter()
        .fold(None, |_, &p| Some(sma.next(p)))
}
