use crate::api::MarketData;
use crate::error::{CoinwatchError, Result};
use crate::model::{Instrument, PriceSample};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

pub const BINANCE_REST_URL: &str = "https://api.binance.com";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    last_price: String,
    open_price: Option<String>,
    high_price: Option<String>,
    low_price: Option<String>,
    quote_volume: Option<String>,
    price_change_percent: Option<String>,
}

fn parse_field(name: &str, raw: &str) -> Result<f64> {
    raw.parse::<f64>()
        .map_err(|_| CoinwatchError::MalformedResponse(format!("{name}={raw:?}")))
}

fn parse_optional(name: &str, raw: Option<&String>) -> Result<Option<f64>> {
    raw.map(|r| parse_field(name, r)).transpose()
}

impl Ticker24h {
    fn into_sample(self) -> Result<PriceSample> {
        let price = parse_field("lastPrice", &self.last_price)?;
        if !price.is_finite() {
            return Err(CoinwatchError::MalformedResponse(format!(
                "{}: non-finite lastPrice",
                self.symbol
            )));
        }
        Ok(PriceSample {
            price,
            open_24h: parse_optional("openPrice", self.open_price.as_ref())?,
            high_24h: parse_optional("highPrice", self.high_price.as_ref())?,
            low_24h: parse_optional("lowPrice", self.low_price.as_ref())?,
            volume_24h: parse_optional("quoteVolume", self.quote_volume.as_ref())?,
            pct_change_24h: parse_optional("priceChangePercent", self.price_change_percent.as_ref())?,
        })
    }
}

/// Close price of one kline row: `[openTime, open, high, low, close, ...]`.
fn kline_close(row: &[Value]) -> Result<f64> {
    match row.get(4) {
        Some(Value::String(s)) => parse_field("close", s),
        Some(Value::Number(n)) => n
            .as_f64()
            .ok_or_else(|| CoinwatchError::MalformedResponse(format!("close={n}"))),
        other => Err(CoinwatchError::MalformedResponse(format!(
            "kline without close: {other:?}"
        ))),
    }
}

/// Spot market data from the public Binance REST API.
pub struct BinanceRest {
    client: Client,
    base_url: String,
}

impl BinanceRest {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self.client.get(&url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoinwatchError::UpstreamStatus {
                service: "binance",
                status: status.as_u16(),
            });
        }
        Ok(resp.json::<T>().await?)
    }
}

#[async_trait]
impl MarketData for BinanceRest {
    async fn fetch_last_price(&self, instrument: &Instrument) -> Result<PriceSample> {
        let ticker: Ticker24h = self
            .get_json(
                "/api/v3/ticker/24hr",
                &[("symbol", instrument.exchange_symbol())],
            )
            .await?;
        debug!("{}: lastPrice = {}", ticker.symbol, ticker.last_price);
        ticker.into_sample()
    }

    async fn fetch_recent_closes(
        &self,
        instrument: &Instrument,
        timeframe: &str,
        count: usize,
    ) -> Result<Vec<f64>> {
        let rows: Vec<Vec<Value>> = self
            .get_json(
                "/api/v3/klines",
                &[
                    ("symbol", instrument.exchange_symbol()),
                    ("interval", timeframe.to_string()),
                    ("limit", count.to_string()),
                ],
            )
            .await?;
        rows.iter().map(|row| kline_close(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticker_parses_into_sample() {
        let json = r#"{"symbol":"BTCUSDT","priceChange":"-94.99","priceChangePercent":"-0.095",
            "lastPrice":"99905.01","openPrice":"100000.00","highPrice":"101000.00",
            "lowPrice":"98000.50","volume":"12.5","quoteVolume":"1250000.75"}"#;
        let ticker: Ticker24h = serde_json::from_str(json).unwrap();
        let sample = ticker.into_sample().unwrap();
        assert_eq!(sample.price, 99905.01);
        assert_eq!(sample.open_24h, Some(100000.0));
        assert_eq!(sample.high_24h, Some(101000.0));
        assert_eq!(sample.low_24h, Some(98000.5));
        assert_eq!(sample.volume_24h, Some(1250000.75));
        assert_eq!(sample.pct_change_24h, Some(-0.095));
    }

    #[test]
    fn test_garbage_price_is_rejected() {
        let json = r#"{"symbol":"BTCUSDT","lastPrice":"n/a"}"#;
        let ticker: Ticker24h = serde_json::from_str(json).unwrap();
        assert!(matches!(
            ticker.into_sample(),
            Err(CoinwatchError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_kline_close_column() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(
            r#"[[1700000000000,"1.0","2.0","0.5","1.5","10",1700003599999],
                [1700003600000,"1.5","2.5","1.0","2.25","10",1700007199999]]"#,
        )
        .unwrap();
        let closes: Vec<f64> = rows.iter().map(|r| kline_close(r).unwrap()).collect();
        assert_eq!(closes, vec![1.5, 2.25]);
        assert!(kline_close(&[Value::from(1)]).is_err());
    }
}
