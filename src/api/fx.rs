use crate::api::FxEndpoint;
use crate::error::{CoinwatchError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;

pub const EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

#[derive(Debug, Deserialize)]
struct LatestRates {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

/// USD-based fiat rates from exchangerate-api.com.
pub struct ExchangeRateApi {
    client: Client,
    url: String,
}

impl ExchangeRateApi {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl FxEndpoint for ExchangeRateApi {
    async fn fetch_rates(&self) -> Result<HashMap<String, f64>> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(CoinwatchError::UpstreamStatus {
                service: "fx",
                status: status.as_u16(),
            });
        }
        let body: LatestRates = resp.json().await?;
        Ok(body.rates)
    }
}
