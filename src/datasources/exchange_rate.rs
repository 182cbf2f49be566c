use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value as JsonValue;

use super::datasource::{decimal_from_json, DataSource, FetchError, Payload};

/// Converts one unit of `from` into `to` through a form-posted conversion API.
pub struct ExchangeRateDataSource {
    client: Arc<Client>,
    title: String,
    url: String,
    api_key: Option<String>,
    from: String,
    to: String,
}

impl ExchangeRateDataSource {
    pub fn new(
        client: Arc<Client>,
        title: String,
        url: String,
        api_key: Option<String>,
        from: String,
        to: String,
    ) -> ExchangeRateDataSource {
        ExchangeRateDataSource {
            client,
            title,
            url,
            api_key,
            from,
            to,
        }
    }
}

#[async_trait]
impl DataSource for ExchangeRateDataSource {
    fn title(&self) -> &str {
        &self.title
    }

    fn request(&self) -> RequestBuilder {
        let mut form = vec![
            ("from", self.from.as_str()),
            ("to", self.to.as_str()),
            ("money", "1"),
        ];
        if let Some(key) = &self.api_key {
            form.push(("key", key.as_str()));
        }
        self.client.post(&self.url).form(&form)
    }

    fn normalize(&self, raw: &JsonValue) -> Result<Payload, FetchError> {
        let code = raw["code"]
            .as_i64()
            .or_else(|| raw["code"].as_str().and_then(|c| c.parse().ok()))
            .ok_or_else(|| FetchError::Parse("response has no status code".to_owned()))?;
        if code != 200 {
            let message = raw["msg"]
                .as_str()
                .map(str::to_owned)
                .unwrap_or_else(|| format!("API status {}", code));
            return Err(FetchError::Http(message));
        }
        let amount = decimal_from_json(&raw["data"]["money"])
            .ok_or_else(|| FetchError::Parse("response has no converted amount".to_owned()))?;
        Ok(Payload::Rate {
            pair: format!("{}/{}", self.from, self.to).to_ascii_uppercase(),
            amount,
        })
    }
}
