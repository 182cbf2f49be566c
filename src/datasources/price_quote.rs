use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value as JsonValue;

use super::datasource::{decimal_from_json, DataSource, FetchError, Payload, PriceQuote};

pub const DEFAULT_API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Latest USD quotes for a list of symbols, CoinMarketCap response layout.
pub struct PriceQuoteDataSource {
    client: Arc<Client>,
    title: String,
    url: String,
    api_key: Option<(String, String)>,
    symbols: Vec<(String, u32)>,
}

impl PriceQuoteDataSource {
    /// `symbols` pairs each ticker with its rendering precision.
    pub fn new(
        client: Arc<Client>,
        title: String,
        url: String,
        api_key: Option<(String, String)>,
        symbols: Vec<(String, u32)>,
    ) -> PriceQuoteDataSource {
        PriceQuoteDataSource {
            client,
            title,
            url,
            api_key,
            symbols,
        }
    }
}

#[async_trait]
impl DataSource for PriceQuoteDataSource {
    fn title(&self) -> &str {
        &self.title
    }

    fn request(&self) -> RequestBuilder {
        let symbols = self
            .symbols
            .iter()
            .map(|(symbol, _)| symbol.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let request = self
            .client
            .get(&self.url)
            .query(&[("symbol", symbols)])
            .header("Accept", "application/json");
        match &self.api_key {
            Some((header, key)) => request.header(header.as_str(), key.as_str()),
            None => request,
        }
    }

    fn normalize(&self, raw: &JsonValue) -> Result<Payload, FetchError> {
        normalize(raw, &self.symbols).map(Payload::Quotes)
    }
}

/// Extracts `data.<SYMBOL>[0].quote.USD.price` for each requested symbol.
/// A symbol that is absent or not numeric fails the whole source.
pub fn normalize(raw: &JsonValue, symbols: &[(String, u32)]) -> Result<Vec<PriceQuote>, FetchError> {
    if let Some(message) = raw["status"]["error_message"].as_str() {
        if raw["status"]["error_code"].as_i64().unwrap_or(0) != 0 {
            return Err(FetchError::Http(message.to_owned()));
        }
    }
    symbols
        .iter()
        .map(|(symbol, precision)| {
            let entry = &raw["data"][symbol.as_str()];
            // v2 wraps each symbol in an array, v1 does not
            let entry = if entry.is_array() { &entry[0] } else { entry };
            if entry.is_null() {
                return Err(FetchError::Parse(format!("symbol {} missing from response", symbol)));
            }
            let price = decimal_from_json(&entry["quote"]["USD"]["price"]).ok_or_else(|| {
                FetchError::Parse(format!("symbol {} has no USD price", symbol))
            })?;
            Ok(PriceQuote {
                symbol: symbol.to_ascii_uppercase(),
                price,
                precision: *precision,
            })
        })
        .collect()
}
