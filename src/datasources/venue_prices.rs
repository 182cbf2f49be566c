use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value as JsonValue;

use super::datasource::{decimal_from_json, DataSource, FetchError, Payload, PriceQuote};

/// One asset's price across exchanges, served as a flat `{venue: price}` object.
pub struct VenuePricesDataSource {
    client: Arc<Client>,
    title: String,
    url: String,
    precision: u32,
}

impl VenuePricesDataSource {
    pub fn new(client: Arc<Client>, title: String, url: String, precision: u32) -> VenuePricesDataSource {
        VenuePricesDataSource {
            client,
            title,
            url,
            precision,
        }
    }
}

#[async_trait]
impl DataSource for VenuePricesDataSource {
    fn title(&self) -> &str {
        &self.title
    }

    fn request(&self) -> RequestBuilder {
        self.client.get(&self.url)
    }

    fn normalize(&self, raw: &JsonValue) -> Result<Payload, FetchError> {
        let venues = raw
            .as_object()
            .ok_or_else(|| FetchError::Parse("venue prices are not an object".to_owned()))?;
        // serde_json maps iterate in key order
        let rows = venues
            .iter()
            .filter_map(|(venue, price)| {
                decimal_from_json(price).map(|price| PriceQuote {
                    symbol: venue.to_ascii_uppercase(),
                    price,
                    precision: self.precision,
                })
            })
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(FetchError::Parse("no venue prices in response".to_owned()));
        }
        Ok(Payload::VenuePrices(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use serde_json::json;

    fn source() -> VenuePricesDataSource {
        VenuePricesDataSource::new(test_support::client(), "btc".to_owned(), "http://localhost/".to_owned(), 2)
    }

    #[test]
    fn numeric_entries_become_rows() {
        let raw = json!({"okx": 65000.1, "binance": "64999.955", "error": "timeout"});
        let rows = match source().normalize(&raw).unwrap() {
            Payload::VenuePrices(rows) => rows,
            other => panic!("unexpected payload {:?}", other),
        };
        let rendered = rows
            .iter()
            .map(|r| (r.symbol.as_str(), r.rendered_price()))
            .collect::<Vec<_>>();
        assert_eq!(
            rendered,
            vec![("BINANCE", "64999.96".to_owned()), ("OKX", "65000.10".to_owned())]
        );
    }

    #[test]
    fn nothing_numeric_is_parse_error() {
        assert!(matches!(
            source().normalize(&json!({"okx": null})),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(source().normalize(&json!([1, 2])), Err(FetchError::Parse(_))));
    }
}
