use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value as JsonValue;

use super::datasource::{DataSource, FetchError, Payload};

/// Fear & greed style index; the label is passed through untouched.
pub struct SentimentDataSource {
    client: Arc<Client>,
    title: String,
    url: String,
}

impl SentimentDataSource {
    pub fn new(client: Arc<Client>, title: String, url: String) -> SentimentDataSource {
        SentimentDataSource { client, title, url }
    }
}

#[async_trait]
impl DataSource for SentimentDataSource {
    fn title(&self) -> &str {
        &self.title
    }

    fn request(&self) -> RequestBuilder {
        self.client.get(&self.url)
    }

    fn normalize(&self, raw: &JsonValue) -> Result<Payload, FetchError> {
        if let Some(label) = raw.as_str() {
            return Ok(Payload::Sentiment {
                label: label.to_owned(),
                value: None,
            });
        }
        let entry = if raw["data"].is_array() { &raw["data"][0] } else { raw };
        let label = ["value_classification", "classification", "label"]
            .iter()
            .find_map(|key| entry[*key].as_str())
            .ok_or_else(|| FetchError::Parse("sentiment label missing".to_owned()))?;
        let value = match &entry["value"] {
            JsonValue::String(s) => Some(s.clone()),
            JsonValue::Number(n) => Some(n.to_string()),
            _ => None,
        };
        Ok(Payload::Sentiment {
            label: label.to_owned(),
            value,
        })
    }
}
