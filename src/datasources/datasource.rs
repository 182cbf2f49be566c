use std::{fmt, str::FromStr};

use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::RequestBuilder;
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Result of one attempt against one configured source.
pub type AcquisitionResult = Result<Payload, FetchError>;

#[async_trait]
pub trait DataSource: Sync + Send {
    /// Section title the result is rendered under.
    fn title(&self) -> &str;

    /// Fully configured outbound request (URL, method, auth).
    fn request(&self) -> RequestBuilder;

    /// Reshape a decoded provider response into a payload.
    fn normalize(&self, raw: &JsonValue) -> Result<Payload, FetchError>;

    async fn fetch(&self) -> AcquisitionResult {
        let result = match send_json(self.request()).await {
            Ok(raw) => {
                debug!("{}: {}", self.title(), raw);
                self.normalize(&raw)
            }
            Err(e) => Err(e),
        };
        match &result {
            Ok(_) => info!("Fetched {}", self.title()),
            Err(e) => error!("Failed to fetch {}: {}", self.title(), e),
        }
        result
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Quotes(Vec<PriceQuote>),
    VenuePrices(Vec<PriceQuote>),
    Rate { pair: String, amount: Decimal },
    Sentiment { label: String, value: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceQuote {
    pub symbol: String,
    pub price: Decimal,
    pub precision: u32,
}

impl PriceQuote {
    pub fn rendered_price(&self) -> String {
        render_fixed(self.price, self.precision)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("{0}")]
    Network(String),
    #[error("{0}")]
    Http(String),
    #[error("{0}")]
    Parse(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Network(_) => FailureKind::NetworkError,
            FetchError::Http(_) => FailureKind::HttpError,
            FetchError::Parse(_) => FailureKind::ParseError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NetworkError,
    HttpError,
    ParseError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            FailureKind::NetworkError => "NetworkError",
            FailureKind::HttpError => "HttpError",
            FailureKind::ParseError => "ParseError",
        };
        f.write_str(name)
    }
}

/// Sends the request and decodes a 2xx body as JSON.
pub async fn send_json(request: RequestBuilder) -> Result<JsonValue, FetchError> {
    let resp_payload = request
        .send()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    let status = resp_payload.status();
    if !status.is_success() {
        return Err(FetchError::Http(format!("HTTP {}", status)));
    }
    let body = resp_payload
        .bytes()
        .await
        .map_err(|e| FetchError::Network(e.to_string()))?;
    serde_json::from_slice(&body).map_err(|e| FetchError::Parse(format!("invalid JSON: {}", e)))
}

/// Accepts JSON numbers and numeric strings, including scientific notation.
pub fn decimal_from_json(value: &JsonValue) -> Option<Decimal> {
    let text = match value {
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

/// Rounds half away from zero and pads to exactly `dp` fractional digits.
pub fn render_fixed(value: Decimal, dp: u32) -> String {
    let mut rounded = value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(dp);
    let mut text = rounded.to_string();
    // rescale stops short when the 96-bit mantissa cannot hold every digit
    let scale = rounded.scale();
    if scale < dp {
        if scale == 0 {
            text.push('.');
        }
        text.extend(std::iter::repeat('0').take((dp - scale) as usize));
    }
    text
}
