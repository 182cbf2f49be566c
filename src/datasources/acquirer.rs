use std::sync::Arc;

use futures::future::join_all;
use reqwest::Client;

use super::datasource::{AcquisitionResult, DataSource};
use super::{ExchangeRateDataSource, PriceQuoteDataSource, SentimentDataSource, VenuePricesDataSource};
use crate::config::{Config, SourceConfig};

pub struct DataAcquirer {
    sources: Vec<Box<dyn DataSource>>,
}

impl DataAcquirer {
    pub fn new(sources: Vec<Box<dyn DataSource>>) -> DataAcquirer {
        DataAcquirer { sources }
    }

    pub fn from_config(client: Arc<Client>, config: &Config) -> DataAcquirer {
        let sources = config
            .sources
            .iter()
            .map(|source| -> Box<dyn DataSource> {
                match source {
                    SourceConfig::PriceQuote {
                        title,
                        url,
                        api_key_header,
                        quoted,
                        ..
                    } => Box::new(PriceQuoteDataSource::new(
                        client.clone(),
                        title.clone(),
                        url.clone(),
                        source.api_key().map(|key| (api_key_header.clone(), key.to_owned())),
                        quoted.clone(),
                    )),
                    SourceConfig::ExchangeRate { title, url, from, to, .. } => {
                        Box::new(ExchangeRateDataSource::new(
                            client.clone(),
                            title.clone(),
                            url.clone(),
                            source.api_key().map(str::to_owned),
                            from.clone(),
                            to.clone(),
                        ))
                    }
                    SourceConfig::SentimentIndex { title, url } => Box::new(
                        SentimentDataSource::new(client.clone(), title.clone(), url.clone()),
                    ),
                    SourceConfig::VenuePrices { title, url, precision } => Box::new(
                        VenuePricesDataSource::new(client.clone(), title.clone(), url.clone(), *precision),
                    ),
                }
            })
            .collect();
        DataAcquirer::new(sources)
    }

    /// Attempts every source once. Results keep configuration order.
    pub async fn acquire(&self) -> Vec<(String, AcquisitionResult)> {
        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;
        self.sources
            .iter()
            .map(|s| s.title().to_owned())
            .zip(results)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasources::{FailureKind, Payload};
    use crate::test_support;

    #[tokio::test]
    async fn one_failing_source_does_not_block_others() {
        let (quote_url, _req) =
            test_support::respond_once(200, r#"{"data":{"BTC":[{"quote":{"USD":{"price":1.5}}}]}}"#).await;
        let dead_url = test_support::refused().await;
        let (fg_url, _req) = test_support::respond_once(200, r#""Greed""#).await;
        let client = test_support::client();
        let acquirer = DataAcquirer::new(vec![
            Box::new(PriceQuoteDataSource::new(
                client.clone(),
                "quotes".to_owned(),
                quote_url,
                None,
                vec![("BTC".to_owned(), 3)],
            )),
            Box::new(SentimentDataSource::new(client.clone(), "dead".to_owned(), dead_url)),
            Box::new(SentimentDataSource::new(client, "fg".to_owned(), fg_url)),
        ]);
        let results = acquirer.acquire().await;
        let titles = results.iter().map(|(t, _)| t.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["quotes", "dead", "fg"]);
        assert!(matches!(results[0].1, Ok(Payload::Quotes(_))));
        assert_eq!(results[1].1.as_ref().unwrap_err().kind(), FailureKind::NetworkError);
        assert!(matches!(results[2].1, Ok(Payload::Sentiment { .. })));
    }

    #[tokio::test]
    async fn timeout_is_network_error() {
        let url = test_support::hang().await;
        let client = Arc::new(
            Client::builder()
                .timeout(std::time::Duration::from_millis(200))
                .build()
                .unwrap(),
        );
        let acquirer = DataAcquirer::new(vec![Box::new(SentimentDataSource::new(client, "fg".to_owned(), url))]);
        let results = acquirer.acquire().await;
        assert_eq!(results[0].1.as_ref().unwrap_err().kind(), FailureKind::NetworkError);
    }
}
