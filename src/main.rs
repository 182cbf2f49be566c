mod config;
mod datasources;
mod delivery;
mod report;
#[cfg(test)]
mod test_support;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use chrono::Utc;
use env_logger::Env;
use log::{error, info};
use reqwest::Client;

use config::Config;
use datasources::DataAcquirer;
use delivery::WebhookNotifier;
use report::{Report, ReportComposer};

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .user_agent(concat!("crypto-report ", env!("CARGO_PKG_VERSION")))
        .timeout(timeout)
        .build()?)
}

/// Fetches every source once, composes the report and hands it to the webhook.
/// Delivery failures are logged, not returned.
async fn run(config: &Config, client: Arc<Client>) -> Report {
    let acquirer = DataAcquirer::from_config(client.clone(), config);
    let results = acquirer.acquire().await;
    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        error!("{} of {} sources failed", failed, results.len());
    }

    let report = ReportComposer::new(config.timezone_label.clone()).compose(&results, Utc::now());

    let notifier = WebhookNotifier::new(client, config.webhook_url.clone());
    if let Err(e) = notifier.send(&report.render()).await {
        error!("Failed to deliver report: {:#}", e);
    }
    report
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::load()?;
    info!("Loaded {} data sources", config.sources.len());
    let client = Arc::new(build_client(config.timeout)?);

    run(&config, client).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn failing_source_renders_placeholder_and_report_is_delivered() {
        let (quote_url, _quote_req) = test_support::respond_once(
            200,
            r#"{"data":{"BTC":[{"quote":{"USD":{"price":65000.1234}}}]}}"#,
        )
        .await;
        let rate_url = test_support::hang().await;
        let (webhook_url, webhook_req) = test_support::respond_once(200, r#"{"errcode":0,"errmsg":"ok"}"#).await;

        let content = format!(
            r#"
webhook_url = "{}"

[[sources]]
kind = "price-quote"
title = "prices"
url = "{}"
symbols = ["BTC"]

[[sources]]
kind = "exchange-rate"
title = "rate"
url = "{}"
from = "USD"
to = "CNY"
"#,
            webhook_url, quote_url, rate_url
        );
        let config = Config::from_toml(&content, |_| None).unwrap();
        let client = Arc::new(build_client(Duration::from_millis(500)).unwrap());

        let report = run(&config, client).await;
        assert_eq!(report.sections.len(), 3);
        assert_eq!(report.sections[0], "## prices\n- BTC: $65000.123");
        assert!(report.sections[1].starts_with("## rate\n> NetworkError: "));
        assert_eq!(report.sections[1].lines().count(), 2);

        let delivered = webhook_req.await.unwrap();
        assert!(delivered.contains(r#""msgtype":"markdown""#));
        assert!(delivered.contains("- BTC: $65000.123"));
    }
}
