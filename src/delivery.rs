use std::sync::Arc;

use anyhow::{anyhow, Result};
use log::info;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value as JsonValue;

/// Posts markdown messages to a WeCom-style group robot webhook.
pub struct WebhookNotifier {
    client: Arc<Client>,
    webhook_url: String,
}

#[derive(Serialize)]
struct MarkdownMessage<'a> {
    msgtype: &'static str,
    markdown: MarkdownContent<'a>,
}

#[derive(Serialize)]
struct MarkdownContent<'a> {
    content: &'a str,
}

impl WebhookNotifier {
    pub fn new(client: Arc<Client>, webhook_url: String) -> WebhookNotifier {
        WebhookNotifier {
            client,
            webhook_url,
        }
    }

    /// Succeeds only on HTTP 200 without a non-zero `errcode` in the reply.
    /// WeCom answers 200 for rejected messages too, so the status alone is
    /// not trusted.
    pub async fn send(&self, content: &str) -> Result<()> {
        let message = MarkdownMessage {
            msgtype: "markdown",
            markdown: MarkdownContent { content },
        };
        let resp_payload = self.client.post(&self.webhook_url).json(&message).send().await?;
        let status = resp_payload.status();
        let text = resp_payload.text().await.unwrap_or_default();
        if status != StatusCode::OK {
            return Err(anyhow!("webhook responded {}: {}", status, text));
        }
        if let Ok(reply) = serde_json::from_str::<JsonValue>(&text) {
            if let Some(code) = reply["errcode"].as_i64().filter(|code| *code != 0) {
                return Err(anyhow!("webhook rejected message ({}): {}", code, reply["errmsg"]));
            }
        }
        info!("Report delivered");
        Ok(())
    }
}
