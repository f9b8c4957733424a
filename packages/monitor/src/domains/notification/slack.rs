//! Slack incoming-webhook notifier.
//!
//! Posts one message per suspicious domain: a header section naming the
//! domain and a section listing its attributes.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

use crate::domains::classification::VerdictAttributes;
use crate::domains::monitoring::SuspiciousSet;
use crate::kernel::BaseNotifier;

const TYPE_SECTION: &str = "section";
const TYPE_MARKDOWN: &str = "mrkdwn";

/// Slack webhook request body
#[derive(Debug, Clone, Serialize)]
pub struct WebhookMessage {
    pub blocks: Vec<WebhookBlock>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WebhookBlock {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: BlockText,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockText {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl WebhookBlock {
    fn markdown(text: String) -> Self {
        Self {
            kind: TYPE_SECTION,
            text: BlockText {
                kind: TYPE_MARKDOWN,
                text,
            },
        }
    }
}

pub fn build_message(domain: &str, attributes: &VerdictAttributes) -> WebhookMessage {
    let properties: String = attributes
        .fields()
        .iter()
        .map(|(key, value)| format!("{}: {}\n", key, value))
        .collect();

    WebhookMessage {
        blocks: vec![
            WebhookBlock::markdown(format!("*Suspicious domain detected:* {}\n", domain)),
            WebhookBlock::markdown(properties),
        ],
    }
}

pub struct SlackNotifier {
    webhook: String,
    client: reqwest::Client,
}

impl SlackNotifier {
    pub fn new(webhook: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            webhook: webhook.into(),
            client,
        })
    }

    async fn post(&self, message: &WebhookMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.webhook)
            .json(message)
            .send()
            .await
            .context("could not send Slack message")?;

        let status = response.status();
        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("could not send Slack message (status code {}): {}", status, body);
        }

        Ok(())
    }
}

#[async_trait]
impl BaseNotifier for SlackNotifier {
    async fn notify(&self, findings: &SuspiciousSet) -> Result<()> {
        for (domain, attributes) in findings.iter() {
            tracing::debug!(domain, "Sending Slack message");
            self.post(&build_message(domain, attributes))
                .await
                .with_context(|| format!("reporting {}", domain))?;
        }

        tracing::info!(total = findings.len(), "Sent Slack messages");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_has_header_and_attribute_blocks() {
        let attributes = VerdictAttributes {
            suspicious: true,
            geo: "Netherlands".to_string(),
            a_records: "203.0.113.7".to_string(),
            created: "Mon, 30 Sep 2024 08:15:00 +0000".to_string(),
            ..Default::default()
        };

        let message = build_message("evi1.com", &attributes);
        let json = serde_json::to_value(&message).unwrap();

        assert_eq!(json["blocks"].as_array().unwrap().len(), 2);
        assert_eq!(json["blocks"][0]["type"], "section");
        assert_eq!(json["blocks"][0]["text"]["type"], "mrkdwn");
        assert_eq!(
            json["blocks"][0]["text"]["text"],
            "*Suspicious domain detected:* evi1.com\n"
        );
        assert_eq!(
            json["blocks"][1]["text"]["text"],
            "suspicious: true\n\
             geo: Netherlands\n\
             a_records: 203.0.113.7\n\
             expires: \n\
             created: Mon, 30 Sep 2024 08:15:00 +0000\n\
             updated: \n\
             abuse: \n"
        );
    }
}
