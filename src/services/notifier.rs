use crate::errors::{RateBotError, Result};
use crate::util::split_message;
use async_trait::async_trait;
use log::{debug, info};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use std::time::Duration;

/// Discord 单条消息 content 的长度上限
pub const DISCORD_CONTENT_LIMIT: usize = 2000;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EmbedFooter {
    pub text: String,
}

/// A titled, coloured, field-based message
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Text(String),
    Embed(Embed),
}

/// Delivery collaborator
#[async_trait]
pub trait Notifier {
    async fn deliver(&self, message: &Message) -> Result<()>;
}

/// 通过 Discord webhook 发送通知
pub struct DiscordWebhook {
    client: Client,
    endpoint: Option<String>,
}

impl DiscordWebhook {
    pub fn new(endpoint: Option<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RateBotError::RequestError)?;

        Ok(Self { client, endpoint })
    }

    async fn post(&self, endpoint: &str, payload: &serde_json::Value) -> Result<()> {
        let response = self.client
            .post(endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| RateBotError::DeliveryError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RateBotError::DeliveryError(format!(
                "webhook returned HTTP {}: {}", status, body
            )));
        }
        debug!("Webhook accepted message ({})", status);
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn deliver(&self, message: &Message) -> Result<()> {
        let endpoint = self.endpoint.as_deref().ok_or_else(|| {
            RateBotError::DeliveryError("webhook endpoint not configured".to_string())
        })?;

        match message {
            Message::Text(text) => {
                // 超长消息按行拆成多条；Discord 不接受空白 content
                let chunks: Vec<String> = split_message(text, DISCORD_CONTENT_LIMIT)
                    .into_iter()
                    .filter(|c| !c.trim().is_empty())
                    .collect();
                for chunk in &chunks {
                    self.post(endpoint, &json!({ "content": chunk })).await?;
                }
                info!("Delivered text notification in {} part(s)", chunks.len());
            }
            Message::Embed(embed) => {
                self.post(endpoint, &json!({ "embeds": [embed] })).await?;
                info!("Delivered embed notification");
            }
        }
        Ok(())
    }
}
