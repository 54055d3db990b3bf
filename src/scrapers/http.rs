use crate::errors::{RateBotError, Result};
use crate::scrapers::base::{FetchResponse, Fetcher};
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use std::time::Duration;

/// 基于 reqwest 的页面抓取器
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(RateBotError::RequestError)?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<FetchResponse> {
        let mut request = self.client.get(url).timeout(timeout);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| RateBotError::NetworkError(format!("{}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateBotError::NetworkError(format!(
                "{} returned HTTP {}", url, status
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| RateBotError::NetworkError(format!("{}: {}", url, e)))?;
        debug!("成功获取 {} ({} 字节)", url, body.len());

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
        })
    }
}
