use crate::errors::Result;
use crate::models::Instrument;
use crate::scrapers::extractor::Extractor;
use async_trait::async_trait;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0";

/// Raw page returned by a [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

/// Fetch collaborator. Timeouts, connection failures and non-2xx statuses
/// all surface as `NetworkError`.
#[async_trait]
pub trait Fetcher {
    async fn fetch(
        &self,
        url: &str,
        headers: &[(String, String)],
        timeout: Duration,
    ) -> Result<FetchResponse>;
}

/// A remote page that quotes some instruments
pub trait RateSource {
    /// Name used in logs and the message footer
    fn source_name(&self) -> &str;

    fn url(&self) -> &str;

    fn headers(&self) -> Vec<(String, String)> {
        vec![("User-Agent".to_string(), DEFAULT_USER_AGENT.to_string())]
    }

    /// Instruments this source is responsible for
    fn instruments(&self) -> &[Instrument];

    fn extractor(&self) -> &Extractor;
}
