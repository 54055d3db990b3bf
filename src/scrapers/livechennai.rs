use crate::errors::Result;
use crate::models::Instrument;
use crate::scrapers::base::RateSource;
use crate::scrapers::extractor::{Extractor, Strategy};

pub const LIVECHENNAI_URL: &str = "https://www.livechennai.com/gold_silverrate.asp";

/// LiveChennai 金银价页面，这里只取白银
pub struct LiveChennaiSource {
    url: String,
    instruments: Vec<Instrument>,
    extractor: Extractor,
}

impl LiveChennaiSource {
    pub fn new() -> Result<Self> {
        Self::with_url(LIVECHENNAI_URL)
    }

    pub fn with_url(url: &str) -> Result<Self> {
        // 页面是表格："Silver 1 Gm" | "190.00"
        let extractor = Extractor::new()?.with_strategies(
            Instrument::Silver,
            vec![
                Strategy::structural("Silver 1 Gm"),
                Strategy::pattern(r"(?i)\bsilver\s*1\s*(?:gm|gram)\b")?,
            ],
        );

        Ok(Self {
            url: url.to_string(),
            instruments: vec![Instrument::Silver],
            extractor,
        })
    }
}

impl RateSource for LiveChennaiSource {
    fn source_name(&self) -> &str {
        "LiveChennai"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    fn extractor(&self) -> &Extractor {
        &self.extractor
    }
}
