use crate::errors::Result;
use crate::models::Instrument;
use crate::scrapers::base::RateSource;
use crate::scrapers::extractor::{Extractor, Strategy};

pub const GOODRETURNS_URL: &str = "https://www.goodreturns.in/gold-rates/";

const GOLD_INSTRUMENTS: [Instrument; 3] = [
    Instrument::Gold24k,
    Instrument::Gold22k,
    Instrument::Gold18k,
];

/// GoodReturns 金价页面
pub struct GoodReturnsSource {
    url: String,
    instruments: Vec<Instrument>,
    extractor: Extractor,
}

impl GoodReturnsSource {
    pub fn new() -> Result<Self> {
        Self::with_url(GOODRETURNS_URL)
    }

    pub fn with_url(url: &str) -> Result<Self> {
        Ok(Self {
            url: url.to_string(),
            instruments: GOLD_INSTRUMENTS.to_vec(),
            extractor: Self::build_extractor()?,
        })
    }

    /// 只追踪部分品种
    pub fn with_instruments(mut self, instruments: &[Instrument]) -> Self {
        self.instruments = instruments.to_vec();
        self
    }

    fn build_extractor() -> Result<Extractor> {
        Ok(Extractor::new()?
            .with_strategies(Instrument::Gold24k, karat_strategies(24)?)
            .with_strategies(Instrument::Gold22k, karat_strategies(22)?)
            .with_strategies(Instrument::Gold18k, {
                let mut strategies = karat_strategies(18)?;
                strategies.push(Strategy::derived(Instrument::Gold24k, 0.75));
                strategies
            }))
    }
}

// "24K" / "24 Carat" / "24 kt" 后面跟着的第一个 ₹ 数值，其次是带标签的表格单元格
fn karat_strategies(karat: u32) -> Result<Vec<Strategy>> {
    Ok(vec![
        Strategy::pattern(&format!(r"(?i)\b{}\s*(?:k|kt|carat|karat)\b", karat))?,
        Strategy::structural(&format!("{} Carat", karat)),
        Strategy::structural(&format!("{}K", karat)),
    ])
}

impl RateSource for GoodReturnsSource {
    fn source_name(&self) -> &str {
        "GoodReturns"
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
