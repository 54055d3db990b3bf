use crate::errors::{RateBotError, Result};
use log::warn;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// 追踪的品种。排序即解析顺序：高纯度在前，派生估算才能引用已解析的值
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Instrument {
    Gold24k,
    Gold22k,
    Gold18k,
    Silver,
}

impl Instrument {
    pub const ALL: [Instrument; 4] = [
        Instrument::Gold24k,
        Instrument::Gold22k,
        Instrument::Gold18k,
        Instrument::Silver,
    ];

    /// 持久化文件中使用的键名
    pub fn key(&self) -> &'static str {
        match self {
            Instrument::Gold24k => "gold_24k",
            Instrument::Gold22k => "gold_22k",
            Instrument::Gold18k => "gold_18k",
            Instrument::Silver => "silver",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.key() == key)
    }

    /// 通知消息中的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            Instrument::Gold24k => "Gold (24K - Pure Gold)",
            Instrument::Gold22k => "Gold (22K - Jewelry Gold)",
            Instrument::Gold18k => "Gold (18K)",
            Instrument::Silver => "Silver",
        }
    }

    pub fn is_gold(&self) -> bool {
        !matches!(self, Instrument::Silver)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Instrument {
    type Err = RateBotError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key(&s.trim().to_lowercase())
            .ok_or_else(|| RateBotError::ParseError(format!("Unknown instrument: {}", s)))
    }
}

/// 价格必须是非负有限数
pub fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// One run's per-gram prices. A missing key means "not observed", never zero.
///
/// Records are built once and never mutated; the next run produces a new one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteRecord {
    prices: BTreeMap<Instrument, f64>,
}

impl QuoteRecord {
    pub fn empty() -> Self {
        Self::default()
    }

    /// 构建记录，遇到负数或非有限值时报错
    pub fn try_from_prices<I>(prices: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Instrument, f64)>,
    {
        let mut map = BTreeMap::new();
        for (instrument, value) in prices {
            if !is_valid_price(value) {
                return Err(RateBotError::ParseError(format!(
                    "Invalid price for {}: {}",
                    instrument, value
                )));
            }
            map.insert(instrument, value);
        }
        Ok(Self { prices: map })
    }

    pub fn get(&self, instrument: Instrument) -> Option<f64> {
        self.prices.get(&instrument).copied()
    }

    pub fn contains(&self, instrument: Instrument) -> bool {
        self.prices.contains_key(&instrument)
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    /// 按品种顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (Instrument, f64)> + '_ {
        self.prices.iter().map(|(i, v)| (*i, *v))
    }

    pub fn instruments(&self) -> impl Iterator<Item = Instrument> + '_ {
        self.prices.keys().copied()
    }
}

/// 收集时丢弃非法价格
impl FromIterator<(Instrument, f64)> for QuoteRecord {
    fn from_iter<T: IntoIterator<Item = (Instrument, f64)>>(iter: T) -> Self {
        let mut prices = BTreeMap::new();
        for (instrument, value) in iter {
            if is_valid_price(value) {
                prices.insert(instrument, value);
            } else {
                warn!("Dropping invalid price for {}: {}", instrument, value);
            }
        }
        Self { prices }
    }
}
