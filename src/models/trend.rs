use crate::models::quote::Instrument;
use std::collections::BTreeMap;

/// 单个品种相对基准日的变化
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trend {
    /// 上涨，携带变化量的绝对值
    Increase(f64),
    /// 下跌，携带变化量的绝对值
    Decrease(f64),
    Unchanged,
    NoBaseline,
}

impl Trend {
    pub fn delta(&self) -> Option<f64> {
        match self {
            Trend::Increase(d) | Trend::Decrease(d) => Some(*d),
            Trend::Unchanged | Trend::NoBaseline => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Trend::Increase(_) => "increase",
            Trend::Decrease(_) => "decrease",
            Trend::Unchanged => "no change",
            Trend::NoBaseline => "no previous data",
        }
    }
}

/// Per-instrument trend classification; derived every run, never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrendResult {
    trends: BTreeMap<Instrument, Trend>,
}

impl TrendResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instrument: Instrument, trend: Trend) {
        self.trends.insert(instrument, trend);
    }

    pub fn get(&self, instrument: Instrument) -> Option<Trend> {
        self.trends.get(&instrument).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Instrument, Trend)> + '_ {
        self.trends.iter().map(|(i, t)| (*i, *t))
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }

    pub fn count_increases(&self) -> usize {
        self.trends.values().filter(|t| matches!(t, Trend::Increase(_))).count()
    }

    pub fn count_decreases(&self) -> usize {
        self.trends.values().filter(|t| matches!(t, Trend::Decrease(_))).count()
    }
}
