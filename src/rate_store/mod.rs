use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use log::{info, warn};
use serde_json::{Map, Value};

use crate::config::Config;
use crate::errors::{RateBotError, Result};
use crate::models::{Instrument, QuoteRecord};
use crate::util::{self, format_iso_date, parse_iso_date};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// 按日期排序的报价历史，最多保留 window 天
#[derive(Debug, Clone, PartialEq)]
pub struct RateHistory {
    records: BTreeMap<NaiveDate, QuoteRecord>,
    window: usize,
}

impl RateHistory {
    pub fn new(window: usize) -> Self {
        Self {
            records: BTreeMap::new(),
            window: window.max(1),
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn get(&self, date: &NaiveDate) -> Option<&QuoteRecord> {
        self.records.get(date)
    }

    /// 覆盖同日记录，然后淘汰最旧的日期
    pub fn put(&mut self, date: NaiveDate, record: QuoteRecord) {
        self.records.insert(date, record);
        util::limit_history_window(&mut self.records, self.window);
    }

    /// 严格早于 date 的最近一条记录
    pub fn latest_before(&self, date: &NaiveDate) -> Option<(NaiveDate, &QuoteRecord)> {
        self.records.range(..*date).next_back().map(|(d, r)| (*d, r))
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.records.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, &QuoteRecord)> + '_ {
        self.records.iter().map(|(d, r)| (*d, r))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// JSON file holding `{ "<ISO-date>": { "<instrument>": <price> } }`
pub struct RateStore {
    path: PathBuf,
    window: usize,
    timezone: Tz,
}

impl RateStore {
    pub fn new(path: impl Into<PathBuf>, window: usize, timezone: Tz) -> Self {
        Self {
            path: path.into(),
            window,
            timezone,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.history_file, config.history_window_days, config.timezone)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the history. A missing or unreadable file yields an empty history.
    pub fn load(&self) -> RateHistory {
        if !self.path.exists() {
            info!("No existing history at {}, starting empty", self.path.display());
            return RateHistory::new(self.window);
        }

        match self.read() {
            Ok(history) => {
                info!("Loaded {} days of history from {}", history.len(), self.path.display());
                history
            }
            Err(e) => {
                warn!("Ignoring unreadable history {}: {}", self.path.display(), e);
                RateHistory::new(self.window)
            }
        }
    }

    fn read(&self) -> Result<RateHistory> {
        let content = fs::read_to_string(&self.path)?;
        let legacy_date = self.modified_date();
        self.parse_document(&content, legacy_date)
    }

    // 旧版文件没有日期，用文件修改时间所在的日期
    fn modified_date(&self) -> NaiveDate {
        let modified: DateTime<Utc> = fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        modified.with_timezone(&self.timezone).date_naive()
    }

    /// Parse a store document. A flat `{instrument: price}` object written by
    /// the older single-record format is filed under `legacy_date`.
    pub fn parse_document(&self, content: &str, legacy_date: NaiveDate) -> Result<RateHistory> {
        let root: Value = serde_json::from_str(content)?;
        let root = root.as_object().ok_or_else(|| {
            RateBotError::StorageError("history document is not a JSON object".to_string())
        })?;

        let mut history = RateHistory::new(self.window);
        let mut legacy = Vec::new();

        for (key, value) in root {
            if let Ok(date) = parse_iso_date(key) {
                match value.as_object() {
                    Some(prices) => {
                        history.records.insert(date, parse_record(key, prices));
                    }
                    None => warn!("Skipping history entry {}: not an object", key),
                }
            } else if let (Some(instrument), Some(price)) = (Instrument::from_key(key), value.as_f64()) {
                legacy.push((instrument, price));
            } else {
                warn!("Skipping unrecognised history key {}", key);
            }
        }

        if !legacy.is_empty() {
            info!("Migrating legacy single-record history as {}", legacy_date);
            history
                .records
                .entry(legacy_date)
                .or_insert_with(|| legacy.into_iter().collect());
        }

        util::limit_history_window(&mut history.records, history.window);
        Ok(history)
    }

    /// Rewrite the whole file: write a sibling temp file, then rename it over the target.
    pub fn save(&self, history: &RateHistory) -> Result<()> {
        self.write(history).map_err(|e| {
            RateBotError::StorageError(format!("{}: {}", self.path.display(), e))
        })
    }

    fn write(&self, history: &RateHistory) -> Result<()> {
        // 确保目录存在
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&to_document(history))?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, content)?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            // 不留下临时文件
            if let Err(cleanup) = fs::remove_file(&tmp) {
                warn!("Could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }

        info!("Saved {} days of history to {}", history.len(), self.path.display());
        Ok(())
    }
}

pub fn to_document(history: &RateHistory) -> Value {
    let mut root = Map::new();
    for (date, record) in history.iter() {
        let mut prices = Map::new();
        for (instrument, value) in record.iter() {
            prices.insert(instrument.key().to_string(), Value::from(value));
        }
        root.insert(format_iso_date(&date), Value::Object(prices));
    }
    Value::Object(root)
}

fn parse_record(date_key: &str, prices: &Map<String, Value>) -> QuoteRecord {
    prices
        .iter()
        .filter_map(|(key, value)| {
            let instrument = Instrument::from_key(key);
            let price = value.as_f64();
            if instrument.is_none() || price.is_none() {
                warn!("Skipping {} entry {}: {}", date_key, key, value);
            }
            Some((instrument?, price?))
        })
        .collect()
}
