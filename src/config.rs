use crate::errors::{RateBotError, Result};
use crate::models::Instrument;
use chrono::Weekday;
use chrono_tz::Tz;
use log::warn;
use std::collections::BTreeMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// 趋势比较最多保留的小数位
pub const MAX_TREND_PRECISION: u32 = 9;

/// 如何选择对比基准
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselinePolicy {
    /// 只和前一个自然日比较
    PreviousDay,
    /// 和今天之前最近一次记录比较（跳过的日子不会让基准丢失）
    LatestBefore,
}

/// 通知的发送形式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFormat {
    Text,
    Embed,
}

pub struct Config {
    pub webhook_endpoint: Option<String>,
    pub history_file: PathBuf,
    pub history_window_days: usize,
    pub instrument_fallbacks: BTreeMap<Instrument, f64>,
    pub skip_weekday: Option<Weekday>,
    pub fetch_timeout: Duration,
    pub timezone: Tz,
    pub trend_precision: Option<u32>,
    pub baseline_policy: BaselinePolicy,
    pub delivery_format: DeliveryFormat,
}

impl Config {
    pub fn new() -> Self {
        Self {
            webhook_endpoint: None,
            history_file: PathBuf::from("rates.json"),
            history_window_days: 7,
            instrument_fallbacks: default_fallbacks(),
            skip_weekday: None,
            fetch_timeout: Duration::from_secs(15),
            timezone: chrono_tz::Asia::Kolkata,
            trend_precision: Some(2),
            baseline_policy: BaselinePolicy::PreviousDay,
            delivery_format: DeliveryFormat::Text,
        }
    }

    /// 从环境变量读取配置，这是唯一读取环境变量的地方
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_value)
    }

    /// Build a config from a variable lookup.
    ///
    /// A malformed optional setting is logged and keeps its default, so a
    /// typo in one variable never stops the daily run.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(url) = lookup("DISCORD_WEBHOOK_URL") {
            config = config.with_webhook_endpoint(&url);
        }
        if let Some(path) = lookup("RATES_FILE") {
            config = config.with_history_file(&path);
        }
        if let Some(days) = setting(&lookup, "HISTORY_WINDOW_DAYS", parse_window_days) {
            config = config.with_history_window_days(days);
        }
        if let Some(day) = setting(&lookup, "SKIP_WEEKDAY", parse_weekday) {
            config = config.with_skip_weekday(Some(day));
        }
        for instrument in Instrument::ALL {
            let var = format!("FALLBACK_{}", instrument.key().to_uppercase());
            if let Some(value) = setting(&lookup, &var, |raw| parse_fallback(&var, raw)) {
                config = config.with_fallback(instrument, value);
            }
        }
        if let Some(timeout) = setting(&lookup, "FETCH_TIMEOUT_SECS", parse_timeout) {
            config = config.with_fetch_timeout(timeout);
        }
        if let Some(tz) = setting(&lookup, "RATES_TIMEZONE", parse_timezone) {
            config = config.with_timezone(tz);
        }
        if let Some(places) = setting(&lookup, "TREND_PRECISION", parse_precision) {
            config = config.with_trend_precision(places);
        }
        if let Some(policy) = setting(&lookup, "BASELINE_POLICY", parse_baseline_policy) {
            config = config.with_baseline_policy(policy);
        }
        if let Some(format) = setting(&lookup, "DELIVERY_FORMAT", parse_delivery_format) {
            config = config.with_delivery_format(format);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_window_days == 0 {
            return Err(RateBotError::ConfigError(
                "history window must keep at least one day".to_string(),
            ));
        }
        if let Some(places) = self.trend_precision {
            if places > MAX_TREND_PRECISION {
                return Err(RateBotError::ConfigError(format!(
                    "trend precision {} exceeds {} decimal places", places, MAX_TREND_PRECISION
                )));
            }
        }
        if self.fetch_timeout.is_zero() {
            return Err(RateBotError::ConfigError("fetch timeout must be positive".to_string()));
        }
        for (instrument, value) in &self.instrument_fallbacks {
            if !crate::models::quote::is_valid_price(*value) {
                return Err(RateBotError::ConfigError(format!(
                    "invalid fallback for {}: {}", instrument, value
                )));
            }
        }
        Ok(())
    }

    pub fn with_webhook_endpoint(mut self, url: &str) -> Self {
        self.webhook_endpoint = Some(url.to_string());
        self
    }

    pub fn with_history_file(mut self, path: &str) -> Self {
        self.history_file = PathBuf::from(path);
        self
    }

    pub fn with_history_window_days(mut self, days: usize) -> Self {
        self.history_window_days = days;
        self
    }

    /// 设置或移除（None）某个品种的兜底价格
    pub fn with_fallback(mut self, instrument: Instrument, value: Option<f64>) -> Self {
        match value {
            Some(v) => { self.instrument_fallbacks.insert(instrument, v); }
            None => { self.instrument_fallbacks.remove(&instrument); }
        }
        self
    }

    pub fn with_fallbacks(mut self, fallbacks: BTreeMap<Instrument, f64>) -> Self {
        self.instrument_fallbacks = fallbacks;
        self
    }

    pub fn with_skip_weekday(mut self, weekday: Option<Weekday>) -> Self {
        self.skip_weekday = weekday;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_timezone(mut self, tz: Tz) -> Self {
        self.timezone = tz;
        self
    }

    pub fn with_trend_precision(mut self, places: Option<u32>) -> Self {
        self.trend_precision = places;
        self
    }

    pub fn with_baseline_policy(mut self, policy: BaselinePolicy) -> Self {
        self.baseline_policy = policy;
        self
    }

    pub fn with_delivery_format(mut self, format: DeliveryFormat) -> Self {
        self.delivery_format = format;
        self
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

pub fn default_fallbacks() -> BTreeMap<Instrument, f64> {
    BTreeMap::from([
        (Instrument::Gold24k, 13069.0),
        (Instrument::Gold22k, 11980.0),
        (Instrument::Silver, 190.0),
    ])
}

// 空字符串视为未设置
fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_optional_number<T: std::str::FromStr>(name: &str, raw: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    if raw.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    raw.parse::<T>()
        .map(Some)
        .map_err(|e| RateBotError::ConfigError(format!("{}: {}", name, e)))
}

// 读取单个可选配置，格式错误时记录警告并保留默认值
fn setting<T, F, P>(lookup: &F, name: &str, parse: P) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Result<T>,
{
    let raw = lookup(name)?;
    match parse(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {}={:?}, keeping the default: {}", name, raw, e);
            None
        }
    }
}

fn parse_window_days(raw: &str) -> Result<usize> {
    match raw.parse::<usize>() {
        Ok(0) => Err(RateBotError::ConfigError("window must keep at least one day".to_string())),
        Ok(days) => Ok(days),
        Err(e) => Err(RateBotError::ConfigError(e.to_string())),
    }
}

fn parse_timeout(raw: &str) -> Result<Duration> {
    match raw.parse::<u64>() {
        Ok(0) => Err(RateBotError::ConfigError("timeout must be positive".to_string())),
        Ok(secs) => Ok(Duration::from_secs(secs)),
        Err(e) => Err(RateBotError::ConfigError(e.to_string())),
    }
}

fn parse_fallback(name: &str, raw: &str) -> Result<Option<f64>> {
    let value = parse_optional_number::<f64>(name, raw)?;
    match value {
        Some(v) if !crate::models::quote::is_valid_price(v) => {
            Err(RateBotError::ConfigError(format!("{}: invalid price {}", name, v)))
        }
        _ => Ok(value),
    }
}

fn parse_precision(raw: &str) -> Result<Option<u32>> {
    let places = parse_optional_number::<u32>("TREND_PRECISION", raw)?;
    match places {
        Some(p) if p > MAX_TREND_PRECISION => Err(RateBotError::ConfigError(format!(
            "at most {} decimal places", MAX_TREND_PRECISION
        ))),
        _ => Ok(places),
    }
}

pub fn parse_weekday(raw: &str) -> Result<Weekday> {
    raw.trim().parse::<Weekday>()
        .map_err(|_| RateBotError::ConfigError(format!("Unknown weekday: {}", raw)))
}

pub fn parse_timezone(raw: &str) -> Result<Tz> {
    raw.trim().parse::<Tz>()
        .map_err(|_| RateBotError::ConfigError(format!("Unknown timezone: {}", raw)))
}

pub fn parse_baseline_policy(raw: &str) -> Result<BaselinePolicy> {
    match raw.trim().to_lowercase().as_str() {
        "previous_day" => Ok(BaselinePolicy::PreviousDay),
        "latest_before" => Ok(BaselinePolicy::LatestBefore),
        other => Err(RateBotError::ConfigError(format!("Unknown baseline policy: {}", other))),
    }
}

pub fn parse_delivery_format(raw: &str) -> Result<DeliveryFormat> {
    match raw.trim().to_lowercase().as_str() {
        "text" => Ok(DeliveryFormat::Text),
        "embed" => Ok(DeliveryFormat::Embed),
        other => Err(RateBotError::ConfigError(format!("Unknown delivery format: {}", other))),
    }
}
