use thiserror::Error;

#[derive(Error, Debug)]
pub enum RateBotError {
    /// 单个数据源抓取失败（超时、连接失败、非 2xx）
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 单个品种解析失败
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 通知未送达
    #[error("Delivery error: {0}")]
    DeliveryError(String),

    /// 历史记录无法写入
    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Date parsing error: {0}")]
    DateError(#[from] chrono::ParseError),
}

pub type Result<T> = std::result::Result<T, RateBotError>;
