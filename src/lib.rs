// 公开导出的模块，供外部使用
pub mod models;
pub mod errors;
pub mod config;
pub mod scrapers;
pub mod rate_store;
pub mod services;
pub mod util;

// 重新导出常用类型，方便使用
pub use config::Config;
pub use errors::{Result, RateBotError};
pub use models::{Instrument, QuoteRecord, Trend, TrendResult};
pub use rate_store::{RateHistory, RateStore};
pub use services::{RatePipeline, RunReport};
