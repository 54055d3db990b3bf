pub mod base;
pub mod extractor;
pub mod goodreturns;
pub mod http;
pub mod livechennai;

pub use base::{FetchResponse, Fetcher, RateSource};
pub use extractor::{Extraction, Extractor, Strategy, StrategyKind};
pub use goodreturns::GoodReturnsSource;
pub use http::HttpFetcher;
pub use livechennai::LiveChennaiSource;
