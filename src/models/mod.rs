pub mod quote;
pub mod trend;

pub use quote::{Instrument, QuoteRecord};
pub use trend::{Trend, TrendResult};
