pub mod notifier;
pub mod pipeline;
pub mod renderer;
pub mod trend;

pub use notifier::{DiscordWebhook, Embed, Message, Notifier};
pub use pipeline::{RatePipeline, RunReport};
pub use renderer::{MessageRenderer, TrendStyle};
pub use trend::TrendEngine;
