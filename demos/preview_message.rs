use chrono::{TimeZone, Weekday};
use gold_rate_bot::models::{Instrument, QuoteRecord};
use gold_rate_bot::services::{MessageRenderer, TrendEngine};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 昨天与今天的示例报价
    let yesterday = QuoteRecord::try_from_prices([
        (Instrument::Gold24k, 13000.0),
        (Instrument::Gold22k, 11980.0),
        (Instrument::Silver, 185.0),
    ])?;
    let today = QuoteRecord::try_from_prices([
        (Instrument::Gold24k, 13069.0),
        (Instrument::Gold22k, 11980.0),
        (Instrument::Gold18k, 9801.75),
        (Instrument::Silver, 190.0),
    ])?;

    let trend = TrendEngine::default().compare(&today, Some(&yesterday));
    let now = chrono_tz::Asia::Kolkata
        .with_ymd_and_hms(2025, 6, 2, 10, 0, 0)
        .single()
        .ok_or("ambiguous local time")?;

    let renderer = MessageRenderer::new()
        .with_source_names(vec!["GoodReturns".to_string(), "LiveChennai".to_string()])
        .with_skip_weekday(Some(Weekday::Sun));

    println!("{}", renderer.render(&today, &trend, &now));
    println!();
    println!("{}", serde_json::to_string_pretty(&renderer.render_embed(&today, &trend, &now))?);

    Ok(())
}
