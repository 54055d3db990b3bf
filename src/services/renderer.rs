use crate::models::{Instrument, QuoteRecord, Trend, TrendResult};
use crate::services::notifier::{Embed, EmbedField, EmbedFooter};
use chrono::{DateTime, Weekday};
use chrono_tz::Tz;

const TITLE: &str = "🇮🇳 Indian Gold & Silver Rates";
const NO_DATA: &str = "⚠️ No rates could be retrieved today. The source pages may have changed.";

const COLOR_UP: u32 = 0x2ECC71;
const COLOR_DOWN: u32 = 0xE74C3C;
const COLOR_NEUTRAL: u32 = 0xF1C40F;

/// 趋势标识：三态（无基准按“无变化”显示）或四态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendStyle {
    ThreeWay,
    FourWay,
}

/// Turns a record and its trends into notification text.
///
/// Output depends only on the inputs, so identical runs render identical text.
pub struct MessageRenderer {
    currency_symbol: String,
    unit_multiplier: f64,
    unit_label: String,
    trend_style: TrendStyle,
    source_names: Vec<String>,
    skip_weekday: Option<Weekday>,
}

impl MessageRenderer {
    pub fn new() -> Self {
        Self {
            currency_symbol: "₹".to_string(),
            unit_multiplier: 8.0,
            unit_label: "1 pavan (8 g)".to_string(),
            trend_style: TrendStyle::FourWay,
            source_names: Vec::new(),
            skip_weekday: None,
        }
    }

    pub fn with_currency_symbol(mut self, symbol: &str) -> Self {
        self.currency_symbol = symbol.to_string();
        self
    }

    pub fn with_unit(mut self, multiplier: f64, label: &str) -> Self {
        self.unit_multiplier = multiplier;
        self.unit_label = label.to_string();
        self
    }

    pub fn with_trend_style(mut self, style: TrendStyle) -> Self {
        self.trend_style = style;
        self
    }

    pub fn with_source_names(mut self, names: Vec<String>) -> Self {
        self.source_names = names;
        self
    }

    pub fn with_skip_weekday(mut self, weekday: Option<Weekday>) -> Self {
        self.skip_weekday = weekday;
        self
    }

    pub fn render(&self, current: &QuoteRecord, trend: &TrendResult, timestamp: &DateTime<Tz>) -> String {
        let mut message = format!("{} (as of {}):\n\n", TITLE, format_timestamp(timestamp));

        if current.is_empty() {
            message += NO_DATA;
            message += "\n\n";
        }

        for (instrument, price) in current.iter() {
            message += &format!("{} {}:\n", icon(instrument), instrument.display_name());
            message += &format!("{}\n", self.gram_line(price, trend.get(instrument)));
            message += &format!("{}\n\n", self.unit_line(price));
        }

        message += &self.footer();
        message
    }

    pub fn render_embed(&self, current: &QuoteRecord, trend: &TrendResult, timestamp: &DateTime<Tz>) -> Embed {
        let description = if current.is_empty() {
            format!("as of {}\n\n{}", format_timestamp(timestamp), NO_DATA)
        } else {
            format!("as of {}", format_timestamp(timestamp))
        };

        let fields = current
            .iter()
            .map(|(instrument, price)| EmbedField {
                name: format!("{} {}", icon(instrument), instrument.display_name()),
                value: format!(
                    "{}\n{}",
                    self.gram_line(price, trend.get(instrument)),
                    self.unit_line(price)
                ),
                inline: false,
            })
            .collect();

        Embed {
            title: TITLE.to_string(),
            description: Some(description),
            color: embed_color(trend),
            fields,
            footer: Some(EmbedFooter { text: self.footer() }),
            timestamp: Some(timestamp.to_rfc3339()),
        }
    }

    fn gram_line(&self, price: f64, trend: Option<Trend>) -> String {
        format!("• 1 gram → {} ({})", self.money(price), self.trend_text(trend))
    }

    fn unit_line(&self, price: f64) -> String {
        format!("• {} → {}", self.unit_label, self.money(price * self.unit_multiplier))
    }

    fn money(&self, value: f64) -> String {
        format!("{}{:.2}", self.currency_symbol, value)
    }

    fn trend_text(&self, trend: Option<Trend>) -> String {
        let trend = match (trend.unwrap_or(Trend::NoBaseline), self.trend_style) {
            (Trend::NoBaseline, TrendStyle::ThreeWay) => Trend::Unchanged,
            (trend, _) => trend,
        };
        let glyph = match trend {
            Trend::Increase(_) => "🔺",
            Trend::Decrease(_) => "🔻",
            Trend::Unchanged => "🟩",
            Trend::NoBaseline => "⚪",
        };
        match trend.delta() {
            Some(delta) => format!("{} {} {}", glyph, trend.label(), self.money(delta)),
            None => format!("{} {}", glyph, trend.label()),
        }
    }

    fn footer(&self) -> String {
        let mut footer = String::new();
        if !self.source_names.is_empty() {
            footer += &format!(
                "📊 Rates sourced from Indian markets ({})\n",
                self.source_names.join(" & ")
            );
        }
        footer += "🕙 Updated automatically every day";
        if let Some(day) = self.skip_weekday {
            footer += &format!(" (except {})", weekday_name(day));
        }
        footer
    }
}

impl Default for MessageRenderer {
    fn default() -> Self {
        Self::new()
    }
}

fn icon(instrument: Instrument) -> &'static str {
    if instrument.is_gold() { "🧈" } else { "🔘" }
}

fn format_timestamp(timestamp: &DateTime<Tz>) -> String {
    timestamp.format("%Y-%m-%d %H:%M %Z").to_string()
}

fn embed_color(trend: &TrendResult) -> u32 {
    let (up, down) = (trend.count_increases(), trend.count_decreases());
    if up > down {
        COLOR_UP
    } else if down > up {
        COLOR_DOWN
    } else {
        COLOR_NEUTRAL
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::Asia::Kolkata;

    fn timestamp() -> DateTime<Tz> {
        Kolkata.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()
    }

    fn renderer() -> MessageRenderer {
        MessageRenderer::new()
            .with_source_names(vec!["GoodReturns".to_string(), "LiveChennai".to_string()])
            .with_skip_weekday(Some(Weekday::Sun))
    }

    #[test]
    fn test_golden_output() {
        let current = QuoteRecord::try_from_prices([
            (Instrument::Gold24k, 13069.0),
            (Instrument::Silver, 190.0),
        ])
        .unwrap();
        let mut trend = TrendResult::new();
        trend.insert(Instrument::Gold24k, Trend::NoBaseline);
        trend.insert(Instrument::Silver, Trend::Increase(5.0));

        let expected = "\
🇮🇳 Indian Gold & Silver Rates (as of 2025-06-02 10:00 IST):

🧈 Gold (24K - Pure Gold):
• 1 gram → ₹13069.00 (⚪ no previous data)
• 1 pavan (8 g) → ₹104552.00

🔘 Silver:
• 1 gram → ₹190.00 (🔺 increase ₹5.00)
• 1 pavan (8 g) → ₹1520.00

📊 Rates sourced from Indian markets (GoodReturns & LiveChennai)
🕙 Updated automatically every day (except Sunday)";

        let text = renderer().render(&current, &trend, &timestamp());
        assert_eq!(text, expected);
        assert_eq!(text, renderer().render(&current, &trend, &timestamp()));
    }

    #[test]
    fn test_absent_instruments_are_omitted() {
        let current = QuoteRecord::try_from_prices([(Instrument::Gold22k, 11980.0)]).unwrap();
        let text = renderer().render(&current, &TrendResult::new(), &timestamp());
        assert!(text.contains("Gold (22K - Jewelry Gold)"));
        assert!(!text.contains("Silver:"));
        assert!(!text.contains("₹0.00"));
    }

    #[test]
    fn test_empty_record_renders_notice() {
        let text = renderer().render(&QuoteRecord::empty(), &TrendResult::new(), &timestamp());
        assert!(text.contains("No rates could be retrieved"));
        assert!(!text.contains("1 gram"));
    }

    #[test]
    fn test_three_way_style_hides_missing_baseline() {
        let current = QuoteRecord::try_from_prices([(Instrument::Silver, 190.0)]).unwrap();
        let mut trend = TrendResult::new();
        trend.insert(Instrument::Silver, Trend::NoBaseline);

        let text = MessageRenderer::new()
            .with_trend_style(TrendStyle::ThreeWay)
            .render(&current, &trend, &timestamp());
        assert!(text.contains("(🟩 no change)"));
        assert!(!text.contains("no previous data"));
    }

    #[test]
    fn test_custom_currency_and_unit() {
        let current = QuoteRecord::try_from_prices([(Instrument::Gold22k, 11980.0)]).unwrap();
        let text = MessageRenderer::new()
            .with_currency_symbol("Rs.")
            .with_unit(10.0, "10 g")
            .render(&current, &TrendResult::new(), &timestamp());
        assert!(text.contains("• 1 gram → Rs.11980.00 (⚪ no previous data)"));
        assert!(text.contains("• 10 g → Rs.119800.00"));
        assert!(text.ends_with("🕙 Updated automatically every day"));
    }

    #[test]
    fn test_embed_fields_and_color() {
        let current = QuoteRecord::try_from_prices([
            (Instrument::Gold24k, 13000.0),
            (Instrument::Silver, 185.0),
        ])
        .unwrap();
        let mut trend = TrendResult::new();
        trend.insert(Instrument::Gold24k, Trend::Decrease(69.0));
        trend.insert(Instrument::Silver, Trend::Decrease(5.0));

        let embed = renderer().render_embed(&current, &trend, &timestamp());
        assert_eq!(embed.fields.len(), 2);
        assert_eq!(embed.color, COLOR_DOWN);
        assert_eq!(embed.fields[0].name, "🧈 Gold (24K - Pure Gold)");
        assert!(embed.fields[0].value.contains("🔻 decrease ₹69.00"));
        assert!(embed.fields[1].value.contains("₹1480.00"));
        assert_eq!(embed.timestamp.as_deref(), Some("2025-06-02T10:00:00+05:30"));
    }
}
