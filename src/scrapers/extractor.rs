//! Strategy-based quote extraction.
//!
//! Every instrument owns an ordered list of [`Strategy`] values. The first
//! strategy that yields a plausible price wins; when none does, a configured
//! fallback is used, and otherwise the instrument is left out of the record.
//! Extraction never fails as a whole: an unrecognisable page simply produces
//! an empty [`Extraction`].
//!
//! Strategy kinds, in the order sources usually list them:
//!
//! * **Pattern**: an anchor regex over the visible page text, followed within
//!   a bounded window by a currency-prefixed number (`₹ 13,069`).
//! * **Structural**: a labelled element in the DOM (table row, `title`
//!   attribute, or adjacent sibling) whose paired element holds the number.
//! * **Derived**: a fixed ratio of a higher purity resolved earlier in the
//!   same extraction (18K ≈ 0.75 × 24K).

use crate::errors::{RateBotError, Result};
use crate::models::{Instrument, QuoteRecord};
use crate::util::{normalize_whitespace, parse_price_token, round_to, take_chars};
use log::{debug, warn};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;

/// Characters scanned after an anchor phrase
pub const DEFAULT_LOOKAHEAD_CHARS: usize = 400;

/// Adjacent-sibling values longer than this are containers, not values
const MAX_PAIRED_TEXT_CHARS: usize = 40;

const CURRENCY_TOKEN: &str = r"(?:₹|Rs\.?|INR)\s*(\d[\d,]*(?:\.\d+)?)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Pattern,
    Structural,
    Derived,
    Fallback,
}

#[derive(Debug, Clone)]
pub enum Strategy {
    Pattern { anchor: Regex, lookahead: usize },
    Structural { label: String },
    Derived { from: Instrument, ratio: f64 },
}

impl Strategy {
    pub fn pattern(anchor: &str) -> Result<Self> {
        Self::pattern_with_lookahead(anchor, DEFAULT_LOOKAHEAD_CHARS)
    }

    pub fn pattern_with_lookahead(anchor: &str, lookahead: usize) -> Result<Self> {
        let anchor = Regex::new(anchor)
            .map_err(|e| RateBotError::ConfigError(format!("invalid anchor pattern: {}", e)))?;
        Ok(Strategy::Pattern { anchor, lookahead })
    }

    pub fn structural(label: &str) -> Self {
        Strategy::Structural { label: label.to_string() }
    }

    pub fn derived(from: Instrument, ratio: f64) -> Self {
        Strategy::Derived { from, ratio }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Strategy::Pattern { .. } => StrategyKind::Pattern,
            Strategy::Structural { .. } => StrategyKind::Structural,
            Strategy::Derived { .. } => StrategyKind::Derived,
        }
    }
}

/// Result of extracting one source, with the strategy that produced each value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub record: QuoteRecord,
    pub provenance: BTreeMap<Instrument, StrategyKind>,
}

impl Extraction {
    fn from_resolved(resolved: BTreeMap<Instrument, (f64, StrategyKind)>) -> Self {
        let record = resolved.iter().map(|(i, (v, _))| (*i, *v)).collect();
        let provenance = resolved.into_iter().map(|(i, (_, k))| (i, k)).collect();
        Self { record, provenance }
    }

    /// 抓取失败时只使用兜底价格
    pub fn fallback_only(instruments: &[Instrument], fallbacks: &BTreeMap<Instrument, f64>) -> Self {
        let resolved = instruments
            .iter()
            .filter_map(|i| fallbacks.get(i).map(|v| (*i, (*v, StrategyKind::Fallback))))
            .collect();
        Self::from_resolved(resolved)
    }

    pub fn source_of(&self, instrument: Instrument) -> Option<StrategyKind> {
        self.provenance.get(&instrument).copied()
    }

    /// Merge per-source extractions given in priority order.
    ///
    /// A live reading always beats a fallback; between two readings of the
    /// same kind the earlier source wins.
    pub fn merge<I>(extractions: I) -> Self
    where
        I: IntoIterator<Item = Extraction>,
    {
        let mut live = BTreeMap::new();
        let mut fallback = BTreeMap::new();

        for extraction in extractions {
            for (instrument, value) in extraction.record.iter() {
                let kind = extraction.source_of(instrument).unwrap_or(StrategyKind::Fallback);
                let target = if kind == StrategyKind::Fallback { &mut fallback } else { &mut live };
                target.entry(instrument).or_insert((value, kind));
            }
        }
        for (instrument, entry) in fallback {
            live.entry(instrument).or_insert(entry);
        }

        Self::from_resolved(live)
    }
}

/// 解析后的页面：DOM 与可见文本各一份
pub struct SourceDocument {
    html: Html,
    text: String,
}

impl SourceDocument {
    pub fn parse(content: &str) -> Self {
        let html = Html::parse_document(content);
        let text = visible_text(&html);
        Self { html, text }
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

pub struct Extractor {
    plans: BTreeMap<Instrument, Vec<Strategy>>,
    currency: Regex,
    row_selector: Selector,
    cell_selector: Selector,
    titled_selector: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            plans: BTreeMap::new(),
            currency: Regex::new(CURRENCY_TOKEN)
                .map_err(|e| RateBotError::ConfigError(e.to_string()))?,
            row_selector: parse_selector("tr")?,
            cell_selector: parse_selector("td, th")?,
            titled_selector: parse_selector("[title]")?,
        })
    }

    pub fn with_strategies(mut self, instrument: Instrument, strategies: Vec<Strategy>) -> Self {
        self.plans.insert(instrument, strategies);
        self
    }

    pub fn strategies(&self, instrument: Instrument) -> &[Strategy] {
        self.plans.get(&instrument).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resolve `instruments` against `content`. Partial results are normal.
    pub fn extract(
        &self,
        content: &str,
        instruments: &[Instrument],
        fallbacks: &BTreeMap<Instrument, f64>,
    ) -> Extraction {
        let document = SourceDocument::parse(content);

        let mut order = instruments.to_vec();
        order.sort();
        order.dedup();

        let mut resolved: BTreeMap<Instrument, (f64, StrategyKind)> = BTreeMap::new();
        for instrument in order {
            let mut found = None;
            for strategy in self.strategies(instrument) {
                match self.attempt(&document, strategy, &resolved) {
                    Ok(value) => {
                        debug!("{} resolved by {:?} strategy: {}", instrument, strategy.kind(), value);
                        found = Some((value, strategy.kind()));
                        break;
                    }
                    Err(e) => debug!("{} {:?} strategy missed: {}", instrument, strategy.kind(), e),
                }
            }

            if found.is_none() {
                if let Some(value) = fallbacks.get(&instrument) {
                    warn!("No strategy resolved {}, using fallback {}", instrument, value);
                    found = Some((*value, StrategyKind::Fallback));
                }
            }

            match found {
                Some(entry) => { resolved.insert(instrument, entry); }
                None => warn!("No value for {}, omitting it", instrument),
            }
        }

        Extraction::from_resolved(resolved)
    }

    fn attempt(
        &self,
        document: &SourceDocument,
        strategy: &Strategy,
        resolved: &BTreeMap<Instrument, (f64, StrategyKind)>,
    ) -> Result<f64> {
        match strategy {
            Strategy::Pattern { anchor, lookahead } => {
                self.match_pattern(document.text(), anchor, *lookahead)
            }
            Strategy::Structural { label } => self.match_structural(&document.html, label),
            Strategy::Derived { from, ratio } => match resolved.get(from) {
                Some((value, kind)) if *kind != StrategyKind::Fallback => {
                    Ok(round_to(value * ratio, 2))
                }
                Some(_) => Err(RateBotError::ParseError(format!(
                    "{} is a fallback value, not deriving from it", from
                ))),
                None => Err(RateBotError::ParseError(format!("{} not resolved", from))),
            },
        }
    }

    fn match_pattern(&self, text: &str, anchor: &Regex, lookahead: usize) -> Result<f64> {
        for anchor_match in anchor.find_iter(text) {
            let rest = &text[anchor_match.end()..];
            // 窗口只限制数值的起点，数值本身完整匹配
            let window_end = take_chars(rest, lookahead).len();
            let value = self
                .currency
                .captures(rest)
                .filter(|caps| caps.get(0).map(|m| m.start() < window_end).unwrap_or(false))
                .and_then(|caps| caps.get(1))
                .and_then(|m| parse_price_token(m.as_str()));
            if let Some(value) = value.filter(|v| is_plausible(*v)) {
                return Ok(value);
            }
        }
        Err(RateBotError::ParseError(format!(
            "no currency value after anchor {}", anchor.as_str()
        )))
    }

    fn match_structural(&self, html: &Html, label: &str) -> Result<f64> {
        let needle = label.to_lowercase();

        // 表格行：标签单元格之后的第一个数值单元格
        for row in html.select(&self.row_selector) {
            let cells: Vec<String> = row.select(&self.cell_selector).map(|c| element_text(&c)).collect();
            if let Some(pos) = cells.iter().position(|c| c.to_lowercase().contains(&needle)) {
                let value = cells[pos + 1..]
                    .iter()
                    .filter_map(|c| parse_price_token(c))
                    .find(|v| is_plausible(*v));
                if let Some(value) = value {
                    return Ok(value);
                }
            }
        }

        // 带 title 属性的容器
        for element in html.select(&self.titled_selector) {
            let matches = element
                .value()
                .attr("title")
                .map(|t| t.to_lowercase().contains(&needle))
                .unwrap_or(false);
            if matches {
                if let Some(value) = parse_price_token(&element_text(&element)).filter(|v| is_plausible(*v)) {
                    return Ok(value);
                }
            }
        }

        // 相邻的叶子节点：<span>标签</span><span>数值</span>
        for element in html.root_element().descendants().filter_map(ElementRef::wrap) {
            let is_leaf = element.children().all(|c| !c.value().is_element());
            if !is_leaf || !element_text(&element).to_lowercase().contains(&needle) {
                continue;
            }
            let sibling = element.next_siblings().find_map(ElementRef::wrap);
            if let Some(sibling) = sibling {
                let text = element_text(&sibling);
                if text.chars().count() > MAX_PAIRED_TEXT_CHARS {
                    continue;
                }
                if let Some(value) = parse_price_token(&text).filter(|v| is_plausible(*v)) {
                    return Ok(value);
                }
            }
        }

        Err(RateBotError::ParseError(format!("no element labelled {:?}", label)))
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| RateBotError::ConfigError(format!("invalid selector {}: {}", selector, e)))
}

fn is_plausible(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn element_text(element: &ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

// 可见文本，跳过 script/style
fn visible_text(html: &Html) -> String {
    let mut parts = Vec::new();
    for node in html.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node
                .parent()
                .and_then(|p| p.value().as_element().map(|e| e.name()))
                .map(|name| matches!(name, "script" | "style" | "noscript"))
                .unwrap_or(false);
            if !hidden {
                parts.push(&**text);
            }
        }
    }
    normalize_whitespace(&parts.join(" "))
}
