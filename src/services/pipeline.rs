use crate::config::{BaselinePolicy, Config, DeliveryFormat};
use crate::errors::Result;
use crate::models::{Instrument, QuoteRecord, TrendResult};
use crate::rate_store::{RateHistory, RateStore};
use crate::scrapers::base::{Fetcher, RateSource};
use crate::scrapers::extractor::{Extraction, StrategyKind};
use crate::services::notifier::{Message, Notifier};
use crate::services::renderer::MessageRenderer;
use crate::services::trend::TrendEngine;
use crate::util::previous_day;
use chrono::{DateTime, Datelike, NaiveDate};
use chrono_tz::Tz;
use log::{error, info, warn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// What one invocation did
#[derive(Debug, Clone)]
pub struct RunReport {
    pub date: NaiveDate,
    pub skipped: bool,
    pub record: QuoteRecord,
    pub provenance: BTreeMap<Instrument, StrategyKind>,
    pub baseline_date: Option<NaiveDate>,
    pub trend: TrendResult,
    pub message: Option<String>,
    pub delivered: bool,
}

impl RunReport {
    fn skipped(date: NaiveDate) -> Self {
        Self {
            date,
            skipped: true,
            record: QuoteRecord::empty(),
            provenance: BTreeMap::new(),
            baseline_date: None,
            trend: TrendResult::new(),
            message: None,
            delivered: false,
        }
    }
}

/// 抓取 → 解析 → 对比 → 渲染 → 发送 → 持久化
pub struct RatePipeline {
    config: Config,
    sources: Vec<Arc<dyn RateSource + Send + Sync>>,
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
    store: RateStore,
    trend_engine: TrendEngine,
    renderer: MessageRenderer,
}

impl RatePipeline {
    /// `sources` are listed in priority order: earlier sources win overlaps.
    pub fn new(
        config: Config,
        sources: Vec<Arc<dyn RateSource + Send + Sync>>,
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Self {
        let store = RateStore::from_config(&config);
        let trend_engine = TrendEngine::new(config.trend_precision);
        let renderer = MessageRenderer::new()
            .with_source_names(sources.iter().map(|s| s.source_name().to_string()).collect())
            .with_skip_weekday(config.skip_weekday);

        Self {
            config,
            sources,
            fetcher,
            notifier,
            store,
            trend_engine,
            renderer,
        }
    }

    pub fn with_renderer(mut self, renderer: MessageRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn store(&self) -> &RateStore {
        &self.store
    }

    /// Run once for `now`. Only a failed store write is returned as an error.
    pub async fn run(&self, now: DateTime<Tz>) -> Result<RunReport> {
        let today = now.date_naive();

        if self.config.skip_weekday == Some(today.weekday()) {
            info!("{} is a skipped weekday ({}), nothing to do", today, today.weekday());
            return Ok(RunReport::skipped(today));
        }
        info!("Running rate pipeline for {}", today);

        let extraction = self.collect_quotes().await;
        let current = extraction.record.clone();
        if current.is_empty() {
            warn!("No instrument resolved from any source");
        }

        let mut history = self.store.load();
        let (baseline_date, baseline) = self.baseline(&history, &today);
        match baseline_date {
            Some(date) => info!("Comparing against {}", date),
            None => info!("No baseline available"),
        }

        let trend = self.trend_engine.compare(&current, baseline);
        let text = self.renderer.render(&current, &trend, &now);
        let message = match self.config.delivery_format {
            DeliveryFormat::Text => Message::Text(text.clone()),
            DeliveryFormat::Embed => Message::Embed(self.renderer.render_embed(&current, &trend, &now)),
        };

        let delivered = match self.notifier.deliver(&message).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to deliver notification: {}", e);
                false
            }
        };

        // 即使发送失败也要保存，避免明天丢失对比基准
        history.put(today, current.clone());
        if let Err(e) = self.store.save(&history) {
            error!("Failed to persist history: {}", e);
            return Err(e);
        }

        Ok(RunReport {
            date: today,
            skipped: false,
            record: current,
            provenance: extraction.provenance,
            baseline_date,
            trend,
            message: Some(text),
            delivered,
        })
    }

    /// 按优先级抓取并解析所有数据源，抓取失败的数据源使用兜底价格
    async fn collect_quotes(&self) -> Extraction {
        let fallbacks = &self.config.instrument_fallbacks;
        let mut extractions = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            info!("Scraping from {}", source.source_name());
            let headers = source.headers();
            let extraction = match self
                .fetcher
                .fetch(source.url(), &headers, self.config.fetch_timeout)
                .await
            {
                Ok(response) => source.extractor().extract(&response.body, source.instruments(), fallbacks),
                Err(e) => {
                    warn!("Fetch from {} failed, using fallback values: {}", source.source_name(), e);
                    Extraction::fallback_only(source.instruments(), fallbacks)
                }
            };
            info!("{} resolved {} instrument(s)", source.source_name(), extraction.record.len());
            extractions.push(extraction);
        }

        Extraction::merge(extractions)
    }

    fn baseline<'h>(
        &self,
        history: &'h RateHistory,
        today: &NaiveDate,
    ) -> (Option<NaiveDate>, Option<&'h QuoteRecord>) {
        match self.config.baseline_policy {
            BaselinePolicy::PreviousDay => {
                let yesterday = previous_day(today);
                let record = yesterday.and_then(|d| history.get(&d));
                (yesterday.filter(|_| record.is_some()), record)
            }
            BaselinePolicy::LatestBefore => match history.latest_before(today) {
                Some((date, record)) => (Some(date), Some(record)),
                None => (None, None),
            },
        }
    }
}
