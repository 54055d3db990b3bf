use crate::models::{QuoteRecord, Trend, TrendResult};
use crate::util::round_to;
use log::warn;

/// Classifies day-over-day movement per instrument.
///
/// There is no tolerance band: after optional rounding to `precision`
/// decimal places, only exact equality counts as `Unchanged`. Without
/// rounding, sub-paisa parsing noise shows up as a change.
pub struct TrendEngine {
    precision: Option<u32>,
}

impl TrendEngine {
    pub fn new(precision: Option<u32>) -> Self {
        Self { precision }
    }

    fn normalize(&self, value: f64) -> f64 {
        match self.precision {
            Some(places) => round_to(value, places),
            None => value,
        }
    }

    /// 对 current 中的每个品种与基准比较
    pub fn compare(&self, current: &QuoteRecord, baseline: Option<&QuoteRecord>) -> TrendResult {
        let mut result = TrendResult::new();

        for (instrument, value) in current.iter() {
            let previous = baseline.and_then(|b| b.get(instrument));
            let trend = match previous {
                None => Trend::NoBaseline,
                Some(previous) => {
                    let delta = self.normalize(self.normalize(value) - self.normalize(previous));
                    if !delta.is_finite() {
                        warn!("Cannot compare {} ({} vs {}), treating as no baseline", instrument, value, previous);
                        Trend::NoBaseline
                    } else if delta > 0.0 {
                        Trend::Increase(delta)
                    } else if delta < 0.0 {
                        Trend::Decrease(delta.abs())
                    } else {
                        Trend::Unchanged
                    }
                }
            };
            result.insert(instrument, trend);
        }

        result
    }
}

impl Default for TrendEngine {
    fn default() -> Self {
        Self::new(Some(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Instrument;

    fn record(pairs: &[(Instrument, f64)]) -> QuoteRecord {
        QuoteRecord::try_from_prices(pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_no_baseline() {
        let current = record(&[(Instrument::Gold24k, 13069.0), (Instrument::Silver, 190.0)]);
        let result = TrendEngine::default().compare(&current, None);
        assert_eq!(result.len(), 2);
        assert!(result.iter().all(|(_, t)| t == Trend::NoBaseline));
    }

    #[test]
    fn test_key_missing_from_baseline() {
        let current = record(&[(Instrument::Gold24k, 13069.0), (Instrument::Silver, 190.0)]);
        let baseline = record(&[(Instrument::Silver, 190.0)]);
        let result = TrendEngine::default().compare(&current, Some(&baseline));
        assert_eq!(result.get(Instrument::Gold24k), Some(Trend::NoBaseline));
        assert_eq!(result.get(Instrument::Silver), Some(Trend::Unchanged));
    }

    #[test]
    fn test_increase_is_not_reported_as_decrease() {
        let current = record(&[(Instrument::Silver, 190.0)]);
        let baseline = record(&[(Instrument::Silver, 185.0)]);
        let result = TrendEngine::default().compare(&current, Some(&baseline));
        assert_eq!(result.get(Instrument::Silver), Some(Trend::Increase(5.0)));

        let result = TrendEngine::default().compare(&baseline, Some(&current));
        assert_eq!(result.get(Instrument::Silver), Some(Trend::Decrease(5.0)));
    }

    #[test]
    fn test_baseline_only_keys_are_ignored() {
        let current = record(&[(Instrument::Silver, 190.0)]);
        let baseline = record(&[(Instrument::Silver, 190.0), (Instrument::Gold22k, 11980.0)]);
        let result = TrendEngine::default().compare(&current, Some(&baseline));
        assert_eq!(result.len(), 1);
        assert_eq!(result.get(Instrument::Gold22k), None);
    }

    #[test]
    fn test_rounding_hides_float_noise() {
        let current = record(&[(Instrument::Gold24k, 13069.001)]);
        let baseline = record(&[(Instrument::Gold24k, 13069.0)]);

        let rounded = TrendEngine::new(Some(2)).compare(&current, Some(&baseline));
        assert_eq!(rounded.get(Instrument::Gold24k), Some(Trend::Unchanged));

        let exact = TrendEngine::new(None).compare(&current, Some(&baseline));
        assert!(matches!(exact.get(Instrument::Gold24k), Some(Trend::Increase(_))));
    }

    #[test]
    fn test_oversized_precision_still_classifies() {
        let current = record(&[(Instrument::Silver, 190.0)]);
        let baseline = record(&[(Instrument::Silver, 185.0)]);
        let result = TrendEngine::new(Some(400)).compare(&current, Some(&baseline));
        assert_eq!(result.get(Instrument::Silver), Some(Trend::Increase(5.0)));
    }

    #[test]
    fn test_rounding_overflow_keeps_direction() {
        // f64::MAX * 100 溢出，取整退回原值
        let current = record(&[(Instrument::Gold24k, f64::MAX)]);
        let baseline = record(&[(Instrument::Gold24k, 1.0)]);
        let result = TrendEngine::new(Some(2)).compare(&current, Some(&baseline));
        assert!(matches!(result.get(Instrument::Gold24k), Some(Trend::Increase(_))));

        let result = TrendEngine::new(Some(2)).compare(&baseline, Some(&current));
        assert!(matches!(result.get(Instrument::Gold24k), Some(Trend::Decrease(_))));
    }

    #[test]
    fn test_delta_is_rounded() {
        let current = record(&[(Instrument::Gold24k, 13069.1)]);
        let baseline = record(&[(Instrument::Gold24k, 13069.0)]);
        let result = TrendEngine::default().compare(&current, Some(&baseline));
        assert_eq!(result.get(Instrument::Gold24k), Some(Trend::Increase(0.1)));
    }
}
