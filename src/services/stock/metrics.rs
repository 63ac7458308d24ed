//! 指标计算
//!
//! 从一年日K线推导最新价、涨跌幅、52 周高低点以及距高点跌幅

use crate::errors::MetricError;
use crate::models::{DailyBar, HistoricalSeries, StockMetric};

/// 保留两位小数，并把 -0.00 归一为 0.00
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

fn required(bar: &DailyBar) -> Result<(f64, f64, f64), MetricError> {
    let high = bar.high.ok_or(MetricError::MalformedData("high"))?;
    let low = bar.low.ok_or(MetricError::MalformedData("low"))?;
    let close = bar.close.ok_or(MetricError::MalformedData("close"))?;
    Ok((high, low, close))
}

/// 百分比变化，基准为零时返回错误
fn percent_change(value: f64, base: f64, base_name: &'static str) -> Result<f64, MetricError> {
    if base == 0.0 {
        return Err(MetricError::InvalidReferencePrice(base_name));
    }
    let pct = (value - base) / base * 100.0;
    if !pct.is_finite() {
        return Err(MetricError::InvalidReferencePrice(base_name));
    }
    Ok(pct)
}

/// 计算单只股票的衍生指标
///
/// - 序列为空：[`MetricError::NoData`]
/// - 任一K线缺少 high/low/close：[`MetricError::MalformedData`]
/// - 前收盘价或 52 周最高价为零：[`MetricError::InvalidReferencePrice`]
///
/// 只有一条K线时前收盘价取最新价，涨跌幅为 0。
pub fn derive_metrics(series: &HistoricalSeries) -> Result<StockMetric, MetricError> {
    if series.is_empty() {
        return Err(MetricError::NoData);
    }

    let mut high_52w = f64::NEG_INFINITY;
    let mut low_52w = f64::INFINITY;
    let mut closes = Vec::with_capacity(series.bars.len());

    for bar in &series.bars {
        let (high, low, close) = required(bar)?;
        high_52w = high_52w.max(high);
        low_52w = low_52w.min(low);
        closes.push(close);
    }

    let price = closes[closes.len() - 1];
    let prev_price = if closes.len() > 1 {
        closes[closes.len() - 2]
    } else {
        price
    };

    let change = percent_change(price, prev_price, "previous close")?;
    let down_from_high = percent_change(price, high_52w, "52-week high")?;

    Ok(StockMetric {
        symbol: series.symbol.clone(),
        price: round2(price),
        change: round2(change),
        high_52w: round2(high_52w),
        low_52w: round2(low_52w),
        down_from_high: round2(down_from_high),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, high: f64, low: f64, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: Some(close),
            high: Some(high),
            low: Some(low),
            close: Some(close),
            volume: Some(1_000),
        }
    }

    fn series(bars: Vec<DailyBar>) -> HistoricalSeries {
        HistoricalSeries::new("TEST", bars)
    }

    /// 两条K线的完整场景
    #[test]
    fn test_two_bar_scenario() {
        let s = series(vec![bar(1, 110.0, 100.0, 100.0), bar(2, 110.0, 100.0, 110.0)]);
        let metric = derive_metrics(&s).unwrap();

        assert_eq!(metric.symbol, "TEST");
        assert_eq!(metric.price, 110.0);
        assert_eq!(metric.change, 10.0);
        assert_eq!(metric.high_52w, 110.0);
        assert_eq!(metric.low_52w, 100.0);
        assert_eq!(metric.down_from_high, 0.0);
    }

    #[test]
    fn test_single_bar_has_zero_change() {
        let s = series(vec![bar(1, 52.0, 48.0, 50.0)]);
        let metric = derive_metrics(&s).unwrap();

        assert_eq!(metric.price, 50.0);
        assert_eq!(metric.change, 0.0);
        assert!(metric.change.is_sign_positive());
        assert_eq!(metric.down_from_high, -3.85);
    }

    #[test]
    fn test_empty_series_is_no_data() {
        let s = series(Vec::new());
        assert_eq!(derive_metrics(&s), Err(MetricError::NoData));
    }

    #[test]
    fn test_missing_field_is_malformed() {
        let mut broken = bar(2, 12.0, 9.0, 11.0);
        broken.low = None;
        let s = series(vec![bar(1, 12.0, 9.0, 10.0), broken]);

        let err = derive_metrics(&s).unwrap_err();
        assert_eq!(err, MetricError::MalformedData("low"));
        assert!(err.is_incomplete());
    }

    #[test]
    fn test_zero_high_is_derivation_failure() {
        let s = series(vec![bar(1, 0.0, 0.0, 0.0), bar(2, 0.0, 0.0, 0.0)]);
        let err = derive_metrics(&s).unwrap_err();
        assert!(matches!(err, MetricError::InvalidReferencePrice(_)));
        assert!(!err.is_incomplete());
    }

    #[test]
    fn test_zero_high_single_bar_reports_high() {
        let s = series(vec![bar(1, 0.0, 0.0, 0.0)]);
        assert_eq!(
            derive_metrics(&s),
            Err(MetricError::InvalidReferencePrice("previous close"))
        );

        let s = series(vec![bar(1, 0.0, 0.0, 5.0)]);
        assert_eq!(
            derive_metrics(&s),
            Err(MetricError::InvalidReferencePrice("52-week high"))
        );
    }

    #[test]
    fn test_zero_previous_close_is_derivation_failure() {
        let s = series(vec![bar(1, 10.0, 0.0, 0.0), bar(2, 10.0, 5.0, 8.0)]);
        assert_eq!(
            derive_metrics(&s),
            Err(MetricError::InvalidReferencePrice("previous close"))
        );
    }

    #[test]
    fn test_high_low_bound_every_bar() {
        let bars = vec![
            bar(1, 101.3, 97.2, 100.0),
            bar(2, 108.9, 99.1, 107.5),
            bar(3, 104.4, 88.8, 90.1),
            bar(4, 95.0, 90.0, 93.7),
        ];
        let metric = derive_metrics(&series(bars.clone())).unwrap();

        for b in &bars {
            assert!(metric.high_52w >= b.high.unwrap());
            assert!(metric.low_52w <= b.low.unwrap());
        }
        assert_eq!(metric.high_52w, 108.9);
        assert_eq!(metric.low_52w, 88.8);
        assert!(metric.down_from_high <= 0.0);
    }

    #[test]
    fn test_change_sign_follows_last_move() {
        let cases = vec![
            (100.0, 101.0, 1.0),
            (100.0, 99.0, -1.0),
            (250.0, 250.0, 0.0),
        ];

        for (prev, last, expected_sign) in cases {
            let s = series(vec![bar(1, 300.0, 50.0, prev), bar(2, 300.0, 50.0, last)]);
            let metric = derive_metrics(&s).unwrap();
            println!("  {} -> {}: change = {}", prev, last, metric.change);
            if expected_sign > 0.0 {
                assert!(metric.change > 0.0);
            } else if expected_sign < 0.0 {
                assert!(metric.change < 0.0);
            } else {
                assert_eq!(metric.change, 0.0);
            }
        }
    }

    #[test]
    fn test_rounds_from_unrounded_inputs() {
        let s = series(vec![bar(1, 3000.0, 2000.0, 2456.789), bar(2, 3000.0, 2000.0, 2470.126)]);
        let metric = derive_metrics(&s).unwrap();

        assert_eq!(metric.price, 2470.13);
        // (2470.126 - 2456.789) / 2456.789 * 100 = 0.5428...
        assert_eq!(metric.change, 0.54);
        assert_eq!(metric.down_from_high, -17.66);
    }

    #[test]
    fn test_is_deterministic() {
        let s = series(vec![bar(1, 12.5, 10.1, 11.0), bar(2, 13.2, 10.9, 12.7)]);
        assert_eq!(derive_metrics(&s), derive_metrics(&s));
    }
}
