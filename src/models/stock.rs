//! 股票数据模型
//!
//! 定义日K线序列与衍生指标的数据结构

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 单日 OHLC 数据
///
/// 数据源响应中缺失的字段为 `None`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyBar {
    /// 日期
    pub date: NaiveDate,
    /// 开盘价
    pub open: Option<f64>,
    /// 最高价
    pub high: Option<f64>,
    /// 最低价
    pub low: Option<f64>,
    /// 收盘价
    pub close: Option<f64>,
    /// 成交量
    pub volume: Option<u64>,
}

/// 单只股票的历史日K线序列（按日期升序）
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct HistoricalSeries {
    /// 股票代码
    pub symbol: String,
    /// 日K线
    pub bars: Vec<DailyBar>,
}

impl HistoricalSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<DailyBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// 股票衍生指标
///
/// 每只股票抓取成功后构造一次，之后不再修改。所有数值保留两位小数。
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StockMetric {
    /// 股票代码
    pub symbol: String,
    /// 最新收盘价
    pub price: f64,
    /// 较前一交易日涨跌幅（百分比）
    pub change: f64,
    /// 52 周最高价
    pub high_52w: f64,
    /// 52 周最低价
    pub low_52w: f64,
    /// 距 52 周最高价的跌幅（百分比，非正数）
    pub down_from_high: f64,
}
