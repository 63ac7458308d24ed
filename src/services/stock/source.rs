//! 行情数据源 trait

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::errors::SourceError;
use crate::models::HistoricalSeries;

/// 日K线数据源
///
/// 调用 [`fetch_daily_series`](Self::fetch_daily_series) 前必须先调用一次
/// [`refresh_cache`](Self::refresh_cache)。
#[async_trait]
pub trait StockDataSource: Send + Sync {
    /// 数据源名称，用于日志
    fn name(&self) -> &'static str;

    /// 刷新本地代码表缓存（阻塞直到完成）
    async fn refresh_cache(&self) -> Result<(), SourceError>;

    /// 获取 `[start, end]` 区间的日K线，按日期升序
    async fn fetch_daily_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricalSeries, SourceError>;
}
