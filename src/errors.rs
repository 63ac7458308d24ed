//! 错误类型定义
//!
//! - [`SourceError`]: 数据源（缓存刷新、日K线请求）错误
//! - [`MetricError`]: 指标计算错误
//! - [`DashboardError`]: 整次运行的错误

use thiserror::Error;

use crate::models::Diagnostic;

/// 数据源错误
#[derive(Error, Debug)]
pub enum SourceError {
    /// 网络错误或请求超时
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// 非 2xx 响应
    #[error("unexpected HTTP status {status} from {url}")]
    Status {
        status: u16,
        url: String,
    },

    /// 代码不在 NSE 代码表中
    #[error("symbol {0} not found in NSE master list")]
    UnknownSymbol(String),

    /// 尚未刷新代码表缓存
    #[error("instrument cache is empty, refresh it before fetching")]
    CacheNotReady,

    /// 数据源返回的错误状态
    #[error("NSE returned status {0:?}")]
    Api(String),

    /// 响应无法解析
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidResponse(e.to_string())
    }
}

/// 指标计算错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricError {
    /// 序列为空
    #[error("no data")]
    NoData,

    /// 缺少必需字段
    #[error("malformed data: missing {0} value")]
    MalformedData(&'static str),

    /// 除数为零
    #[error("invalid reference price: {0} is zero")]
    InvalidReferencePrice(&'static str),
}

impl MetricError {
    /// 序列为空或字段缺失
    pub fn is_incomplete(&self) -> bool {
        matches!(self, Self::NoData | Self::MalformedData(_))
    }
}

/// 整次运行的错误
#[derive(Error, Debug)]
pub enum DashboardError {
    /// 代码表下载失败，本次运行终止
    #[error("failed to download NSE data: {0}")]
    CacheRefresh(#[source] SourceError),

    /// 回看天数超出时间可表示范围
    #[error("lookback of {0} days is out of range")]
    InvalidLookback(i64),

    /// 所有股票均抓取失败
    #[error("no data fetched for any of {attempted} symbols")]
    EmptyResult {
        attempted: usize,
        diagnostics: Vec<Diagnostic>,
    },
}
