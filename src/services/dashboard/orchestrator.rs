//! 抓取流程
//!
//! 刷新代码表后按列表顺序逐只抓取日K线、计算指标，并通过 [`Presenter`] 汇报进度。
//! 单只股票的失败只记录诊断信息，不影响其他股票。

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};

use crate::config::FetchConfig;
use crate::errors::{DashboardError, MetricError, SourceError};
use crate::models::{Diagnostic, RunReport, Severity, StockMetric};
use crate::services::stock::{derive_metrics, StockDataSource};

use super::presenter::Presenter;

pub const PAGE_TITLE: &str = "📊 Nifty 50 Dashboard";
pub const CACHE_REFRESH_STATUS: &str = "Downloading NSE data... This may take a few minutes.";
pub const CACHE_REFRESH_DONE: &str = "NSE data download completed!";
pub const EMPTY_RESULT_MESSAGE: &str =
    "No data was successfully fetched for any stocks. Please check your internet connection and try again.";

/// 抓取参数
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// 回看天数
    pub lookback_days: i64,
    /// 同时进行的请求数，1 为顺序抓取
    pub concurrency: usize,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            lookback_days: 365,
            concurrency: 1,
        }
    }
}

impl From<&FetchConfig> for FetchOptions {
    fn from(config: &FetchConfig) -> Self {
        Self {
            lookback_days: config.lookback_days,
            concurrency: config.concurrency.max(1),
        }
    }
}

/// 单只股票的失败原因
#[derive(Debug)]
pub enum SymbolFailure {
    /// 请求失败
    Fetch(SourceError),
    /// 数据不完整或无法计算
    Metric(MetricError),
}

impl SymbolFailure {
    /// 转换为展示给用户的诊断信息
    pub fn into_diagnostic(self, symbol: &str) -> Diagnostic {
        match self {
            Self::Metric(e) if e.is_incomplete() => Diagnostic {
                symbol: symbol.to_string(),
                severity: Severity::Warning,
                message: format!("Data for {} is incomplete or missing required columns", symbol),
            },
            Self::Metric(e) => Diagnostic {
                symbol: symbol.to_string(),
                severity: Severity::Error,
                message: format!("Error fetching data for {}: {}", symbol, e),
            },
            Self::Fetch(e) => Diagnostic {
                symbol: symbol.to_string(),
                severity: Severity::Error,
                message: format!("Error fetching data for {}: {}", symbol, e),
            },
        }
    }
}

/// 抓取单只股票并计算指标
pub async fn fetch_symbol(
    source: &dyn StockDataSource,
    symbol: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<StockMetric, SymbolFailure> {
    let series = source
        .fetch_daily_series(symbol, start, end)
        .await
        .map_err(SymbolFailure::Fetch)?;
    derive_metrics(&series).map_err(SymbolFailure::Metric)
}

fn report_diagnostic(presenter: &dyn Presenter, diagnostic: &Diagnostic) {
    log::warn!("跳过 {}: {}", diagnostic.symbol, diagnostic.message);
    match diagnostic.severity {
        Severity::Warning => presenter.warning(&diagnostic.message),
        Severity::Error => presenter.error(&diagnostic.message),
    }
}

/// 计算抓取区间，回看天数超出时间可表示范围时返回 `None`
fn lookback_range(end: DateTime<Utc>, lookback_days: i64) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = end.checked_sub_signed(Duration::try_days(lookback_days)?)?;
    Some((start, end))
}

/// 执行一次完整运行
///
/// 1. 刷新代码表缓存，失败则终止本次运行
/// 2. 按顺序抓取每只股票（`concurrency > 1` 时并发请求，但结果和进度仍按列表顺序汇总）
/// 3. 全部失败时提示错误，否则输出表格
pub async fn run_dashboard(
    source: &dyn StockDataSource,
    presenter: &dyn Presenter,
    symbols: &[&str],
    options: &FetchOptions,
) -> Result<RunReport, DashboardError> {
    presenter.title(PAGE_TITLE);

    let Some((start, end)) = lookback_range(Utc::now(), options.lookback_days) else {
        log::error!("回看天数超出范围: {}", options.lookback_days);
        presenter.error(&format!("Invalid lookback period: {} days", options.lookback_days));
        return Err(DashboardError::InvalidLookback(options.lookback_days));
    };

    presenter.status(CACHE_REFRESH_STATUS);
    if let Err(e) = source.refresh_cache().await {
        presenter.clear_status();
        log::error!("{} 代码表下载失败: {}", source.name(), e);
        presenter.error(&format!("Failed to download NSE data: {}", e));
        return Err(DashboardError::CacheRefresh(e));
    }
    presenter.clear_status();
    presenter.success(CACHE_REFRESH_DONE);

    let total = symbols.len();
    log::info!("开始抓取 {} 只股票，区间 {} ~ {}", total, start.date_naive(), end.date_naive());

    presenter.progress(0.0);

    let initial = RunReport {
        attempted: total,
        ..RunReport::default()
    };

    let report = stream::iter(symbols.iter().copied().enumerate())
        .map(move |(idx, symbol)| async move {
            presenter.status(&format!("Fetching data for {}...", symbol));
            (idx, symbol, fetch_symbol(source, symbol, start, end).await)
        })
        .buffered(options.concurrency.max(1))
        .fold(initial, move |mut report, (idx, symbol, outcome)| async move {
            match outcome {
                Ok(metric) => report.results.push(metric),
                Err(failure) => {
                    let diagnostic = failure.into_diagnostic(symbol);
                    report_diagnostic(presenter, &diagnostic);
                    report.diagnostics.push(diagnostic);
                }
            }
            presenter.progress((idx + 1) as f64 / total as f64);
            report
        })
        .await;

    presenter.clear_status();
    presenter.clear_progress();

    log::info!(
        "抓取完成: 成功 {} 只，失败 {} 只",
        report.results.len(),
        report.diagnostics.len()
    );

    if report.results.is_empty() {
        presenter.error(EMPTY_RESULT_MESSAGE);
        return Err(DashboardError::EmptyResult {
            attempted: report.attempted,
            diagnostics: report.diagnostics,
        });
    }

    presenter.table(&report.results);
    Ok(report)
}
