//! 看板服务
//!
//! 组合数据源、抓取流程和页面模型，负责在后台启动一次运行

mod orchestrator;
mod presenter;
mod render;

pub use orchestrator::FetchOptions;
pub use presenter::{DashboardPage, PageState};
pub use render::render_page;

use orchestrator::run_dashboard;

use std::sync::Arc;

use crate::errors::DashboardError;
use crate::services::stock::{StockDataSource, NIFTY50_SYMBOLS};

/// 运行结束（包括 panic 退出）时释放页面
struct RunGuard<'a>(&'a DashboardPage);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.finish_run();
    }
}

/// 看板服务
///
/// 克隆开销很小，可直接放入 `web::Data`
#[derive(Clone)]
pub struct DashboardService {
    /// 行情数据源
    source: Arc<dyn StockDataSource>,
    /// 页面模型
    page: Arc<DashboardPage>,
    /// 抓取参数
    options: FetchOptions,
    /// 股票列表
    symbols: &'static [&'static str],
}

impl DashboardService {
    /// 创建看板服务，默认抓取 Nifty 50 成分股
    pub fn new(source: Arc<dyn StockDataSource>, options: FetchOptions) -> Self {
        Self {
            source,
            page: Arc::new(DashboardPage::new()),
            options,
            symbols: &NIFTY50_SYMBOLS,
        }
    }

    /// 替换股票列表
    pub fn with_symbols(mut self, symbols: &'static [&'static str]) -> Self {
        self.symbols = symbols;
        self
    }

    pub fn page(&self) -> &DashboardPage {
        &self.page
    }

    /// 在后台启动一次运行，已有运行时返回 `false`
    pub fn trigger(&self) -> bool {
        if !self.page.begin_run() {
            log::info!("已有运行进行中，忽略本次请求");
            return false;
        }

        let service = self.clone();
        actix_web::rt::spawn(async move {
            service.run().await;
        });
        true
    }

    /// 执行一次运行，调用前需已通过 `begin_run` 占用页面
    async fn run(&self) {
        let _guard = RunGuard(self.page.as_ref());
        log::info!("开始运行，数据源: {}", self.source.name());

        let result = run_dashboard(
            self.source.as_ref(),
            self.page.as_ref(),
            self.symbols,
            &self.options,
        )
        .await;

        match result {
            Ok(report) => {
                log::info!(
                    "运行完成，表格共 {} 行，跳过 {} 只",
                    report.results.len(),
                    report.diagnostics.len()
                );
            }
            Err(DashboardError::EmptyResult { diagnostics, .. }) => {
                log::error!("运行失败: {} 只股票全部抓取失败", diagnostics.len());
            }
            Err(e) => {
                log::error!("运行失败: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use crate::models::{DailyBar, HistoricalSeries};
    use async_trait::async_trait;
    use chrono::{DateTime, NaiveDate, Utc};
    use std::time::Duration;

    struct FlatSource;

    #[async_trait]
    impl StockDataSource for FlatSource {
        fn name(&self) -> &'static str {
            "FLAT"
        }

        async fn refresh_cache(&self) -> Result<(), SourceError> {
            Ok(())
        }

        async fn fetch_daily_series(
            &self,
            symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<HistoricalSeries, SourceError> {
            tokio::time::sleep(Duration::from_millis(20)).await;
            let bar = DailyBar {
                date: NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                open: Some(10.0),
                high: Some(12.0),
                low: Some(9.0),
                close: Some(11.0),
                volume: Some(500),
            };
            Ok(HistoricalSeries::new(symbol, vec![bar]))
        }
    }

    /// 刷新代码表时 panic 的数据源
    struct PanickingSource;

    #[async_trait]
    impl StockDataSource for PanickingSource {
        fn name(&self) -> &'static str {
            "PANIC"
        }

        async fn refresh_cache(&self) -> Result<(), SourceError> {
            panic!("master list parser blew up");
        }

        async fn fetch_daily_series(
            &self,
            symbol: &str,
            _start: DateTime<Utc>,
            _end: DateTime<Utc>,
        ) -> Result<HistoricalSeries, SourceError> {
            Err(SourceError::UnknownSymbol(symbol.to_string()))
        }
    }

    async fn wait_until_idle(service: &DashboardService) {
        for _ in 0..100 {
            if !service.page().is_running() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    #[actix_web::test]
    async fn test_panicking_run_releases_page() {
        let service = DashboardService::new(Arc::new(PanickingSource), FetchOptions::default());

        assert!(service.trigger());
        wait_until_idle(&service).await;

        let state = service.page().snapshot();
        assert!(!state.running);
        assert!(state.finished_at.is_some());
        assert!(service.trigger());
    }

    #[actix_web::test]
    async fn test_out_of_range_lookback_releases_page() {
        let options = FetchOptions {
            lookback_days: 200_000_000_000_000,
            ..FetchOptions::default()
        };
        let service = DashboardService::new(Arc::new(FlatSource), options).with_symbols(&["SBIN"]);

        assert!(service.trigger());
        wait_until_idle(&service).await;

        let state = service.page().snapshot();
        assert!(!state.running);
        assert!(state.rows.is_none());
        assert!(state.banners[0].message.starts_with("Invalid lookback period"));
        assert!(service.trigger());
    }

    #[actix_web::test]
    async fn test_trigger_runs_in_background_once() {
        let service = DashboardService::new(Arc::new(FlatSource), FetchOptions::default())
            .with_symbols(&["SBIN", "ONGC"]);

        assert!(service.trigger());
        assert!(!service.trigger());
        assert!(service.page().is_running());

        wait_until_idle(&service).await;

        let state = service.page().snapshot();
        assert!(!state.running);
        assert!(state.progress.is_none());
        let symbols: Vec<String> = state.rows.unwrap().into_iter().map(|m| m.symbol).collect();
        assert_eq!(symbols, vec!["SBIN", "ONGC"]);
    }
}
