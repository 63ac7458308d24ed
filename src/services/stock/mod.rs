//! 股票数据服务模块
//!
//! 提供数据源接入和指标计算

pub mod common;
pub mod metrics;
pub mod nse;
pub mod source;

pub use common::{india_now, NIFTY50_SYMBOLS};
pub use metrics::derive_metrics;
pub use nse::NseSource;
pub use source::StockDataSource;
