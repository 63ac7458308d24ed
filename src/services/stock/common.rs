//! 公共常量和辅助函数

use chrono::{DateTime, Utc};
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;

// ==================== 指数成分 ====================

/// Nifty 50 成分股代码（NSE 代码）
pub const NIFTY50_SYMBOLS: [&str; 50] = [
    "RELIANCE", "TCS", "HDFCBANK", "ICICIBANK", "INFY", "HINDUNILVR", "HDFC", "SBIN",
    "BHARTIARTL", "KOTAKBANK", "BAJFINANCE", "LICI", "LT", "HCLTECH", "ASIANPAINT",
    "AXISBANK", "MARUTI", "SUNPHARMA", "TITAN", "ADANIENT", "DMART", "ULTRACEMCO",
    "BAJAJFINSV", "WIPRO", "ONGC", "NTPC", "JSWSTEEL", "POWERGRID", "M&M", "TATASTEEL",
    "ADANIPORTS", "COALINDIA", "TECHM", "TATAMOTORS", "GRASIM", "BRITANNIA", "EICHERMOT",
    "ITC", "HEROMOTOCO", "DIVISLAB", "DRREDDY", "CIPLA", "ADANIGREEN", "HINDALCO",
    "SBILIFE", "BAJAJ-AUTO", "HDFCLIFE", "UPL", "BPCL", "INDUSINDBK",
];

// ==================== NSE 图表服务 API ====================

/// 股票代码表（ScripCode|Symbol|Name|Type）
pub const NSE_EQ_MASTERS_PATH: &str = "/Charts/GetEQMasters";
/// 历史K线数据
pub const NSE_HISTORY_PATH: &str = "/Charts/symbolhistoricaldata/";

pub const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// 获取印度标准时间
pub fn india_now() -> DateTime<Tz> {
    Utc::now().with_timezone(&Kolkata)
}
