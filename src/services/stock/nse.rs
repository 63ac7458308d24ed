//! NSE 图表服务数据源
//!
//! 先下载股票代码表（代码 -> ScripCode），再按 ScripCode 请求日K线。
//! 对接 https://charting.nseindia.com

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Asia::Kolkata;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use crate::config::{ApiConfig, FetchConfig};
use crate::errors::SourceError;
use crate::models::{DailyBar, HistoricalSeries};

use super::common::{NSE_EQ_MASTERS_PATH, NSE_HISTORY_PATH, USER_AGENT};
use super::source::StockDataSource;

/// 日K线请求体
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HistoryRequest {
    exch: &'static str,
    instr_type: &'static str,
    scrip_code: u64,
    ul_token: u64,
    from_date: i64,
    to_date: i64,
    time_interval: u32,
    chart_period: &'static str,
    chart_start: u32,
}

/// 日K线响应（列式数组）
#[derive(Debug, Deserialize)]
struct HistoryResponse {
    s: String,
    #[serde(default)]
    t: Vec<i64>,
    o: Option<Vec<Option<f64>>>,
    h: Option<Vec<Option<f64>>>,
    l: Option<Vec<Option<f64>>>,
    c: Option<Vec<Option<f64>>>,
    v: Option<Vec<Option<f64>>>,
}

/// NSE 数据源
pub struct NseSource {
    /// HTTP 客户端（启用 cookie）
    client: Client,
    /// 服务地址
    base_url: String,
    /// 代码表缓存：代码 -> ScripCode
    scrip_codes: RwLock<HashMap<String, u64>>,
}

impl NseSource {
    /// 创建数据源实例
    pub fn new(fetch: &FetchConfig, api: &ApiConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .gzip(true)
            .timeout(Duration::from_secs(api.timeout_secs))
            .connect_timeout(Duration::from_secs(api.connect_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: fetch.base_url.trim_end_matches('/').to_string(),
            scrip_codes: RwLock::new(HashMap::new()),
        })
    }

    /// 已缓存的代码数量
    pub fn cached_symbols(&self) -> usize {
        self.scrip_codes
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    fn lookup(&self, symbol: &str) -> Result<u64, SourceError> {
        let codes = self.scrip_codes.read().unwrap_or_else(|e| e.into_inner());
        if codes.is_empty() {
            return Err(SourceError::CacheNotReady);
        }
        resolve_scrip_code(&codes, symbol).ok_or_else(|| SourceError::UnknownSymbol(symbol.to_string()))
    }
}

#[async_trait]
impl StockDataSource for NseSource {
    fn name(&self) -> &'static str {
        "NSE"
    }

    async fn refresh_cache(&self) -> Result<(), SourceError> {
        // 先访问首页获取 cookie
        if let Err(e) = self.client.get(&self.base_url).send().await {
            log::debug!("访问 {} 获取 cookie 失败: {}", self.base_url, e);
        }

        let url = format!("{}{}", self.base_url, NSE_EQ_MASTERS_PATH);
        log::info!("📡 下载 NSE 代码表: {}", url);

        let response = self
            .client
            .get(&url)
            .header("Referer", &self.base_url)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        let codes = parse_eq_masters(&text);
        if codes.is_empty() {
            return Err(SourceError::InvalidResponse("empty NSE master list".to_string()));
        }

        *self.scrip_codes.write().unwrap_or_else(|e| e.into_inner()) = codes;
        log::info!("NSE 代码表共 {} 条", self.cached_symbols());
        Ok(())
    }

    async fn fetch_daily_series(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<HistoricalSeries, SourceError> {
        let scrip_code = self.lookup(symbol)?;
        let url = format!("{}{}", self.base_url, NSE_HISTORY_PATH);

        let payload = HistoryRequest {
            exch: "N",
            instr_type: "C",
            scrip_code,
            ul_token: scrip_code,
            from_date: start.timestamp(),
            to_date: end.timestamp(),
            time_interval: 1,
            chart_period: "D",
            chart_start: 0,
        };

        log::debug!("请求 {} 日K线 (scripCode={})", symbol, scrip_code);

        let response = self
            .client
            .post(&url)
            .header("Referer", &self.base_url)
            .header("Origin", &self.base_url)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Status {
                status: response.status().as_u16(),
                url,
            });
        }

        let text = response.text().await?;
        parse_history(&text, symbol)
    }
}

/// 解析代码表，每行格式为 `ScripCode|Symbol|Name|Type`
///
/// 无法解析 ScripCode 的行（如表头）直接跳过
fn parse_eq_masters(text: &str) -> HashMap<String, u64> {
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split('|');
            let code = fields.next()?.trim().parse::<u64>().ok()?;
            let symbol = fields.next()?.trim();
            if symbol.is_empty() {
                return None;
            }
            Some((symbol.to_uppercase(), code))
        })
        .collect()
}

/// 代码表中的股票可能带 `-EQ` 后缀
fn resolve_scrip_code(codes: &HashMap<String, u64>, symbol: &str) -> Option<u64> {
    let symbol = symbol.to_uppercase();
    codes
        .get(&symbol)
        .or_else(|| codes.get(&format!("{}-EQ", symbol)))
        .copied()
}

fn column_value(column: &Option<Vec<Option<f64>>>, idx: usize) -> Option<f64> {
    column
        .as_ref()
        .and_then(|values| values.get(idx).copied().flatten())
        .filter(|v| v.is_finite())
}

fn to_trading_date(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(&Kolkata).date_naive())
}

/// 解析日K线响应
///
/// 状态为无数据时返回空序列；缺失的列对应字段为 `None`
fn parse_history(text: &str, symbol: &str) -> Result<HistoricalSeries, SourceError> {
    let data: HistoryResponse = serde_json::from_str(text)?;

    match data.s.to_ascii_lowercase().as_str() {
        "ok" => {}
        "no_data" | "no data" | "nodata" => {
            return Ok(HistoricalSeries::new(symbol, Vec::new()));
        }
        _ => return Err(SourceError::Api(data.s)),
    }

    let mut bars = Vec::with_capacity(data.t.len());
    for (idx, ts) in data.t.iter().enumerate() {
        let date = to_trading_date(*ts)
            .ok_or_else(|| SourceError::InvalidResponse(format!("invalid timestamp {}", ts)))?;

        bars.push(DailyBar {
            date,
            open: column_value(&data.o, idx),
            high: column_value(&data.h, idx),
            low: column_value(&data.l, idx),
            close: column_value(&data.c, idx),
            volume: column_value(&data.v, idx).map(|v| v.max(0.0) as u64),
        });
    }
    bars.sort_by_key(|bar| bar.date);

    Ok(HistoricalSeries::new(symbol, bars))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTERS: &str = "ScripCode|Symbol|Name|Type\n\
        2885|RELIANCE-EQ|RELIANCE INDUSTRIES LTD|EQ\n\
        11536|TCS-EQ|TATA CONSULTANCY SERV LT|EQ\n\
        2031|M&M-EQ|MAHINDRA & MAHINDRA LTD|EQ\n\
        99926000|NIFTY 50|NIFTY 50|IDX\n\
        \n\
        broken line\n";

    #[test]
    fn test_parse_eq_masters_skips_header_and_blank_lines() {
        let codes = parse_eq_masters(MASTERS);
        assert_eq!(codes.len(), 4);
        assert_eq!(codes.get("RELIANCE-EQ"), Some(&2885));
        assert_eq!(codes.get("NIFTY 50"), Some(&99926000));
    }

    #[test]
    fn test_resolve_scrip_code_with_eq_suffix() {
        let codes = parse_eq_masters(MASTERS);

        let test_cases = vec![
            ("RELIANCE", Some(2885)),
            ("tcs", Some(11536)),
            ("M&M", Some(2031)),
            ("NIFTY 50", Some(99926000)),
            ("FOO", None),
        ];

        for (input, expected) in &test_cases {
            let result = resolve_scrip_code(&codes, input);
            println!("  {} -> {:?} (期望: {:?})", input, result, expected);
            assert_eq!(result, *expected);
        }
    }

    #[test]
    fn test_parse_history_ok() {
        // 2024-01-02 / 2024-01-01 09:00 IST，故意倒序
        let text = r#"{"s":"Ok","t":[1704166200,1704079800],
            "o":[101.0,99.5],"h":[103.2,100.4],"l":[100.1,98.7],"c":[102.8,100.0],"v":[1200.0,900.0]}"#;
        let series = parse_history(text, "RELIANCE").unwrap();

        assert_eq!(series.symbol, "RELIANCE");
        assert_eq!(series.bars.len(), 2);
        assert_eq!(series.bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(series.bars[0].close, Some(100.0));
        assert_eq!(series.bars[1].high, Some(103.2));
        assert_eq!(series.bars[1].volume, Some(1200));
    }

    #[test]
    fn test_parse_history_missing_column_leaves_none() {
        let text = r#"{"s":"Ok","t":[1704079800],"o":[99.5],"l":[98.7],"c":[100.0]}"#;
        let series = parse_history(text, "TCS").unwrap();

        assert_eq!(series.bars.len(), 1);
        assert_eq!(series.bars[0].high, None);
        assert_eq!(series.bars[0].low, Some(98.7));
    }

    #[test]
    fn test_parse_history_null_values() {
        let text = r#"{"s":"Ok","t":[1704079800],"o":[null],"h":[null],"l":[98.7],"c":[100.0],"v":[null]}"#;
        let series = parse_history(text, "TCS").unwrap();
        assert_eq!(series.bars[0].high, None);
        assert_eq!(series.bars[0].volume, None);
    }

    #[test]
    fn test_parse_history_no_data_is_empty() {
        let series = parse_history(r#"{"s":"no_data"}"#, "FOO").unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_history_error_status() {
        let err = parse_history(r#"{"s":"error"}"#, "FOO").unwrap_err();
        assert!(matches!(err, SourceError::Api(ref s) if s == "error"));

        let err = parse_history("<html>blocked</html>", "FOO").unwrap_err();
        assert!(matches!(err, SourceError::InvalidResponse(_)));
    }

    #[test]
    fn test_history_request_field_names() {
        let payload = HistoryRequest {
            exch: "N",
            instr_type: "C",
            scrip_code: 2885,
            ul_token: 2885,
            from_date: 1672531200,
            to_date: 1704067200,
            time_interval: 1,
            chart_period: "D",
            chart_start: 0,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "exch": "N",
                "instrType": "C",
                "scripCode": 2885,
                "ulToken": 2885,
                "fromDate": 1672531200,
                "toDate": 1704067200,
                "timeInterval": 1,
                "chartPeriod": "D",
                "chartStart": 0
            })
        );
    }

    #[tokio::test]
    async fn test_fetch_before_refresh_is_cache_not_ready() {
        let source = NseSource::new(&FetchConfig::default(), &ApiConfig::default()).unwrap();
        assert_eq!(source.cached_symbols(), 0);

        let end = Utc::now();
        let start = end - chrono::Duration::days(365);
        let err = source.fetch_daily_series("RELIANCE", start, end).await.unwrap_err();
        assert!(matches!(err, SourceError::CacheNotReady));
    }
}
