//! 配置模块
//!
//! 支持从 JSON 文件加载系统配置

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 回看天数上限（约 100 年）
pub const MAX_LOOKBACK_DAYS: i64 = 36_500;

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
    /// 工作线程数（0 表示使用 CPU 核心数）
    #[serde(default)]
    pub workers: usize,
}

/// 数据源请求配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// 请求超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// 日志级别: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// 行情抓取配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// 回看天数（52 周 = 365 天）
    #[serde(default = "default_lookback_days")]
    pub lookback_days: i64,
    /// 并发抓取数（1 表示逐只顺序抓取）
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// NSE 图表服务地址
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,
    /// 数据源请求配置
    #[serde(default)]
    pub api: ApiConfig,
    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
    /// 行情抓取配置
    #[serde(default)]
    pub fetch: FetchConfig,
}

// 默认值函数
fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8501 }
fn default_timeout() -> u64 { 30 }
fn default_connect_timeout() -> u64 { 10 }
fn default_log_level() -> String { "info".to_string() }
fn default_lookback_days() -> i64 { 365 }
fn default_concurrency() -> usize { 1 }
fn default_base_url() -> String { "https://charting.nseindia.com".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: 0,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            lookback_days: default_lookback_days(),
            concurrency: default_concurrency(),
            base_url: default_base_url(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            api: ApiConfig::default(),
            log: LogConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从 JSON 文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析配置，缺省字段使用默认值
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: AppConfig = serde_json::from_str(content)?;
        let lookback_days = config.fetch.lookback_days;
        if lookback_days <= 0 || lookback_days > MAX_LOOKBACK_DAYS {
            anyhow::bail!(
                "fetch.lookback_days 必须在 1 ~ {} 之间: {}",
                MAX_LOOKBACK_DAYS,
                lookback_days
            );
        }
        Ok(config)
    }

    /// 加载配置，依次尝试 `config.json`、`config/config.json`，都不可用时使用默认值
    ///
    /// 日志系统依赖配置中的日志级别，因此这里返回的提示信息由调用方在初始化日志后输出
    pub fn load() -> (Self, Vec<(log::Level, String)>) {
        Self::load_from(&["config.json", "config/config.json"])
    }

    fn load_from<P: AsRef<Path>>(config_paths: &[P]) -> (Self, Vec<(log::Level, String)>) {
        let mut notes = Vec::new();

        for path in config_paths {
            let path = path.as_ref();
            if path.exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        notes.push((log::Level::Info, format!("从 {} 加载配置成功", path.display())));
                        return (config, notes);
                    }
                    Err(e) => {
                        notes.push((log::Level::Warn, format!("加载配置文件 {} 失败: {}", path.display(), e)));
                    }
                }
            }
        }

        notes.push((log::Level::Info, "使用默认配置".to_string()));
        (Self::default(), notes)
    }

    /// 获取服务器绑定地址
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
