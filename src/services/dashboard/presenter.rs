//! 展示层
//!
//! [`Presenter`] 是抓取流程向界面汇报的接口；[`DashboardPage`] 是供 HTTP 层渲染的
//! 内存页面模型。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::RwLock;

use crate::models::StockMetric;

/// 抓取流程使用的展示接口
pub trait Presenter: Send + Sync {
    /// 页面标题
    fn title(&self, text: &str);
    /// 成功提示
    fn success(&self, message: &str);
    /// 进度，取值 [0, 1]
    fn progress(&self, fraction: f64);
    fn clear_progress(&self);
    /// 状态行
    fn status(&self, text: &str);
    fn clear_status(&self);
    /// 结果表格
    fn table(&self, rows: &[StockMetric]);
    /// 警告提示
    fn warning(&self, message: &str);
    /// 错误提示
    fn error(&self, message: &str);
}

/// 提示级别
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BannerLevel {
    Success,
    Warning,
    Error,
}

/// 页面提示
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Banner {
    pub level: BannerLevel,
    pub message: String,
}

/// 页面状态快照
#[derive(Debug, Serialize, Clone, Default)]
pub struct PageState {
    /// 标题
    pub title: Option<String>,
    /// 提示（按出现顺序）
    pub banners: Vec<Banner>,
    /// 进度条，`None` 表示不显示
    pub progress: Option<f64>,
    /// 状态行
    pub status: Option<String>,
    /// 结果表格，`None` 表示尚未生成
    pub rows: Option<Vec<StockMetric>>,
    /// 是否正在运行
    pub running: bool,
    /// 本次运行开始时间
    pub started_at: Option<DateTime<Utc>>,
    /// 本次运行结束时间
    pub finished_at: Option<DateTime<Utc>>,
}

/// 内存页面模型
///
/// 同一时间只允许一次运行，由 [`begin_run`](Self::begin_run) 保证
#[derive(Debug, Default)]
pub struct DashboardPage {
    state: RwLock<PageState>,
}

impl DashboardPage {
    pub fn new() -> Self {
        Self::default()
    }

    fn update<F: FnOnce(&mut PageState)>(&self, f: F) {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        f(&mut state);
    }

    /// 开始新一次运行并清空上次的内容，已有运行时返回 `false`
    pub fn begin_run(&self) -> bool {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.running {
            return false;
        }
        *state = PageState {
            running: true,
            started_at: Some(Utc::now()),
            ..PageState::default()
        };
        true
    }

    /// 结束本次运行
    pub fn finish_run(&self) {
        self.update(|state| {
            state.running = false;
            state.finished_at = Some(Utc::now());
        });
    }

    pub fn is_running(&self) -> bool {
        self.state.read().unwrap_or_else(|e| e.into_inner()).running
    }

    /// 当前页面状态
    pub fn snapshot(&self) -> PageState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn push_banner(&self, level: BannerLevel, message: &str) {
        self.update(|state| {
            state.banners.push(Banner {
                level,
                message: message.to_string(),
            })
        });
    }
}

impl Presenter for DashboardPage {
    fn title(&self, text: &str) {
        self.update(|state| state.title = Some(text.to_string()));
    }

    fn success(&self, message: &str) {
        self.push_banner(BannerLevel::Success, message);
    }

    fn progress(&self, fraction: f64) {
        self.update(|state| state.progress = Some(fraction.clamp(0.0, 1.0)));
    }

    fn clear_progress(&self) {
        self.update(|state| state.progress = None);
    }

    fn status(&self, text: &str) {
        self.update(|state| state.status = Some(text.to_string()));
    }

    fn clear_status(&self) {
        self.update(|state| state.status = None);
    }

    fn table(&self, rows: &[StockMetric]) {
        self.update(|state| state.rows = Some(rows.to_vec()));
    }

    fn warning(&self, message: &str) {
        self.push_banner(BannerLevel::Warning, message);
    }

    fn error(&self, message: &str) {
        self.push_banner(BannerLevel::Error, message);
    }
}
