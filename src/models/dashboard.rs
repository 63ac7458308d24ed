//! 看板运行结果模型

use serde::{Deserialize, Serialize};

use super::StockMetric;

/// 诊断信息级别
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// 单只股票被跳过时记录的诊断信息
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Diagnostic {
    /// 股票代码
    pub symbol: String,
    /// 级别
    pub severity: Severity,
    /// 展示给用户的提示
    pub message: String,
}

/// 一次运行的汇总
///
/// `results` 与输入代码列表顺序一致，只包含成功的股票
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RunReport {
    /// 尝试抓取的股票数量
    pub attempted: usize,
    /// 成功的指标
    pub results: Vec<StockMetric>,
    /// 失败的诊断信息
    pub diagnostics: Vec<Diagnostic>,
}
