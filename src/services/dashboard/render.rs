//! 页面渲染
//!
//! 把 [`PageState`] 渲染为完整的 HTML 页面

use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt::Write;

use crate::models::StockMetric;

use super::presenter::{BannerLevel, PageState};

const TABLE_COLUMNS: [&str; 6] = ["Symbol", "Price", "Change", "52W High", "52W Low", "Down from High"];

const STYLE: &str = r#"<style>
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; margin: 2rem 3rem; color: #262730; }
.banner { padding: 12px 16px; margin: 8px 0; border-radius: 6px; }
.banner.success { background-color: #e8f5e9; color: #1b5e20; }
.banner.warning { background-color: #fff8e1; color: #8a6d00; }
.banner.error { background-color: #fdecea; color: #b71c1c; }
.status { margin: 6px 0; color: #555; }
progress { width: 100%; height: 14px; }
.dataframe {
    font-size: 14px !important;
    width: 100% !important;
    border-collapse: collapse !important;
}
.dataframe th {
    background-color: #1E1E1E !important;
    color: white !important;
    font-weight: bold !important;
    text-align: left !important;
    padding: 12px 8px !important;
    border: 1px solid #333 !important;
}
.dataframe td {
    padding: 10px 8px !important;
    border: 1px solid #ddd !important;
    background-color: #ffffff !important;
}
.dataframe tr:nth-child(even) td {
    background-color: #f8f9fa !important;
}
.dataframe tr:hover td {
    background-color: #f0f2f6 !important;
}
footer { margin-top: 2rem; color: #555; }
</style>"#;

/// 转义 HTML 特殊字符
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// 两位小数并添加千位分隔符，如 1234567.8 -> "1,234,567.80"
pub fn format_thousands(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if value < 0.0 && formatted.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// 价格格式：₹ + 千位分隔 + 两位小数
pub fn format_price(price: f64) -> String {
    format!("₹{}", format_thousands(price))
}

/// 涨跌幅格式：非负为绿色上箭头，负数为红色下箭头
pub fn format_change(change: f64) -> String {
    let (arrow, color) = if change >= 0.0 { ("↑", "green") } else { ("↓", "red") };
    format!(
        r#"<span style="color: {}">{} {:.2}%</span>"#,
        color,
        arrow,
        change.abs()
    )
}

/// 距高点跌幅格式
pub fn format_down_from_high(value: f64) -> String {
    format!("{:.2}%", value)
}

fn render_table(out: &mut String, rows: &[StockMetric]) {
    out.push_str("<table border=\"1\" class=\"dataframe\">\n<thead>\n<tr style=\"text-align: right;\">");
    for column in TABLE_COLUMNS {
        let _ = write!(out, "<th>{}</th>", column);
    }
    out.push_str("</tr>\n</thead>\n<tbody>\n");

    for row in rows {
        let _ = writeln!(
            out,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
            escape_html(&row.symbol),
            format_price(row.price),
            format_change(row.change),
            format_price(row.high_52w),
            format_price(row.low_52w),
            format_down_from_high(row.down_from_high),
        );
    }
    out.push_str("</tbody>\n</table>\n");
}

/// 渲染完整页面
///
/// 运行中时页面每 2 秒自动刷新；页脚时间为渲染时间
pub fn render_page(state: &PageState, rendered_at: &DateTime<Tz>) -> String {
    let mut out = String::with_capacity(16 * 1024);

    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    if state.running {
        out.push_str("<meta http-equiv=\"refresh\" content=\"2\">\n");
    }
    out.push_str("<title>Nifty 50 Dashboard</title>\n");
    out.push_str("<link rel=\"icon\" href=\"data:image/svg+xml,<svg xmlns=%22http://www.w3.org/2000/svg%22 viewBox=%220 0 100 100%22><text y=%22.9em%22 font-size=%2290%22>📈</text></svg>\">\n");
    out.push_str(STYLE);
    out.push_str("\n</head>\n<body>\n");

    if let Some(title) = &state.title {
        let _ = writeln!(out, "<h1>{}</h1>", escape_html(title));
    }

    for banner in &state.banners {
        let class = match banner.level {
            BannerLevel::Success => "success",
            BannerLevel::Warning => "warning",
            BannerLevel::Error => "error",
        };
        let _ = writeln!(
            out,
            "<div class=\"banner {}\">{}</div>",
            class,
            escape_html(&banner.message)
        );
    }

    if let Some(progress) = state.progress {
        let _ = writeln!(
            out,
            "<progress max=\"100\" value=\"{:.0}\"></progress>",
            progress * 100.0
        );
    }
    if let Some(status) = &state.status {
        let _ = writeln!(out, "<div class=\"status\">{}</div>", escape_html(status));
    }

    if let Some(rows) = &state.rows {
        render_table(&mut out, rows);
    }

    if !state.running {
        out.push_str("<form method=\"post\" action=\"/refresh\"><button type=\"submit\">Refresh data</button></form>\n");
    }

    out.push_str("<hr>\n<footer>\n<p>Data source: NSE (National Stock Exchange of India)</p>\n");
    let _ = writeln!(
        out,
        "<p>Last updated: {}</p>",
        rendered_at.format("%Y-%m-%d %H:%M:%S")
    );
    out.push_str("</footer>\n</body>\n</html>\n");

    out
}
