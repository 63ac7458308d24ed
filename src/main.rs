//! Nifty 50 看板服务
//!
//! 抓取 Nifty 50 成分股一年日K线，计算涨跌幅与 52 周高低点，并以网页表格展示
//! 数据来源：NSE 图表服务

mod config;     // 配置
mod errors;     // 错误类型
mod handlers;   // HTTP 请求处理器
mod models;     // 数据模型定义
mod services;   // 业务逻辑服务

use std::sync::Arc;

use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context;
use env_logger::Env;

use crate::config::AppConfig;
use crate::services::dashboard::{DashboardService, FetchOptions};
use crate::services::stock::NseSource;

/// 应用程序入口
///
/// 启动 HTTP 服务器，并在后台立即开始第一次运行
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let (config, config_notes) = AppConfig::load();

    // 初始化日志系统，RUST_LOG 优先于配置文件
    env_logger::init_from_env(Env::default().default_filter_or(config.log.level.as_str()));
    for (level, note) in &config_notes {
        log::log!(*level, "{}", note);
    }

    let source = NseSource::new(&config.fetch, &config.api).context("创建 NSE 数据源失败")?;
    let service = DashboardService::new(Arc::new(source), FetchOptions::from(&config.fetch));

    log::info!("启动 Nifty 50 看板服务: http://{}", config.bind_addr());
    service.trigger();

    let data = web::Data::new(service);
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())  // 添加请求日志中间件
            .app_data(data.clone())
            .configure(handlers::config)  // 配置路由
    });
    if config.server.workers > 0 {
        server = server.workers(config.server.workers);
    }

    server
        .bind(config.bind_addr())
        .with_context(|| format!("绑定地址 {} 失败", config.bind_addr()))?
        .run()
        .await
        .context("HTTP 服务异常退出")
}
