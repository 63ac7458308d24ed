//! 看板页面与接口
//!
//! - GET / - 看板页面
//! - POST /refresh - 重新抓取并跳转回看板页面
//! - GET /api/v1/dashboard - 页面状态（JSON）
//! - POST /api/v1/dashboard/runs - 启动一次运行

use actix_web::{http::header, web, HttpResponse, Result};

use crate::models::ApiResponse;
use crate::services::dashboard::{render_page, DashboardService, PageState};
use crate::services::stock::india_now;

/// 看板页面
///
/// GET /
pub async fn index(service: web::Data<DashboardService>) -> Result<HttpResponse> {
    let html = render_page(&service.page().snapshot(), &india_now());
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(html))
}

/// 页面上的刷新按钮
///
/// POST /refresh
pub async fn refresh(service: web::Data<DashboardService>) -> Result<HttpResponse> {
    service.trigger();
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/"))
        .finish())
}

/// 获取页面状态
///
/// GET /api/v1/dashboard
pub async fn get_dashboard(service: web::Data<DashboardService>) -> Result<HttpResponse> {
    let response = ApiResponse::success(service.page().snapshot());
    Ok(HttpResponse::Ok().json(response))
}

/// 启动一次运行
///
/// POST /api/v1/dashboard/runs
pub async fn start_run(service: web::Data<DashboardService>) -> Result<HttpResponse> {
    if service.trigger() {
        let response = ApiResponse::success("run started");
        Ok(HttpResponse::Accepted().json(response))
    } else {
        let response = ApiResponse::<PageState>::error("a run is already in progress".to_string());
        Ok(HttpResponse::Conflict().json(response))
    }
}

pub fn page_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(index))
        .route("/refresh", web::post().to(refresh));
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/dashboard")
            .route("", web::get().to(get_dashboard))
            .route("/runs", web::post().to(start_run))
    );
}
