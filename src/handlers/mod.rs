pub mod dashboard;
pub mod health;

use actix_web::web;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.configure(dashboard::page_config)
        .service(
            web::scope("/api/v1")
                .configure(health::config)
                .configure(dashboard::config)
        );
}
