// ==========================================
// 考试材料发放追踪系统 - HTTP 路由
// ==========================================
// 职责: multipart / JSON 解包 → 调用 API 层 → 统一响应封装
// 约定: 所有同步 API 调用经 web::block 执行
// ==========================================
//
// 路由一览:
// - POST   /api/excel/upload
// - POST   /api/materials/search
// - POST   /api/materials
// - GET    /api/materials/{id}
// - PUT    /api/materials/{id}
// - DELETE /api/materials/{id}
// - POST   /api/materials/{id}/received
// - POST   /api/materials/{id}/cancel-received
// - POST   /api/materials/bulk-update
// - POST   /api/materials/bulk-delete
// - POST   /api/materials/delete-all

use actix_web::web::{self, delete, get, post, put, scope};
use actix_web::{HttpResponse, Scope};

mod common;
mod import;
mod material;

const API_PATH: &str = "/api";

/// 配置并返回 /api 路由作用域
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .app_data(web::JsonConfig::default().error_handler(|err, _req| {
            let message = err.to_string();
            actix_web::error::InternalError::from_response(
                err,
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "success": false,
                    "code": "REQUEST_VALIDATION_ERROR",
                    "message": message,
                })),
            )
            .into()
        }))
        // 材料导入
        .route("/excel/upload", post().to(import::upload))
        // 材料查询与维护（固定路径先于 {id} 注册）
        .route("/materials/search", post().to(material::search))
        .route("/materials/bulk-update", post().to(material::bulk_update))
        .route("/materials/bulk-delete", post().to(material::bulk_delete))
        .route("/materials/delete-all", post().to(material::delete_all))
        .route("/materials", post().to(material::create))
        .route("/materials/{id}", get().to(material::get))
        .route("/materials/{id}", put().to(material::update))
        .route("/materials/{id}", delete().to(material::delete))
        .route("/materials/{id}/received", post().to(material::mark_received))
        .route("/materials/{id}/cancel-received", post().to(material::cancel_received))
}
