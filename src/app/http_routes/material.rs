use actix_web::{web, HttpResponse};

use crate::api::error::ApiError;
use crate::api::{
    BulkDeleteRequest, BulkUpdateRequest, DeleteAllRequest, MarkReceivedRequest, MaterialInput,
    SearchRequest,
};
use crate::app::state::AppState;

use super::common::{created, ok, run_blocking};

// ==========================================
// 材料查询与维护路由
// ==========================================

/// POST /api/materials/search
///
/// 响应体不套 data 层：{success, exists, total_count, materials}
pub async fn search(
    state: web::Data<AppState>,
    body: web::Json<SearchRequest>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let request = body.into_inner();
    let result = run_blocking(move || api.search(request)).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "success": true,
        "exists": result.exists,
        "total_count": result.total_count,
        "materials": result.materials,
    })))
}

/// POST /api/materials
pub async fn create(
    state: web::Data<AppState>,
    body: web::Json<MaterialInput>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let input = body.into_inner();
    let record = run_blocking(move || api.create_material(input)).await?;
    Ok(created(record))
}

/// GET /api/materials/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let id = path.into_inner();
    let record = run_blocking(move || api.get_material(id)).await?;
    Ok(ok(None, record))
}

/// PUT /api/materials/{id}
pub async fn update(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MaterialInput>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let id = path.into_inner();
    let input = body.into_inner();
    let record = run_blocking(move || api.update_material(id, input)).await?;
    Ok(ok(None, record))
}

/// DELETE /api/materials/{id}
pub async fn delete(state: web::Data<AppState>, path: web::Path<i64>) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let id = path.into_inner();
    run_blocking(move || api.delete_material(id)).await?;
    Ok(ok(Some("Material deleted".to_string()), serde_json::Value::Null))
}

/// POST /api/materials/{id}/received
pub async fn mark_received(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<MarkReceivedRequest>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let id = path.into_inner();
    let request = body.into_inner();
    let record = run_blocking(move || api.mark_received(id, request)).await?;
    Ok(ok(None, record))
}

/// POST /api/materials/{id}/cancel-received
pub async fn cancel_received(
    state: web::Data<AppState>,
    path: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let id = path.into_inner();
    let record = run_blocking(move || api.cancel_received(id)).await?;
    Ok(ok(None, record))
}

/// POST /api/materials/bulk-update
pub async fn bulk_update(
    state: web::Data<AppState>,
    body: web::Json<BulkUpdateRequest>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let request = body.into_inner();
    let result = run_blocking(move || api.bulk_update(request)).await?;
    Ok(ok(None, result))
}

/// POST /api/materials/bulk-delete
pub async fn bulk_delete(
    state: web::Data<AppState>,
    body: web::Json<BulkDeleteRequest>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let request = body.into_inner();
    let result = run_blocking(move || api.bulk_delete(request)).await?;
    Ok(ok(None, result))
}

/// POST /api/materials/delete-all
pub async fn delete_all(
    state: web::Data<AppState>,
    body: web::Json<DeleteAllRequest>,
) -> Result<HttpResponse, ApiError> {
    let api = state.material_api.clone();
    let request = body.into_inner();
    let result = run_blocking(move || api.delete_all(request)).await?;
    Ok(ok(Some("All materials deleted".to_string()), result))
}
