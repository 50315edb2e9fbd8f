use crate::api::error::ApiError;
use actix_web::http::StatusCode;
use actix_web::{web, HttpResponse, ResponseError};
use serde::Serialize;

// ==========================================
// 公共工具：错误映射、响应封装、阻塞调用
// ==========================================

/// 错误响应（返回给前端）
#[derive(Debug, Clone, Serialize)]
pub(super) struct ErrorResponse {
    pub success: bool,

    /// 错误代码
    pub code: String,

    /// 错误消息
    pub message: String,

    /// 详细信息（可选）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// 成功响应
#[derive(Debug, Clone, Serialize)]
pub(super) struct SuccessResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: T,
}

/// 4xx 表示未做任何修改；5xx 表示失败且事务已回滚
fn status_for(err: &ApiError) -> StatusCode {
    match err {
        ApiError::RequestValidation { .. }
        | ApiError::UnreadableFile(_)
        | ApiError::EmptyFile(_)
        | ApiError::HeaderMismatch { .. }
        | ApiError::ColumnMapping { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        ApiError::ImportFailed(_)
        | ApiError::DatabaseError(_)
        | ApiError::DatabaseConnectionError(_)
        | ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        status_for(self)
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.code(), "请求失败: {}", self);
        } else {
            tracing::debug!(code = self.code(), "请求被拒绝: {}", self);
        }

        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            code: self.code().to_string(),
            message: self.to_string(),
            details: self.details(),
        })
    }
}

pub(super) fn ok<T: Serialize>(message: Option<String>, data: T) -> HttpResponse {
    HttpResponse::Ok().json(SuccessResponse {
        success: true,
        message,
        data,
    })
}

pub(super) fn created<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(SuccessResponse {
        success: true,
        message: None,
        data,
    })
}

/// 在阻塞线程池中执行同步 API 调用
///
/// 导入与仓储都是同步的，持锁期间不能占用 worker
pub(super) async fn run_blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    web::block(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("阻塞任务执行失败: {}", e)))?
}
