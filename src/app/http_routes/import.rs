use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use futures::StreamExt;

use crate::api::error::ApiError;
use crate::api::UploadRequest;
use crate::app::state::AppState;
use crate::config::ImportConfigReader;

use super::common::{ok, run_blocking};

/// 普通文本字段（stage / replace_mode）字节上限
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

// ==========================================
// 材料导入相关路由
// ==========================================

/// POST /api/excel/upload
///
/// multipart 字段: file（必填）、stage、replace_mode
pub async fn upload(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse, ApiError> {
    let config = state.config_manager.clone();
    let max_upload_bytes = run_blocking(move || Ok(config.max_upload_bytes()?)).await?;

    let request = read_upload_form(payload, max_upload_bytes).await?;
    tracing::info!(
        file_name = ?request.file_name,
        size = ?request.content.as_ref().map(Vec::len),
        "[excel_upload] 收到上传"
    );

    let import_api = state.import_api.clone();
    let response = run_blocking(move || import_api.upload(request)).await?;

    tracing::info!(
        processed = response.data.report.processed,
        skipped = response.data.report.skipped,
        "[excel_upload] 导入完成"
    );
    Ok(ok(Some(response.message), response.data))
}

/// 从 multipart 表单中提取上传请求
///
/// 文件内容最多保留 max_upload_bytes + 1 字节，超限判定交给 ImportApi
async fn read_upload_form(mut payload: Multipart, max_upload_bytes: u64) -> Result<UploadRequest, ApiError> {
    let file_cap = usize::try_from(max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(1);
    let mut request = UploadRequest::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ApiError::validation("file", format!("Malformed upload: {}", e)))?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match name.as_deref() {
            Some("file") => {
                request.file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()));
                request.content = Some(read_field(&mut field, "file", file_cap).await?);
            }
            Some(text @ ("stage" | "replace_mode")) => {
                let bytes = read_field(&mut field, text, MAX_TEXT_FIELD_BYTES).await?;
                let value = String::from_utf8(bytes)
                    .map_err(|_| ApiError::validation(text, format!("The {} must be valid UTF-8 text.", text)))?;
                if text == "stage" {
                    request.stage = Some(value);
                } else {
                    request.replace_mode = Some(value);
                }
            }
            _ => {
                // 未知字段：读完丢弃
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| ApiError::validation("file", format!("Malformed upload: {}", e)))?;
                }
            }
        }
    }

    Ok(request)
}

/// 读取单个字段；超过 cap 后继续消费数据流但不再保存
async fn read_field(field: &mut Field, name: &str, cap: usize) -> Result<Vec<u8>, ApiError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| ApiError::validation(name, format!("Malformed upload: {}", e)))?;
        let room = cap.saturating_sub(bytes.len());
        if room > 0 {
            bytes.extend_from_slice(&chunk[..chunk.len().min(room)]);
        }
    }
    Ok(bytes)
}
