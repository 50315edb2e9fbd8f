// ==========================================
// 考试材料发放追踪系统 - 材料 API
// ==========================================
// 职责: 材料记录的查询、维护与领取状态管理
// 约定: 输入在此层 trim + 长度校验，仓储层只负责存取
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult, FieldErrors};
use crate::config::{ConfigManager, DEFAULT_DELETE_ALL_PASSWORD};
use crate::domain::material::{MaterialField, MaterialRecord, NewMaterial};
use crate::repository::material_repo::MaterialRepository;

/// 领取人标签最大长度
const MAX_RECEIVED_BY_LENGTH: usize = 255;
/// 批量更新值最大长度
const MAX_BULK_VALUE_LENGTH: usize = 255;

// ==========================================
// 请求 / 响应结构
// ==========================================

/// 单条创建 / 更新请求
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialInput {
    pub seat_number: Option<String>,
    pub subject_name: Option<String>,
    pub material_name: Option<String>,
    pub hall: Option<String>,
    pub seat: Option<String>,
    pub stage: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    pub seat_number: Option<String>,
}

/// 按考号查询结果
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub exists: bool,
    pub total_count: usize,
    pub materials: Vec<MaterialRecord>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarkReceivedRequest {
    pub received_by: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkUpdateRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
    pub field: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteAllRequest {
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdatedCount {
    pub updated_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletedCount {
    pub deleted_count: usize,
}

// ==========================================
// MaterialApi - 材料 API
// ==========================================
pub struct MaterialApi {
    material_repo: Arc<MaterialRepository>,
    config: Arc<ConfigManager>,
}

impl MaterialApi {
    /// 创建新的MaterialApi实例
    pub fn new(material_repo: Arc<MaterialRepository>, config: Arc<ConfigManager>) -> Self {
        Self {
            material_repo,
            config,
        }
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按考号查询全部材料（科目、材料名升序）
    pub fn search(&self, request: SearchRequest) -> ApiResult<SearchResponse> {
        let mut errors = FieldErrors::new();
        let seat_number = required_text(
            &mut errors,
            "seat_number",
            request.seat_number.as_deref(),
            MaterialField::SeatNumber.max_len(),
        );
        let seat_number = match seat_number {
            Some(s) if errors.is_empty() => s,
            _ => return Err(validation_error(errors)),
        };

        let materials = self.material_repo.find_by_seat_number(&seat_number)?;
        Ok(SearchResponse {
            exists: !materials.is_empty(),
            total_count: materials.len(),
            materials,
        })
    }

    /// 按 id 查询
    pub fn get_material(&self, id: i64) -> ApiResult<MaterialRecord> {
        self.material_repo
            .find_by_id(id)?
            .ok_or_else(|| ApiError::NotFound(format!("Material with id={} not found", id)))
    }

    // ==========================================
    // 维护接口
    // ==========================================

    pub fn create_material(&self, input: MaterialInput) -> ApiResult<MaterialRecord> {
        let material = validate_material_input(&input)?;
        let record = self.material_repo.insert(&material)?;
        info!(id = record.id, seat_number = %record.seat_number, "材料记录已创建");
        Ok(record)
    }

    /// 更新五个必填字段与阶段；领取状态不受影响
    pub fn update_material(&self, id: i64, input: MaterialInput) -> ApiResult<MaterialRecord> {
        let material = validate_material_input(&input)?;
        let record = self.material_repo.update(id, &material)?;
        info!(id, "材料记录已更新");
        Ok(record)
    }

    pub fn delete_material(&self, id: i64) -> ApiResult<()> {
        self.material_repo.delete(id)?;
        info!(id, "材料记录已删除");
        Ok(())
    }

    // ==========================================
    // 领取状态
    // ==========================================

    pub fn mark_received(&self, id: i64, request: MarkReceivedRequest) -> ApiResult<MaterialRecord> {
        let mut errors = FieldErrors::new();
        let received_by = required_text(
            &mut errors,
            "received_by",
            request.received_by.as_deref(),
            MAX_RECEIVED_BY_LENGTH,
        );
        let received_by = match received_by {
            Some(r) if errors.is_empty() => r,
            _ => return Err(validation_error(errors)),
        };

        let record = self.material_repo.mark_received(id, &received_by)?;
        info!(id, received_by = %received_by, "材料已领取");
        Ok(record)
    }

    pub fn cancel_received(&self, id: i64) -> ApiResult<MaterialRecord> {
        let record = self.material_repo.cancel_received(id)?;
        info!(id, "已取消领取");
        Ok(record)
    }

    // ==========================================
    // 批量操作
    // ==========================================

    /// 批量更新单个白名单字段；任一 id 不存在则整体拒绝
    pub fn bulk_update(&self, request: BulkUpdateRequest) -> ApiResult<UpdatedCount> {
        let mut errors = FieldErrors::new();
        if request.ids.is_empty() {
            push_error(&mut errors, "ids", "The ids field is required.".to_string());
        }

        let field = match request.field.as_deref() {
            None => {
                push_error(&mut errors, "field", "The field field is required.".to_string());
                None
            }
            Some(raw) => {
                let parsed = MaterialField::parse(raw);
                if parsed.is_none() {
                    push_error(&mut errors, "field", "The selected field is invalid.".to_string());
                }
                parsed
            }
        };

        let value = match request.value.as_deref() {
            None => {
                push_error(&mut errors, "value", "The value field is required.".to_string());
                None
            }
            Some(raw) => {
                let max_len = field.map_or(MAX_BULK_VALUE_LENGTH, |f| f.max_len());
                let trimmed = raw.trim();
                if trimmed.chars().count() > max_len {
                    push_error(
                        &mut errors,
                        "value",
                        format!("The value may not be greater than {} characters.", max_len),
                    );
                }
                // 仅 stage 允许清空为 NULL
                if trimmed.is_empty() && field != Some(MaterialField::Stage) {
                    push_error(&mut errors, "value", "The value field is required.".to_string());
                }
                Some(trimmed.to_string())
            }
        };

        let (field, value) = match (field, value) {
            (Some(field), Some(value)) if errors.is_empty() => (field, value),
            _ => return Err(validation_error(errors)),
        };

        let value = if value.is_empty() { None } else { Some(value.as_str()) };
        let updated_count = self
            .material_repo
            .bulk_update_field(&request.ids, field, value)?;
        info!(updated_count, field = field.column(), "批量更新完成");
        Ok(UpdatedCount { updated_count })
    }

    pub fn bulk_delete(&self, request: BulkDeleteRequest) -> ApiResult<DeletedCount> {
        if request.ids.is_empty() {
            return Err(ApiError::validation("ids", "The ids field is required."));
        }
        let deleted_count = self.material_repo.bulk_delete(&request.ids)?;
        info!(deleted_count, "批量删除完成");
        Ok(DeletedCount { deleted_count })
    }

    /// 清空全部材料（需口令）
    pub fn delete_all(&self, request: DeleteAllRequest) -> ApiResult<DeletedCount> {
        let password = match request.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => {
                return Err(ApiError::RequestValidation {
                    message: "Password is required".to_string(),
                    errors: FieldErrors::from([(
                        "password".to_string(),
                        vec!["The password field is required.".to_string()],
                    )]),
                })
            }
        };

        let expected = self.config.delete_all_password()?;
        if expected == DEFAULT_DELETE_ALL_PASSWORD {
            warn!("delete_all_password 仍为默认值，请在 config_kv 中修改");
        }
        if password != expected {
            warn!("清空材料口令错误");
            return Err(ApiError::Unauthorized("Invalid password".to_string()));
        }

        let deleted_count = self.material_repo.delete_all()?;
        warn!(deleted_count, "全部材料已清空");
        Ok(DeletedCount { deleted_count })
    }
}

// ==========================================
// 输入校验
// ==========================================

/// 单条记录校验：必填字段 trim 后非空且不超长；stage 可空
pub fn validate_material_input(input: &MaterialInput) -> ApiResult<NewMaterial> {
    let mut errors = FieldErrors::new();

    let seat_number = required_text(
        &mut errors,
        "seat_number",
        input.seat_number.as_deref(),
        MaterialField::SeatNumber.max_len(),
    );
    let subject_name = required_text(
        &mut errors,
        "subject_name",
        input.subject_name.as_deref(),
        MaterialField::SubjectName.max_len(),
    );
    let material_name = required_text(
        &mut errors,
        "material_name",
        input.material_name.as_deref(),
        MaterialField::MaterialName.max_len(),
    );
    let hall = required_text(&mut errors, "hall", input.hall.as_deref(), MaterialField::Hall.max_len());
    let seat = required_text(&mut errors, "seat", input.seat.as_deref(), MaterialField::Seat.max_len());

    let stage = input
        .stage
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    if let Some(s) = &stage {
        let max_len = MaterialField::Stage.max_len();
        if s.chars().count() > max_len {
            push_error(
                &mut errors,
                "stage",
                format!("The stage may not be greater than {} characters.", max_len),
            );
        }
    }

    match (seat_number, subject_name, material_name, hall, seat) {
        (Some(seat_number), Some(subject_name), Some(material_name), Some(hall), Some(seat))
            if errors.is_empty() =>
        {
            Ok(NewMaterial {
                seat_number,
                subject_name,
                material_name,
                hall,
                seat,
                stage,
            })
        }
        _ => Err(validation_error(errors)),
    }
}

/// 必填文本：trim 后非空且不超过 max_len 个字符
fn required_text(errors: &mut FieldErrors, field: &str, raw: Option<&str>, max_len: usize) -> Option<String> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        push_error(errors, field, format!("The {} field is required.", field));
        return None;
    }
    if trimmed.chars().count() > max_len {
        push_error(
            errors,
            field,
            format!("The {} may not be greater than {} characters.", field, max_len),
        );
        return None;
    }
    Some(trimmed.to_string())
}

fn push_error(errors: &mut FieldErrors, field: &str, reason: String) {
    errors.entry(field.to_string()).or_default().push(reason);
}

fn validation_error(errors: FieldErrors) -> ApiError {
    ApiError::RequestValidation {
        message: "Validation error".to_string(),
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> MaterialInput {
        MaterialInput {
            seat_number: Some(" 1001 ".to_string()),
            subject_name: Some("Math".to_string()),
            material_name: Some("Final".to_string()),
            hall: Some("A".to_string()),
            seat: Some("10".to_string()),
            stage: Some("  ".to_string()),
        }
    }

    #[test]
    fn test_validate_material_input_trims() {
        let material = validate_material_input(&input()).unwrap();
        assert_eq!(material.seat_number, "1001");
        assert_eq!(material.stage, None);
    }

    #[test]
    fn test_validate_material_input_reports_each_field() {
        let bad = MaterialInput {
            seat_number: Some("9".repeat(51)),
            hall: Some("   ".to_string()),
            seat: None,
            ..input()
        };
        match validate_material_input(&bad).unwrap_err() {
            ApiError::RequestValidation { errors, .. } => {
                let fields: Vec<&str> = errors.keys().map(String::as_str).collect();
                assert_eq!(fields, vec!["hall", "seat", "seat_number"]);
            }
            other => panic!("期望 RequestValidation，实际: {:?}", other),
        }
    }
}
