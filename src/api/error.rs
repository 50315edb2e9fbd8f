// ==========================================
// 考试材料发放追踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，把导入/仓储错误转换为稳定的错误码与可读消息
// 约定: 4xx 类错误表示“未做任何修改”；ImportFailed 表示事务已回滚
// ==========================================

use crate::domain::types::ImportField;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use serde_json::json;
use std::collections::BTreeMap;
use thiserror::Error;

/// 字段 → 校验失败原因列表
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 请求校验错误
    // ==========================================
    #[error("{message}")]
    RequestValidation { message: String, errors: FieldErrors },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    // ==========================================
    // 导入错误（事务开启前，零副作用）
    // ==========================================
    #[error("{0}")]
    UnreadableFile(String),

    #[error("{0}")]
    EmptyFile(String),

    #[error("{message}")]
    HeaderMismatch {
        message: String,
        missing_columns: Vec<String>,
        found_columns: Vec<String>,
    },

    #[error("{message}")]
    ColumnMapping {
        message: String,
        field: String,
        found_columns: Vec<String>,
    },

    // ==========================================
    // 导入错误（事务已回滚）
    // ==========================================
    #[error("{0}")]
    ImportFailed(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 单字段校验错误
    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![reason.into()]);
        ApiError::RequestValidation {
            message: "Validation error".to_string(),
            errors,
        }
    }

    /// 稳定错误码
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::RequestValidation { .. } => "REQUEST_VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::UnreadableFile(_) => "UNREADABLE_FILE",
            ApiError::EmptyFile(_) => "EMPTY_FILE",
            ApiError::HeaderMismatch { .. } => "HEADER_ERROR",
            ApiError::ColumnMapping { .. } => "COLUMN_MAPPING_ERROR",
            ApiError::ImportFailed(_) => "IMPORT_FAILED",
            ApiError::DatabaseError(_) => "DATABASE_ERROR",
            ApiError::DatabaseConnectionError(_) => "DATABASE_CONNECTION_ERROR",
            ApiError::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// 诊断详情（可选）
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            ApiError::RequestValidation { errors, .. } => Some(json!({ "errors": errors })),
            ApiError::HeaderMismatch {
                missing_columns,
                found_columns,
                ..
            } => Some(json!({
                "found_columns": found_columns,
                "required_columns": ImportField::required_names(),
                "missing_columns": missing_columns,
                "hint": format!(
                    "Please use the template file or ensure your Excel has these exact column names in the first row: {}",
                    ImportField::required_names().join(", ")
                ),
            })),
            ApiError::ColumnMapping {
                field,
                found_columns,
                ..
            } => Some(json!({
                "field": field,
                "found_columns": found_columns,
            })),
            ApiError::UnreadableFile(_) => Some(json!({
                "hint": "Please ensure the file is a valid Excel file (.xlsx or .xls format) or a UTF-8 CSV file",
            })),
            _ => None,
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        let message = err.to_string();
        match err {
            ImportError::UnreadableFile { .. } => ApiError::UnreadableFile(message),
            ImportError::EmptyFile => ApiError::EmptyFile(message),
            ImportError::Header {
                missing,
                found_columns,
                ..
            } => ApiError::HeaderMismatch {
                message,
                missing_columns: missing,
                found_columns,
            },
            ImportError::ColumnMapping {
                field,
                found_columns,
            } => ApiError::ColumnMapping {
                message,
                field,
                found_columns,
            },
            ImportError::ImportFailed { .. } => ApiError::ImportFailed(message),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} with id={} not found", entity, id))
            }
            RepositoryError::LockError(msg) | RepositoryError::DatabaseConnectionError(msg) => {
                ApiError::DatabaseConnectionError(msg)
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),

            // 约束错误：数据本身不合法
            RepositoryError::UniqueConstraintViolation(msg)
            | RepositoryError::CheckConstraintViolation(msg)
            | RepositoryError::NotNullViolation(msg) => ApiError::RequestValidation {
                message: "Validation error".to_string(),
                errors: FieldErrors::from([("record".to_string(), vec![msg])]),
            },
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_error_conversion_keeps_diagnostics() {
        let err = ImportError::Header {
            message: "Missing required columns".to_string(),
            missing: vec!["Hall".to_string()],
            found_columns: vec!["SeatNumber".to_string()],
        };
        let api_err: ApiError = err.into();

        assert_eq!(api_err.code(), "HEADER_ERROR");
        assert_eq!(api_err.to_string(), "Invalid Excel format: Missing required columns");

        let details = api_err.details().unwrap();
        assert_eq!(details["missing_columns"], json!(["Hall"]));
        assert_eq!(
            details["required_columns"],
            json!(["SeatNumber", "SubjectName", "MaterialName", "Hall", "Seat"])
        );
    }

    #[test]
    fn test_import_failed_conversion() {
        let err: ImportError = RepositoryError::DatabaseQueryError("disk full".into()).into();
        let api_err: ApiError = err.into();
        assert_eq!(api_err.code(), "IMPORT_FAILED");
        assert!(api_err.to_string().starts_with("Error processing Excel file"));
    }

    #[test]
    fn test_repository_error_conversion() {
        let api_err: ApiError = RepositoryError::NotFound {
            entity: "Material".to_string(),
            id: "42".to_string(),
        }
        .into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Material"));
                assert!(msg.contains("42"));
            }
            other => panic!("期望 NotFound，实际: {:?}", other),
        }

        let api_err: ApiError = RepositoryError::CheckConstraintViolation("CHECK constraint failed".into()).into();
        assert_eq!(api_err.code(), "REQUEST_VALIDATION_ERROR");
    }
}
