// ==========================================
// 考试材料发放追踪系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 事务开启前的错误零副作用；ImportFailed 表示事务已整体回滚
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 底层解码错误（csv / calamine）
pub type DecodeError = Box<dyn std::error::Error + Send + Sync>;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（无事务）=====
    #[error("Error reading Excel file: {source}")]
    UnreadableFile {
        #[source]
        source: DecodeError,
    },

    #[error("Excel file is empty or has no data rows. Please ensure the file has a header row and at least one data row.")]
    EmptyFile,

    // ===== 表头契约错误（无事务）=====
    #[error("Invalid Excel format: {message}")]
    Header {
        message: String,
        missing: Vec<String>,
        found_columns: Vec<String>,
    },

    #[error("Column mapping error: Could not find column '{field}'")]
    ColumnMapping {
        field: String,
        found_columns: Vec<String>,
    },

    // ===== 落库错误（事务已回滚）=====
    #[error("Error processing Excel file: {source}")]
    ImportFailed {
        #[source]
        source: RepositoryError,
    },
}

impl ImportError {
    /// 包装底层解码错误
    pub fn unreadable<E>(err: E) -> Self
    where
        E: Into<DecodeError>,
    {
        ImportError::UnreadableFile { source: err.into() }
    }

    /// 是否发生在事务开启之前（零副作用）
    pub fn is_pre_transaction(&self) -> bool {
        !matches!(self, ImportError::ImportFailed { .. })
    }
}

// 实现 From<RepositoryError>（事务内的存储错误）
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::ImportFailed { source: err }
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::unreadable(err)
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::unreadable(err)
    }
}

// 实现 From<calamine::XlsError>
impl From<calamine::XlsError> for ImportError {
    fn from(err: calamine::XlsError) -> Self {
        ImportError::unreadable(err)
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_unreadable_keeps_cause() {
        let err = ImportError::unreadable("bad zip header");
        assert!(err.source().is_some());
        assert!(err.to_string().contains("bad zip header"));
        assert!(err.is_pre_transaction());
    }

    #[test]
    fn test_repository_error_becomes_import_failed() {
        let err: ImportError = RepositoryError::DatabaseQueryError("disk I/O error".into()).into();
        assert!(matches!(err, ImportError::ImportFailed { .. }));
        assert!(!err.is_pre_transaction());
    }
}
