// ==========================================
// 考试材料发放追踪系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入流程所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use std::sync::Arc;

/// 报告中最多列出的错误条数
pub const DEFAULT_MAX_REPORTED_ERRORS: usize = 20;
/// 上传文件大小上限（10 MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
/// 批次阶段最大长度
pub const DEFAULT_MAX_STAGE_LENGTH: usize = 100;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入流程所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）/ ImportLimits（固定值）
pub trait ImportConfigReader: Send + Sync {
    /// 报告中最多列出的行错误数
    ///
    /// # 默认值
    /// - 20
    fn max_reported_errors(&self) -> RepositoryResult<usize>;

    /// 上传文件字节数上限
    ///
    /// # 默认值
    /// - 10485760
    fn max_upload_bytes(&self) -> RepositoryResult<u64>;

    /// 批次阶段字符数上限
    ///
    /// # 默认值
    /// - 100
    fn max_stage_length(&self) -> RepositoryResult<usize>;
}

// 共享配置源（导入器与 API 层共用同一个 ConfigManager）
impl<T: ImportConfigReader + ?Sized> ImportConfigReader for Arc<T> {
    fn max_reported_errors(&self) -> RepositoryResult<usize> {
        (**self).max_reported_errors()
    }

    fn max_upload_bytes(&self) -> RepositoryResult<u64> {
        (**self).max_upload_bytes()
    }

    fn max_stage_length(&self) -> RepositoryResult<usize> {
        (**self).max_stage_length()
    }
}

// ==========================================
// ImportLimits - 固定导入限制
// ==========================================
// 用途: 离线校验工具与测试（无需数据库）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportLimits {
    pub max_reported_errors: usize,
    pub max_upload_bytes: u64,
    pub max_stage_length: usize,
}

impl Default for ImportLimits {
    fn default() -> Self {
        Self {
            max_reported_errors: DEFAULT_MAX_REPORTED_ERRORS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            max_stage_length: DEFAULT_MAX_STAGE_LENGTH,
        }
    }
}

impl ImportConfigReader for ImportLimits {
    fn max_reported_errors(&self) -> RepositoryResult<usize> {
        Ok(self.max_reported_errors)
    }

    fn max_upload_bytes(&self) -> RepositoryResult<u64> {
        Ok(self.max_upload_bytes)
    }

    fn max_stage_length(&self) -> RepositoryResult<usize> {
        Ok(self.max_stage_length)
    }
}
