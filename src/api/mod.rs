// ==========================================
// 考试材料发放追踪系统 - API 层
// ==========================================
// 职责: 与传输无关的业务接口，供 HTTP 路由与命令行工具调用
// ==========================================

pub mod error;
pub mod import_api;
pub mod material_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult, FieldErrors};
pub use import_api::{parse_replace_mode, ImportApi, ImportApiResponse, ImportSummary, UploadRequest};
pub use material_api::{
    BulkDeleteRequest, BulkUpdateRequest, DeleteAllRequest, DeletedCount, MarkReceivedRequest,
    MaterialApi, MaterialInput, SearchRequest, SearchResponse, UpdatedCount,
};
