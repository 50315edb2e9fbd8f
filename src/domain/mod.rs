// ==========================================
// 考试材料发放追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod material;
pub mod types;

// 重导出核心类型
pub use material::{
    ImportReport, ImportRow, MaterialField, MaterialRecord, NewMaterial, RowOutcome,
};
pub use types::{CellTable, CellValue, FileKind, ImportField, StageScope};
