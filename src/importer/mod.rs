// ==========================================
// 考试材料发放追踪系统 - 导入层
// ==========================================
// 职责: 上传文件 → 材料记录（单事务）
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod material_importer_impl;
pub mod material_importer_trait;

// 重导出核心类型
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use dq_validator::DqValidator as DqValidatorImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::{ColumnMap, FieldMapper as FieldMapperImpl, MIN_HEADER_CELLS};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use material_importer_impl::{ImportPipeline, MaterialImporterImpl};

// 重导出 Trait 接口
pub use material_importer_trait::{
    DataCleaner, FieldMapper, FileParser, ImportOptions, MaterialImporter, RowValidator,
};
