// ==========================================
// 考试材料发放追踪系统 - 材料导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 管道: 解码 → 表头契约 → 单元格清洗 → 行校验 → 事务落库
// ==========================================

use crate::domain::material::{ImportReport, RowOutcome};
use crate::domain::types::{CellTable, CellValue, FileKind};
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::ColumnMap;

// ==========================================
// MaterialImporter Trait
// ==========================================
// 用途: 材料导入主接口
// 实现者: MaterialImporterImpl
pub trait MaterialImporter: Send + Sync {
    /// 导入上传文件
    ///
    /// # 参数
    /// - bytes: 文件原始字节
    /// - kind: 声明的文件类型（由扩展名判定）
    /// - options: 批次阶段与覆盖模式
    ///
    /// # 返回
    /// - Ok(ImportReport): 导入汇总（processed / skipped / 前 N 条错误）
    /// - Err: 解码失败、表头不符（零副作用）或落库失败（已回滚）
    fn import_file(
        &self,
        bytes: &[u8],
        kind: FileKind,
        options: &ImportOptions,
    ) -> ImportResult<ImportReport>;

    /// 导入已解码的表格（第一行为表头）
    fn import_table(&self, table: &CellTable, options: &ImportOptions)
        -> ImportResult<ImportReport>;
}

/// 单次导入参数
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportOptions {
    /// 批次阶段（行内 Stage 为空时使用）
    pub stage: Option<String>,
    /// 覆盖模式：先删除目标阶段范围内的已有记录
    pub replace_mode: bool,
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 将上传字节解码为二维单元格表格
// 实现者: CsvParser / ExcelParser / UniversalFileParser
pub trait FileParser: Send + Sync {
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<CellTable>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格统一转换
pub trait DataCleaner: Send + Sync {
    /// 单元格 → trim 后文本；缺失、NULL、全空白均为 None
    fn cell_text(&self, cell: Option<&CellValue>) -> Option<String>;

    /// 文本 trim，空串视为 None
    fn normalize_null(&self, value: &str) -> Option<String>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 表头契约校验 + 逻辑字段 → 列下标
pub trait FieldMapper: Send + Sync {
    fn resolve_header(&self, header: &[CellValue]) -> ImportResult<ColumnMap>;
}

// ==========================================
// RowValidator Trait
// ==========================================
// 用途: 单行校验与规范化
pub trait RowValidator: Send + Sync {
    fn validate_row(
        &self,
        row: &[CellValue],
        columns: &ColumnMap,
        batch_stage: Option<&str>,
    ) -> RowOutcome;
}
