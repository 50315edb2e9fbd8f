// ==========================================
// 考试材料发放追踪系统 - 表头契约解析器
// ==========================================
// 职责: 表头校验 + 逻辑字段 → 列下标映射
// 规则: 精确匹配（区分大小写），仅 trim 首尾空白，不做同义词映射
// ==========================================

use crate::domain::types::{CellValue, ImportField};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_importer_trait::{
    DataCleaner as DataCleanerTrait, FieldMapper as FieldMapperTrait,
};
use std::collections::HashMap;

/// 表头至少需要的非空单元格数
pub const MIN_HEADER_CELLS: usize = 5;

// ==========================================
// ColumnMap - 逻辑字段 → 列下标
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    indices: HashMap<ImportField, usize>,
}

impl ColumnMap {
    pub fn index_of(&self, field: ImportField) -> Option<usize> {
        self.indices.get(&field).copied()
    }

    pub fn has(&self, field: ImportField) -> bool {
        self.indices.contains_key(&field)
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self { cleaner: DataCleaner }
    }
}

impl FieldMapperTrait for FieldMapper {
    fn resolve_header(&self, header: &[CellValue]) -> ImportResult<ColumnMap> {
        // 保留完整表头（空单元格为 ""），用于诊断
        let found_columns: Vec<String> = header
            .iter()
            .map(|cell| self.cleaner.cell_text(Some(cell)).unwrap_or_default())
            .collect();

        let missing = self.missing_required(&found_columns);

        let non_empty = found_columns.iter().filter(|c| !c.is_empty()).count();
        if non_empty < MIN_HEADER_CELLS {
            return Err(ImportError::Header {
                message: "Header row is missing or incomplete.".to_string(),
                missing,
                found_columns,
            });
        }

        if !missing.is_empty() {
            return Err(ImportError::Header {
                message: "Missing required columns".to_string(),
                missing,
                found_columns,
            });
        }

        let columns = self.map_columns(&found_columns);
        self.verify_required(&columns, &found_columns)?;
        Ok(columns)
    }
}

impl FieldMapper {
    /// 缺失的必填列（按契约顺序，全部列出）
    fn missing_required(&self, found_columns: &[String]) -> Vec<String> {
        ImportField::REQUIRED
            .iter()
            .filter(|field| !found_columns.iter().any(|c| c == field.header_name()))
            .map(|field| field.header_name().to_string())
            .collect()
    }

    /// 单次遍历建立映射；同名列出现多次时以最后一次为准
    fn map_columns(&self, found_columns: &[String]) -> ColumnMap {
        let mut indices = HashMap::new();
        for (index, name) in found_columns.iter().enumerate() {
            if let Some(field) = ImportField::from_header(name) {
                indices.insert(field, index);
            }
        }
        ColumnMap { indices }
    }

    /// 构造后再次确认必填字段齐全
    fn verify_required(&self, columns: &ColumnMap, found_columns: &[String]) -> ImportResult<()> {
        match ImportField::REQUIRED.iter().find(|f| f.is_required() && !columns.has(**f)) {
            Some(field) => Err(ImportError::ColumnMapping {
                field: field.header_name().to_string(),
                found_columns: found_columns.to_vec(),
            }),
            None => Ok(()),
        }
    }
}
