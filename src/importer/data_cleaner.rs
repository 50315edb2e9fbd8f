// ==========================================
// 考试材料发放追踪系统 - 数据清洗器实现
// ==========================================
// 职责: 单元格 → trim 后字符串或 NULL 的统一转换
// 红线: 校验逻辑只接触 Option<String>，不接触原始单元格类型
// ==========================================

use crate::domain::types::CellValue;
use crate::importer::material_importer_trait::DataCleaner as DataCleanerTrait;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn cell_text(&self, cell: Option<&CellValue>) -> Option<String> {
        let raw = match cell? {
            CellValue::Empty => return None,
            CellValue::Text(s) => return self.normalize_null(s),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => format_float(*f),
            // 与电子表格显示一致，true/false 都是非空数据
            CellValue::Bool(true) => "TRUE".to_string(),
            CellValue::Bool(false) => "FALSE".to_string(),
        };
        self.normalize_null(&raw)
    }

    fn normalize_null(&self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }
}

/// 浮点数转文本：整数值不带小数部分（10.0 → "10"）
fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
