// ==========================================
// 考试材料发放追踪系统 - 领域类型定义
// ==========================================
// 职责: 导入列契约、单元格值、文件类型、阶段作用域
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 导入字段 (Import Field)
// ==========================================
// 表头必须与枚举名逐字一致（区分大小写，去除首尾空白后比较）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ImportField {
    SeatNumber,   // 学生座位号（考号）
    SubjectName,  // 科目名称
    MaterialName, // 材料名称
    Hall,         // 考场/大厅
    Seat,         // 物理座位标签
    Stage,        // 阶段（可选）
}

impl ImportField {
    /// 必填列（按契约顺序，缺失字段的报告顺序与此一致）
    pub const REQUIRED: [ImportField; 5] = [
        ImportField::SeatNumber,
        ImportField::SubjectName,
        ImportField::MaterialName,
        ImportField::Hall,
        ImportField::Seat,
    ];

    /// 可选列
    pub const OPTIONAL: [ImportField; 1] = [ImportField::Stage];

    /// 表头中的列名
    pub fn header_name(&self) -> &'static str {
        match self {
            ImportField::SeatNumber => "SeatNumber",
            ImportField::SubjectName => "SubjectName",
            ImportField::MaterialName => "MaterialName",
            ImportField::Hall => "Hall",
            ImportField::Seat => "Seat",
            ImportField::Stage => "Stage",
        }
    }

    /// 按列名精确匹配（调用方负责 trim）
    pub fn from_header(name: &str) -> Option<ImportField> {
        Self::REQUIRED
            .iter()
            .chain(Self::OPTIONAL.iter())
            .copied()
            .find(|field| field.header_name() == name)
    }

    pub fn is_required(&self) -> bool {
        !matches!(self, ImportField::Stage)
    }

    /// 必填列名列表（用于诊断信息）
    pub fn required_names() -> Vec<String> {
        Self::REQUIRED
            .iter()
            .map(|f| f.header_name().to_string())
            .collect()
    }
}

impl fmt::Display for ImportField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

// ==========================================
// 单元格值 (Cell Value)
// ==========================================
// 解码后的表格单元格，类型来自源文件（CSV 全部为文本）
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

/// 解码后的二维表格（第一行为表头）
pub type CellTable = Vec<Vec<CellValue>>;

// ==========================================
// 文件类型 (File Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Xlsx,
    Xls,
    Csv,
}

impl FileKind {
    /// 根据扩展名判断文件类型（不区分大小写）
    pub fn from_extension(ext: &str) -> Option<FileKind> {
        match ext.trim().to_ascii_lowercase().as_str() {
            "xlsx" => Some(FileKind::Xlsx),
            "xls" => Some(FileKind::Xls),
            "csv" => Some(FileKind::Csv),
            _ => None,
        }
    }

    /// 根据文件名判断文件类型
    pub fn from_file_name(name: &str) -> Option<FileKind> {
        let (_, ext) = name.rsplit_once('.')?;
        Self::from_extension(ext)
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Xlsx => write!(f, "xlsx"),
            FileKind::Xls => write!(f, "xls"),
            FileKind::Csv => write!(f, "csv"),
        }
    }
}

// ==========================================
// 阶段作用域 (Stage Scope)
// ==========================================
// 覆盖模式下预清理的目标范围
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageScope {
    Stage(String), // stage = ?
    Unstaged,      // stage IS NULL
}

impl StageScope {
    pub fn for_batch_stage(stage: Option<&str>) -> StageScope {
        match stage {
            Some(s) => StageScope::Stage(s.to_string()),
            None => StageScope::Unstaged,
        }
    }
}

impl fmt::Display for StageScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageScope::Stage(s) => write!(f, "stage={}", s),
            StageScope::Unstaged => write!(f, "stage IS NULL"),
        }
    }
}
