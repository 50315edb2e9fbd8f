// ==========================================
// 考试材料发放追踪系统 - 材料领域模型
// ==========================================
// 职责: 材料记录实体、导入中间结构、导入报告
// 对齐: db.rs materials 表
// ==========================================

use crate::domain::types::ImportField;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// MaterialRecord - 材料发放记录
// ==========================================
// 红线: 五个必填字段 trim 后非空；received 与 received_at/received_by 同进同退
// 说明: seat_number 不唯一（一个学生可以有多份材料）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    pub id: i64,

    // ===== 必填字段 =====
    pub seat_number: String,   // 考号（学生标识，非物理座位）
    pub subject_name: String,  // 科目
    pub material_name: String, // 材料名称
    pub hall: String,          // 考场
    pub seat: String,          // 物理座位标签

    // ===== 可选分组 =====
    pub stage: Option<String>, // 阶段（如考试轮次）

    // ===== 发放状态 =====
    pub received: bool,
    pub received_at: Option<DateTime<Utc>>,
    pub received_by: Option<String>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// NewMaterial - 待写入的材料记录
// ==========================================
// 用途: 导入器与单条创建接口的共同输入（已 trim）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMaterial {
    pub seat_number: String,
    pub subject_name: String,
    pub material_name: String,
    pub hall: String,
    pub seat: String,
    pub stage: Option<String>,
}

// ==========================================
// MaterialField - 可批量更新的字段
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialField {
    SeatNumber,
    SubjectName,
    MaterialName,
    Hall,
    Seat,
    Stage,
}

impl MaterialField {
    /// 数据库列名（白名单，用于拼接 UPDATE 语句）
    pub fn column(&self) -> &'static str {
        match self {
            MaterialField::SeatNumber => "seat_number",
            MaterialField::SubjectName => "subject_name",
            MaterialField::MaterialName => "material_name",
            MaterialField::Hall => "hall",
            MaterialField::Seat => "seat",
            MaterialField::Stage => "stage",
        }
    }

    pub fn parse(raw: &str) -> Option<MaterialField> {
        match raw.trim() {
            "seat_number" => Some(MaterialField::SeatNumber),
            "subject_name" => Some(MaterialField::SubjectName),
            "material_name" => Some(MaterialField::MaterialName),
            "hall" => Some(MaterialField::Hall),
            "seat" => Some(MaterialField::Seat),
            "stage" => Some(MaterialField::Stage),
            _ => None,
        }
    }

    /// 字段最大长度（与 materials 表 CHECK 约束一致）
    pub fn max_len(&self) -> usize {
        match self {
            MaterialField::SeatNumber | MaterialField::Seat => 50,
            MaterialField::SubjectName | MaterialField::MaterialName => 255,
            MaterialField::Hall | MaterialField::Stage => 100,
        }
    }
}

// ==========================================
// RowOutcome - 单行校验结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// 整行为空：不计入 processed，也不计入 skipped
    Blank,
    /// 校验通过，等待写入
    Accepted(NewMaterial),
    /// 必填字段缺失（按契约顺序列出全部缺失字段）
    Rejected { missing: Vec<ImportField> },
}

impl RowOutcome {
    /// 拒绝原因文本，例如 "Missing SeatNumber, Hall"
    pub fn rejection_reason(&self) -> Option<String> {
        match self {
            RowOutcome::Rejected { missing } => {
                let names: Vec<&str> = missing.iter().map(|f| f.header_name()).collect();
                Some(format!("Missing {}", names.join(", ")))
            }
            _ => None,
        }
    }
}

// ==========================================
// ImportRow - 导入中间结构体
// ==========================================
// 生命周期: 仅在导入流程内，不落库
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRow {
    pub row_number: usize, // 表格行号（表头为第 1 行）
    pub outcome: RowOutcome,
}

impl ImportRow {
    /// 带行号的拒绝信息，例如 "Row 3: Missing SeatNumber"
    pub fn rejection_message(&self) -> Option<String> {
        self.outcome
            .rejection_reason()
            .map(|reason| format!("Row {}: {}", self.row_number, reason))
    }
}

// ==========================================
// ImportReport - 导入结果
// ==========================================
// 用途: 一次导入的汇总（错误信息最多保留前 N 条）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportReport {
    pub processed: usize,
    pub skipped: usize,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub errors: Vec<String>,
    /// 仅在错误信息被截断时出现
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub total_errors: Option<usize>,
}

impl ImportReport {
    /// 由完整的拒绝信息列表构造报告
    pub fn from_rejections(processed: usize, rejections: Vec<String>, cap: usize) -> Self {
        let skipped = rejections.len();
        let total_errors = if skipped > cap { Some(skipped) } else { None };
        let mut errors = rejections;
        errors.truncate(cap);
        Self {
            processed,
            skipped,
            errors,
            total_errors,
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.total_errors.is_some()
    }
}
