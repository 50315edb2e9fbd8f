// ==========================================
// 考试材料发放追踪系统 - 行数据质量校验器
// ==========================================
// 职责: 单行 → Blank / Accepted / Rejected
// 规则:
// - 整行为空 → Blank（不计数）
// - 五个必填字段任一为空 → Rejected（列出全部缺失字段）
// - 阶段: 行内 Stage 优先，其次批次阶段，最后 NULL
// ==========================================

use crate::domain::material::{NewMaterial, RowOutcome};
use crate::domain::types::{CellValue, ImportField};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::field_mapper::ColumnMap;
use crate::importer::material_importer_trait::{
    DataCleaner as DataCleanerTrait, RowValidator as RowValidatorTrait,
};

pub struct DqValidator {
    cleaner: DataCleaner,
}

impl Default for DqValidator {
    fn default() -> Self {
        Self { cleaner: DataCleaner }
    }
}

impl RowValidatorTrait for DqValidator {
    fn validate_row(
        &self,
        row: &[CellValue],
        columns: &ColumnMap,
        batch_stage: Option<&str>,
    ) -> RowOutcome {
        if self.is_blank(row) {
            return RowOutcome::Blank;
        }

        let seat_number = self.field_text(row, columns, ImportField::SeatNumber);
        let subject_name = self.field_text(row, columns, ImportField::SubjectName);
        let material_name = self.field_text(row, columns, ImportField::MaterialName);
        let hall = self.field_text(row, columns, ImportField::Hall);
        let seat = self.field_text(row, columns, ImportField::Seat);

        let missing: Vec<ImportField> = [
            (ImportField::SeatNumber, &seat_number),
            (ImportField::SubjectName, &subject_name),
            (ImportField::MaterialName, &material_name),
            (ImportField::Hall, &hall),
            (ImportField::Seat, &seat),
        ]
        .into_iter()
        .filter(|(_, value)| value.is_none())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            return RowOutcome::Rejected { missing };
        }

        let stage = self
            .field_text(row, columns, ImportField::Stage)
            .or_else(|| batch_stage.and_then(|s| self.cleaner.normalize_null(s)));

        // missing 为空，五个必填值均为 Some
        RowOutcome::Accepted(NewMaterial {
            seat_number: seat_number.unwrap_or_default(),
            subject_name: subject_name.unwrap_or_default(),
            material_name: material_name.unwrap_or_default(),
            hall: hall.unwrap_or_default(),
            seat: seat.unwrap_or_default(),
            stage,
        })
    }
}

impl DqValidator {
    /// 整行所有单元格清洗后均为空
    fn is_blank(&self, row: &[CellValue]) -> bool {
        row.iter().all(|cell| self.cleaner.cell_text(Some(cell)).is_none())
    }

    /// 按映射取值；下标越界视为空
    fn field_text(&self, row: &[CellValue], columns: &ColumnMap, field: ImportField) -> Option<String> {
        let index = columns.index_of(field)?;
        self.cleaner.cell_text(row.get(index))
    }
}
