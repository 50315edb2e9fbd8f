// ==========================================
// 考试材料发放追踪系统 - 材料数据导入器实现
// ==========================================
// 职责: 整合导入流程，从上传字节到数据库
// 流程: 解码 → 表格形状检查 → 表头契约 → 开启事务 → 预清理 → 逐行校验写入 → 提交
// 红线: 表头错误零副作用；事务内任一存储错误整体回滚（含预清理）
// ==========================================

use crate::config::import_config_trait::{ImportConfigReader, DEFAULT_MAX_REPORTED_ERRORS};
use crate::domain::material::{ImportReport, ImportRow, NewMaterial, RowOutcome};
use crate::domain::types::{CellTable, CellValue, FileKind, StageScope};
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{ColumnMap, FieldMapper};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::material_importer_trait::{
    DataCleaner as DataCleanerTrait, FieldMapper as FieldMapperTrait, ImportOptions,
    MaterialImporter, RowValidator,
};
use crate::repository::material_import_repo::MaterialImportRepository;
use std::time::Instant;
use tracing::{debug, error, field, info, instrument, warn, Span};
use uuid::Uuid;

// ==========================================
// ImportPipeline - 与存储无关的解析/校验管道
// ==========================================
// 导入与离线预检共用同一套表头与行规则
pub struct ImportPipeline {
    field_mapper: Box<dyn FieldMapperTrait>,
    row_validator: Box<dyn RowValidator>,
    cleaner: DataCleaner,
}

impl Default for ImportPipeline {
    fn default() -> Self {
        Self::new(Box::new(FieldMapper::default()), Box::new(DqValidator::default()))
    }
}

impl ImportPipeline {
    pub fn new(field_mapper: Box<dyn FieldMapperTrait>, row_validator: Box<dyn RowValidator>) -> Self {
        Self {
            field_mapper,
            row_validator,
            cleaner: DataCleaner,
        }
    }

    /// 批次阶段规范化（trim，空白视为未提供）
    pub fn batch_stage(&self, options: &ImportOptions) -> Option<String> {
        options
            .stage
            .as_deref()
            .and_then(|s| self.cleaner.normalize_null(s))
    }

    /// 表格形状检查 + 表头解析
    ///
    /// # 返回
    /// - (列映射, 数据行)
    pub fn prepare<'t>(&self, table: &'t CellTable) -> ImportResult<(ColumnMap, &'t [Vec<CellValue>])> {
        if table.len() < 2 {
            return Err(ImportError::EmptyFile);
        }
        let columns = self.field_mapper.resolve_header(&table[0])?;
        Ok((columns, &table[1..]))
    }

    /// 逐行分类；行号从 2 开始（表头为第 1 行）
    pub fn classify<'a>(
        &'a self,
        rows: &'a [Vec<CellValue>],
        columns: &'a ColumnMap,
        batch_stage: Option<&'a str>,
    ) -> impl Iterator<Item = ImportRow> + 'a {
        rows.iter().enumerate().map(move |(index, row)| ImportRow {
            row_number: index + 2,
            outcome: self.row_validator.validate_row(row, columns, batch_stage),
        })
    }

    /// 按原始顺序处理数据行，通过的行交给 on_accept
    ///
    /// # 返回
    /// - (写入条数, 全部拒绝信息)
    pub fn apply_rows<F, E>(
        &self,
        rows: &[Vec<CellValue>],
        columns: &ColumnMap,
        batch_stage: Option<&str>,
        mut on_accept: F,
    ) -> Result<(usize, Vec<String>), E>
    where
        F: FnMut(&NewMaterial) -> Result<(), E>,
    {
        let mut processed = 0;
        let mut rejections = Vec::new();

        for row in self.classify(rows, columns, batch_stage) {
            match &row.outcome {
                RowOutcome::Accepted(material) => {
                    on_accept(material)?;
                    processed += 1;
                }
                RowOutcome::Rejected { .. } => {
                    if let Some(message) = row.rejection_message() {
                        debug!(row_number = row.row_number, %message, "行校验未通过");
                        rejections.push(message);
                    }
                }
                RowOutcome::Blank => {}
            }
        }

        Ok((processed, rejections))
    }

    /// 离线预检：执行全部解析与校验规则，不写入任何存储
    pub fn preview(
        &self,
        table: &CellTable,
        options: &ImportOptions,
        max_reported_errors: usize,
    ) -> ImportResult<ImportReport> {
        let batch_stage = self.batch_stage(options);
        let (columns, rows) = self.prepare(table)?;
        let (processed, rejections) =
            self.apply_rows(rows, &columns, batch_stage.as_deref(), |_| Ok::<_, ImportError>(()))?;
        Ok(ImportReport::from_rejections(processed, rejections, max_reported_errors))
    }
}

// ==========================================
// MaterialImporterImpl - 材料数据导入器实现
// ==========================================
pub struct MaterialImporterImpl<R, C>
where
    R: MaterialImportRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    import_repo: R,

    // 配置读取器
    config: C,

    // 导入组件
    file_parser: UniversalFileParser,
    pipeline: ImportPipeline,
}

impl<R, C> MaterialImporterImpl<R, C>
where
    R: MaterialImportRepository,
    C: ImportConfigReader,
{
    /// 使用默认组件创建导入器
    ///
    /// # 参数
    /// - import_repo: 导入数据仓储
    /// - config: 配置读取器
    pub fn new(import_repo: R, config: C) -> Self {
        Self::with_pipeline(import_repo, config, ImportPipeline::default())
    }

    /// 使用自定义管道创建导入器
    pub fn with_pipeline(import_repo: R, config: C, pipeline: ImportPipeline) -> Self {
        Self {
            import_repo,
            config,
            file_parser: UniversalFileParser,
            pipeline,
        }
    }

    /// 读取错误条数上限；配置读取失败时使用默认值
    fn max_reported_errors(&self) -> usize {
        self.config.max_reported_errors().unwrap_or_else(|e| {
            warn!(error = %e, "读取 max_reported_errors 失败，使用默认值");
            DEFAULT_MAX_REPORTED_ERRORS
        })
    }
}

impl<R, C> MaterialImporter for MaterialImporterImpl<R, C>
where
    R: MaterialImportRepository,
    C: ImportConfigReader,
{
    #[instrument(skip(self, bytes, options), fields(size = bytes.len(), kind = ?kind))]
    fn import_file(
        &self,
        bytes: &[u8],
        kind: FileKind,
        options: &ImportOptions,
    ) -> ImportResult<ImportReport> {
        // === 步骤 1: 解码 ===
        let table = self.file_parser.parse(bytes, kind).map_err(|e| {
            warn!(error = %e, "文件解码失败");
            e
        })?;
        debug!(rows = table.len(), "文件解码完成");

        self.import_table(&table, options)
    }

    #[instrument(
        skip(self, table, options),
        fields(import_id = tracing::field::Empty, replace_mode = options.replace_mode)
    )]
    fn import_table(&self, table: &CellTable, options: &ImportOptions) -> ImportResult<ImportReport> {
        let start_time = Instant::now();
        let import_id = Uuid::new_v4();
        Span::current().record("import_id", field::display(import_id));

        let batch_stage = self.pipeline.batch_stage(options);
        info!(stage = ?batch_stage, rows = table.len(), "开始导入材料数据");

        // === 步骤 2-3: 形状检查 + 表头契约（事务开启前，零副作用）===
        let (columns, rows) = self.pipeline.prepare(table).map_err(|e| {
            warn!(error = %e, "表头校验失败，未做任何修改");
            e
        })?;

        let max_reported_errors = self.max_reported_errors();
        let scope = StageScope::for_batch_stage(batch_stage.as_deref());

        // === 步骤 4-7: 单事务内预清理 + 逐行写入 ===
        let (processed, rejections) = self
            .import_repo
            .run_in_transaction(|sink| -> ImportResult<(usize, Vec<String>)> {
                if options.replace_mode {
                    let deleted = sink.delete_by_stage_scope(&scope)?;
                    info!(deleted, scope = %scope, "覆盖模式预清理完成");
                }

                self.pipeline
                    .apply_rows(rows, &columns, batch_stage.as_deref(), |material| {
                        sink.insert_material(material).map(|_| ())
                    })
                    .map_err(ImportError::from)
            })
            .map_err(|e| {
                error!(error = %e, "导入失败，事务已回滚");
                e
            })?;

        // === 步骤 8: 汇总 ===
        let report = ImportReport::from_rejections(processed, rejections, max_reported_errors);
        info!(
            processed = report.processed,
            skipped = report.skipped,
            truncated = report.is_truncated(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "材料导入完成"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> CellTable {
        rows.iter()
            .map(|r| r.iter().map(|c| CellValue::from(*c)).collect())
            .collect()
    }

    const HEADER: &[&str] = &["SeatNumber", "SubjectName", "MaterialName", "Hall", "Seat"];

    #[test]
    fn test_prepare_requires_data_row() {
        let pipeline = ImportPipeline::default();
        assert!(matches!(pipeline.prepare(&Vec::new()), Err(ImportError::EmptyFile)));
        assert!(matches!(pipeline.prepare(&table(&[HEADER])), Err(ImportError::EmptyFile)));
    }

    #[test]
    fn test_preview_counts_and_row_numbers() {
        let pipeline = ImportPipeline::default();
        let t = table(&[
            HEADER,
            &["1001", "Math", "Final", "A", "10"],
            &["", "", "", "", ""],
            &["1002", "", "Final", "A", "11"],
        ]);

        let report = pipeline.preview(&t, &ImportOptions::default(), 20).unwrap();
        assert_eq!(report.processed, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.errors, vec!["Row 4: Missing SubjectName"]);
    }

    #[test]
    fn test_batch_stage_normalized() {
        let pipeline = ImportPipeline::default();
        let blank = ImportOptions {
            stage: Some("   ".to_string()),
            replace_mode: true,
        };
        assert_eq!(pipeline.batch_stage(&blank), None);

        let padded = ImportOptions {
            stage: Some(" S1 ".to_string()),
            replace_mode: false,
        };
        assert_eq!(pipeline.batch_stage(&padded).as_deref(), Some("S1"));
    }
}
