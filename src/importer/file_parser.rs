// ==========================================
// 考试材料发放追踪系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls，仅第一个工作表) / CSV (.csv)
// 输出: 二维单元格表格，第一行为表头；行号与文件中的物理行一致
// ==========================================

use crate::domain::types::{CellTable, CellValue, FileKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::material_importer_trait::FileParser;
use calamine::{open_workbook_from_rs, Data, Range, Reader, Xls, Xlsx};
use csv::{ReaderBuilder, StringRecord};
use std::io::{Cursor, Read, Seek};
use tracing::debug;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

// ==========================================
// CSV Parser 实现
// ==========================================
// 逗号分隔、双引号包裹、UTF-8；允许行长度不一致
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<CellTable> {
        let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true) // 允许行长度不一致
            .delimiter(b',')
            .quote(b'"')
            .from_reader(content);

        let mut table: CellTable = Vec::new();
        let mut record = StringRecord::new();
        let mut prev_end = 0usize;
        while reader.read_record(&mut record)? {
            // csv 会跳过空行；每个被跳过的空行补一个空行，保证行号与表格行一致
            if let Some(position) = record.position() {
                let start = position.byte() as usize;
                let blank_lines = skipped_blank_lines(content, prev_end, start);
                table.extend((0..blank_lines).map(|_| Vec::new()));
            }
            prev_end = record_end(content, reader.position().byte() as usize);

            table.push(record.iter().map(CellValue::from).collect());
        }

        debug!(rows = table.len(), "CSV 解析完成");
        Ok(table)
    }
}

/// 上一条记录结束到当前记录开始之间的空行数
fn skipped_blank_lines(content: &[u8], prev_end: usize, start: usize) -> usize {
    content
        .get(prev_end..start)
        .map_or(0, |gap| gap.iter().filter(|&&b| b == b'\n').count())
}

/// 记录结束位置（含行终止符）
///
/// 读取器返回的位置可能停在终止符之前或 CRLF 的 \r 与 \n 之间
fn record_end(content: &[u8], position: usize) -> usize {
    let mut end = position;
    match end.checked_sub(1).and_then(|i| content.get(i)) {
        Some(b'\n') => {}
        Some(b'\r') => {
            if content.get(end) == Some(&b'\n') {
                end += 1;
            }
        }
        _ => {
            if content.get(end) == Some(&b'\r') {
                end += 1;
            }
            if content.get(end) == Some(&b'\n') {
                end += 1;
            }
        }
    }
    end
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser {
    kind: FileKind,
}

impl ExcelParser {
    /// Office Open XML 工作簿（.xlsx）
    pub fn xlsx() -> Self {
        Self { kind: FileKind::Xlsx }
    }

    /// 旧版二进制工作簿（.xls）
    pub fn xls() -> Self {
        Self { kind: FileKind::Xls }
    }
}

impl FileParser for ExcelParser {
    fn parse_table(&self, bytes: &[u8]) -> ImportResult<CellTable> {
        let cursor = Cursor::new(bytes);
        match self.kind {
            FileKind::Xls => {
                let workbook: Xls<_> = open_workbook_from_rs(cursor)?;
                first_sheet_table(workbook)
            }
            _ => {
                let workbook: Xlsx<_> = open_workbook_from_rs(cursor)?;
                first_sheet_table(workbook)
            }
        }
    }
}

/// 读取第一个工作表
fn first_sheet_table<RS, R>(mut workbook: R) -> ImportResult<CellTable>
where
    RS: Read + Seek,
    R: Reader<RS>,
    ImportError: From<R::Error>,
{
    let sheet_name = match workbook.sheet_names().into_iter().next() {
        Some(name) => name,
        None => return Err(ImportError::EmptyFile),
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let table = range_to_table(&range);
    debug!(sheet = %sheet_name, rows = table.len(), "Excel 解析完成");
    Ok(table)
}

/// Range → 表格；按已用区域的起点补齐前导空行与空列（A1 对应 table[0][0]）
fn range_to_table(range: &Range<Data>) -> CellTable {
    let (start_row, start_col) = match range.start() {
        Some(start) => start,
        None => return Vec::new(),
    };

    let mut table: CellTable = (0..start_row).map(|_| Vec::new()).collect();
    for row in range.rows() {
        let mut cells: Vec<CellValue> = Vec::with_capacity(start_col as usize + row.len());
        cells.extend((0..start_col).map(|_| CellValue::Empty));
        cells.extend(row.iter().map(to_cell));
        table.push(cells);
    }
    table
}

/// calamine 单元格 → CellValue
fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty | Data::Error(_) => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // 日期保留序列值，与表格中的原始数值一致
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ==========================================
// 通用文件解析器（根据文件类型自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn parse(&self, bytes: &[u8], kind: FileKind) -> ImportResult<CellTable> {
        match kind {
            FileKind::Csv => CsvParser.parse_table(bytes),
            FileKind::Xlsx => ExcelParser::xlsx().parse_table(bytes),
            FileKind::Xls => ExcelParser::xls().parse_table(bytes),
        }
    }
}
