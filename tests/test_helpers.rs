// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试数据生成等功能
// ==========================================

#![allow(dead_code)]

use material_tracker::app::AppState;
use material_tracker::db::{init_schema, open_sqlite_connection};
use material_tracker::domain::types::{CellTable, CellValue};
use rusqlite::Connection;
use std::error::Error;
use tempfile::NamedTempFile;

/// 完整表头（含可选 Stage 列）
pub const HEADER: &[&str] = &["SeatNumber", "SubjectName", "MaterialName", "Hall", "Seat", "Stage"];

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().ok_or("临时文件路径不是 UTF-8")?.to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 创建基于临时数据库的 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("Failed to create AppState");
    (temp_file, state)
}

/// 打开测试数据库（用于断言）
pub fn open(db_path: &str) -> Connection {
    open_sqlite_connection(db_path).expect("Failed to open db")
}

/// 材料总数
pub fn count_materials(db_path: &str) -> i64 {
    open(db_path)
        .query_row("SELECT COUNT(*) FROM materials", [], |row| row.get(0))
        .expect("Failed to count materials")
}

/// 按阶段统计（None 表示 stage IS NULL）
pub fn count_by_stage(db_path: &str, stage: Option<&str>) -> i64 {
    let conn = open(db_path);
    match stage {
        Some(s) => conn.query_row("SELECT COUNT(*) FROM materials WHERE stage = ?1", [s], |row| row.get::<_, i64>(0)),
        None => conn.query_row("SELECT COUNT(*) FROM materials WHERE stage IS NULL", [], |row| row.get::<_, i64>(0)),
    }
    .expect("Failed to count materials by stage")
}

/// 读取全部 (seat_number, stage)，按 id 排序
pub fn seat_numbers_with_stage(db_path: &str) -> Vec<(String, Option<String>)> {
    let conn = open(db_path);
    let mut stmt = conn
        .prepare("SELECT seat_number, stage FROM materials ORDER BY id")
        .expect("Failed to prepare query");
    let rows = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
        .expect("Failed to query materials");
    rows.collect::<Result<Vec<_>, _>>().expect("Failed to read rows")
}

/// 字符串二维数组 → 单元格表
pub fn table(rows: &[&[&str]]) -> CellTable {
    rows.iter()
        .map(|row| row.iter().map(|cell| CellValue::from(*cell)).collect())
        .collect()
}

/// 生成一行数据（Stage 列可空）
pub fn row(seat_number: &str, stage: &str) -> Vec<String> {
    vec![
        seat_number.to_string(),
        "Math".to_string(),
        "Final".to_string(),
        "A".to_string(),
        "10".to_string(),
        stage.to_string(),
    ]
}

/// 生成 CSV 字节（首行为 HEADER）
pub fn csv_bytes(rows: &[Vec<String>]) -> Vec<u8> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(HEADER).expect("Failed to write header");
    for row in rows {
        writer.write_record(row).expect("Failed to write row");
    }
    match writer.into_inner() {
        Ok(bytes) => bytes,
        Err(_) => panic!("Failed to flush csv"),
    }
}
