// ==========================================
// 考试材料发放追踪系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 建表幂等（CREATE TABLE IF NOT EXISTS），启动时执行
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建表语句
///
/// 约束与导入规则对齐：
/// - 必填列 trim 后非空
/// - 列长度上限（seat_number 50 / subject_name 255 / material_name 255 / hall 100 / seat 50 / stage 100）
/// - received = 0 时 received_at / received_by 必须为 NULL；received = 1 时两者必须非空
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS materials (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    seat_number    TEXT NOT NULL CHECK (length(trim(seat_number)) > 0 AND length(seat_number) <= 50),
    subject_name   TEXT NOT NULL CHECK (length(trim(subject_name)) > 0 AND length(subject_name) <= 255),
    material_name  TEXT NOT NULL CHECK (length(trim(material_name)) > 0 AND length(material_name) <= 255),
    hall           TEXT NOT NULL CHECK (length(trim(hall)) > 0 AND length(hall) <= 100),
    seat           TEXT NOT NULL CHECK (length(trim(seat)) > 0 AND length(seat) <= 50),
    stage          TEXT CHECK (stage IS NULL OR length(stage) <= 100),
    received       INTEGER NOT NULL DEFAULT 0 CHECK (received IN (0, 1)),
    received_at    TEXT,
    received_by    TEXT CHECK (received_by IS NULL OR length(received_by) <= 255),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL,
    CHECK (
        (received = 0 AND received_at IS NULL AND received_by IS NULL)
        OR (received = 1 AND received_at IS NOT NULL AND received_by IS NOT NULL)
    )
);

CREATE INDEX IF NOT EXISTS idx_materials_seat_number ON materials (seat_number);
CREATE INDEX IF NOT EXISTS idx_materials_stage ON materials (stage);

CREATE TABLE IF NOT EXISTS config_kv (
    key        TEXT PRIMARY KEY,
    value      TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表并登记 schema_version（可重复执行）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (?1, ?2)",
        rusqlite::params![CURRENT_SCHEMA_VERSION, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
