// ==========================================
// 考试材料发放追踪系统 - 材料导入 Repository 实现
// ==========================================
// 职责: 用 rusqlite 事务实现导入批次的原子写入
// 红线: Repository 不含业务规则，只做数据写入
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::NewMaterial;
use crate::domain::types::StageScope;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::material_import_repo::{ImportSink, MaterialImportRepository};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// MaterialImportRepositoryImpl
// ==========================================
pub struct MaterialImportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialImportRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl MaterialImportRepository for MaterialImportRepositoryImpl {
    fn run_in_transaction<T, E, F>(&self, work: F) -> Result<T, E>
    where
        F: FnOnce(&mut dyn ImportSink) -> Result<T, E>,
        E: From<RepositoryError>,
    {
        // 持有连接锁直到提交/回滚，同一数据库上的导入互斥
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut sink = SqliteImportSink {
            conn: &tx,
            timestamp: Utc::now(),
        };

        match work(&mut sink) {
            Ok(value) => {
                tx.commit()
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(error = %rollback_err, "导入事务回滚失败");
                }
                Err(err)
            }
        }
    }
}

// ==========================================
// SqliteImportSink - 事务内写入
// ==========================================
struct SqliteImportSink<'a> {
    conn: &'a Connection,
    // 同一批次共用一个时间戳
    timestamp: DateTime<Utc>,
}

impl ImportSink for SqliteImportSink<'_> {
    fn delete_by_stage_scope(&mut self, scope: &StageScope) -> RepositoryResult<usize> {
        let deleted = match scope {
            StageScope::Stage(stage) => self
                .conn
                .execute("DELETE FROM materials WHERE stage = ?1", params![stage])?,
            StageScope::Unstaged => self
                .conn
                .execute("DELETE FROM materials WHERE stage IS NULL", [])?,
        };
        Ok(deleted)
    }

    fn insert_material(&mut self, material: &NewMaterial) -> RepositoryResult<i64> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            INSERT INTO materials (
                seat_number, subject_name, material_name, hall, seat, stage,
                received, received_at, received_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, NULL, ?7, ?7)
            "#,
        )?;
        stmt.execute(params![
            material.seat_number,
            material.subject_name,
            material.material_name,
            material.hall,
            material.seat,
            material.stage,
            self.timestamp,
        ])?;
        Ok(self.conn.last_insert_rowid())
    }
}
