// ==========================================
// 考试材料发放追踪系统 - 材料数据仓储
// ==========================================
// 职责: 管理 materials 表的 CRUD、按考号查询、领取状态切换
// 红线: Repository 不含业务逻辑，输入校验在 api 层完成
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::{MaterialField, MaterialRecord, NewMaterial};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, seat_number, subject_name, material_name, hall, seat, stage,
           received, received_at, received_by, created_at, updated_at
    FROM materials
"#;

// ==========================================
// MaterialRepository - 材料记录仓储
// ==========================================
pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
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

    // ===== 单条 CRUD =====

    /// 插入一条材料记录（未领取）
    pub fn insert(&self, material: &NewMaterial) -> RepositoryResult<MaterialRecord> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        conn.execute(
            r#"
            INSERT INTO materials (
                seat_number, subject_name, material_name, hall, seat, stage,
                received, received_at, received_by, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, NULL, NULL, ?7, ?7)
            "#,
            params![
                material.seat_number,
                material.subject_name,
                material.material_name,
                material.hall,
                material.seat,
                material.stage,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();
        Self::require_by_id(&conn, id)
    }

    /// 按 id 查询
    pub fn find_by_id(&self, id: i64) -> RepositoryResult<Option<MaterialRecord>> {
        let conn = self.get_conn()?;
        Self::query_by_id(&conn, id)
    }

    /// 覆盖更新五个必填字段与阶段；领取状态保持不变
    pub fn update(&self, id: i64, material: &NewMaterial) -> RepositoryResult<MaterialRecord> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE materials
            SET seat_number = ?1, subject_name = ?2, material_name = ?3,
                hall = ?4, seat = ?5, stage = ?6, updated_at = ?7
            WHERE id = ?8
            "#,
            params![
                material.seat_number,
                material.subject_name,
                material.material_name,
                material.hall,
                material.seat,
                material.stage,
                Utc::now(),
                id,
            ],
        )?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Self::require_by_id(&conn, id)
    }

    /// 删除单条记录
    pub fn delete(&self, id: i64) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute("DELETE FROM materials WHERE id = ?1", params![id])?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    // ===== 查询 =====

    /// 按考号查询全部材料（科目、材料名升序）
    pub fn find_by_seat_number(&self, seat_number: &str) -> RepositoryResult<Vec<MaterialRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "{} WHERE seat_number = ?1 ORDER BY subject_name, material_name, id",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![seat_number], map_material_row)?;
        let materials = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(materials)
    }

    /// 全表记录数
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM materials", [], |row| row.get(0))?;
        Ok(count)
    }

    // ===== 领取状态 =====

    /// 标记为已领取（同时写入领取时间与领取人）
    pub fn mark_received(&self, id: i64, received_by: &str) -> RepositoryResult<MaterialRecord> {
        let conn = self.get_conn()?;
        let now = Utc::now();
        let affected = conn.execute(
            r#"
            UPDATE materials
            SET received = 1, received_at = ?1, received_by = ?2, updated_at = ?1
            WHERE id = ?3
            "#,
            params![now, received_by, id],
        )?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Self::require_by_id(&conn, id)
    }

    /// 取消领取（领取时间与领取人一并清空）
    pub fn cancel_received(&self, id: i64) -> RepositoryResult<MaterialRecord> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE materials
            SET received = 0, received_at = NULL, received_by = NULL, updated_at = ?1
            WHERE id = ?2
            "#,
            params![Utc::now(), id],
        )?;
        if affected == 0 {
            return Err(not_found(id));
        }
        Self::require_by_id(&conn, id)
    }

    // ===== 批量操作 =====

    /// 批量更新单个字段
    ///
    /// # 说明
    /// - 任一 id 不存在 → NotFound，不做任何修改
    /// - value 为 None 仅对 stage 有意义（其余列 NOT NULL，由约束拒绝）
    pub fn bulk_update_field(
        &self,
        ids: &[i64],
        field: MaterialField,
        value: Option<&str>,
    ) -> RepositoryResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        if let Some(missing) = Self::first_missing_id(&tx, ids)? {
            return Err(not_found(missing));
        }

        // 列名来自白名单枚举，不接受外部字符串
        let now = Utc::now().to_rfc3339();
        let mut updated = 0;
        for chunk in unique_ids(ids).chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!(
                "UPDATE materials SET {} = ?1, updated_at = ?2 WHERE id IN ({})",
                field.column(),
                placeholders(chunk.len(), 3)
            );
            let mut values: Vec<rusqlite::types::Value> = Vec::with_capacity(chunk.len() + 2);
            values.push(value.map(str::to_string).into());
            values.push(now.clone().into());
            values.extend(chunk.iter().map(|id| rusqlite::types::Value::Integer(*id)));

            updated += tx.execute(&sql, params_from_iter(values))?;
        }
        tx.commit()?;
        Ok(updated)
    }

    /// 批量删除；不存在的 id 忽略
    pub fn bulk_delete(&self, ids: &[i64]) -> RepositoryResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        let mut deleted = 0;
        for chunk in unique_ids(ids).chunks(MAX_IDS_PER_STATEMENT) {
            let sql = format!("DELETE FROM materials WHERE id IN ({})", placeholders(chunk.len(), 1));
            deleted += tx.execute(&sql, params_from_iter(chunk.iter()))?;
        }
        tx.commit()?;
        Ok(deleted)
    }

    /// 清空 materials 表，返回删除前的记录数
    pub fn delete_all(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let deleted = conn.execute("DELETE FROM materials", [])?;
        Ok(deleted)
    }

    // ===== 内部工具 =====

    fn query_by_id(conn: &Connection, id: i64) -> RepositoryResult<Option<MaterialRecord>> {
        let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
        let record = conn
            .query_row(&sql, params![id], map_material_row)
            .optional()?;
        Ok(record)
    }

    fn require_by_id(conn: &Connection, id: i64) -> RepositoryResult<MaterialRecord> {
        Self::query_by_id(conn, id)?.ok_or_else(|| not_found(id))
    }

    fn first_missing_id(conn: &Connection, ids: &[i64]) -> RepositoryResult<Option<i64>> {
        let mut stmt = conn.prepare_cached("SELECT 1 FROM materials WHERE id = ?1")?;
        for id in ids {
            if !stmt.exists(params![id])? {
                return Ok(Some(*id));
            }
        }
        Ok(None)
    }
}

/// 单条语句绑定的 id 上限（SQLite 变量数上限的安全值）
const MAX_IDS_PER_STATEMENT: usize = 500;

/// 排序去重
fn unique_ids(ids: &[i64]) -> Vec<i64> {
    let mut unique = ids.to_vec();
    unique.sort_unstable();
    unique.dedup();
    unique
}

/// 生成 ?N, ?N+1, ... 占位符
fn placeholders(count: usize, start: usize) -> String {
    (start..start + count)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn not_found(id: i64) -> RepositoryError {
    RepositoryError::NotFound {
        entity: "Material".to_string(),
        id: id.to_string(),
    }
}

fn map_material_row(row: &Row<'_>) -> rusqlite::Result<MaterialRecord> {
    Ok(MaterialRecord {
        id: row.get(0)?,
        seat_number: row.get(1)?,
        subject_name: row.get(2)?,
        material_name: row.get(3)?,
        hall: row.get(4)?,
        seat: row.get(5)?,
        stage: row.get(6)?,
        received: row.get::<_, i64>(7)? != 0,
        received_at: row.get::<_, Option<DateTime<Utc>>>(8)?,
        received_by: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> MaterialRepository {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        MaterialRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn material(seat_number: &str, subject: &str, name: &str) -> NewMaterial {
        NewMaterial {
            seat_number: seat_number.to_string(),
            subject_name: subject.to_string(),
            material_name: name.to_string(),
            hall: "A".to_string(),
            seat: "1".to_string(),
            stage: None,
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = repo();
        let created = repo.insert(&material("1001", "Math", "Final")).unwrap();
        assert!(!created.received);
        assert_eq!(created.received_at, None);

        let found = repo.find_by_id(created.id).unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.find_by_id(created.id + 100).unwrap().is_none());
    }

    #[test]
    fn test_find_by_seat_number_ordering() {
        let repo = repo();
        repo.insert(&material("1001", "Physics", "B")).unwrap();
        repo.insert(&material("1001", "Math", "Z")).unwrap();
        repo.insert(&material("1001", "Math", "A")).unwrap();
        repo.insert(&material("2002", "Math", "A")).unwrap();

        let found = repo.find_by_seat_number("1001").unwrap();
        let keys: Vec<(String, String)> = found
            .iter()
            .map(|m| (m.subject_name.clone(), m.material_name.clone()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("Math".to_string(), "A".to_string()),
                ("Math".to_string(), "Z".to_string()),
                ("Physics".to_string(), "B".to_string()),
            ]
        );
    }

    #[test]
    fn test_received_round_trip() {
        let repo = repo();
        let created = repo.insert(&material("1001", "Math", "Final")).unwrap();

        let received = repo.mark_received(created.id, "desk-1").unwrap();
        assert!(received.received);
        assert!(received.received_at.is_some());
        assert_eq!(received.received_by.as_deref(), Some("desk-1"));

        let cancelled = repo.cancel_received(created.id).unwrap();
        assert!(!cancelled.received);
        assert_eq!(cancelled.received_at, None);
        assert_eq!(cancelled.received_by, None);
    }

    #[test]
    fn test_update_keeps_received_state() {
        let repo = repo();
        let created = repo.insert(&material("1001", "Math", "Final")).unwrap();
        repo.mark_received(created.id, "desk-1").unwrap();

        let mut changed = material("1001", "Math", "Final v2");
        changed.stage = Some("S2".to_string());
        let updated = repo.update(created.id, &changed).unwrap();

        assert_eq!(updated.material_name, "Final v2");
        assert_eq!(updated.stage.as_deref(), Some("S2"));
        assert!(updated.received);
        assert_eq!(updated.received_by.as_deref(), Some("desk-1"));
    }

    #[test]
    fn test_missing_id_is_not_found() {
        let repo = repo();
        assert!(matches!(repo.delete(42), Err(RepositoryError::NotFound { .. })));
        assert!(matches!(repo.mark_received(42, "x"), Err(RepositoryError::NotFound { .. })));
        assert!(matches!(
            repo.update(42, &material("1", "M", "F")),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_bulk_update_rejects_unknown_ids() {
        let repo = repo();
        let a = repo.insert(&material("1001", "Math", "Final")).unwrap();
        let b = repo.insert(&material("1002", "Math", "Final")).unwrap();

        let err = repo
            .bulk_update_field(&[a.id, b.id + 10], MaterialField::Hall, Some("B"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(repo.find_by_id(a.id).unwrap().unwrap().hall, "A");

        let updated = repo
            .bulk_update_field(&[a.id, b.id], MaterialField::Hall, Some("B"))
            .unwrap();
        assert_eq!(updated, 2);
        assert_eq!(repo.find_by_id(b.id).unwrap().unwrap().hall, "B");
    }

    #[test]
    fn test_bulk_update_stage_to_null() {
        let repo = repo();
        let mut m = material("1001", "Math", "Final");
        m.stage = Some("S1".to_string());
        let created = repo.insert(&m).unwrap();

        repo.bulk_update_field(&[created.id], MaterialField::Stage, None)
            .unwrap();
        assert_eq!(repo.find_by_id(created.id).unwrap().unwrap().stage, None);
    }

    #[test]
    fn test_bulk_delete_and_delete_all() {
        let repo = repo();
        let a = repo.insert(&material("1", "M", "F")).unwrap();
        let b = repo.insert(&material("2", "M", "F")).unwrap();
        repo.insert(&material("3", "M", "F")).unwrap();

        assert_eq!(repo.bulk_delete(&[a.id, b.id, 999]).unwrap(), 2);
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.delete_all().unwrap(), 1);
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_bulk_operations_split_large_id_lists() {
        let repo = repo();
        let ids: Vec<i64> = (0..1200)
            .map(|i| repo.insert(&material(&i.to_string(), "M", "F")).unwrap().id)
            .collect();

        // 重复 id 只计一次
        let mut with_duplicates = ids.clone();
        with_duplicates.extend_from_slice(&ids[..10]);
        let updated = repo
            .bulk_update_field(&with_duplicates, MaterialField::Hall, Some("B"))
            .unwrap();
        assert_eq!(updated, 1200);
        assert_eq!(repo.find_by_id(ids[1199]).unwrap().unwrap().hall, "B");

        let mut to_delete = ids[..1100].to_vec();
        to_delete.extend(100_000..100_600);
        assert_eq!(repo.bulk_delete(&to_delete).unwrap(), 1100);
        assert_eq!(repo.count().unwrap(), 100);
    }

    #[test]
    fn test_large_bulk_update_with_unknown_id_changes_nothing() {
        let repo = repo();
        let mut ids: Vec<i64> = (0..700)
            .map(|i| repo.insert(&material(&i.to_string(), "M", "F")).unwrap().id)
            .collect();
        ids.push(999_999);

        let err = repo
            .bulk_update_field(&ids, MaterialField::Hall, Some("B"))
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
        assert_eq!(repo.find_by_id(ids[0]).unwrap().unwrap().hall, "A");
    }
}
