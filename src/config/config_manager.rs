// ==========================================
// 考试材料发放追踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value)
// 约定: 缺失或格式错误的值回退为默认值并告警
// ==========================================

use crate::config::import_config_trait::{
    ImportConfigReader, DEFAULT_MAX_REPORTED_ERRORS, DEFAULT_MAX_STAGE_LENGTH,
    DEFAULT_MAX_UPLOAD_BYTES,
};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 清空全部材料的口令默认值（兼容既有部署）
pub const DEFAULT_DELETE_ALL_PASSWORD: &str = "123";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入配置值（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![key, value, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// 读取并解析配置；缺失时返回默认值，解析失败时告警后返回默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T: FromStr + Copy + std::fmt::Display,
    {
        let raw = match self.get_config_value(key)? {
            Some(raw) => raw,
            None => return Ok(default),
        };
        match raw.trim().parse::<T>() {
            Ok(value) => Ok(value),
            Err(_) => {
                warn!(key, value = %raw, default = %default, "配置值格式错误，使用默认值");
                Ok(default)
            }
        }
    }

    /// 清空全部材料的口令
    pub fn delete_all_password(&self) -> RepositoryResult<String> {
        let password = self
            .get_config_value(config_keys::DELETE_ALL_PASSWORD)?
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_DELETE_ALL_PASSWORD.to_string());
        Ok(password)
    }
}

impl ImportConfigReader for ConfigManager {
    fn max_reported_errors(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_REPORTED_ERRORS, DEFAULT_MAX_REPORTED_ERRORS)
    }

    fn max_upload_bytes(&self) -> RepositoryResult<u64> {
        self.get_parsed_or_default(config_keys::MAX_UPLOAD_BYTES, DEFAULT_MAX_UPLOAD_BYTES)
    }

    fn max_stage_length(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_STAGE_LENGTH, DEFAULT_MAX_STAGE_LENGTH)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // ===== 导入 =====
    pub const MAX_REPORTED_ERRORS: &str = "max_reported_errors";
    pub const MAX_UPLOAD_BYTES: &str = "max_upload_bytes";
    pub const MAX_STAGE_LENGTH: &str = "max_stage_length";

    // ===== 管理 =====
    pub const DELETE_ALL_PASSWORD: &str = "delete_all_password";
}
