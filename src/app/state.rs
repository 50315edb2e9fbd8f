// ==========================================
// 考试材料发放追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约定: 所有仓储共用同一个 SQLite 连接（Arc<Mutex<Connection>>）
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::api::{ImportApi, MaterialApi};
use crate::config::config_manager::ConfigManager;
use crate::db::{configure_sqlite_connection, init_schema, open_sqlite_connection, read_schema_version};
use crate::importer::MaterialImporterImpl;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::material_import_repo_impl::MaterialImportRepositoryImpl;
use crate::repository::material_repo::MaterialRepository;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "MATERIAL_TRACKER_DB_PATH";
/// 监听地址环境变量
pub const BIND_ENV: &str = "MATERIAL_TRACKER_BIND";
/// 默认监听地址
pub const DEFAULT_BIND: &str = "127.0.0.1:8080";

/// 应用状态
///
/// 包含所有API实例和共享资源，作为 actix-web 的 app_data 共享
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 材料导入API
    pub import_api: Arc<ImportApi>,

    /// 材料API
    pub material_api: Arc<MaterialApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库并应用统一 PRAGMA
    /// 2. 建表（幂等）
    /// 3. 创建所有Repository与API实例
    pub fn new(db_path: String) -> RepositoryResult<Self> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(db_path, conn)
    }

    /// 从已有连接创建（测试使用内存库）
    pub fn from_connection(db_path: String, conn: Connection) -> RepositoryResult<Self> {
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        if let Some(version) = read_schema_version(&conn)? {
            tracing::debug!(schema_version = version, "数据库 schema 就绪");
        }
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone()));
        let material_repo = Arc::new(MaterialRepository::from_connection(conn.clone()));
        let import_repo = MaterialImportRepositoryImpl::from_connection(conn);

        // ==========================================
        // 初始化API层
        // ==========================================
        let importer = Arc::new(MaterialImporterImpl::new(import_repo, config_manager.clone()));
        let import_api = Arc::new(ImportApi::new(importer, config_manager.clone()));
        let material_api = Arc::new(MaterialApi::new(material_repo, config_manager.clone()));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            import_api,
            material_api,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./material_tracker.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("material-tracker");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("material_tracker.db");
        }
    }

    path.to_string_lossy().to_string()
}

/// 获取 HTTP 监听地址
pub fn get_bind_address() -> String {
    std::env::var(BIND_ENV)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}
