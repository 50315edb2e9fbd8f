// ==========================================
// 考试材料发放追踪系统 - 核心库
// ==========================================
// 技术栈: actix-web + Rust + SQLite
// 系统定位: 考务人员按考号发放材料，管理员批量导入名单
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - HTTP 集成
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellTable, CellValue, FileKind, ImportField, StageScope};

// 领域实体
pub use domain::{ImportReport, MaterialRecord, NewMaterial};

// 导入
pub use importer::{ImportError, ImportOptions, ImportPipeline, MaterialImporter, MaterialImporterImpl};

// API
pub use api::{ApiError, ImportApi, MaterialApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "考试材料发放追踪系统";
