// ==========================================
// 考试材料发放追踪系统 - 配置层
// ==========================================
// 职责: 运行期配置读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, DEFAULT_DELETE_ALL_PASSWORD};
pub use import_config_trait::{ImportConfigReader, ImportLimits};
