// ==========================================
// 考试材料发放追踪系统 - 应用层
// ==========================================
// 职责: 组装共享状态，挂载 actix-web 路由
// ==========================================

pub mod http_routes;
pub mod state;

// 重导出
pub use http_routes::configure_routes;
pub use state::{get_bind_address, get_default_db_path, AppState};
