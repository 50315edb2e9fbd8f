// ==========================================
// 考试材料发放追踪系统 - HTTP 服务主入口
// ==========================================
// 技术栈: actix-web + Rust + SQLite
// ==========================================

use actix_web::{middleware, web, App, HttpServer};
use anyhow::Context;

use material_tracker::app::{configure_routes, get_bind_address, get_default_db_path, AppState};
use material_tracker::logging;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志系统
    logging::init();

    tracing::info!("==================================================");
    tracing::info!("{}", material_tracker::APP_NAME);
    tracing::info!("系统版本: {}", material_tracker::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState
    let app_state = AppState::new(db_path.clone())
        .with_context(|| format!("无法初始化AppState: {}", db_path))?;
    let app_state = web::Data::new(app_state);

    let bind = get_bind_address();
    tracing::info!("HTTP 服务监听: http://{}", bind);

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .service(configure_routes())
    })
    .bind(&bind)
    .with_context(|| format!("无法绑定地址: {}", bind))?
    .run()
    .await
    .context("HTTP 服务异常退出")?;

    tracing::info!("HTTP 服务已停止");
    Ok(())
}
