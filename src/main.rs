use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use contest_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{CloudinaryStorage, GoogleIdentity, ImageStorage, TurnstileService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");
    let default_policy = config
        .contest
        .draw_policy()
        .expect("Invalid contest.default_draw_policy");

    if config.admin.allowed_emails.is_empty() {
        log::warn!("admin.allowed_emails is empty, nobody can log in to the admin area");
    }

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 创建外部服务
    let storage: Arc<dyn ImageStorage> = Arc::new(
        CloudinaryStorage::new(config.cloudinary.clone())
            .expect("Failed to create Cloudinary client"),
    );
    let identity = Arc::new(
        GoogleIdentity::new(config.admin.google_client_id.clone())
            .expect("Failed to create Google identity client"),
    );
    let turnstile_service = web::Data::new(
        TurnstileService::new(config.turnstile.clone()).expect("Failed to create Turnstile client"),
    );
    if !turnstile_service.is_enabled() {
        log::info!("Turnstile secret not configured, captcha check disabled");
    }

    // 创建服务，所有 worker 共享同一份实例
    let entry_service = web::Data::new(EntryService::new(
        pool.clone(),
        storage.clone(),
        AdmissionLimits {
            max_image_bytes: config.contest.max_image_bytes,
            folder: config.cloudinary.folder.clone(),
        },
    ));
    let draw_service = web::Data::new(DrawService::new(pool.clone(), default_policy));
    let export_service = web::Data::new(ExportService::new(pool.clone(), storage));
    let admin_auth_service = web::Data::new(AdminAuthService::new(
        identity,
        jwt_service.clone(),
        config.admin.allowed_emails.clone(),
    ));

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{} (draw policy {:?})",
        config.server.host,
        config.server.port,
        default_policy
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .app_data(entry_service.clone())
            .app_data(draw_service.clone())
            .app_data(export_service.clone())
            .app_data(admin_auth_service.clone())
            .app_data(turnstile_service.clone())
            .configure(swagger_config)
            .route("/", web::get().to(handlers::entry::status))
            .service(
                web::scope("/api/v1")
                    .configure(handlers::entry_config)
                    .configure(handlers::auth_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
