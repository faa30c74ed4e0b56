//! Social Service — Comments, as a standalone `actix-web` process.
//!
//! Only exists in `DEPLOYMENT_MODE=microservices`: `content-service` hosts
//! Comments itself in `serverless` mode. This process talks back to
//! `content-service`'s `PostService` over HMAC-signed HTTP via
//! `social_core::adapters::RpcPostStatsUpdater`, and answers
//! `content-service`'s `RpcCommentCounter` calls at
//! `/comments/actions/root-count/{postId}`.
//!
//! # Routes
//!
//! - `/comments/*` — create, list (cursor), update, like, delete
//! - `/comments/actions/root-count/{postId}` — HMAC-authenticated, called by
//!   `content-service` for lazy `commentCounter` correction
//! - `/health`, `/ready`, `/metrics` — no auth

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use crypto_core::jwt;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use social_core::adapters::{PostStatsUpdater, RpcPostStatsUpdater};
use social_core::deployment::{HmacConfig, ServiceEndpoints};
use social_service::handlers;
use social_service::openapi::ApiDoc;
use social_service::services::comments::CommentService;
use std::io;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa_swagger_ui::SwaggerUi;

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "social-service",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn ready(pool: web::Data<sqlx::PgPool>) -> HttpResponse {
    match sqlx::query("SELECT 1").execute(pool.get_ref()).await {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({"ready": true})),
        Err(e) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "ready": false,
            "error": e.to_string(),
        })),
    }
}

async fn openapi_json(doc: web::Data<utoipa::openapi::OpenApi>) -> actix_web::Result<HttpResponse> {
    let body = serde_json::to_string(&*doc).map_err(|e| {
        tracing::error!("OpenAPI serialization failed: {}", e);
        actix_web::error::ErrorInternalServerError("OpenAPI serialization error")
    })?;
    Ok(HttpResponse::Ok().content_type("application/json").body(body))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut terminate =
            signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = terminate.recv() => {},
        }
    }
    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match social_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("configuration loading failed: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("starting social-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("environment: {}", config.app.env);

    if config.jwt.public_key_pem.is_empty() {
        tracing::warn!("JWT_PUBLIC_KEY_PEM not set; bearer-authenticated routes will reject every request");
    } else if let Err(err) = jwt::initialize_jwt_validation_only(&config.jwt.public_key_pem) {
        return Err(io::Error::new(io::ErrorKind::Other, format!("failed to initialize JWT keys: {err}")));
    }

    let mut db_cfg = DbPoolConfig::from_env("social-service").unwrap_or_else(|e| {
        tracing::warn!("db-pool config from env failed ({e}), falling back to app config");
        DbPoolConfig { service_name: "social-service".to_string(), ..Default::default() }
    });
    if db_cfg.database_url.is_empty() {
        db_cfg.database_url = config.database.url.clone();
    }
    if db_cfg.max_connections < config.database.max_connections {
        db_cfg.max_connections = config.database.max_connections;
    }
    db_cfg.log_config();

    let db_pool = match create_pg_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("database pool creation failed: {e}");
            std::process::exit(1);
        }
    };
    tracing::info!("connected to database via db-pool crate");

    let hmac_config = HmacConfig::from_env();
    let endpoints = ServiceEndpoints::from_env();
    let service_uid = std::env::var("SERVICE_UID").unwrap_or_else(|_| "social-service".to_string());

    // This service only runs in `microservices` mode, so `post_stats` is
    // always the RPC adapter — there is no in-process `PostService` here to
    // delegate to directly.
    let post_stats: Arc<dyn PostStatsUpdater> = Arc::new(RpcPostStatsUpdater::new(
        endpoints.posts_base_url.clone(),
        hmac_config.secret.clone(),
        service_uid.clone(),
    ));
    let comment_service = Arc::new(CommentService::new(db_pool.clone(), post_stats));

    let comment_service_data = web::Data::new(comment_service);
    let hmac_config_data = web::Data::new(hmac_config);
    let db_pool_data = web::Data::new(db_pool.clone());

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("starting HTTP server at {}", http_bind_address);

    let server = HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in config.cors.allowed_origins.split(',') {
            let origin = origin.trim();
            cors = if origin == "*" { cors.allow_any_origin() } else { cors.allowed_origin(origin) };
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        let openapi_doc = ApiDoc::openapi();

        App::new()
            .app_data(web::Data::new(openapi_doc.clone()))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi_doc.clone()))
            .route("/openapi.json", web::get().to(openapi_json))
            .app_data(db_pool_data.clone())
            .app_data(comment_service_data.clone())
            .app_data(hmac_config_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(social_service::metrics::serve_metrics))
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
            .service(
                web::scope("/comments")
                    .service(
                        web::resource("")
                            .route(web::post().to(handlers::create_comment))
                            .route(web::get().to(handlers::list_comments))
                            .route(web::put().to(handlers::update_comment)),
                    )
                    .service(web::resource("/{comment_id}").route(web::get().to(handlers::get_comment)))
                    .service(web::resource("/{comment_id}/like").route(web::post().to(handlers::like_comment)))
                    .service(
                        web::resource("/id/{comment_id}/post/{post_id}")
                            .route(web::delete().to(handlers::delete_comment)),
                    )
                    .service(
                        web::resource("/actions/root-count/{post_id}")
                            .route(web::get().to(handlers::service_get_root_comment_count)),
                    ),
            )
    })
    .bind(&http_bind_address)?
    .workers(4)
    .run();

    let server_handle = server.handle();
    let mut tasks: tokio::task::JoinSet<io::Result<()>> = tokio::task::JoinSet::new();
    tasks.spawn(async move { server.await });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut first_error: Option<io::Error> = None;
    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(_))) => {}
                    Some(Ok(Err(e))) => {
                        tracing::error!("HTTP server task error: {e}");
                        first_error.get_or_insert(e);
                    }
                    Some(Err(e)) => {
                        tracing::error!("HTTP server task join error: {e}");
                        first_error.get_or_insert(io::Error::new(io::ErrorKind::Other, e.to_string()));
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                server_handle.stop(true).await;
                tasks.shutdown().await;
                break;
            }
        }
    }

    tracing::info!("social-service shutting down");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
