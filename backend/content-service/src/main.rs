//! Content Service — Posts, Votes, and (in `serverless` deployment mode)
//! Comments, as one `actix-web` process.
//!
//! # Routes
//!
//! - `/posts/*` — create, read, update, delete, query (offset + cursor), vote
//! - `/comments/*` — hosted here only when `DEPLOYMENT_MODE=serverless`
//! - `/votes` — cast/read a vote
//! - `/health`, `/ready`, `/metrics` — no auth
//!
//! # Deployment
//!
//! `DEPLOYMENT_MODE=serverless` (default) co-hosts `PostService` and
//! `CommentService` in this process, wired directly to each other.
//! `DEPLOYMENT_MODE=microservices` hosts only `PostService`/`VoteService`
//! here; comments live in `social-service`, reached over HMAC-signed HTTP.

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpResponse, HttpServer};
use async_trait::async_trait;
use content_service::cache::ContentCache;
use content_service::handlers;
use content_service::openapi::ApiDoc;
use content_service::services::comments::CommentService;
use content_service::services::posts::PostService;
use content_service::services::votes::VoteService;
use crypto_core::jwt;
use db_pool::{create_pool as create_pg_pool, DbConfig as DbPoolConfig};
use social_core::adapters::{AdapterError, CommentCounter, PostStatsUpdater, RpcCommentCounter};
use social_core::deployment::{DeploymentMode, HmacConfig, ServiceEndpoints};
use std::cell::RefCell;
use std::io;
use std::sync::{Arc, Weak};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

/// Forwards to a `PostService` that may not exist yet when this adapter is
/// constructed — breaks the `PostService` <-> `CommentService` construction
/// cycle in serverless mode, where each co-hosted service needs an `Arc` to
/// the other before either is fully built.
struct WeakPostStatsUpdater(Weak<PostService>);

#[async_trait]
impl PostStatsUpdater for WeakPostStatsUpdater {
    async fn increment_comment_count_for_service(
        &self,
        post_id: Uuid,
        delta: i64,
    ) -> Result<(), AdapterError> {
        match self.0.upgrade() {
            Some(posts) => posts.increment_comment_count_for_service(post_id, delta).await,
            None => Err(AdapterError::Network("post service no longer running".to_string())),
        }
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "content-service",
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

    let config = match content_service::Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("configuration loading failed: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("starting content-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("environment: {}", config.app.env);

    if config.jwt.public_key_pem.is_empty() {
        tracing::warn!("JWT_PUBLIC_KEY_PEM not set; bearer-authenticated routes will reject every request");
    } else if let Err(err) = jwt::initialize_jwt_validation_only(&config.jwt.public_key_pem) {
        return Err(io::Error::new(io::ErrorKind::Other, format!("failed to initialize JWT keys: {err}")));
    }

    let mut db_cfg = DbPoolConfig::from_env("content-service").unwrap_or_else(|e| {
        tracing::warn!("db-pool config from env failed ({e}), falling back to app config");
        DbPoolConfig { service_name: "content-service".to_string(), ..Default::default() }
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

    // One instance, shared (via `Arc`) by `PostService`/`CommentService` and
    // `VoteService` below — vote and comment writes invalidate the same
    // cached post lists a reader hits, so they must land in the same store.
    let content_cache: Arc<ContentCache> = Arc::new(if !config.cache.enabled {
        ContentCache::disabled()
    } else {
        match redis::Client::open(config.cache.url.clone()) {
            Ok(client) => match redis::aio::ConnectionManager::new(client).await {
                Ok(manager) => {
                    tracing::info!("connected to redis cache");
                    ContentCache::redis(Arc::new(tokio::sync::Mutex::new(manager)))
                }
                Err(e) => {
                    tracing::warn!("redis connection failed ({e}), falling back to in-memory cache");
                    ContentCache::memory()
                }
            },
            Err(e) => {
                tracing::warn!("invalid redis url ({e}), falling back to in-memory cache");
                ContentCache::memory()
            }
        }
    });

    let deployment_mode = DeploymentMode::from_env();
    let hmac_config = HmacConfig::from_env();
    let endpoints = ServiceEndpoints::from_env();
    let service_uid = std::env::var("SERVICE_UID").unwrap_or_else(|_| "content-service".to_string());

    tracing::info!(mode = ?deployment_mode, "deployment mode resolved");

    // `comment_service` is `None` in microservices mode: comments are hosted
    // by social-service there, reached only over the HMAC RPC surface.
    let (post_service, comment_service): (Arc<PostService>, Option<Arc<CommentService>>) =
        match deployment_mode {
            DeploymentMode::Serverless => {
                let comment_service_slot: RefCell<Option<Arc<CommentService>>> = RefCell::new(None);
                let posts = Arc::new_cyclic(|weak_posts: &Weak<PostService>| {
                    let post_stats: Arc<dyn PostStatsUpdater> =
                        Arc::new(WeakPostStatsUpdater(weak_posts.clone()));
                    let comments = Arc::new(CommentService::new(db_pool.clone(), post_stats));
                    *comment_service_slot.borrow_mut() = Some(comments.clone());
                    PostService::new(db_pool.clone(), content_cache.clone(), comments as Arc<dyn CommentCounter>)
                });
                let comments = comment_service_slot.into_inner().expect("comment service set during construction");
                (posts, Some(comments))
            }
            DeploymentMode::Microservices => {
                let comment_counter: Arc<dyn CommentCounter> = Arc::new(RpcCommentCounter::new(
                    endpoints.comments_base_url.clone(),
                    hmac_config.secret.clone(),
                    service_uid.clone(),
                ));
                let posts = Arc::new(PostService::new(db_pool.clone(), content_cache.clone(), comment_counter));
                (posts, None)
            }
        };

    let vote_service = Arc::new(VoteService::new(db_pool.clone(), content_cache.clone()));

    let post_service_data = web::Data::new(post_service);
    let vote_service_data = web::Data::new(vote_service);
    let comment_service_data = comment_service.map(web::Data::new);
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

        let mut app = App::new()
            .app_data(web::Data::new(openapi_doc.clone()))
            .service(SwaggerUi::new("/swagger-ui/{_:.*}").url("/openapi.json", openapi_doc.clone()))
            .route("/openapi.json", web::get().to(openapi_json))
            .app_data(db_pool_data.clone())
            .app_data(post_service_data.clone())
            .app_data(vote_service_data.clone())
            .app_data(hmac_config_data.clone())
            .wrap(cors)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/metrics", web::get().to(content_service::metrics::serve_metrics))
            .route("/health", web::get().to(health))
            .route("/ready", web::get().to(ready))
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::post().to(handlers::create_post))
                            .route(web::get().to(handlers::query_posts))
                            .route(web::put().to(handlers::update_post)),
                    )
                    .service(web::resource("/queries/cursor").route(web::get().to(handlers::query_posts_with_cursor)))
                    .service(web::resource("/queries/search/cursor").route(web::get().to(handlers::search_posts_with_cursor)))
                    .service(
                        web::resource("/urlkey/{key}")
                            .route(web::get().to(handlers::get_post_by_url_key))
                            .route(web::put().to(handlers::generate_url_key)),
                    )
                    .service(
                        web::resource("/cursor/info/{post_id}")
                            .route(web::get().to(handlers::cursor_info)),
                    )
                    .service(
                        web::resource("/{post_id}")
                            .route(web::get().to(handlers::get_post))
                            .route(web::delete().to(handlers::delete_post)),
                    )
                    .service(web::resource("/comment/disable").route(web::put().to(handlers::disable_comments)))
                    .service(web::resource("/share/disable").route(web::put().to(handlers::disable_sharing)))
                    .service(
                        web::resource("/actions/comment/count")
                            .route(web::put().to(handlers::service_increment_comment_count)),
                    ),
            )
            .service(
                web::scope("/votes")
                    .service(web::resource("").route(web::post().to(handlers::cast_vote)))
                    .service(web::resource("/{post_id}").route(web::get().to(handlers::get_vote))),
            );

        if let Some(comment_service_data) = &comment_service_data {
            app = app.app_data(comment_service_data.clone()).service(
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
            );
        }

        app
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

    tracing::info!("content-service shutting down");
    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
