/*
 * Responsibility
 * - Config読み込み → 依存生成 (DB / TokenVerifier / LocationHub) → Router 組み立て
 * - Middleware の適用 (Appwrite ゲート / CORS / HTTP 層)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{self, v1::handlers::health::health};
use crate::config::Config;
use crate::middleware::{cors, http};
use crate::repos::PgUserRepo;
use crate::services::{auth::build_token_verifier, realtime::LocationHub};
use crate::state::AppState;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,tracker_backend=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast. production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("bind {}", config.addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("connect database")?;

    if config.run_migrations {
        sqlx::migrate!().run(&pool).await.context("run migrations")?;
    }

    let verifier = build_token_verifier(config).await?;

    Ok(AppState::new(
        Arc::new(PgUserRepo::new(pool)),
        verifier,
        LocationHub::new(config.location_channel_capacity),
    ))
}

fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = cors::apply(router, config);
    http::apply(router, config)
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::{
        body::Body,
        http::{Method, Request, StatusCode, header},
    };
    use tower::ServiceExt;

    use crate::config::{AppEnv, AppwriteConfig};
    use crate::error::UNAUTHORIZED_BODY;
    use crate::middleware::http::REQUEST_ID_HEADER;
    use crate::repos::user_repo::memory::MemoryUserRepo;
    use crate::services::auth::verifier::testing::StaticVerifier;

    fn test_config() -> Config {
        Config {
            addr: "127.0.0.1:0".parse().unwrap(),
            database_url: "postgres://unused".into(),
            database_max_connections: 1,
            run_migrations: false,
            app_env: AppEnv::Development,
            cors_allowed_origins: Vec::new(),
            http_timeout: Duration::from_secs(5),
            body_limit_bytes: 1024,
            appwrite: AppwriteConfig {
                endpoint: "http://127.0.0.1:1/v1".parse().unwrap(),
                project_id: "tracker".into(),
                timeout: Duration::from_secs(1),
            },
            valkey_url: None,
            verify_cache_ttl_seconds: 60,
            location_channel_capacity: 16,
        }
    }

    fn router(verifier: Arc<StaticVerifier>) -> Router {
        let state = AppState::for_tests(MemoryUserRepo::default(), verifier);
        build_router(state, &test_config())
    }

    #[tokio::test]
    async fn health_answers_without_a_token() {
        let verifier = Arc::new(StaticVerifier::rejecting());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let res = router(verifier.clone()).oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn cors_preflight_is_answered_outside_the_gate() {
        let verifier = Arc::new(StaticVerifier::rejecting());
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/v1/users")
            .header(header::ORIGIN, "https://tracker.example")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();

        let res = router(verifier.clone()).oneshot(req).await.unwrap();

        assert_ne!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(
            res.headers()
                .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        );
        assert_eq!(verifier.calls(), 0);
    }

    #[tokio::test]
    async fn unknown_v1_path_is_gated_in_the_full_router() {
        for auth in [None, Some("Bearer x")] {
            let verifier = Arc::new(StaticVerifier::rejecting());
            let mut req = Request::builder().uri("/api/v1/nope");
            if let Some(value) = auth {
                req = req.header(header::AUTHORIZATION, value);
            }

            let res = router(verifier)
                .oneshot(req.body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
            let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
                .await
                .unwrap();
            assert_eq!(&bytes[..], UNAUTHORIZED_BODY.as_bytes());
        }
    }
}
