/*
 * Responsibility
 * - tracing / panic hook の初期化
 * - Config読み込み → 依存生成 (repo / AuthService) → Router 組み立て
 * - Middleware の適用 (HTTP / CORS / security headers)
 * - axum::serve() で起動、Ctrl-C / SIGTERM で graceful shutdown
 */
use std::{panic, process, sync::Arc, time::Duration};

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::middleware;
use crate::repos::{InMemoryUserRepo, PgUserRepo, UserRepo};
use crate::services::auth::build_auth_service;
use crate::services::authz::{Role, permissions::granted_to, policy::policy_table};
use crate::state::AppState;
use crate::api;

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,user_directory=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new("info,user_directory=debug,tower_http=info")
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    // Keep the default hook as a fallback (prints to stderr with location/payload).
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // development: fail fast
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

// Effective role → permission and endpoint → permission tables.
fn log_authorization_tables() {
    for role in Role::ALL {
        let permissions: Vec<&str> = granted_to(role).iter().map(|p| p.as_str()).collect();
        tracing::info!(role = %role.as_str(), ?permissions, "role permissions");
    }
    for (operation, permission) in policy_table() {
        tracing::info!(%operation, %permission, "endpoint policy");
    }
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let abort_on_panic = !config.app_env.is_production();
    init_panic_hook(abort_on_panic);

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );
    log_authorization_tables();

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(unix)]
fn terminate_signal() -> impl Future<Output = ()> {
    // registered now, so a SIGTERM arriving before the first poll is not lost
    let sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate());
    async move {
        match sigterm {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
fn terminate_signal() -> impl Future<Output = ()> {
    std::future::pending::<()>()
}

/// Resolves on Ctrl-C or SIGTERM (container stop).
fn shutdown_signal() -> impl Future<Output = ()> {
    let terminate = terminate_signal();
    async move {
        let ctrl_c = async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %err, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            () = ctrl_c => tracing::info!("ctrl-c received, shutting down"),
            () = terminate => tracing::info!("SIGTERM received, shutting down"),
        }
    }
}

async fn build_state(config: &Config) -> Result<AppState> {
    let users: Arc<dyn UserRepo> = match &config.database_url {
        Some(url) => {
            // Avoid logging the URL: it may carry credentials.
            let db = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(Duration::from_secs(5))
                .connect(url)
                .await?;
            Arc::new(PgUserRepo::new(db))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; users are kept in memory and lost on restart");
            Arc::new(InMemoryUserRepo::new())
        }
    };

    let auth = build_auth_service(config)?;
    tracing::info!(
        issuer = %config.auth_issuer,
        audience = %config.auth_audience,
        roles_claim = %auth.roles_claim(),
        "access token verification configured"
    );

    Ok(AppState::new(users, auth))
}

/// Full application router: `/api/v1` plus every cross-cutting layer.
pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_resolves_shutdown_signal() {
        let shutdown = shutdown_signal();

        let status = std::process::Command::new("kill")
            .args(["-TERM", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        tokio::time::timeout(Duration::from_secs(5), shutdown)
            .await
            .expect("shutdown future should resolve after SIGTERM");
    }
}
