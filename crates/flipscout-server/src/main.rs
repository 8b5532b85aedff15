mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use flipscout_analysis::sources::VisionClient;
use flipscout_analysis::AnalysisEngine;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(flipscout_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    let engine = AnalysisEngine::from_config(&config)?;
    let vision = VisionClient::new(&config.vision_api_key, config.request_timeout_secs)?;

    let auth = AuthState::from_env(matches!(
        config.env,
        flipscout_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            engine: Arc::new(engine),
            vision: Arc::new(vision),
            upload_dir: config.upload_dir.clone(),
        },
        auth,
        default_rate_limit_state(),
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "flipscout server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
