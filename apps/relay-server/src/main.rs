use std::path::Path;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay_server::config::Config;
use relay_server::AppState;

#[tokio::main]
async fn main() {
    // Load .env file (silently skip if missing; env vars may be set externally)
    if dotenvy::dotenv().is_err() {
        let env_path = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(env_path);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    let bind = format!("{}:{}", config.host, config.port);

    tracing::info!(
        client_dir = %config.client_dir.display(),
        outbound_buffer = config.outbound_buffer,
        "relay-server configured"
    );

    let state = AppState::new(config);

    let app = Router::new()
        .merge(relay_server::routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .expect("failed to bind");
    let addr = listener.local_addr().expect("listener address");
    tracing::info!(%addr, "relay-server listening");

    axum::serve(listener, app).await.expect("server error");
}
