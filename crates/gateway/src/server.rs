use std::{net::SocketAddr, sync::Arc, time::Duration};

use {
    axum::{
        Router,
        response::IntoResponse,
        routing::{get, post},
    },
    tower_http::trace::TraceLayer,
    tracing::info,
};

use {
    igdm_auth::Carrier,
    igdm_client::{DirectClient, RestClient},
};

use crate::{
    routes,
    state::{AppState, ClientFactory},
};

// ── Router ───────────────────────────────────────────────────────────────────

/// Build the application router (shared between production startup and
/// tests).
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/login", get(routes::login_form).post(routes::login_submit))
        .route("/logout", get(routes::logout))
        .route("/threads", get(routes::threads))
        .route("/thread/{thread_id}", get(routes::thread_detail))
        .route("/thread/{thread_id}/send", post(routes::send))
        .route("/session/export", get(routes::session_export))
        .route("/assets/send.js", get(send_js_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the HTTP server. `bind`/`port` override the configured listener
/// when given.
pub async fn start_gateway(bind: Option<&str>, port: Option<u16>) -> anyhow::Result<()> {
    let config = igdm_config::discover_and_load();

    // The signing secret has no default: an unset key must fail loudly
    // rather than sign cookies with something guessable.
    let secret = config
        .session
        .secret_key
        .clone()
        .or_else(|| std::env::var("IGDM_SECRET").ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            anyhow::anyhow!("no signing secret configured — set session.secret_key or IGDM_SECRET")
        })?;
    let carrier = Carrier::new(&secret);

    // One prototype bridge client; each request clones it, sharing the
    // connection pool while keeping session settings request-scoped.
    let prototype = RestClient::new(
        &config.bridge.base_url,
        Duration::from_secs(config.bridge.timeout_secs),
    )?;
    let clients: ClientFactory =
        Arc::new(move || Box::new(prototype.clone()) as Box<dyn DirectClient>);

    let bind = bind.unwrap_or(config.gateway.bind.as_str()).to_string();
    let port = port.unwrap_or(config.gateway.port);
    let bridge_url = config.bridge.base_url.clone();

    let state = AppState::new(config, carrier, clients);
    let app = build_app(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("igdm v{}", env!("CARGO_PKG_VERSION")),
        format!("listening on {addr}"),
        format!("bridge at {bridge_url}"),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Static assets ────────────────────────────────────────────────────────────

async fn send_js_handler() -> impl IntoResponse {
    (
        [("content-type", "application/javascript; charset=utf-8")],
        include_str!("assets/send.js"),
    )
}
