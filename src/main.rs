use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use tower_http::trace::TraceLayer;

use rbac_server::{
    auth::{bootstrap::seed_admin, oauth::ReqwestOAuthClient},
    config::AppConfig,
    db::connection,
    logging::init_tracing,
    mail::{LogTransport, Mailer},
    routes::app,
    services::ServiceContext,
    state::AppState,
};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        tracing::error!("server failed: {err:?}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cfg = AppConfig::from_env().context("failed to load config")?;
    init_tracing(&cfg.logging.rust_log);

    let db_cfg = cfg
        .database
        .clone()
        .context("database config is required (APP_DATABASE__URL)")?;
    let db = connection::connect(&db_cfg).await?;

    let mailer = Mailer::spawn(&cfg.mail, Arc::new(LogTransport));
    let oauth_client = Arc::new(ReqwestOAuthClient::new(&cfg.general.app_name)?);
    let addr: SocketAddr = format!("{}:{}", cfg.general.host, cfg.general.port)
        .parse()
        .context("invalid host/port")?;

    let state = AppState::new(cfg, db, mailer, oauth_client)?;
    seed_admin(&ServiceContext::from_state(&state), &state.auth).await?;

    let app = app(Arc::clone(&state)).layer(TraceLayer::new_for_http());

    tracing::info!("listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
