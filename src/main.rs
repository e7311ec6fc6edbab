//! Dashgate - Google OAuth domain gate for the powerplugs dashboard

use anyhow::Result;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dashgate::{
    api::{self, AppState},
    config::Config,
    oauth::{GoogleOAuthClient, OAuthConfig},
    services::{AuthGate, CookieSigner},
    store::MemorySessionStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dashgate=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting dashgate...");

    // Load configuration; missing Google credentials abort here, before
    // any listener exists
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::info!(
        allowed_domain = %config.google.allowed_domain,
        dashboard = %config.dashboard.file,
        "Configuration loaded"
    );

    // Identity provider adapter
    let oauth_config = OAuthConfig::new(
        config.google.client_id.clone(),
        config.google.client_secret.clone(),
        config.google.callback_url.clone(),
    )
    .with_hosted_domain(config.google.allowed_domain.clone());
    let oauth = Arc::new(GoogleOAuthClient::new(oauth_config));

    // Session gate over an in-memory store
    let store = MemorySessionStore::boxed();
    let gate = Arc::new(AuthGate::with_ttl_days(
        store,
        config.google.allowed_domain.clone(),
        config.session.ttl_days,
    ));

    let state = AppState {
        gate,
        oauth,
        signer: CookieSigner::new(&config.session.secret),
        dashboard_file: Arc::from(config.dashboard.file.as_str()),
        callback_is_https: config.google.callback_url.starts_with("https://"),
    };

    // Build router
    let app = api::build_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
