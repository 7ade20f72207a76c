use std::net::SocketAddr;
use std::sync::Arc;

use sqlx::postgres::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vidstream_backend::{
    config::Config,
    routes::build_router,
    services::{
        assets::{AssetStore, HttpAssetStore, StaticAssetStore},
        session::{SessionManager, TokenSettings},
    },
    state::AppState,
    store::{PgUserStore, UserStore},
};

fn mask_secret(s: &str) -> String {
    if s.is_empty() {
        return "<empty>".into();
    }
    let prefix = s.chars().take(4).collect::<String>();
    format!("{}*** (len={})", prefix, s.len())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vidstream_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load()?;
    tracing::info!(
        database_url = %config.database_url,
        access_token_secret = %mask_secret(&config.access_token_secret),
        refresh_token_secret = %mask_secret(&config.refresh_token_secret),
        access_token_ttl_minutes = config.access_token_ttl_minutes,
        refresh_token_ttl_days = config.refresh_token_ttl_days,
        cookie_secure = config.cookie_secure,
        "Loaded configuration from environment/.env"
    );

    let pool = PgPool::connect(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store: Arc<dyn UserStore> = Arc::new(PgUserStore::new(pool));
    let assets: Arc<dyn AssetStore> = match config.asset_upload_url.clone() {
        Some(endpoint) => Arc::new(HttpAssetStore::new(endpoint, config.asset_api_key.clone())),
        None => {
            tracing::warn!("ASSET_UPLOAD_URL not set; serving placeholder asset URLs");
            Arc::new(StaticAssetStore::new("https://assets.invalid"))
        }
    };

    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        assets,
        TokenSettings::from_config(&config),
    ));
    let state = AppState::new(sessions, store, config.clone());

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
