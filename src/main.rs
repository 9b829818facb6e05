use std::{net::SocketAddr, sync::Arc};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use grocery_drive_api::{
    app::build_app,
    config::AppConfig,
    db::{create_orm_conn, create_pool},
    notify::LogNotifier,
    payments::gateway_from_config,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,grocery_drive_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).await?;
    let orm = create_orm_conn(&config.database_url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));
    if config.payments.webhook_secret.is_none() {
        tracing::warn!("STRIPE_WEBHOOK_SECRET is not set, payment webhooks are rejected");
    }
    let state = AppState {
        pool,
        orm,
        payments: gateway_from_config(&config.payments),
        notifier: Arc::new(LogNotifier),
        config: Arc::new(config),
    };

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, build_app(state)).await?;

    Ok(())
}
