use std::net::{IpAddr, SocketAddr};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront_api::{
    config::AppConfig,
    db::{create_orm_conn, run_migrations},
    mail::mailer_from_config,
    routes::build_app,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,storefront_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let orm = create_orm_conn(&config.database_url).await?;
    let applied = run_migrations(&orm, "migrations").await?;
    tracing::info!(count = applied.len(), "migrations checked");

    let addr = SocketAddr::from((config.host.parse::<IpAddr>()?, config.port));
    let mailer = mailer_from_config(&config)?;
    tracing::info!(
        mail_backend = ?config.mail_backend,
        cache_enabled = config.cache_enabled,
        "configuration loaded"
    );
    let app = build_app(AppState::new(orm, config, mailer));

    tracing::info!("listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
