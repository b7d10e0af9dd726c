use actix_web::{middleware, web, App, HttpServer};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use boutique_mall::api::configure_api;
use boutique_mall::config::LogFormat;
use boutique_mall::metrics::configure_observability;
use boutique_mall::{seed, MallConfig, MallServices};

fn init_tracing(config: &MallConfig) {
    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    match config.log_format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_target(true).with_thread_ids(true))
            .with(filter)
            .init(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = MallConfig::load()?;
    init_tracing(&config);

    tracing::info!("🚀 Starting boutique mall");

    // === 1. Wire services ===
    let services = MallServices::build(&config)?;
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        services.metrics.registry().gather().len()
    );

    // === 2. Optional demo data ===
    if config.seed_demo {
        let products = seed::seed_demo(&services).await?;
        tracing::info!(products, "🌱 Demo tokens: demo-client, demo-kente, demo-bogolan, demo-admin");
    }

    // === 3. Outbox relay ===
    let relay_task = services.relay.clone().spawn(config.relay_interval());

    // === 4. HTTP server ===
    let metrics = services.metrics.clone();
    let health = services.health.clone();
    let services = web::Data::new(services);

    let addr = config.socket_addr();
    tracing::info!(%addr, "🌐 HTTP server listening (API under /api, /metrics, /health)");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(services.clone())
            .app_data(web::Data::new(metrics.clone()))
            .app_data(web::Data::new(health.clone()))
            .configure(configure_api)
            .configure(configure_observability)
    })
    .bind(&addr)?
    .run()
    .await?;

    relay_task.abort();
    tracing::info!("👋 Boutique mall stopped");

    Ok(())
}
