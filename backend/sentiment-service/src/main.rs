use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Result;
use sentiment_service::{handlers, provision, AppState, Config, PostFetcher, XApiClient};
use std::sync::Arc;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[actix_web::main]
async fn main() -> Result<()> {
    // Load .env first so RUST_LOG from it reaches the filter
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sentiment_service=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting sentiment-service v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        anyhow::anyhow!("Configuration error: {}", e)
    })?;
    config.log_config();

    // Model failures are not fatal; handlers report the model as unavailable
    tracing::info!("Loading sentiment model...");
    let model = provision(config.model_source()).await;

    let fetcher: Arc<dyn PostFetcher> = Arc::new(XApiClient::from_config(&config)?);

    let state = web::Data::new(
        AppState::new(model, fetcher)
            .with_default_trending_limit(config.trending_default_limit)
            .with_frontend_dir(config.frontend_dir.clone()),
    );

    let bind_address = config.bind_address();
    tracing::info!("Starting HTTP server on {}", bind_address);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(|cfg| handlers::configure(cfg, state.clone()))
    })
    .bind(&bind_address)?
    .run()
    .await?;

    tracing::info!("sentiment-service shut down");
    Ok(())
}
