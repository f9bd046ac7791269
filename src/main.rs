//! notarobot server binary.
//!
//! Loads configuration, connects the adapters, and serves the API.

use std::sync::Arc;

use secrecy::Secret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use notarobot::adapters::ai::{
    AnthropicVisionAdapter, AnthropicVisionConfig, GroqConfig, GroqTextAdapter,
};
use notarobot::adapters::alert::{LogAlertNotifier, WebhookAlertNotifier};
use notarobot::adapters::auth::SupabaseJwtVerifier;
use notarobot::adapters::http::{app_router, AppState};
use notarobot::adapters::postgres::{
    PostgresEntitlementStore, PostgresResultStore, PostgresWebhookEventRepository,
};
use notarobot::adapters::stripe::{StripeCheckoutAdapter, StripeCheckoutConfig};
use notarobot::application::handlers::analysis::AnalysisService;
use notarobot::application::handlers::billing::{
    CheckoutCompletedHandler, CheckoutService, InvoicePaidHandler, SubscriptionDeletedHandler,
};
use notarobot::config::AppConfig;
use notarobot::domain::billing::{HandlerRegistry, StripeWebhookVerifier, WebhookProcessor};
use notarobot::ports::{AlertNotifier, EntitlementStore, TokenVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(&config.server.log_level)
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        environment = ?config.server.environment,
        stripe_test_mode = config.payment.is_test_mode(),
        "Starting notarobot"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let entitlements: Arc<dyn EntitlementStore> =
        Arc::new(PostgresEntitlementStore::new(pool.clone()));
    let results = Arc::new(PostgresResultStore::new(pool.clone()));
    let webhook_events = Arc::new(PostgresWebhookEventRepository::new(pool.clone()));

    let alerts: Arc<dyn AlertNotifier> = match &config.alert.webhook_url {
        Some(url) if !url.is_empty() => Arc::new(WebhookAlertNotifier::new(url.clone())),
        _ => Arc::new(LogAlertNotifier),
    };

    let text_analyzer = Arc::new(GroqTextAdapter::new(
        GroqConfig::new(config.ai.groq_api_key.clone())
            .with_model(config.ai.groq_model.clone())
            .with_base_url(config.ai.groq_base_url.clone())
            .with_timeout(config.ai.timeout()),
    ));
    let vision_analyzer = Arc::new(AnthropicVisionAdapter::new(
        AnthropicVisionConfig::new(config.ai.anthropic_api_key.clone())
            .with_model(config.ai.anthropic_model.clone())
            .with_base_url(config.ai.anthropic_base_url.clone())
            .with_timeout(config.ai.timeout()),
    ));

    let analysis = Arc::new(AnalysisService::new(
        entitlements.clone(),
        text_analyzer,
        vision_analyzer,
        results,
        alerts,
    ));

    let gateway = Arc::new(StripeCheckoutAdapter::new(
        StripeCheckoutConfig::new(
            config.payment.stripe_api_key.clone(),
            config.payment.stripe_pro_price_id.clone(),
            config.payment.stripe_enterprise_price_id.clone(),
        )
        .with_base_url(config.payment.stripe_base_url.clone()),
    ));
    let checkout = Arc::new(CheckoutService::new(
        gateway,
        config.payment.default_return_url.clone(),
    ));

    let registry = HandlerRegistry::new()
        .register(Arc::new(CheckoutCompletedHandler::new(entitlements.clone())))
        .register(Arc::new(InvoicePaidHandler::new(entitlements.clone())))
        .register(Arc::new(SubscriptionDeletedHandler::new(
            entitlements.clone(),
        )));
    let webhook_processor = Arc::new(WebhookProcessor::new(webhook_events, registry));
    let webhook_verifier = Arc::new(StripeWebhookVerifier::new(
        config.payment.stripe_webhook_secret.clone(),
    ));

    let token_verifier: Arc<dyn TokenVerifier> = Arc::new(SupabaseJwtVerifier::new(
        Secret::new(config.auth.jwt_secret.clone()),
        &config.auth.audience,
    ));

    let state = AppState {
        analysis,
        checkout,
        webhook_verifier,
        webhook_processor,
        entitlements,
        token_verifier,
    };

    let app = app_router(state, &config.server);

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received");
}
