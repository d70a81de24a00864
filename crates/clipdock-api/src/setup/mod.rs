//! Application wiring: database, storage, services, background consumer,
//! and the router.

pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::postgres::PgPoolOptions;

use clipdock_core::Config;
use clipdock_db::{PgVideoRequestRepository, VideoRequestRepository, MIGRATOR};
use clipdock_services::{
    HttpProcessingDispatcher, LogNotifier, NoopDispatcher, Notifier, ProcessingDispatcher,
    ResultIngestService, UpdateProcessingStatus, WebhookNotifier,
};
use clipdock_storage::build_storage;
use clipdock_worker::{ResultConsumer, ResultConsumerConfig, SqsResultInbox};

use crate::state::AppState;

const WORKER_DISPATCH_TIMEOUT_SECS: u64 = 10;

pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, Router)> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let repository: Arc<dyn VideoRequestRepository> =
        Arc::new(PgVideoRequestRepository::new(pool));

    let storage = build_storage(&config)
        .await
        .context("Failed to initialize storage backend")?;

    let notifier: Arc<dyn Notifier> = match &config.notify_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(
            url.clone(),
            Duration::from_secs(config.notify_timeout_secs),
        )?),
        None => Arc::new(LogNotifier),
    };

    let dispatcher: Arc<dyn ProcessingDispatcher> = match &config.worker_endpoint {
        Some(endpoint) => Arc::new(HttpProcessingDispatcher::new(
            endpoint.clone(),
            Duration::from_secs(WORKER_DISPATCH_TIMEOUT_SECS),
        )?),
        None => Arc::new(NoopDispatcher),
    };

    let update_status =
        UpdateProcessingStatus::new(repository.clone(), notifier, dispatcher);

    // Background result consumer, enabled when a queue is configured.
    if let Some(queue_url) = config.result_queue_url.clone() {
        let inbox = Arc::new(SqsResultInbox::from_env(queue_url).await);
        let ingest = ResultIngestService::new(storage.clone(), update_status.clone());
        let consumer = ResultConsumer::new(
            inbox,
            ingest,
            ResultConsumerConfig {
                max_in_flight: config.max_in_flight_results,
                wait_time: Duration::from_secs(config.result_queue_wait_secs.max(0) as u64),
                batch_size: 10,
            },
        );
        tokio::spawn(consumer.run());
    } else {
        tracing::info!("RESULT_QUEUE_URL not set; result consumer disabled");
    }

    let state = Arc::new(AppState {
        config,
        repository,
        storage,
        update_status,
    });

    let router = routes::build_router(state.clone());
    Ok((state, router))
}
