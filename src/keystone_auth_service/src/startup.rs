use std::{net::SocketAddr, sync::Arc};

use keystone_adapters::{
    HttpMessageBus, InMemoryDatabase, PostgresOutboxStore, PostgresTransactionManager,
    PostgresUserStore, PrometheusMetrics, StaticSecretProvider,
    config::{ConfigError, DatabaseSettings, KeystoneSettings},
};
use keystone_application::{
    AuthApi, AuthOrchestrator, ConfirmLinkBuilder, OutboxDispatcher, OutboxPublisher,
    TokenIssuer, TransactionCoordinator,
};
use keystone_core::{MessageBusError, MetricsSink, OutboxStore, TransactionManager};
use secrecy::ExposeSecret;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::{net::TcpListener, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::AuthService;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Message bus error: {0}")]
    MessageBus(#[from] MessageBusError),
    #[error("Failed to bind listener: {0}")]
    Io(#[from] std::io::Error),
}

/// A bound HTTP listener plus the outbox dispatcher running beside it, when
/// a webhook is configured.
pub struct Application {
    address: SocketAddr,
    listener: TcpListener,
    service: AuthService,
    allowed_origins: Vec<String>,
    dispatcher: Option<JoinHandle<()>>,
    metrics: PrometheusMetrics,
    shutdown: CancellationToken,
}

impl Application {
    /// Connect to Postgres, run migrations and wire the service over it.
    pub async fn build(settings: KeystoneSettings) -> Result<Self, StartupError> {
        let pool = configure_postgresql(&settings.database).await?;
        let attempts = settings.database.max_transaction_attempts;
        let metrics = PrometheusMetrics::new();
        let shutdown = CancellationToken::new();

        let auth = AuthOrchestrator::new(
            TransactionCoordinator::new(PostgresTransactionManager::new(pool.clone()))
                .with_max_attempts(attempts),
            PostgresUserStore::new(pool.clone()),
            OutboxPublisher::new(PostgresOutboxStore::new(pool.clone())),
            TokenIssuer::new(
                settings.token_policy(),
                StaticSecretProvider::new(settings.tokens.signing_key.clone()),
            ),
            ConfirmLinkBuilder::new(settings.application.base_url.clone()),
            Arc::new(metrics.clone()),
        );

        let dispatcher = spawn_dispatcher(
            &settings,
            TransactionCoordinator::new(PostgresTransactionManager::new(pool.clone()))
                .with_max_attempts(attempts),
            PostgresOutboxStore::new(pool),
            Arc::new(metrics.clone()),
            shutdown.clone(),
        )?;

        Self::assemble(&settings, Arc::new(auth), dispatcher, metrics, shutdown).await
    }

    /// Wire the service over an in-memory database shared with the caller.
    pub async fn in_memory(
        settings: KeystoneSettings,
        db: InMemoryDatabase,
    ) -> Result<Self, StartupError> {
        let attempts = settings.database.max_transaction_attempts;
        let metrics = PrometheusMetrics::new();
        let shutdown = CancellationToken::new();

        let auth = AuthOrchestrator::new(
            TransactionCoordinator::new(db.clone()).with_max_attempts(attempts),
            db.user_store(),
            OutboxPublisher::new(db.outbox_store()),
            TokenIssuer::new(
                settings.token_policy(),
                StaticSecretProvider::new(settings.tokens.signing_key.clone()),
            ),
            ConfirmLinkBuilder::new(settings.application.base_url.clone()),
            Arc::new(metrics.clone()),
        );

        let dispatcher = spawn_dispatcher(
            &settings,
            TransactionCoordinator::new(db.clone()).with_max_attempts(attempts),
            db.outbox_store(),
            Arc::new(metrics.clone()),
            shutdown.clone(),
        )?;

        Self::assemble(&settings, Arc::new(auth), dispatcher, metrics, shutdown).await
    }

    async fn assemble<A: AuthApi>(
        settings: &KeystoneSettings,
        api: Arc<A>,
        dispatcher: Option<JoinHandle<()>>,
        metrics: PrometheusMetrics,
        shutdown: CancellationToken,
    ) -> Result<Self, StartupError> {
        let listener = match bind(settings).await {
            Ok(listener) => listener,
            Err(e) => {
                shutdown.cancel();
                return Err(e);
            }
        };
        let address = listener.local_addr()?;

        Ok(Self {
            address,
            listener,
            service: AuthService::new(api, metrics.clone()),
            allowed_origins: settings.application.allowed_origins.clone(),
            dispatcher,
            metrics,
            shutdown,
        })
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn metrics(&self) -> &PrometheusMetrics {
        &self.metrics
    }

    /// Cancelling this token stops the server and the dispatcher.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Serve until the shutdown token is cancelled, then wait for the
    /// dispatcher to finish its current pass.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        let allowed_origins = if self.allowed_origins.is_empty() {
            None
        } else {
            Some(self.allowed_origins)
        };

        let served = self
            .service
            .run_standalone(self.listener, allowed_origins, self.shutdown.clone())
            .await;

        self.shutdown.cancel();
        if let Some(dispatcher) = self.dispatcher {
            if let Err(e) = dispatcher.await {
                tracing::error!(error = %e, "Outbox dispatcher task failed");
            }
        }

        served
    }
}

async fn bind(settings: &KeystoneSettings) -> Result<TcpListener, StartupError> {
    Ok(TcpListener::bind(settings.address()?).await?)
}

#[tracing::instrument(name = "Configure PostgreSQL", skip_all)]
pub async fn configure_postgresql(settings: &DatabaseSettings) -> Result<PgPool, StartupError> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .connect(settings.url.expose_secret())
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Start the dispatcher against the configured webhook.
///
/// Without a webhook nothing is dispatched: rows stay pending in the outbox
/// until a service with a webhook picks them up.
fn spawn_dispatcher<M, O>(
    settings: &KeystoneSettings,
    coordinator: TransactionCoordinator<M>,
    outbox: O,
    metrics: Arc<dyn MetricsSink>,
    shutdown: CancellationToken,
) -> Result<Option<JoinHandle<()>>, StartupError>
where
    M: TransactionManager + 'static,
    O: OutboxStore<Handle = M::Handle> + 'static,
{
    let dispatcher_settings = settings.dispatcher_settings();

    let Some(url) = &settings.outbox.webhook_url else {
        tracing::warn!("No outbox webhook configured, outbox messages stay pending");
        return Ok(None);
    };

    let bus = HttpMessageBus::with_timeout(url.clone(), settings.webhook_timeout())?;
    tracing::info!(webhook = %url, "Dispatching outbox to webhook");
    let handle = OutboxDispatcher::new(coordinator, outbox, bus, dispatcher_settings, metrics)
        .start(shutdown);

    Ok(Some(handle))
}
