//! Shared startup sequence for both daemon binaries: build the
//! connection pool, run migrations unless skipped, and assemble an
//! [`AppState`] over the Postgres-backed repositories.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use memory_activity::{ActivityLedger, PgActivityRepository};
use memory_core::{MemoryCore, MemoryCoreConfig, PgMemoryRepository};
use memory_embeddings::{EmbeddingProvider, MockEmbeddingProvider, RemoteEmbeddingConfig, RemoteEmbeddingProvider};
use memory_envelope::CryptoEnvelope;
use memory_search::HybridSearch;

use crate::auth::{Authenticator, LocalAuthenticator};
use crate::config::AppConfig;
use crate::state::{AppState, HealthCheck, PgHealthCheck};

pub type ProdState = AppState<PgMemoryRepository, PgActivityRepository>;

#[derive(Debug)]
pub enum BootstrapError {
    Pool(sqlx::Error),
    Migration(memory_migrations::MigrationError),
    Envelope(memory_envelope::error::InvalidMasterKey),
}

impl std::fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pool(e) => write!(f, "failed to connect to database: {e}"),
            Self::Migration(e) => write!(f, "migration failed: {e}"),
            Self::Envelope(e) => write!(f, "invalid encryption master key: {e}"),
        }
    }
}

impl std::error::Error for BootstrapError {}

impl From<sqlx::Error> for BootstrapError {
    fn from(e: sqlx::Error) -> Self {
        Self::Pool(e)
    }
}

/// Builds the shared Postgres pool per the configured tuning defaults, builds
/// the crypto envelope if encryption is enabled, runs migrations unless
/// `skip_migrations`, and returns a ready-to-serve [`ProdState`].
pub async fn bootstrap(config: AppConfig, skip_migrations: bool) -> Result<Arc<ProdState>, BootstrapError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.max_idle_conns)
        .max_lifetime(Some(config.database.conn_max_lifetime))
        .idle_timeout(Some(config.database.conn_max_idle_time))
        .connect(&config.database.connection_string())
        .await?;

    let envelope = match &config.encryption.master_key {
        Some(key) if config.encryption.enabled => {
            Some(Arc::new(CryptoEnvelope::from_base64(key).map_err(BootstrapError::Envelope)?))
        }
        _ => None,
    };

    if !skip_migrations {
        let mut runner = memory_migrations::core_runner(pool.clone(), envelope.clone());
        runner.run().await.map_err(BootstrapError::Migration)?;
    }

    let memories = Arc::new(PgMemoryRepository::new(pool.clone()));
    let activity_repo = Arc::new(PgActivityRepository::new(pool.clone()));

    let embeddings: Arc<dyn EmbeddingProvider> = match &config.embedding.api_key {
        Some(key) => {
            let mut remote_cfg = RemoteEmbeddingConfig::new(key.clone());
            remote_cfg.model = config.embedding.model.clone();
            remote_cfg.max_retries = config.embedding.max_retries;
            remote_cfg.call_deadline = config.embedding.timeout.max(memory_embeddings::MIN_CALL_DEADLINE);
            let provider = RemoteEmbeddingProvider::new(remote_cfg);
            provider.validate_key().await;
            Arc::new(provider)
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, falling back to the deterministic mock embedding provider");
            Arc::new(MockEmbeddingProvider::new())
        }
    };

    let core_config = MemoryCoreConfig {
        max_memories: config.memory.max_memories,
        ..MemoryCoreConfig::default()
    };
    let core = MemoryCore::new(memories.clone(), embeddings.clone(), envelope.clone(), core_config);
    let search = HybridSearch::new(memories.clone(), Some(embeddings), envelope);
    let local_offset = chrono::FixedOffset::east_opt(config.local_utc_offset_minutes * 60)
        .unwrap_or_else(|| chrono::FixedOffset::east_opt(0).unwrap());
    let activity = ActivityLedger::new(activity_repo, memories, local_offset);

    let authenticator: Arc<dyn Authenticator> = Arc::new(LocalAuthenticator);
    let health: Arc<dyn HealthCheck> = Arc::new(PgHealthCheck::new(pool));

    Ok(Arc::new(AppState {
        core,
        search,
        activity,
        authenticator,
        health,
        config,
        started_at: chrono::Utc::now(),
    }))
}
