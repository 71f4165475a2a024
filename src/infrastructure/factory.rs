//! Infrastructure factory for runtime backend selection.
//!
//! Builds the task repository and the session verifier once at process
//! start from environment configuration. The resulting handles are shared
//! read-only with every request.
//!
//! # Environment Variables
//!
//! - `STORAGE_MODE`: `in_memory` (default) | `postgres`
//! - `SESSION_MODE`: `static` (default) | `postgres`
//! - `DATABASE_URL`: `PostgreSQL` connection URL (required when either mode is `postgres`)
//! - `SESSION_TOKENS`: `token=user_id[:name[:email]]` entries, comma separated
//! - `STORAGE_TIMEOUT_MS`: deadline for each storage call and session lookup (default: 5000)
//!
//! # Example
//!
//! ```ignore
//! let config = InfrastructureConfig::from_env()?;
//! let infrastructure = InfrastructureFactory::new(config).create().await?;
//! ```

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use super::{
    InMemoryTaskRepository, PostgresSessionVerifier, PostgresTaskRepository, SessionVerifier,
    StaticTokenVerifier, TaskRepository, TimeoutSessionVerifier, TimeoutTaskRepository,
    TokenTableError,
};

/// Default deadline for a single storage call.
pub const DEFAULT_STORAGE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Upper bound on pooled connections.
const MAX_POOL_CONNECTIONS: u32 = 15;

/// Connections older than this are closed and replaced.
const CONNECTION_MAX_LIFETIME: Duration = Duration::from_secs(300);

// =============================================================================
// Configuration Types
// =============================================================================

/// Storage backend for tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Process-local storage. Data is lost on restart.
    #[default]
    InMemory,
    /// `PostgreSQL` storage for production use.
    Postgres,
}

impl FromStr for StorageMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "in_memory" | "inmemory" | "memory" => Ok(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidStorageMode(value.to_string())),
        }
    }
}

/// Source of session verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Fixed token table from `SESSION_TOKENS`.
    #[default]
    Static,
    /// Identity provider tables in `PostgreSQL`.
    Postgres,
}

impl FromStr for SessionMode {
    type Err = ConfigurationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            _ => Err(ConfigurationError::InvalidSessionMode(value.to_string())),
        }
    }
}

/// Configuration for the infrastructure factory.
#[derive(Debug, Clone)]
pub struct InfrastructureConfig {
    /// Task storage backend.
    pub storage_mode: StorageMode,
    /// Session verification backend.
    pub session_mode: SessionMode,
    /// `PostgreSQL` connection URL.
    pub database_url: Option<String>,
    /// Token table used when `session_mode` is `Static`.
    pub session_tokens: StaticTokenVerifier,
    /// Deadline for each storage call.
    pub storage_timeout: Duration,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::default(),
            session_mode: SessionMode::default(),
            database_url: None,
            session_tokens: StaticTokenVerifier::new(),
            storage_timeout: DEFAULT_STORAGE_TIMEOUT,
        }
    }
}

/// Reads a variable, treating absent, empty and whitespace-only as `None`.
fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

impl InfrastructureConfig {
    /// Creates a configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError` if a value cannot be parsed or a required
    /// URL is missing for the selected modes.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let storage_mode = non_empty_var("STORAGE_MODE")
            .map(|value| value.parse::<StorageMode>())
            .transpose()?
            .unwrap_or_default();

        let session_mode = non_empty_var("SESSION_MODE")
            .map(|value| value.parse::<SessionMode>())
            .transpose()?
            .unwrap_or_default();

        let session_tokens = non_empty_var("SESSION_TOKENS")
            .map(|value| value.parse::<StaticTokenVerifier>())
            .transpose()?
            .unwrap_or_default();

        let storage_timeout = non_empty_var("STORAGE_TIMEOUT_MS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|millis| *millis > 0)
                    .map(Duration::from_millis)
                    .ok_or(ConfigurationError::InvalidStorageTimeout(value))
            })
            .transpose()?
            .unwrap_or(DEFAULT_STORAGE_TIMEOUT);

        let config = Self {
            storage_mode,
            session_mode,
            database_url: non_empty_var("DATABASE_URL"),
            session_tokens,
            storage_timeout,
        };

        config.validate()?;
        Ok(config)
    }

    /// Returns `true` if any backend needs a database connection.
    #[must_use]
    pub fn needs_database(&self) -> bool {
        self.storage_mode == StorageMode::Postgres || self.session_mode == SessionMode::Postgres
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingDatabaseUrl` if a `PostgreSQL`
    /// backend is selected without `DATABASE_URL`.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.needs_database() && self.database_url.is_none() {
            return Err(ConfigurationError::MissingDatabaseUrl);
        }
        Ok(())
    }
}

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while reading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// Invalid storage mode value.
    #[error("Invalid storage mode: '{0}'. Expected 'in_memory' or 'postgres'")]
    InvalidStorageMode(String),

    /// Invalid session mode value.
    #[error("Invalid session mode: '{0}'. Expected 'static' or 'postgres'")]
    InvalidSessionMode(String),

    /// Invalid storage timeout value.
    #[error("Invalid STORAGE_TIMEOUT_MS: '{0}'. Expected a positive number of milliseconds")]
    InvalidStorageTimeout(String),

    /// Malformed `SESSION_TOKENS`.
    #[error(transparent)]
    InvalidSessionTokens(#[from] TokenTableError),

    /// Missing `DATABASE_URL` when a `PostgreSQL` backend is selected.
    #[error("DATABASE_URL environment variable is required when STORAGE_MODE or SESSION_MODE is postgres")]
    MissingDatabaseUrl,
}

/// Errors that can occur during factory initialization.
#[derive(Debug, Error)]
pub enum FactoryError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    DatabaseConnection(String),

    /// Schema migration error.
    #[error("Database migration error: {0}")]
    Migration(String),
}

// =============================================================================
// Factory
// =============================================================================

/// Initialized infrastructure handles.
#[derive(Clone)]
pub struct Infrastructure {
    /// Task repository, already bounded by the storage timeout.
    pub task_repository: Arc<dyn TaskRepository + Send + Sync>,
    /// Session verifier, bounded by the same timeout.
    pub session_verifier: Arc<dyn SessionVerifier + Send + Sync>,
}

impl std::fmt::Debug for Infrastructure {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Infrastructure")
            .field("task_repository", &"Arc<dyn TaskRepository>")
            .field("session_verifier", &"Arc<dyn SessionVerifier>")
            .finish()
    }
}

/// Factory for creating infrastructure handles from configuration.
#[derive(Debug, Clone)]
pub struct InfrastructureFactory {
    config: InfrastructureConfig,
}

impl InfrastructureFactory {
    /// Creates a new factory with the given configuration.
    #[must_use]
    pub const fn new(config: InfrastructureConfig) -> Self {
        Self { config }
    }

    /// Creates the repository and verifier for the configured modes.
    ///
    /// # Errors
    ///
    /// Returns `FactoryError` if the configuration is invalid, the database
    /// cannot be reached, or migrations fail.
    pub async fn create(&self) -> Result<Infrastructure, FactoryError> {
        self.config.validate()?;

        let pool = if self.config.needs_database() {
            Some(self.create_postgres_pool().await?)
        } else {
            None
        };

        let task_repository: Arc<dyn TaskRepository + Send + Sync> =
            match (self.config.storage_mode, &pool) {
                (StorageMode::Postgres, Some(pool)) => {
                    sqlx::migrate!("./migrations")
                        .run(pool)
                        .await
                        .map_err(|error| FactoryError::Migration(error.to_string()))?;
                    tracing::info!("Task schema is up to date");
                    Arc::new(PostgresTaskRepository::new(pool.clone()))
                }
                _ => Arc::new(InMemoryTaskRepository::new()),
            };

        let session_verifier: Arc<dyn SessionVerifier + Send + Sync> =
            match (self.config.session_mode, pool) {
                (SessionMode::Postgres, Some(pool)) => {
                    Arc::new(PostgresSessionVerifier::new(pool))
                }
                _ => {
                    if self.config.session_tokens.is_empty() {
                        tracing::warn!(
                            "No session tokens configured; every request will be rejected"
                        );
                    }
                    Arc::new(self.config.session_tokens.clone())
                }
            };

        Ok(Infrastructure {
            task_repository: Arc::new(TimeoutTaskRepository::new(
                task_repository,
                self.config.storage_timeout,
            )),
            session_verifier: Arc::new(TimeoutSessionVerifier::new(
                session_verifier,
                self.config.storage_timeout,
            )),
        })
    }

    /// Creates a `PostgreSQL` connection pool.
    async fn create_postgres_pool(&self) -> Result<PgPool, FactoryError> {
        let database_url = self
            .config
            .database_url
            .as_ref()
            .ok_or(ConfigurationError::MissingDatabaseUrl)?;

        PgPoolOptions::new()
            .max_connections(MAX_POOL_CONNECTIONS)
            .max_lifetime(CONNECTION_MAX_LIFETIME)
            .acquire_timeout(self.config.storage_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await
            .map_err(|error| FactoryError::DatabaseConnection(error.to_string()))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewTask, OwnerId};
    use crate::infrastructure::{CredentialSource, Credentials, Session};
    use rstest::rstest;

    #[rstest]
    #[case("in_memory", StorageMode::InMemory)]
    #[case("memory", StorageMode::InMemory)]
    #[case("POSTGRES", StorageMode::Postgres)]
    #[case("pg", StorageMode::Postgres)]
    fn test_storage_mode_from_str(#[case] input: &str, #[case] expected: StorageMode) {
        assert_eq!(input.parse::<StorageMode>().unwrap(), expected);
    }

    #[rstest]
    fn test_storage_mode_invalid() {
        assert_eq!(
            "sqlite".parse::<StorageMode>(),
            Err(ConfigurationError::InvalidStorageMode("sqlite".to_string()))
        );
    }

    #[rstest]
    #[case("static", SessionMode::Static)]
    #[case("postgresql", SessionMode::Postgres)]
    fn test_session_mode_from_str(#[case] input: &str, #[case] expected: SessionMode) {
        assert_eq!(input.parse::<SessionMode>().unwrap(), expected);
    }

    #[rstest]
    fn test_validate_requires_database_url() {
        let config = InfrastructureConfig {
            session_mode: SessionMode::Postgres,
            ..InfrastructureConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigurationError::MissingDatabaseUrl));

        let config = InfrastructureConfig {
            storage_mode: StorageMode::Postgres,
            database_url: Some("postgres://localhost/tasks".to_string()),
            ..InfrastructureConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[rstest]
    fn test_default_config_is_in_memory() {
        let config = InfrastructureConfig::default();
        assert_eq!(config.storage_mode, StorageMode::InMemory);
        assert_eq!(config.session_mode, SessionMode::Static);
        assert!(!config.needs_database());
        assert_eq!(config.storage_timeout, DEFAULT_STORAGE_TIMEOUT);
    }

    #[rstest]
    #[tokio::test]
    async fn test_create_in_memory_infrastructure() {
        let factory = InfrastructureFactory::new(InfrastructureConfig::default());
        let infrastructure = factory.create().await.unwrap();
        let owner = OwnerId::new("alice");

        let task = infrastructure
            .task_repository
            .insert(&owner, NewTask::new("Buy milk", None))
            .await
            .unwrap();

        assert_eq!(
            infrastructure.task_repository.list(&owner).await.unwrap(),
            vec![task]
        );

        let session = infrastructure
            .session_verifier
            .verify(Some(Credentials::new("unknown", CredentialSource::Bearer)))
            .await
            .unwrap();
        assert_eq!(session, Session::Anonymous);
    }
}
