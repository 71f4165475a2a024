//! Infrastructure module for external services.
//!
//! This module contains the task repositories, the session verifiers, and
//! the factory that selects between them at start-up.

pub mod factory;
pub mod in_memory;
pub mod postgres;
pub mod repository;
pub mod session;
pub mod timeout;

pub use factory::{
    ConfigurationError, FactoryError, Infrastructure, InfrastructureConfig, InfrastructureFactory,
    SessionMode, StorageMode,
};
pub use in_memory::InMemoryTaskRepository;
pub use postgres::PostgresTaskRepository;
pub use repository::{RepositoryError, TaskRepository};
pub use session::{
    CredentialSource, Credentials, PostgresSessionVerifier, Session, SessionError,
    SessionVerifier, StaticTokenVerifier, TokenTableError,
};
pub use timeout::{TimeoutSessionVerifier, TimeoutTaskRepository};
