//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the claims workflow using SQLx.
//!
//! # Architecture
//!
//! The crate follows the repository pattern: [`repositories`] hold the SQL and
//! row types, [`adapters`] implement the domain ports on top of them.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgClaimStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/claims")).await?;
//! run_migrations(&pool).await?;
//! let store = PgClaimStore::new(pool);
//! ```

pub mod adapters;
pub mod error;
pub mod pool;
pub mod repositories;

pub use adapters::PgClaimStore;
pub use error::DatabaseError;
pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool, DEFAULT_DATABASE_URL};
