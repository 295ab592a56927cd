//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Repositories are thin translators between Diesel rows and domain types;
//! validation and business rules stay in the domain services. Connections
//! come from a shared `bb8` pool driven by `diesel-async`, and every Diesel
//! failure is classified once in `diesel_error_mapping` before being turned
//! into the relevant port error.
//!
//! ```ignore
//! use helpdesk::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/helpdesk")).await?;
//! let users = DieselUserRepository::new(pool.clone());
//! ```

mod diesel_error_mapping;
mod diesel_lookup_repository;
mod diesel_ticket_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_lookup_repository::DieselLookupRepository;
pub use diesel_ticket_repository::DieselTicketRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
