//! PostgreSQL persistence adapters for the lead ports.
//!
//! Repositories are thin translators between Diesel rows (`models.rs`,
//! `schema.rs`, both private) and domain types. Connections come from a
//! `bb8` pool of `diesel-async` connections, and every Diesel or pool
//! failure is mapped onto the port's own error enum.
//!
//! ```ignore
//! use leads_backend::outbound::persistence::{DbPool, DieselLeadRepository, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/leads")).await?;
//! let leads = DieselLeadRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_lead_history_repository;
mod diesel_lead_repository;
mod diesel_lead_sequence;
mod diesel_lead_sync_state_repository;
mod diesel_staff_directory;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_lead_history_repository::DieselLeadHistoryRepository;
pub use diesel_lead_repository::DieselLeadRepository;
pub use diesel_lead_sequence::DieselLeadSequence;
pub use diesel_lead_sync_state_repository::DieselLeadSyncStateRepository;
pub use diesel_staff_directory::DieselStaffDirectory;
pub use migrations::{MIGRATIONS, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
