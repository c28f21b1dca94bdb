//! Outbound adapters implementing the driven lead ports.
//!
//! - **persistence**: PostgreSQL repositories using Diesel
//! - **memory**: process-local repositories for development and tests
//! - **facebook**: Graph API client for lead-ads submissions
//!
//! Adapters translate between domain types and infrastructure
//! representations. They contain no business logic.

pub mod facebook;
pub mod memory;
pub mod persistence;
