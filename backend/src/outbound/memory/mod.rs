//! Process-local adapters for the driven lead ports.
//!
//! The server falls back to these when no database URL is configured, and
//! behaviour tests run the real services against them. State lives behind
//! `tokio` mutexes and is lost on restart.

mod history_log;
mod lead_counter;
mod lead_store;
mod staff_roster;
mod sync_state;

pub use history_log::InMemoryLeadHistory;
pub use lead_counter::InMemoryLeadSequence;
pub use lead_store::InMemoryLeadRepository;
pub use staff_roster::InMemoryStaffDirectory;
pub use sync_state::{InMemoryLeadSyncState, StoredLeadForm};
