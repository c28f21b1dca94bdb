//! HTTP inbound adapter exposing REST endpoints.

pub mod admin;
pub mod caller;
pub mod error;
pub mod health;
pub mod integrations;
pub mod leads;
mod leads_dto;
pub mod schemas;
pub mod state;
pub mod team;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;
