//! HTTP surface for the CRM analytics resources.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
