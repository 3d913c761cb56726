//! Data types for source discovery.

pub mod config;
pub mod query;
pub mod race;
pub mod source;
