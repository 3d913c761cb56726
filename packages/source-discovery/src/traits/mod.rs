//! Collaborator boundaries consumed by the discovery pipeline.

pub mod fetcher;
pub mod generator;
pub mod metadata;
pub mod searcher;
