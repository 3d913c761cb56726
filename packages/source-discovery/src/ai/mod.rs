//! Structured-generation support: strict response schemas and the
//! optional OpenAI generator.

pub mod schema;

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAIGenerator;

pub use schema::strict_schema;
