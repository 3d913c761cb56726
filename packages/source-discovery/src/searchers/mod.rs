//! Search executor implementations.

mod rate_limited;
mod tavily;

pub use rate_limited::RateLimitedSearcher;
pub use tavily::TavilySearcher;
