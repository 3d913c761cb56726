//! Rate-limited search wrapper.
//!
//! Wraps any [`SearchExecutor`] so concurrent query fan-out stays inside a
//! provider's request quota.

use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::error::Result;
use crate::traits::searcher::SearchExecutor;
use crate::types::{query::SearchQuery, source::Source};

type DirectRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// A search executor that waits for a quota permit before every query.
pub struct RateLimitedSearcher<S: SearchExecutor> {
    inner: S,
    limiter: Arc<DirectRateLimiter>,
}

fn non_zero(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN)
}

impl<S: SearchExecutor> RateLimitedSearcher<S> {
    /// Allow `requests_per_second` sustained (minimum 1).
    pub fn new(searcher: S, requests_per_second: u32) -> Self {
        Self::with_quota(searcher, Quota::per_second(non_zero(requests_per_second)))
    }

    /// Allow bursts of up to `burst` queries on top of the sustained rate.
    pub fn with_burst(searcher: S, requests_per_second: u32, burst: u32) -> Self {
        let quota = Quota::per_second(non_zero(requests_per_second)).allow_burst(non_zero(burst));
        Self::with_quota(searcher, quota)
    }

    pub fn with_quota(searcher: S, quota: Quota) -> Self {
        Self {
            inner: searcher,
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SearchExecutor> SearchExecutor for RateLimitedSearcher<S> {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Source>> {
        self.limiter.until_ready().await;
        self.inner.search(query).await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
