//! Retrying decorator over any [`DistanceProvider`] or [`Geocode`].
//!
//! Failed calls are retried with linear backoff (`initial_backoff * attempt`).
//! "Unavailable" answers are returned immediately and never retried.

use std::fmt;
use std::thread;
use std::time::Duration;

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::traits::{DistanceProvider, Geocode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    /// Wait before the first retry; the n-th retry waits n times this.
    pub initial_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(300),
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.initial_backoff.saturating_mul(attempt)
    }

    /// Upper bound on time spent sleeping for one call.
    pub fn max_total_backoff(&self) -> Duration {
        (1..=self.max_retries).map(|attempt| self.backoff_for(attempt)).sum()
    }
}

type Sleeper = Box<dyn Fn(Duration) + Send + Sync>;

pub struct RetryingProvider<P> {
    inner: P,
    config: RetryConfig,
    sleep: Sleeper,
}

impl<P: fmt::Debug> fmt::Debug for RetryingProvider<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryingProvider")
            .field("inner", &self.inner)
            .field("config", &self.config)
            .finish()
    }
}

impl<P> RetryingProvider<P> {
    pub fn new(inner: P, config: RetryConfig) -> Self {
        Self {
            inner,
            config,
            sleep: Box::new(thread::sleep),
        }
    }

    /// Replaces the blocking sleep, e.g. to observe the backoff schedule.
    pub fn with_sleeper<F>(mut self, sleep: F) -> Self
    where
        F: Fn(Duration) + Send + Sync + 'static,
    {
        self.sleep = Box::new(sleep);
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    fn with_retry<T, F>(&self, operation: &str, call: F) -> Result<T, ProviderError>
    where
        F: Fn() -> Result<T, ProviderError>,
    {
        let mut attempt = 0;
        loop {
            match call() {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.config.backoff_for(attempt);
                    tracing::warn!(
                        operation,
                        attempt,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "provider call failed, retrying"
                    );
                    (self.sleep)(delay);
                }
                Err(err) => {
                    tracing::warn!(operation, attempts = attempt + 1, error = %err, "provider call failed, giving up");
                    return Err(err);
                }
            }
        }
    }
}

impl<P: DistanceProvider> DistanceProvider for RetryingProvider<P> {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        self.with_retry("distance_km", || self.inner.distance_km(from, to))
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        self.with_retry("total_route_distance_km", || self.inner.total_route_distance_km(path))
    }
}

impl<P: Geocode> Geocode for RetryingProvider<P> {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        self.with_retry("geocode", || self.inner.geocode(address))
    }
}
