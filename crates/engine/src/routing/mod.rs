mod osrm;

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use gosafe_common::config::{RetryConfig, RoutingConfig};
use gosafe_common::types::Coordinate;

use crate::circuit_breaker::CircuitBreaker;

pub use osrm::{decode_route, route_url};

/// Errors from route fetching. Both are surfaced to the user once.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    #[error("No route found")]
    NotFound,

    #[error("Routing network error: {0}")]
    Network(String),
}

impl From<RouteError> for gosafe_common::GoSafeError {
    fn from(e: RouteError) -> Self {
        match e {
            RouteError::NotFound => gosafe_common::GoSafeError::RouteNotFound,
            RouteError::Network(msg) => gosafe_common::GoSafeError::Network(msg),
        }
    }
}

/// Fetches a driving path between two coordinates.
///
/// Object-safe for `Arc<dyn RouteFetcher>`; tests substitute scripted fetchers.
pub trait RouteFetcher: Send + Sync {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Coordinate>, RouteError>> + Send + '_>>;
}

/// Left unused at the end of the budget so a final failure is recorded
/// before a caller's timeout of the same length fires.
const BUDGET_MARGIN: Duration = Duration::from_millis(100);

/// Client for an OSRM-compatible routing service with retry and a circuit breaker.
pub struct RoutingClient {
    http: reqwest::Client,
    base_url: String,
    profile: String,
    retry_config: RetryConfig,
    breaker: CircuitBreaker,
    /// Whole-fetch budget, retries and backoff included, less the margin.
    budget: Duration,
    attempt_timeout: Duration,
}

impl RoutingClient {
    pub fn new(config: &RoutingConfig) -> Result<Self, RouteError> {
        let budget = Duration::from_secs(config.timeout_seconds).saturating_sub(BUDGET_MARGIN);
        let attempt_timeout = attempt_timeout(budget, config.retry.max_attempts);

        let http = reqwest::Client::builder()
            .user_agent("GoSafe-Engine/0.1")
            .timeout(attempt_timeout)
            .build()
            .map_err(|e| RouteError::Network(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.clone(),
            profile: config.profile.clone(),
            retry_config: config.retry.clone(),
            breaker: CircuitBreaker::from_config("routing", &config.circuit_breaker),
            budget,
            attempt_timeout,
        })
    }

    /// Fetch a route, retrying transport failures with exponential backoff.
    /// `NotFound` is a definite answer and is never retried.
    ///
    /// Each attempt gets an equal share of the budget. A retry that could not
    /// finish inside the budget is not started, so the failure still reaches
    /// the breaker before the caller's own timeout fires.
    pub async fn fetch(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, RouteError> {
        if !self.breaker.allow() {
            metrics::counter!("route.fetch.errors", "kind" => "circuit_open").increment(1);
            return Err(RouteError::Network(
                "routing service unavailable (circuit open)".into(),
            ));
        }

        let url = route_url(&self.base_url, &self.profile, origin, destination);
        let started = Instant::now();
        let mut attempt = 0u32;
        let mut backoff_ms = self.retry_config.initial_backoff_ms;

        loop {
            attempt += 1;
            match osrm::call_route_service(&self.http, &url).await {
                Ok(path) => {
                    self.breaker.record_success();
                    return Ok(path);
                }
                Err(RouteError::NotFound) => {
                    // The service answered; it is healthy.
                    self.breaker.record_success();
                    metrics::counter!("route.fetch.errors", "kind" => "not_found").increment(1);
                    return Err(RouteError::NotFound);
                }
                Err(e) => {
                    let wait = backoff_ms + jitter_ms(&self.retry_config, attempt, backoff_ms);
                    let next_attempt_end =
                        started.elapsed() + Duration::from_millis(wait) + self.attempt_timeout;

                    if attempt >= self.retry_config.max_attempts || next_attempt_end > self.budget {
                        self.breaker.record_failure();
                        metrics::counter!("route.fetch.errors", "kind" => "network").increment(1);
                        tracing::warn!(attempt, error = %e, "Route fetch gave up");
                        return Err(e);
                    }
                    tracing::warn!(attempt, wait_ms = wait, error = %e, "Route fetch failed, retrying");
                    tokio::time::sleep(Duration::from_millis(wait)).await;
                    backoff_ms = next_backoff(&self.retry_config, backoff_ms);
                }
            }
        }
    }
}

impl RouteFetcher for RoutingClient {
    fn fetch_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Coordinate>, RouteError>> + Send + '_>> {
        Box::pin(self.fetch(origin, destination))
    }
}

fn attempt_timeout(budget: Duration, max_attempts: u32) -> Duration {
    budget / max_attempts.max(1)
}

fn next_backoff(config: &RetryConfig, backoff_ms: u64) -> u64 {
    ((backoff_ms as f64 * config.backoff_multiplier) as u64).min(config.max_backoff_ms)
}

fn jitter_ms(config: &RetryConfig, attempt: u32, backoff_ms: u64) -> u64 {
    if !config.jitter {
        return 0;
    }
    use std::hash::{Hash, Hasher};
    let mut hasher = std::hash::DefaultHasher::new();
    attempt.hash(&mut hasher);
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos()
        .hash(&mut hasher);
    hasher.finish() % (backoff_ms / 2 + 1)
}
