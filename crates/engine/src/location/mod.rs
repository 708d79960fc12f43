mod http;

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use gosafe_common::config::{LocationConfig, LocationProviderKind};
use gosafe_common::types::{Coordinate, PermissionStatus};

pub use http::HttpLocationProvider;

/// Errors from location acquisition. Always recoverable.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    Unavailable(String),
}

impl From<LocationError> for gosafe_common::GoSafeError {
    fn from(e: LocationError) -> Self {
        match e {
            LocationError::PermissionDenied => gosafe_common::GoSafeError::PermissionDenied,
            LocationError::Unavailable(msg) => gosafe_common::GoSafeError::LocationUnavailable(msg),
        }
    }
}

/// Device permission and position acquisition.
///
/// Object-safe so the session controller can hold `Arc<dyn LocationProvider>`.
/// Both calls may suspend (permission prompt, waiting for a fix) and are safe
/// to re-issue.
pub trait LocationProvider: Send + Sync {
    fn request_access(&self) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + '_>>;

    fn current_location(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + '_>>;
}

/// Provider answering with a fixed permission and an optional fix.
pub struct StaticLocationProvider {
    permission: PermissionStatus,
    fix: Option<Coordinate>,
}

impl StaticLocationProvider {
    pub fn new(permission: PermissionStatus, fix: Option<Coordinate>) -> Self {
        Self { permission, fix }
    }

    pub fn granted(fix: Coordinate) -> Self {
        Self::new(PermissionStatus::Granted, Some(fix))
    }

    pub fn denied() -> Self {
        Self::new(PermissionStatus::Denied, None)
    }
}

impl LocationProvider for StaticLocationProvider {
    fn request_access(&self) -> Pin<Box<dyn Future<Output = PermissionStatus> + Send + '_>> {
        let permission = self.permission;
        Box::pin(async move { permission })
    }

    fn current_location(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<Coordinate, LocationError>> + Send + '_>> {
        let result = match (self.permission, self.fix) {
            (PermissionStatus::Denied, _) => Err(LocationError::PermissionDenied),
            (PermissionStatus::Granted, Some(fix)) => Ok(fix),
            (PermissionStatus::Granted, None) => {
                Err(LocationError::Unavailable("no fix configured".into()))
            }
        };
        Box::pin(async move { result })
    }
}

/// Build the provider selected by configuration.
pub fn provider_from_config(config: &LocationConfig) -> Box<dyn LocationProvider> {
    match config.provider {
        LocationProviderKind::Static => Box::new(StaticLocationProvider::new(
            config.permission,
            config.static_fix,
        )),
        LocationProviderKind::Http => Box::new(HttpLocationProvider::new(
            config.base_url.clone().unwrap_or_default(),
            Duration::from_secs(config.timeout_seconds),
        )),
    }
}

/// Ask for access, then for a fix.
///
/// Returns the first failure; a denied permission short-circuits without
/// querying the position.
pub async fn acquire(provider: &dyn LocationProvider) -> Result<Coordinate, LocationError> {
    let permission = provider.request_access().await;
    if !permission.is_granted() {
        tracing::debug!("Location permission denied");
        return Err(LocationError::PermissionDenied);
    }

    provider.current_location().await
}
