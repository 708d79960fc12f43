use thiserror::Error;

/// Top-level error type for GoSafe session operations.
///
/// Nothing here is fatal to the process. Every variant leaves the session usable.
#[derive(Debug, Error)]
pub enum GoSafeError {
    // --- Location (degrades: session continues without a user location) ---
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    // --- Routing (surfaced once to the user, navigation enters RouteFailed) ---
    #[error("No route found between the requested points")]
    RouteNotFound,

    #[error("Routing service error: {0}")]
    Network(String),

    // --- Session contract ---
    #[error("Select a point on the map first")]
    NoActiveSelection,

    /// A route result that arrived after a newer request superseded it.
    #[error("Route result for generation {generation} is stale (current {current})")]
    StaleRouteResult { generation: u64, current: u64 },

    // --- Operational errors ---
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl GoSafeError {
    /// Whether this error degrades silently (no user interruption).
    pub fn is_degradable(&self) -> bool {
        matches!(self, Self::PermissionDenied | Self::LocationUnavailable(_))
    }

    /// Whether this error should reach the user as an alert or prompt.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::RouteNotFound | Self::Network(_) | Self::NoActiveSelection
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(GoSafeError::PermissionDenied.is_degradable());
        assert!(!GoSafeError::PermissionDenied.is_user_visible());
        assert!(GoSafeError::RouteNotFound.is_user_visible());
        assert!(GoSafeError::NoActiveSelection.is_user_visible());

        let stale = GoSafeError::StaleRouteResult {
            generation: 1,
            current: 2,
        };
        assert!(!stale.is_user_visible());
        assert!(!stale.is_degradable());
    }
}
