use gosafe_common::config::{LocationProviderKind, RetryConfig, SystemConfig};

use super::loader::ConfigError;

/// Validate the complete engine configuration.
///
/// Checks sane ranges on numeric parameters and cross-field rules.
/// All violations are collected into a single error.
pub fn validate(config: &SystemConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_map(config, &mut errors);
    validate_routing(config, &mut errors);
    validate_location(config, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::Validation(errors.join("; ")))
    }
}

fn validate_map(config: &SystemConfig, errors: &mut Vec<String>) {
    let m = &config.map;

    if !m.initial_center.is_valid() {
        errors.push("map.initial_center must be a valid latitude/longitude".into());
    }
    if !(m.initial_delta > 0.0 && m.initial_delta <= 180.0) {
        errors.push("map.initial_delta must be in (0, 180]".into());
    }

    let p = &m.fit_padding;
    if [p.top, p.right, p.bottom, p.left]
        .iter()
        .any(|v| !v.is_finite() || *v < 0.0)
    {
        errors.push("map.fit_padding values must be finite and >= 0".into());
    }
}

fn validate_routing(config: &SystemConfig, errors: &mut Vec<String>) {
    let r = &config.routing;

    if !is_http_url(&r.base_url) {
        errors.push("routing.base_url must be an http(s) URL".into());
    }
    if r.profile.is_empty() {
        errors.push("routing.profile must not be empty".into());
    }
    if r.timeout_seconds == 0 || r.timeout_seconds > 120 {
        errors.push("routing.timeout_seconds must be between 1 and 120".into());
    }
    if r.circuit_breaker.failure_threshold == 0 {
        errors.push("routing.circuit_breaker.failure_threshold must be > 0".into());
    }

    validate_retry(&r.retry, "routing.retry", errors);
}

fn validate_retry(rc: &RetryConfig, name: &str, errors: &mut Vec<String>) {
    if rc.max_attempts == 0 {
        errors.push(format!("{}.max_attempts must be > 0", name));
    }
    if rc.initial_backoff_ms == 0 {
        errors.push(format!("{}.initial_backoff_ms must be > 0", name));
    }
    if rc.max_backoff_ms < rc.initial_backoff_ms {
        errors.push(format!(
            "{}.max_backoff_ms must be >= initial_backoff_ms",
            name
        ));
    }
    if !rc.backoff_multiplier.is_finite() || rc.backoff_multiplier < 1.0 {
        errors.push(format!("{}.backoff_multiplier must be finite and >= 1.0", name));
    }
}

fn validate_location(config: &SystemConfig, errors: &mut Vec<String>) {
    let l = &config.location;

    if l.timeout_seconds == 0 {
        errors.push("location.timeout_seconds must be > 0".into());
    }

    match l.provider {
        LocationProviderKind::Http => match l.base_url.as_deref() {
            Some(url) if is_http_url(url) => {}
            _ => errors.push("location.base_url must be an http(s) URL when provider = \"http\"".into()),
        },
        LocationProviderKind::Static => {
            if let Some(fix) = l.static_fix {
                if !fix.is_valid() {
                    errors.push("location.static_fix must be a valid latitude/longitude".into());
                }
            }
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
