use gosafe_common::api::routing::RouteServiceResponse;
use gosafe_common::types::Coordinate;

use super::RouteError;

/// Build the route URL: `{base}/route/v1/{profile}/{olon},{olat};{dlon},{dlat}`.
///
/// The service takes longitude first. Full GeoJSON geometry is requested.
pub fn route_url(base_url: &str, profile: &str, origin: Coordinate, destination: Coordinate) -> String {
    format!(
        "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
        base_url.trim_end_matches('/'),
        profile,
        origin.longitude,
        origin.latitude,
        destination.longitude,
        destination.latitude,
    )
}

/// Call the routing service once and decode candidate 0.
pub async fn call_route_service(
    http: &reqwest::Client,
    url: &str,
) -> Result<Vec<Coordinate>, RouteError> {
    let start = std::time::Instant::now();

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| RouteError::Network(e.to_string()))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| RouteError::Network(e.to_string()))?;

    metrics::histogram!("route.fetch.latency").record(start.elapsed().as_secs_f64());

    // OSRM answers NoRoute with a 400 and a JSON body, so parse before judging status.
    match serde_json::from_str::<RouteServiceResponse>(&body) {
        Ok(parsed) => decode_route(parsed),
        Err(_) if !status.is_success() => Err(RouteError::Network(format!(
            "{}: {}",
            status,
            body.chars().take(200).collect::<String>()
        ))),
        Err(e) => Err(RouteError::Network(format!(
            "Failed to parse route response: {}",
            e
        ))),
    }
}

/// Turn a service response into a path. First candidate wins.
///
/// Geometry positions are `[longitude, latitude]` and are flipped here.
pub fn decode_route(response: RouteServiceResponse) -> Result<Vec<Coordinate>, RouteError> {
    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(RouteError::NotFound),
        other => {
            return Err(RouteError::Network(format!(
                "routing service returned {}: {}",
                other,
                response.message.unwrap_or_default()
            )))
        }
    }

    let first = response.routes.into_iter().next().ok_or(RouteError::NotFound)?;

    let path: Vec<Coordinate> = first
        .geometry
        .coordinates
        .into_iter()
        .map(Coordinate::from_lon_lat)
        .collect();

    if path.is_empty() {
        return Err(RouteError::NotFound);
    }

    Ok(path)
}
