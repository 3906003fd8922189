//! OSRM-compatible directions adapter.
//!
//! Speaks the OSRM `route` service, either against a self-hosted
//! `osrm-routed` or the Mapbox Directions API (same response shape, token
//! in the query string).

use std::time::Duration;

use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::polyline::Polyline;
use crate::traits::DistanceProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectionsApi {
    /// `{base}/route/v1/{profile}/{coords}`
    Osrm,
    /// `{base}/directions/v5/mapbox/{profile}/{coords}?access_token=...`
    Mapbox,
}

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub api: DirectionsApi,
    pub base_url: String,
    pub profile: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    /// Request full route geometry alongside distance and duration.
    pub include_geometry: bool,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            api: DirectionsApi::Osrm,
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            access_token: None,
            timeout_secs: 10,
            include_geometry: false,
        }
    }
}

impl OsrmConfig {
    pub fn mapbox(access_token: impl Into<String>) -> Self {
        Self {
            api: DirectionsApi::Mapbox,
            base_url: "https://api.mapbox.com".to_string(),
            profile: "driving".to_string(),
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    /// Full request URL for a route through `points`.
    pub fn route_url(&self, points: &[Coordinate]) -> String {
        let coords = points
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.longitude, point.latitude))
            .collect::<Vec<_>>()
            .join(";");
        let base = self.base_url.trim_end_matches('/');
        let overview = if self.include_geometry {
            "overview=full&geometries=geojson"
        } else {
            "overview=false"
        };

        match self.api {
            DirectionsApi::Osrm => {
                format!("{}/route/v1/{}/{}?{}", base, self.profile, coords, overview)
            }
            DirectionsApi::Mapbox => format!(
                "{}/directions/v5/mapbox/{}/{}?{}&access_token={}",
                base,
                self.profile,
                coords,
                overview,
                self.access_token.as_deref().unwrap_or_default()
            ),
        }
    }
}

/// Distance and duration of one routed path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub geometry: Option<Polyline>,
}

impl RouteSummary {
    fn zero() -> Self {
        Self {
            distance_km: 0.0,
            duration_minutes: 0.0,
            geometry: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    /// Routes through `points` in order.
    pub fn route(&self, points: &[Coordinate]) -> Result<RouteSummary, ProviderError> {
        if points.len() < 2 {
            return Err(ProviderError::InvalidRequest(format!(
                "route needs at least 2 points, got {}",
                points.len()
            )));
        }
        if points.windows(2).all(|leg| leg[0] == leg[1]) {
            tracing::debug!("all route points identical, returning zero route");
            return Ok(RouteSummary::zero());
        }

        let url = self.config.route_url(points);
        tracing::debug!(points = points.len(), profile = %self.config.profile, "requesting route");

        let response = self.client.get(&url).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;

        parse_route_response(status, &body).inspect_err(|err| {
            tracing::error!(status, error = %err, "route request failed");
        })
    }
}

impl DistanceProvider for OsrmClient {
    fn distance_km(&self, from: Coordinate, to: Coordinate) -> Result<Option<f64>, ProviderError> {
        self.route(&[from, to]).map(|summary| Some(summary.distance_km))
    }

    fn total_route_distance_km(&self, path: &[Coordinate]) -> Result<Option<f64>, ProviderError> {
        if path.len() < 2 {
            return Ok(Some(0.0));
        }
        self.route(path).map(|summary| Some(summary.distance_km))
    }
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    code: Option<String>,
    message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteEntry>,
}

#[derive(Debug, Deserialize)]
struct RouteEntry {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
    geometry: Option<GeoJsonLine>,
}

#[derive(Debug, Deserialize)]
struct GeoJsonLine {
    coordinates: Vec<[f64; 2]>,
}

/// Translates a directions response into a [`RouteSummary`].
pub fn parse_route_response(status: u16, body: &str) -> Result<RouteSummary, ProviderError> {
    let parsed = serde_json::from_str::<RouteResponse>(body);

    if !(200..300).contains(&status) {
        let message = match parsed {
            Ok(RouteResponse {
                code, message: Some(message), ..
            }) => match code {
                Some(code) => format!("{}: {}", code, message),
                None => message,
            },
            _ => body.to_string(),
        };
        return Err(ProviderError::Api { status, message });
    }

    let response = parsed?;
    if let Some(code) = response.code.as_deref() {
        if code != "Ok" {
            return Err(ProviderError::Api {
                status,
                message: format!("{}: {}", code, response.message.unwrap_or_default()),
            });
        }
    }

    let route = response
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::empty("no route in directions response"))?;

    if !route.distance.is_finite() || route.distance < 0.0 {
        return Err(ProviderError::malformed(format!("route distance {}", route.distance)));
    }
    if !route.duration.is_finite() || route.duration < 0.0 {
        return Err(ProviderError::malformed(format!("route duration {}", route.duration)));
    }

    Ok(RouteSummary {
        distance_km: route.distance / 1000.0,
        duration_minutes: route.duration / 60.0,
        geometry: route
            .geometry
            .map(|line| Polyline::from_lng_lat(&line.coordinates)),
    })
}
