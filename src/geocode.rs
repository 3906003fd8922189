//! Forward geocoding (address to coordinate) against a Mapbox-style
//! `geocoding/v5` endpoint. Used to resolve depot addresses.
//!
//! [`Geocoder`] implements [`Geocode`], so it composes with the same caching
//! and retry decorators as the directions client.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::error::ProviderError;
use crate::model::Coordinate;
use crate::traits::Geocode;

#[derive(Debug, Clone)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub access_token: String,
    /// ISO 3166 alpha-2 filter, e.g. "au".
    pub country: Option<String>,
    pub timeout_secs: u64,
}

impl GeocoderConfig {
    pub fn mapbox(access_token: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.mapbox.com".to_string(),
            access_token: access_token.into(),
            country: None,
            timeout_secs: 10,
        }
    }

    pub fn search_url(&self, address: &str) -> Result<Url, ProviderError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|err| ProviderError::InvalidRequest(format!("base url {}: {}", self.base_url, err)))?;
        let file = format!("{}.json", address);
        url.path_segments_mut()
            .map_err(|_| ProviderError::InvalidRequest(format!("base url {} cannot have a path", self.base_url)))?
            .pop_if_empty()
            .extend(["geocoding", "v5", "mapbox.places", file.as_str()]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("access_token", &self.access_token);
            query.append_pair("limit", "1");
            if let Some(country) = &self.country {
                query.append_pair("country", country);
            }
        }
        Ok(url)
    }
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    config: GeocoderConfig,
    client: reqwest::blocking::Client,
}

impl Geocoder {
    pub fn new(config: GeocoderConfig) -> Result<Self, ProviderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &GeocoderConfig {
        &self.config
    }
}

impl Geocode for Geocoder {
    fn geocode(&self, address: &str) -> Result<Coordinate, ProviderError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(ProviderError::InvalidRequest("empty address".to_string()));
        }

        let url = self.config.search_url(address)?;
        tracing::debug!(address, "geocoding address");

        let response = self.client.get(url).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        parse_geocode_response(&body)
            .map_err(|err| match err {
                ProviderError::EmptyResponse(_) => {
                    ProviderError::empty(format!("no geocode results for {:?}", address))
                }
                other => other,
            })
    }
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

#[derive(Debug, Deserialize)]
struct Feature {
    /// `[lng, lat]`
    center: Option<[f64; 2]>,
}

/// First result's center as a coordinate.
pub fn parse_geocode_response(body: &str) -> Result<Coordinate, ProviderError> {
    let response: GeocodeResponse = serde_json::from_str(body)?;
    let [longitude, latitude] = response
        .features
        .first()
        .and_then(|feature| feature.center)
        .ok_or_else(|| ProviderError::empty("no geocode results"))?;

    let coordinate = Coordinate::new(latitude, longitude);
    if !coordinate.is_valid() {
        return Err(ProviderError::malformed(format!(
            "geocode center out of range: {:?}",
            [longitude, latitude]
        )));
    }
    Ok(coordinate)
}
