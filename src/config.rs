//! Distance provider configuration.
//!
//! Selects and composes the provider stack. With no mapping integration the
//! planner runs on great-circle distances through [`NullProvider`];
//! otherwise the external client is wrapped as `Caching(Retrying(client))`.
//! Mapbox also yields a geocoder composed the same way.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::cache::{CachingProvider, DEFAULT_CACHE_CAPACITY};
use crate::error::ProviderError;
use crate::geocode::{Geocoder, GeocoderConfig};
use crate::osrm::{OsrmClient, OsrmConfig};
use crate::retry::{RetryConfig, RetryingProvider};
use crate::traits::{DistanceProvider, Geocode, NullProvider};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unknown map provider {0:?} (expected none, osrm or mapbox)")]
    UnknownProvider(String),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },

    #[error("map provider {0} requires an API key")]
    MissingApiKey(String),

    #[error("retry backoff must be greater than zero")]
    ZeroBackoff,

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    None,
    Osrm,
    Mapbox,
}

impl std::str::FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(ProviderKind::None),
            "osrm" => Ok(ProviderKind::Osrm),
            "mapbox" => Ok(ProviderKind::Mapbox),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    pub profile: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub backoff_ms: u64,
    pub cache_capacity: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            provider: ProviderKind::None,
            api_key: None,
            base_url: None,
            profile: None,
            timeout_secs: 10,
            max_retries: retry.max_retries,
            backoff_ms: retry.initial_backoff.as_millis() as u64,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ProviderConfig {
    /// Reads `MAP_*` environment variables; unset keys keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("MAP_PROVIDER") {
            config.provider = value.parse()?;
        }
        config.api_key = lookup("MAP_API_KEY").filter(|key| !key.is_empty());
        config.base_url = lookup("MAP_BASE_URL").filter(|url| !url.is_empty());
        config.profile = lookup("MAP_PROFILE").filter(|profile| !profile.is_empty());
        if let Some(value) = lookup("MAP_TIMEOUT_SECS") {
            config.timeout_secs = parse_number("MAP_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = lookup("MAP_RETRIES") {
            config.max_retries = parse_number("MAP_RETRIES", &value)?;
        }
        if let Some(value) = lookup("MAP_BACKOFF_MS") {
            config.backoff_ms = parse_number("MAP_BACKOFF_MS", &value)?;
        }
        if let Some(value) = lookup("MAP_CACHE_CAPACITY") {
            config.cache_capacity = parse_number("MAP_CACHE_CAPACITY", &value)?;
        }

        Ok(config)
    }

    pub fn retry(&self) -> Result<RetryConfig, ConfigError> {
        if self.backoff_ms == 0 {
            return Err(ConfigError::ZeroBackoff);
        }
        Ok(RetryConfig {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.backoff_ms),
        })
    }

    /// Client settings for the external provider, `None` when not configured.
    pub fn osrm(&self) -> Result<Option<OsrmConfig>, ConfigError> {
        let mut osrm = match self.provider {
            ProviderKind::None => return Ok(None),
            ProviderKind::Osrm => OsrmConfig {
                access_token: self.api_key.clone(),
                ..OsrmConfig::default()
            },
            ProviderKind::Mapbox => {
                let token = self
                    .api_key
                    .clone()
                    .ok_or_else(|| ConfigError::MissingApiKey("mapbox".to_string()))?;
                OsrmConfig::mapbox(token)
            }
        };

        if let Some(base_url) = &self.base_url {
            osrm.base_url = base_url.clone();
        }
        if let Some(profile) = &self.profile {
            osrm.profile = profile.clone();
        }
        osrm.timeout_secs = self.timeout_secs;
        Ok(Some(osrm))
    }

    /// Composes the provider stack.
    pub fn build(&self) -> Result<Arc<dyn DistanceProvider>, ConfigError> {
        let Some(osrm) = self.osrm()? else {
            tracing::info!("no map provider configured, using great-circle distances");
            return Ok(Arc::new(NullProvider));
        };
        let retry = self.retry()?;

        tracing::info!(
            provider = ?self.provider,
            base_url = %osrm.base_url,
            max_retries = retry.max_retries,
            cache_capacity = self.cache_capacity,
            "configured map provider"
        );
        let client = OsrmClient::new(osrm)?;
        let retrying = RetryingProvider::new(client, retry);
        Ok(Arc::new(CachingProvider::with_capacity(retrying, self.cache_capacity)))
    }

    /// Geocoder settings; only Mapbox offers geocoding.
    pub fn geocoder(&self) -> Result<Option<GeocoderConfig>, ConfigError> {
        if self.provider != ProviderKind::Mapbox {
            return Ok(None);
        }
        let token = self
            .api_key
            .clone()
            .ok_or_else(|| ConfigError::MissingApiKey("mapbox".to_string()))?;
        let mut geocoder = GeocoderConfig::mapbox(token);
        if let Some(base_url) = &self.base_url {
            geocoder.base_url = base_url.clone();
        }
        geocoder.timeout_secs = self.timeout_secs;
        Ok(Some(geocoder))
    }

    /// Composes `Caching(Retrying(Geocoder))`, `None` without a geocoding provider.
    pub fn build_geocoder(&self) -> Result<Option<Arc<dyn Geocode>>, ConfigError> {
        let Some(config) = self.geocoder()? else {
            return Ok(None);
        };
        let retry = self.retry()?;
        let retrying = RetryingProvider::new(Geocoder::new(config)?, retry);
        Ok(Some(Arc::new(CachingProvider::with_capacity(retrying, self.cache_capacity))))
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
