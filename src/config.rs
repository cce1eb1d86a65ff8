use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::EnrichError;

#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Distance to grow the economic zone before indexing; 0 disables it
    pub economic_zone_buffer_km: f64,
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum cached coordinates; `None` keeps every entry
    pub capacity: Option<usize>,
    pub stripes: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: None,
            stripes: 64,
        }
    }
}

impl EnrichmentConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: EnrichmentConfig =
            toml::from_str(&content).context("Failed to parse config file")?;
        config.validate().context("Invalid config file")?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EnrichError> {
        if !self.economic_zone_buffer_km.is_finite() || self.economic_zone_buffer_km < 0.0 {
            return Err(EnrichError::InvalidConfig(format!(
                "economic_zone_buffer_km must be a non-negative number, got {}",
                self.economic_zone_buffer_km
            )));
        }
        if self.cache.stripes == 0 {
            return Err(EnrichError::InvalidConfig(
                "cache.stripes must be greater than 0".to_string(),
            ));
        }
        if self.cache.capacity == Some(0) {
            return Err(EnrichError::InvalidConfig(
                "cache.capacity must be greater than 0 when set".to_string(),
            ));
        }
        Ok(())
    }
}
