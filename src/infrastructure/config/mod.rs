use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::domain::error::{AppError, Result};
use crate::domain::map::LatLng;

pub const CONFIG_FILE: &str = "venue_atlas.toml";
pub const ENV_PREFIX: &str = "VENUE_ATLAS_";

/// Service configuration: defaults, then `venue_atlas.toml`, then
/// `VENUE_ATLAS_*` environment variables (nested keys split on `__`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// CSV loaded at startup and by `/api/load` without a body.
    /// `http(s)://` means fetch, anything else is a file path.
    pub csv_source: String,

    pub map: MapConfig,

    pub places: PlacesConfig,

    pub http: HttpConfig,

    /// tracing-subscriber filter directive
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    pub default_center_lat: f64,
    pub default_center_lng: f64,
    pub default_zoom: u8,

    /// Zoom used by the list's "zoom to" action
    pub focus_zoom: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Without a key every lookup reports no photos
    pub api_key: Option<String>,
    pub base_url: String,
    pub search_radius_m: u32,
    pub max_photos: usize,
    pub photo_max_width: u32,
    pub timeout_secs: u64,
    pub max_concurrent_lookups: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            csv_source: "data/venues.csv".to_string(),
            map: MapConfig::default(),
            places: PlacesConfig::default(),
            http: HttpConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        // London
        Self {
            default_center_lat: 51.5074,
            default_center_lng: -0.1278,
            default_zoom: 13,
            focus_zoom: 16,
        }
    }
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://maps.googleapis.com/maps/api/place".to_string(),
            search_radius_m: 80,
            max_photos: 3,
            photo_max_width: 400,
            timeout_secs: 20,
            max_concurrent_lookups: 4,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

impl MapConfig {
    pub fn default_center(&self) -> LatLng {
        LatLng::new(self.default_center_lat, self.default_center_lng)
    }
}

impl AppConfig {
    /// Load from the default file and environment. Reads `.env` first.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_figment(Self::figment(CONFIG_FILE))
    }

    pub fn figment(config_file: &str) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ValidationError(format!("Invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.csv_source.trim().is_empty() {
            return Err(AppError::ValidationError("csv_source must not be empty".to_string()));
        }
        if !self.map.default_center_lat.is_finite() || !self.map.default_center_lng.is_finite() {
            return Err(AppError::ValidationError(
                "map default center must be finite".to_string(),
            ));
        }
        if self.map.default_zoom > 22 || self.map.focus_zoom > 22 {
            return Err(AppError::ValidationError(
                "map zoom levels must be between 0 and 22".to_string(),
            ));
        }
        if self.places.max_photos == 0 || self.places.photo_max_width == 0 {
            return Err(AppError::ValidationError(
                "places.max_photos and places.photo_max_width must be > 0".to_string(),
            ));
        }
        if self.places.max_concurrent_lookups == 0 {
            return Err(AppError::ValidationError(
                "places.max_concurrent_lookups must be > 0".to_string(),
            ));
        }
        if self.http.port == 0 {
            return Err(AppError::ValidationError("http.port must be > 0".to_string()));
        }
        Ok(())
    }
}
