pub mod google;

use async_trait::async_trait;

use crate::domain::error::{AppError, Result};
use crate::domain::map::LatLng;

pub use google::GooglePlacesClient;

/// Finds photo URLs for a venue by name and position.
///
/// Retries and fallbacks live inside implementations; callers only see an
/// ordered list of URLs (possibly empty) or a failure.
#[async_trait]
pub trait PhotoLookup: Send + Sync {
    async fn lookup_photos(&self, name: &str, position: LatLng) -> Result<Vec<String>>;
}

/// Used when no Places API key is configured
pub struct UnavailablePhotoLookup;

#[async_trait]
impl PhotoLookup for UnavailablePhotoLookup {
    async fn lookup_photos(&self, _name: &str, _position: LatLng) -> Result<Vec<String>> {
        Err(AppError::PhotoLookupFailed(
            "Places service not available".to_string(),
        ))
    }
}
