use super::PhotoLookup;
use crate::domain::error::{AppError, Result};
use crate::domain::map::LatLng;
use crate::infrastructure::config::PlacesConfig;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

const STATUS_OK: &str = "OK";

#[derive(Deserialize)]
struct NearbySearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceSummary>,
}

#[derive(Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceSummary>,
}

#[derive(Deserialize)]
struct FindPlaceResponse {
    status: String,
    #[serde(default)]
    candidates: Vec<PlaceSummary>,
}

#[derive(Deserialize)]
struct PlaceSummary {
    place_id: Option<String>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
}

#[derive(Deserialize)]
struct PlacePhoto {
    photo_reference: String,
}

/// Google Places web service client.
///
/// Nearby search around the venue, then place details of the best match;
/// falls back to find-place-from-text when nothing is nearby.
pub struct GooglePlacesClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    search_radius_m: u32,
    max_photos: usize,
    photo_max_width: u32,
}

impl GooglePlacesClient {
    pub fn new(api_key: String, config: &PlacesConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_secs))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            search_radius_m: config.search_radius_m,
            max_photos: config.max_photos,
            photo_max_width: config.photo_max_width,
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|e| AppError::PhotoLookupFailed(format!("Invalid Places URL: {}", e)))?;
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.api_key);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::PhotoLookupFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::PhotoLookupFailed(format!(
                "API error ({})",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::PhotoLookupFailed(format!("Failed to parse JSON: {}", e)))
    }

    async fn nearby_search(&self, name: &str, position: LatLng) -> Result<Vec<PlaceSummary>> {
        let location = format!("{},{}", position.lat, position.lng);
        let radius = self.search_radius_m.to_string();
        let url = self.endpoint(
            "nearbysearch/json",
            &[
                ("location", location.as_str()),
                ("radius", radius.as_str()),
                ("keyword", name),
            ],
        )?;
        let body: NearbySearchResponse = self.get_json(url).await?;
        if body.status != STATUS_OK {
            debug!(status = %body.status, name, "Nearby search returned no match");
            return Ok(Vec::new());
        }
        Ok(body.results)
    }

    async fn details_photos(&self, place_id: &str) -> Result<Vec<PlacePhoto>> {
        let url = self.endpoint(
            "details/json",
            &[
                ("place_id", place_id),
                ("fields", "photos,name,formatted_address,rating"),
            ],
        )?;
        let body: DetailsResponse = self.get_json(url).await?;
        if body.status != STATUS_OK {
            return Ok(Vec::new());
        }
        Ok(body.result.map(|place| place.photos).unwrap_or_default())
    }

    async fn find_place_photos(&self, name: &str, position: LatLng) -> Result<Vec<PlacePhoto>> {
        let query = format!("{} {}, {}", name, position.lat, position.lng);
        let url = self.endpoint(
            "findplacefromtext/json",
            &[
                ("input", query.as_str()),
                ("inputtype", "textquery"),
                ("fields", "photos,place_id,name"),
            ],
        )?;
        let body: FindPlaceResponse = self.get_json(url).await?;
        if body.status != STATUS_OK {
            return Ok(Vec::new());
        }
        Ok(body
            .candidates
            .into_iter()
            .next()
            .map(|place| place.photos)
            .unwrap_or_default())
    }

    fn photo_urls(&self, photos: &[PlacePhoto]) -> Result<Vec<String>> {
        let width = self.photo_max_width.to_string();
        photos
            .iter()
            .take(self.max_photos)
            .map(|photo| {
                self.endpoint(
                    "photo",
                    &[
                        ("maxwidth", width.as_str()),
                        ("photo_reference", photo.photo_reference.as_str()),
                    ],
                )
                .map(String::from)
            })
            .collect()
    }
}

#[async_trait]
impl PhotoLookup for GooglePlacesClient {
    async fn lookup_photos(&self, name: &str, position: LatLng) -> Result<Vec<String>> {
        let nearby = match self.nearby_search(name, position).await {
            Ok(results) => results,
            Err(err) => {
                debug!(error = %err, name, "Nearby search failed, trying text search");
                Vec::new()
            }
        };

        let photos = match nearby.into_iter().next() {
            Some(place) => {
                let details = match place.place_id.as_deref() {
                    Some(place_id) => self.details_photos(place_id).await.unwrap_or_default(),
                    None => Vec::new(),
                };
                if details.is_empty() {
                    place.photos
                } else {
                    details
                }
            }
            None => self.find_place_photos(name, position).await?,
        };

        self.photo_urls(&photos)
    }
}
