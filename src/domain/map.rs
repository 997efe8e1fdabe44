use serde::Serialize;

use super::error::Result;
use super::venue::Venue;

/// Opaque handle issued by a map sink for one marker.
///
/// Handles are only valid until the next catalog replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MarkerHandle(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Photo area of a marker's info panel
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "urls", rename_all = "snake_case")]
pub enum PhotoState {
    Loading,
    Found(Vec<String>),
    NotFound,
}

impl PhotoState {
    /// Failures and empty results render the same way.
    pub fn from_lookup(result: Result<Vec<String>>) -> Self {
        match result {
            Ok(urls) if !urls.is_empty() => PhotoState::Found(urls),
            _ => PhotoState::NotFound,
        }
    }

    pub fn caption(&self) -> Option<&'static str> {
        match self {
            PhotoState::Loading => Some("Loading photos…"),
            PhotoState::Found(_) => None,
            PhotoState::NotFound => Some("No photos found."),
        }
    }
}

/// Content shown when a marker is opened
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoPanel {
    pub venue_id: u64,
    pub title: String,
    pub email: String,
    pub mailto: String,
    photos: PhotoState,
    /// Text shown in place of the photo strip, if any
    photo_caption: Option<&'static str>,
}

impl InfoPanel {
    pub fn for_venue(venue: &Venue) -> Self {
        let photos = PhotoState::Loading;
        Self {
            venue_id: venue.id(),
            title: venue.name().to_string(),
            email: venue.email().to_string(),
            mailto: format!("mailto:{}", venue.email()),
            photo_caption: photos.caption(),
            photos,
        }
    }

    pub fn photos(&self) -> &PhotoState {
        &self.photos
    }

    pub fn photo_caption(&self) -> Option<&'static str> {
        self.photo_caption
    }

    pub fn set_photos(&mut self, photos: PhotoState) {
        self.photo_caption = photos.caption();
        self.photos = photos;
    }
}

/// One entry of the venue list. Carries what the zoom and edit actions need.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub genre: String,
    pub position: LatLng,
}

impl From<&Venue> for ListItem {
    fn from(venue: &Venue) -> Self {
        Self {
            id: venue.id(),
            name: venue.name().to_string(),
            email: venue.email().to_string(),
            genre: venue.genre().to_string(),
            position: LatLng::new(venue.latitude(), venue.longitude()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;

    #[test]
    fn test_photo_state_collapses_failures() {
        assert_eq!(PhotoState::from_lookup(Ok(vec![])), PhotoState::NotFound);
        assert_eq!(
            PhotoState::from_lookup(Err(AppError::PhotoLookupFailed("ZERO_RESULTS".to_string()))),
            PhotoState::NotFound
        );
        assert_eq!(
            PhotoState::from_lookup(Ok(vec!["u".to_string()])),
            PhotoState::Found(vec!["u".to_string()])
        );
    }

    fn venue() -> Venue {
        Venue::new(
            4,
            51.5,
            -0.1,
            "Blue Note".to_string(),
            "bn@example.com".to_string(),
            "Jazz".to_string(),
            crate::domain::csv::RawRow::new(),
        )
        .unwrap()
    }

    #[test]
    fn test_info_panel_caption_follows_photos() {
        let mut panel = InfoPanel::for_venue(&venue());
        assert_eq!(panel.mailto, "mailto:bn@example.com");
        assert_eq!(panel.photo_caption(), Some("Loading photos…"));

        panel.set_photos(PhotoState::from_lookup(Ok(vec![])));
        assert_eq!(panel.photo_caption(), Some("No photos found."));
        let json = serde_json::to_value(&panel).unwrap();
        assert_eq!(json["photo_caption"], "No photos found.");
        assert_eq!(json["photos"]["state"], "not_found");

        panel.set_photos(PhotoState::Found(vec!["https://img/1".to_string()]));
        assert_eq!(panel.photo_caption(), None);
        assert_eq!(panel.photos(), &PhotoState::Found(vec!["https://img/1".to_string()]));
    }
}
