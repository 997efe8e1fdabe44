// ============================================================
// VENUE CATALOG
// ============================================================
// Authoritative in-memory venue collection

use std::collections::BTreeSet;

use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::venue::{GenreFilter, Venue};

/// Owns every venue of the current load, in normalization order.
///
/// `generation` increases on every replace; anything that captured an older
/// generation refers to a collection that no longer exists.
#[derive(Debug, Default)]
pub struct VenueCatalog {
    venues: Vec<Venue>,
    generation: u64,
}

impl VenueCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a new collection wholesale.
    pub fn replace(&mut self, venues: Vec<Venue>) -> u64 {
        self.venues = venues;
        self.generation += 1;
        info!(
            venues = self.len(),
            generation = self.generation,
            "Venue catalog replaced"
        );
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn venues(&self) -> &[Venue] {
        &self.venues
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn find_by_id(&self, id: u64) -> Option<&Venue> {
        self.venues.iter().find(|venue| venue.id() == id)
    }

    /// Set `genre` and its raw mirror in one step.
    pub fn update_genre(&mut self, id: u64, genre: &str) -> Result<&Venue> {
        let Some(venue) = self.venues.iter_mut().find(|venue| venue.id() == id) else {
            warn!(venue_id = id, "Genre edit for unknown venue ignored");
            return Err(AppError::EditTargetMissing(id));
        };

        venue.assign_genre(genre);
        Ok(venue)
    }

    /// Sorted, de-duplicated, non-empty genres currently present
    pub fn distinct_genres(&self) -> Vec<String> {
        self.venues
            .iter()
            .map(|venue| venue.genre().trim())
            .filter(|genre| !genre.is_empty())
            .map(str::to_string)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Matching venues in catalog order
    pub fn filter(&self, filter: &GenreFilter) -> Vec<&Venue> {
        self.venues
            .iter()
            .filter(|venue| filter.matches(venue))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::venue_normalizer::normalize;
    use crate::domain::csv::RawRow;

    fn catalog(genres: &[&str]) -> VenueCatalog {
        let rows = genres
            .iter()
            .enumerate()
            .map(|(i, genre)| {
                RawRow::from_pairs([
                    ("lat", i.to_string()),
                    ("lng", "0".to_string()),
                    ("name", format!("V{}", i)),
                    ("genre", genre.to_string()),
                ])
            })
            .collect();
        let mut catalog = VenueCatalog::new();
        catalog.replace(normalize(rows, 0).venues);
        catalog
    }

    #[test]
    fn test_update_genre_mirrors_raw() {
        let mut catalog = catalog(&["Rock", "Pop"]);
        let venue = catalog.update_genre(1, "Jazz").unwrap();
        assert_eq!(venue.genre(), "Jazz");
        assert_eq!(venue.raw().get("genre"), Some("Jazz"));

        let ids: Vec<u64> = catalog
            .filter(&GenreFilter::from_selection("Jazz"))
            .iter()
            .map(|v| v.id())
            .collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn test_update_genre_adds_raw_column_when_absent() {
        let mut catalog = VenueCatalog::new();
        let rows = vec![RawRow::from_pairs([("lat", "1"), ("lng", "2")])];
        catalog.replace(normalize(rows, 0).venues);

        catalog.update_genre(0, "Folk").unwrap();
        assert_eq!(catalog.find_by_id(0).unwrap().raw().get("genre"), Some("Folk"));
    }

    #[test]
    fn test_update_unknown_id_is_reported() {
        let mut catalog = catalog(&["Rock"]);
        let err = catalog.update_genre(42, "Jazz").unwrap_err();
        assert_eq!(err, AppError::EditTargetMissing(42));
        assert_eq!(catalog.find_by_id(0).unwrap().genre(), "Rock");
    }

    #[test]
    fn test_distinct_genres_sorted_without_blanks() {
        let catalog = catalog(&["Rock", "", "Jazz", "Rock", "Blues"]);
        assert_eq!(catalog.distinct_genres(), vec!["Blues", "Jazz", "Rock"]);
    }

    #[test]
    fn test_filter_preserves_catalog_order() {
        let catalog = catalog(&["Rock", "Jazz", "Rock"]);
        let ids: Vec<u64> = catalog
            .filter(&GenreFilter::from_selection("Rock"))
            .iter()
            .map(|v| v.id())
            .collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(catalog.filter(&GenreFilter::All).len(), 3);
    }

    #[test]
    fn test_replace_bumps_generation() {
        let mut catalog = catalog(&["Rock"]);
        let before = catalog.generation();
        let after = catalog.replace(Vec::new());
        assert_eq!(after, before + 1);
        assert!(catalog.is_empty());
        assert!(catalog.find_by_id(0).is_none());
    }
}
