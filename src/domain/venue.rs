use serde::Serialize;

use super::csv::RawRow;

/// Value of the genre selector that matches every venue.
pub const ALL_GENRES: &str = "all";

/// Canonical venue record built from one CSV row.
///
/// Coordinates are checked once at construction. `genre` is the only field
/// that changes afterwards, and it is always mirrored into `raw["genre"]`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Venue {
    id: u64,
    latitude: f64,
    longitude: f64,
    name: String,
    email: String,
    genre: String,
    raw: RawRow,
}

impl Venue {
    /// Returns `None` unless both coordinates are finite.
    pub fn new(
        id: u64,
        latitude: f64,
        longitude: f64,
        name: String,
        email: String,
        genre: String,
        raw: RawRow,
    ) -> Option<Self> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return None;
        }

        Some(Self {
            id,
            latitude,
            longitude,
            name,
            email,
            genre,
            raw,
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn genre(&self) -> &str {
        &self.genre
    }

    pub fn raw(&self) -> &RawRow {
        &self.raw
    }

    /// Writes `genre` and `raw["genre"]` together. Only the catalog calls this.
    pub(crate) fn assign_genre(&mut self, genre: &str) {
        self.genre = genre.to_string();
        self.raw.set("genre", genre);
    }
}

/// Active selection of the genre filter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GenreFilter {
    #[default]
    All,
    Exact(String),
}

impl GenreFilter {
    /// Interpret a selector value; `"all"` is the sentinel for no filtering.
    pub fn from_selection(value: &str) -> Self {
        if value == ALL_GENRES {
            GenreFilter::All
        } else {
            GenreFilter::Exact(value.to_string())
        }
    }

    pub fn as_selection(&self) -> &str {
        match self {
            GenreFilter::All => ALL_GENRES,
            GenreFilter::Exact(genre) => genre,
        }
    }

    /// Case-sensitive exact comparison, no partial matches.
    pub fn matches(&self, venue: &Venue) -> bool {
        match self {
            GenreFilter::All => true,
            GenreFilter::Exact(genre) => venue.genre() == genre,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn venue(genre: &str) -> Venue {
        Venue::new(
            0,
            51.5,
            -0.1,
            "A".to_string(),
            String::new(),
            genre.to_string(),
            RawRow::from_pairs([("genre", genre)]),
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_non_finite_coordinates() {
        let raw = RawRow::new();
        assert!(Venue::new(0, f64::NAN, 0.0, String::new(), String::new(), String::new(), raw.clone()).is_none());
        assert!(Venue::new(0, 0.0, f64::INFINITY, String::new(), String::new(), String::new(), raw).is_none());
    }

    #[test]
    fn test_assign_genre_mirrors_raw() {
        let mut v = venue("Rock");
        v.assign_genre("Jazz");
        assert_eq!(v.genre(), "Jazz");
        assert_eq!(v.raw().get("genre"), Some("Jazz"));
    }

    #[test]
    fn test_filter_is_exact_and_case_sensitive() {
        let v = venue("Jazz");
        assert!(GenreFilter::All.matches(&v));
        assert!(GenreFilter::from_selection("Jazz").matches(&v));
        assert!(!GenreFilter::from_selection("jazz").matches(&v));
        assert!(!GenreFilter::from_selection("Jaz").matches(&v));
    }

    #[test]
    fn test_all_sentinel_round_trips() {
        assert_eq!(GenreFilter::from_selection("all"), GenreFilter::All);
        assert_eq!(GenreFilter::All.as_selection(), "all");
    }
}
