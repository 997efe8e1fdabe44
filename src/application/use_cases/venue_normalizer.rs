// ============================================================
// VENUE NORMALIZER
// ============================================================
// Turn loosely shaped CSV rows into canonical venue records

use tracing::debug;

use crate::domain::csv::RawRow;
use crate::domain::venue::Venue;

const LATITUDE_FIELDS: [&str; 2] = ["latitude", "lat"];
const LONGITUDE_FIELDS: [&str; 2] = ["longitude", "lng"];
const COMBINED_FIELD: &str = "latlng";

/// Outcome of normalizing one batch of rows
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedBatch {
    pub venues: Vec<Venue>,
    pub dropped: usize,
}

/// Convert rows into venues with sequential ids from `start_index`.
///
/// Rows whose coordinates do not both resolve to finite numbers are left
/// out without error and do not consume an id.
pub fn normalize(rows: Vec<RawRow>, start_index: u64) -> NormalizedBatch {
    let mut venues = Vec::with_capacity(rows.len());
    let mut dropped = 0;
    let mut next_id = start_index;

    for (row_number, raw) in rows.into_iter().enumerate() {
        let Some((latitude, longitude)) = resolve_coordinates(&raw) else {
            debug!(row = row_number + 1, "Dropping row without usable coordinates");
            dropped += 1;
            continue;
        };

        let name = trimmed(&raw, "name");
        let email = trimmed(&raw, "email");
        let genre = trimmed(&raw, "genre");

        match Venue::new(next_id, latitude, longitude, name, email, genre, raw) {
            Some(venue) => {
                venues.push(venue);
                next_id += 1;
            }
            None => dropped += 1,
        }
    }

    NormalizedBatch { venues, dropped }
}

fn trimmed(raw: &RawRow, field: &str) -> String {
    raw.get(field).map(str::trim).unwrap_or_default().to_string()
}

fn resolve_coordinates(raw: &RawRow) -> Option<(f64, f64)> {
    let combined = first_present(raw, &[COMBINED_FIELD]).map(|value| value.split(','));
    let (combined_lat, combined_lng) = match combined {
        Some(mut parts) => (parts.next(), parts.next()),
        None => (None, None),
    };

    let latitude = first_present(raw, &LATITUDE_FIELDS).or(combined_lat)?;
    let longitude = first_present(raw, &LONGITUDE_FIELDS).or(combined_lng)?;

    Some((parse_coordinate(latitude)?, parse_coordinate(longitude)?))
}

/// First field in priority order whose value is not blank
fn first_present<'a>(raw: &'a RawRow, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .filter_map(|field| raw.get(field))
        .find(|value| !value.trim().is_empty())
}

fn parse_coordinate(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|number| number.is_finite())
}
