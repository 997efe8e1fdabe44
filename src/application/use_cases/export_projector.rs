// ============================================================
// EXPORT PROJECTOR
// ============================================================
// Rebuild a CSV table from the catalog, keeping unknown input columns

use crate::application::use_cases::venue_catalog::VenueCatalog;
use crate::domain::csv::{ExportTable, RawRow};
use crate::domain::venue::Venue;

/// Columns always written first, from canonical venue fields
pub const CORE_COLUMNS: [&str; 4] = ["latitude", "longitude", "name", "email"];
pub const GENRE_COLUMN: &str = "genre";

/// Header = core columns, extra columns of the first venue's raw row, `genre`.
///
/// Extra columns are discovered from the first record only. Values for them
/// are copied verbatim from each venue's raw row.
pub fn project(catalog: &VenueCatalog) -> ExportTable {
    let mut headers: Vec<String> = CORE_COLUMNS.iter().map(|c| c.to_string()).collect();

    if let Some(first) = catalog.venues().first() {
        headers.extend(
            first
                .raw()
                .keys()
                .filter(|key| !CORE_COLUMNS.contains(key) && *key != GENRE_COLUMN)
                .map(str::to_string),
        );
    }
    headers.push(GENRE_COLUMN.to_string());

    let rows = catalog
        .venues()
        .iter()
        .map(|venue| project_row(venue, &headers))
        .collect();

    ExportTable { headers, rows }
}

fn project_row(venue: &Venue, headers: &[String]) -> RawRow {
    RawRow::from_pairs(headers.iter().map(|header| {
        let value = match header.as_str() {
            "latitude" => venue.latitude().to_string(),
            "longitude" => venue.longitude().to_string(),
            "name" => venue.name().to_string(),
            "email" => venue.email().to_string(),
            GENRE_COLUMN => venue.genre().to_string(),
            other => venue.raw().get(other).unwrap_or_default().to_string(),
        };
        (header.clone(), value)
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::venue_normalizer::normalize;
    use crate::infrastructure::csv::{CsvParser, CsvWriter};

    fn load(csv: &str) -> VenueCatalog {
        let rows = CsvParser::new().parse_content(csv).unwrap();
        let mut catalog = VenueCatalog::new();
        catalog.replace(normalize(rows, 0).venues);
        catalog
    }

    #[test]
    fn test_empty_catalog_headers() {
        let table = project(&VenueCatalog::new());
        assert_eq!(
            table.headers,
            vec!["latitude", "longitude", "name", "email", "genre"]
        );
        assert!(table.rows.is_empty());
    }

    #[test]
    fn test_extra_columns_between_core_and_genre() {
        let catalog = load("lat,lng,name,genre,notes,capacity\n51.5,-0.1,A,Rock,x,200");
        let table = project(&catalog);
        assert_eq!(
            table.headers,
            vec!["latitude", "longitude", "name", "email", "lat", "lng", "notes", "capacity", "genre"]
        );
        let row = &table.rows[0];
        assert_eq!(row.get("notes"), Some("x"));
        assert_eq!(row.get("capacity"), Some("200"));
        assert_eq!(row.get("latitude"), Some("51.5"));
        assert_eq!(row.get("email"), Some(""));
    }

    #[test]
    fn test_core_fields_come_from_canonical_values() {
        let catalog = load("latitude,longitude,name,email\n51.50,-0.10,\"  Spaced  \", a@b.c ");
        let row = &project(&catalog).rows[0];
        assert_eq!(row.get("name"), Some("Spaced"));
        assert_eq!(row.get("email"), Some("a@b.c"));
        assert_eq!(row.get("latitude"), Some("51.5"));
        assert_eq!(row.get("longitude"), Some("-0.1"));
    }

    #[test]
    fn test_edited_genre_is_exported() {
        let mut catalog = load("lat,lng,name,genre\n1,2,A,Rock\n3,4,B,Pop");
        catalog.update_genre(1, "Jazz").unwrap();
        let table = project(&catalog);
        assert_eq!(table.rows[1].get("genre"), Some("Jazz"));
        assert_eq!(table.rows[0].get("genre"), Some("Rock"));
    }

    #[test]
    fn test_zero_coordinate_is_not_blank() {
        let catalog = load("lat,lng\n0,0");
        let row = &project(&catalog).rows[0];
        assert_eq!(row.get("latitude"), Some("0"));
    }

    #[test]
    fn test_round_trip_through_codec() {
        let catalog = load(
            "lat,lng,name,email,genre,notes\n51.5,-0.1,\"Bar \"\"X\"\"\",x@y.z,Jazz,\"a, b\"\n40.7,-74,Club,,Rock,",
        );
        let table = project(&catalog);
        let text = CsvWriter::new().encode_table(&table).unwrap();
        let decoded = CsvParser::new().parse_content(&text).unwrap();

        assert_eq!(decoded.len(), 2);
        for (row, venue) in decoded.iter().zip(catalog.venues()) {
            assert_eq!(row.get("latitude"), Some(venue.latitude().to_string().as_str()));
            assert_eq!(row.get("longitude"), Some(venue.longitude().to_string().as_str()));
            assert_eq!(row.get("name"), Some(venue.name()));
            assert_eq!(row.get("email"), Some(venue.email()));
            assert_eq!(row.get("genre"), Some(venue.genre()));
        }
        assert_eq!(decoded[0].get("notes"), Some("a, b"));
        assert_eq!(decoded[0].get("name"), Some("Bar \"X\""));

        // Re-normalizing the export yields the same canonical values
        let reloaded = normalize(decoded, 0).venues;
        assert_eq!(reloaded[1].longitude(), -74.0);
    }

    #[test]
    fn test_projection_does_not_mutate_catalog() {
        let catalog = load("lat,lng,name\n1,2,A");
        let before = catalog.venues().to_vec();
        let _ = project(&catalog);
        assert_eq!(catalog.venues(), before.as_slice());
    }
}
