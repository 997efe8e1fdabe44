use std::sync::{Arc, Mutex};

use tracing::{error, info};

use crate::application::{SharedVenueSession, VenueSession, ViewSync};
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::places::{GooglePlacesClient, PhotoLookup, UnavailablePhotoLookup};
use crate::infrastructure::sinks::{MarkerBoard, VenueListView};
use crate::infrastructure::source::{CsvSource, CsvSourceLoader};
use crate::interfaces::http::{add_log, HttpState, LogEntry};

/// Build the session and sinks, then load the configured CSV.
///
/// A failed initial load is reported once and leaves an empty catalog; the
/// service still starts so the user can upload or reload.
pub async fn setup(config: AppConfig) -> HttpState {
    let logs: Arc<Mutex<Vec<LogEntry>>> = Arc::new(Mutex::new(Vec::new()));

    let map = MarkerBoard::new(config.map.default_center(), config.map.default_zoom);
    let list = VenueListView::new();
    let view = ViewSync::new(Box::new(map.clone()), Box::new(list.clone()));

    let session = SharedVenueSession::new(
        VenueSession::new(view, &config.map),
        CsvSourceLoader::new(),
        photo_lookup(&config, &logs),
        config.places.max_concurrent_lookups,
    );

    let source = CsvSource::from_location(&config.csv_source);
    match session.load(source.clone()).await {
        Ok(report) => add_log(
            &logs,
            "INFO",
            "Catalog",
            &format!(
                "Loaded {} venues from {} ({} rows without coordinates skipped)",
                report.venues,
                source.describe(),
                report.dropped
            ),
        ),
        Err(err) => {
            error!(error = %err, source = %source.describe(), "Initial CSV load failed");
            add_log(
                &logs,
                "ERROR",
                "Catalog",
                &format!("Error loading CSV: {}", err),
            );
        }
    }

    HttpState {
        session,
        map,
        list,
        config,
        logs,
    }
}

fn photo_lookup(config: &AppConfig, logs: &Arc<Mutex<Vec<LogEntry>>>) -> Arc<dyn PhotoLookup> {
    match config.places.api_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            info!(base_url = %config.places.base_url, "Using Google Places for venue photos");
            Arc::new(GooglePlacesClient::new(key.to_string(), &config.places))
        }
        _ => {
            add_log(
                logs,
                "WARN",
                "Places",
                "No Places API key configured; venue photos are disabled",
            );
            Arc::new(UnavailablePhotoLookup)
        }
    }
}
