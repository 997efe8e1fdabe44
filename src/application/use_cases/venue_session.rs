// ============================================================
// VENUE SESSION
// ============================================================
// Single owner of catalog + views; every mutation and its re-render happen
// under one lock so observers never see a half-applied change

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::application::use_cases::export_projector::project;
use crate::application::use_cases::venue_catalog::VenueCatalog;
use crate::application::use_cases::venue_normalizer::{normalize, NormalizedBatch};
use crate::application::use_cases::view_sync::ViewSync;
use crate::domain::csv::ExportTable;
use crate::domain::error::{AppError, Result};
use crate::domain::map::{InfoPanel, LatLng, PhotoState};
use crate::domain::venue::{GenreFilter, Venue};
use crate::infrastructure::config::MapConfig;
use crate::infrastructure::csv::{CsvParser, CsvWriter};
use crate::infrastructure::places::PhotoLookup;
use crate::infrastructure::source::{CsvSource, CsvSourceLoader};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    pub generation: u64,
    pub venues: usize,
    pub dropped: usize,
}

/// What the edit dialog shows for one venue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditTarget {
    pub id: u64,
    pub name: String,
    pub genre: String,
}

/// Photo lookup to run for one venue of one catalog generation
#[derive(Debug, Clone)]
pub struct PhotoRequest {
    pub generation: u64,
    pub venue_id: u64,
    pub name: String,
    pub position: LatLng,
}

pub struct VenueSession {
    catalog: VenueCatalog,
    view: ViewSync,
    focus_zoom: u8,
}

impl VenueSession {
    pub fn new(mut view: ViewSync, map: &MapConfig) -> Self {
        view.center_on(map.default_center(), map.default_zoom);
        Self {
            catalog: VenueCatalog::new(),
            view,
            focus_zoom: map.focus_zoom,
        }
    }

    pub fn catalog(&self) -> &VenueCatalog {
        &self.catalog
    }

    pub fn filter(&self) -> &GenreFilter {
        self.view.filter()
    }

    /// Swap the catalog and fully re-render both views.
    pub fn replace(&mut self, batch: NormalizedBatch) -> LoadReport {
        let generation = self.catalog.replace(batch.venues);
        self.view.rebuild(&self.catalog);
        LoadReport {
            generation,
            venues: self.catalog.len(),
            dropped: batch.dropped,
        }
    }

    /// One photo request per marker of the current generation
    pub fn photo_requests(&self) -> Vec<PhotoRequest> {
        let generation = self.catalog.generation();
        self.catalog
            .venues()
            .iter()
            .map(|venue| PhotoRequest {
                generation,
                venue_id: venue.id(),
                name: venue.name().to_string(),
                position: LatLng::new(venue.latitude(), venue.longitude()),
            })
            .collect()
    }

    /// Apply a selector value (`"all"` or an exact genre). Returns visible ids.
    pub fn set_filter(&mut self, selection: &str) -> Vec<u64> {
        self.view
            .set_filter(GenreFilter::from_selection(selection), &self.catalog);
        self.visible_ids()
    }

    pub fn visible_ids(&self) -> Vec<u64> {
        self.catalog
            .filter(self.view.filter())
            .iter()
            .map(|venue| venue.id())
            .collect()
    }

    pub fn genres(&self) -> Vec<String> {
        self.catalog.distinct_genres()
    }

    pub fn begin_edit(&self, id: u64) -> Result<EditTarget> {
        let venue = self
            .catalog
            .find_by_id(id)
            .ok_or(AppError::EditTargetMissing(id))?;
        Ok(EditTarget {
            id,
            name: venue.name().to_string(),
            genre: venue.genre().to_string(),
        })
    }

    /// Trim the submitted genre, store it, and re-render with the current filter.
    pub fn edit_genre(&mut self, id: u64, genre: &str) -> Result<Venue> {
        let venue = self.catalog.update_genre(id, genre.trim())?.clone();
        self.view.after_edit(&self.catalog);
        info!(venue_id = id, genre = %venue.genre(), "Venue genre updated");
        Ok(venue)
    }

    pub fn zoom_to(&mut self, id: u64) -> Result<()> {
        let venue = self
            .catalog
            .find_by_id(id)
            .ok_or_else(|| AppError::NotFound(format!("Venue {} not found", id)))?;
        self.view.zoom_to(venue, self.focus_zoom)
    }

    pub fn open_marker(&mut self, id: u64) -> Result<()> {
        self.view.open_marker(id)
    }

    pub fn info_panel(&self, id: u64) -> Option<&InfoPanel> {
        self.view.panel(id)
    }

    pub fn apply_photos(
        &mut self,
        generation: u64,
        venue_id: u64,
        result: Result<Vec<String>>,
    ) -> bool {
        self.view
            .apply_photos(generation, venue_id, PhotoState::from_lookup(result))
    }

    pub fn export(&self) -> ExportTable {
        project(&self.catalog)
    }

    pub fn export_csv(&self) -> Result<String> {
        CsvWriter::new().encode_table(&self.export())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Cloneable handle around a `VenueSession` that also owns source loading
/// and the photo lookup tasks.
#[derive(Clone)]
pub struct SharedVenueSession {
    inner: Arc<Mutex<VenueSession>>,
    loader: Arc<CsvSourceLoader>,
    photos: Arc<dyn PhotoLookup>,
    lookup_slots: Arc<Semaphore>,
    lookups: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SharedVenueSession {
    pub fn new(
        session: VenueSession,
        loader: CsvSourceLoader,
        photos: Arc<dyn PhotoLookup>,
        max_concurrent_lookups: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
            loader: Arc::new(loader),
            photos,
            lookup_slots: Arc::new(Semaphore::new(max_concurrent_lookups.max(1))),
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut VenueSession) -> R) -> R {
        f(&mut lock(&self.inner))
    }

    /// Read presentation state between mutations.
    ///
    /// Sinks are only written while the session lock is held, so `read`
    /// sees either the whole previous view or the whole new one.
    pub fn observe<R>(&self, read: impl FnOnce() -> R) -> R {
        let _session = lock(&self.inner);
        read()
    }

    /// Read, parse and normalize `source`, then replace the catalog.
    ///
    /// Nothing changes on failure: the previous catalog stays visible.
    pub async fn load(&self, source: CsvSource) -> Result<LoadReport> {
        let text = self.loader.read_text(&source).await?;
        let rows = CsvParser::new().parse_content(&text)?;
        let batch = normalize(rows, 0);

        let mut session = lock(&self.inner);
        let report = session.replace(batch);
        self.restart_lookups(session.photo_requests());
        drop(session);

        info!(
            source = %source.describe(),
            venues = report.venues,
            dropped = report.dropped,
            generation = report.generation,
            "Venues loaded"
        );
        Ok(report)
    }

    /// Abort lookups of the previous catalog and start one per new venue.
    fn restart_lookups(&self, requests: Vec<PhotoRequest>) {
        let mut lookups = lock(&self.lookups);
        for handle in lookups.drain(..) {
            handle.abort();
        }

        for request in requests {
            let session = Arc::clone(&self.inner);
            let photos = Arc::clone(&self.photos);
            let slots = Arc::clone(&self.lookup_slots);

            lookups.push(tokio::spawn(async move {
                let Ok(_permit) = slots.acquire_owned().await else {
                    return;
                };

                let result = photos.lookup_photos(&request.name, request.position).await;
                if let Err(err) = &result {
                    warn!(venue_id = request.venue_id, error = %err, "Photo lookup failed");
                }

                lock(&session).apply_photos(request.generation, request.venue_id, result);
            }));
        }
    }

    /// Wait until every photo lookup started so far has finished.
    pub async fn settle_lookups(&self) {
        let handles: Vec<JoinHandle<()>> = lock(&self.lookups).drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    pub fn set_filter(&self, selection: &str) -> Vec<u64> {
        self.with(|session| session.set_filter(selection))
    }

    pub fn edit_genre(&self, id: u64, genre: &str) -> Result<Venue> {
        self.with(|session| session.edit_genre(id, genre))
    }

    pub fn begin_edit(&self, id: u64) -> Result<EditTarget> {
        self.with(|session| session.begin_edit(id))
    }

    pub fn zoom_to(&self, id: u64) -> Result<()> {
        self.with(|session| session.zoom_to(id))
    }

    pub fn open_marker(&self, id: u64) -> Result<()> {
        self.with(|session| session.open_marker(id))
    }

    pub fn genres(&self) -> Vec<String> {
        self.with(|session| session.genres())
    }

    pub fn export_csv(&self) -> Result<String> {
        self.with(|session| session.export_csv())
    }
}
