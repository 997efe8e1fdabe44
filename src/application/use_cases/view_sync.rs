// ============================================================
// VIEW SYNC
// ============================================================
// Keep the map markers and the venue list showing the same filtered set

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::application::use_cases::venue_catalog::VenueCatalog;
use crate::domain::error::{AppError, Result};
use crate::domain::map::{InfoPanel, LatLng, MarkerHandle, PhotoState};
use crate::domain::venue::{GenreFilter, Venue};
use crate::infrastructure::sinks::{ListSink, MapSink};

struct MarkerEntry {
    handle: MarkerHandle,
    visible: bool,
    panel_open: bool,
    panel: InfoPanel,
}

/// Drives both presentation sinks from the catalog.
///
/// Markers are created once per venue when a catalog is loaded and only
/// toggled afterwards; the list is rebuilt on every render.
pub struct ViewSync {
    map: Box<dyn MapSink>,
    list: Box<dyn ListSink>,
    markers: BTreeMap<u64, MarkerEntry>,
    filter: GenreFilter,
    generation: u64,
}

impl ViewSync {
    pub fn new(map: Box<dyn MapSink>, list: Box<dyn ListSink>) -> Self {
        Self {
            map,
            list,
            markers: BTreeMap::new(),
            filter: GenreFilter::All,
            generation: 0,
        }
    }

    pub fn filter(&self) -> &GenreFilter {
        &self.filter
    }

    /// Catalog generation the current markers belong to
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn center_on(&mut self, center: LatLng, zoom: u8) {
        self.map.set_center_and_zoom(center, zoom);
    }

    /// Full re-render after a catalog replace.
    ///
    /// Every previous marker is hidden, closed and released before the new
    /// set is created. The filter goes back to "All".
    pub fn rebuild(&mut self, catalog: &VenueCatalog) {
        for entry in std::mem::take(&mut self.markers).into_values() {
            if entry.panel_open {
                self.map.close_info_panel(entry.handle);
            }
            if entry.visible {
                self.map.set_visible(entry.handle, false);
            }
            self.map.release_marker(entry.handle);
        }

        for venue in catalog.venues() {
            let handle = self.map.create_marker(
                venue.id(),
                LatLng::new(venue.latitude(), venue.longitude()),
                venue.name(),
            );
            self.markers.insert(
                venue.id(),
                MarkerEntry {
                    handle,
                    visible: true,
                    panel_open: false,
                    panel: InfoPanel::for_venue(venue),
                },
            );
        }

        self.generation = catalog.generation();
        self.filter = GenreFilter::All;
        self.refresh_genres(catalog);
        self.render(catalog);
    }

    pub fn set_filter(&mut self, filter: GenreFilter, catalog: &VenueCatalog) {
        self.filter = filter;
        self.refresh_genres(catalog);
        self.render(catalog);
    }

    /// Re-render after a genre edit. The filter selection is kept.
    pub fn after_edit(&mut self, catalog: &VenueCatalog) {
        self.refresh_genres(catalog);
        self.render(catalog);
    }

    /// Show exactly the venues matching the current filter.
    pub fn render(&mut self, catalog: &VenueCatalog) -> Vec<u64> {
        let visible = catalog.filter(&self.filter);
        let visible_ids: HashSet<u64> = visible.iter().map(|venue| venue.id()).collect();

        for (venue_id, entry) in self.markers.iter_mut() {
            let show = visible_ids.contains(venue_id);
            if show != entry.visible {
                self.map.set_visible(entry.handle, show);
                entry.visible = show;
            }
            if !show && entry.panel_open {
                self.map.close_info_panel(entry.handle);
                entry.panel_open = false;
            }
        }

        self.list.render(&visible);
        visible.iter().map(|venue| venue.id()).collect()
    }

    fn refresh_genres(&mut self, catalog: &VenueCatalog) {
        self.list
            .render_genre_options(self.filter.as_selection(), &catalog.distinct_genres());
    }

    pub fn open_marker(&mut self, venue_id: u64) -> Result<()> {
        let entry = self
            .markers
            .get_mut(&venue_id)
            .ok_or_else(|| AppError::NotFound(format!("No marker for venue {}", venue_id)))?;
        self.map.open_info_panel(entry.handle, &entry.panel);
        entry.panel_open = true;
        Ok(())
    }

    /// The list's "zoom to" action
    pub fn zoom_to(&mut self, venue: &Venue, zoom: u8) -> Result<()> {
        self.map
            .set_center_and_zoom(LatLng::new(venue.latitude(), venue.longitude()), zoom);
        self.open_marker(venue.id())
    }

    /// Deliver a finished photo lookup. Results from an older generation are
    /// dropped; returns whether the result was applied.
    pub fn apply_photos(&mut self, generation: u64, venue_id: u64, photos: PhotoState) -> bool {
        if generation != self.generation {
            debug!(
                venue_id,
                generation,
                current = self.generation,
                "Ignoring photo result for a replaced catalog"
            );
            return false;
        }

        let Some(entry) = self.markers.get_mut(&venue_id) else {
            return false;
        };

        entry.panel.set_photos(photos);
        if entry.panel_open {
            self.map.refresh_info_panel(entry.handle, &entry.panel);
        }
        true
    }

    pub fn panel(&self, venue_id: u64) -> Option<&InfoPanel> {
        self.markers.get(&venue_id).map(|entry| &entry.panel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::venue_normalizer::normalize;
    use crate::domain::csv::RawRow;
    use crate::infrastructure::sinks::{MarkerBoard, VenueListView};

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

    fn view() -> (ViewSync, MarkerBoard, VenueListView) {
        let board = MarkerBoard::new(LatLng::new(51.5074, -0.1278), 13);
        let list = VenueListView::new();
        let sync = ViewSync::new(Box::new(board.clone()), Box::new(list.clone()));
        (sync, board, list)
    }

    #[test]
    fn test_rebuild_shows_everything() {
        let catalog = catalog(&["Rock", "Jazz", ""]);
        let (mut sync, board, list) = view();
        sync.rebuild(&catalog);

        assert_eq!(board.snapshot().visible_venue_ids(), vec![0, 1, 2]);
        assert_eq!(list.ids(), vec![0, 1, 2]);
        assert_eq!(list.snapshot().genre_options, vec!["all", "Jazz", "Rock"]);
    }

    #[test]
    fn test_filter_toggles_markers_without_recreating() {
        let catalog = catalog(&["Rock", "Jazz", "Rock"]);
        let (mut sync, board, list) = view();
        sync.rebuild(&catalog);
        let handles_before: Vec<_> = board.snapshot().markers.iter().map(|m| m.handle).collect();

        sync.set_filter(GenreFilter::from_selection("Rock"), &catalog);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.visible_venue_ids(), vec![0, 2]);
        assert_eq!(
            snapshot.markers.iter().map(|m| m.handle).collect::<Vec<_>>(),
            handles_before
        );
        assert_eq!(list.ids(), vec![0, 2]);
        assert_eq!(list.snapshot().selected_genre, "Rock");
    }

    #[test]
    fn test_hiding_closes_open_panel() {
        let catalog = catalog(&["Rock", "Jazz"]);
        let (mut sync, board, _list) = view();
        sync.rebuild(&catalog);
        sync.open_marker(1).unwrap();
        assert!(board.snapshot().marker_for(1).unwrap().open_panel.is_some());

        sync.set_filter(GenreFilter::from_selection("Rock"), &catalog);
        assert!(board.snapshot().marker_for(1).unwrap().open_panel.is_none());
    }

    #[test]
    fn test_edit_keeps_filter_and_only_touches_edited_venue() {
        let mut catalog = catalog(&["Rock", "Rock", "Jazz"]);
        let (mut sync, board, list) = view();
        sync.rebuild(&catalog);
        sync.set_filter(GenreFilter::from_selection("Rock"), &catalog);
        let changes_before = board.visibility_changes();

        catalog.update_genre(1, "Jazz").unwrap();
        sync.after_edit(&catalog);

        assert_eq!(sync.filter(), &GenreFilter::from_selection("Rock"));
        assert_eq!(board.snapshot().visible_venue_ids(), vec![0]);
        assert_eq!(board.visibility_changes(), changes_before + 1);
        assert_eq!(list.ids(), vec![0]);

        catalog.update_genre(2, "Rock").unwrap();
        sync.after_edit(&catalog);
        assert_eq!(board.snapshot().visible_venue_ids(), vec![0, 2]);
        assert_eq!(list.snapshot().genre_options, vec!["all", "Jazz", "Rock"]);
    }

    #[test]
    fn test_rebuild_releases_old_markers() {
        let mut catalog = catalog(&["Rock", "Jazz"]);
        let (mut sync, board, _list) = view();
        sync.rebuild(&catalog);
        sync.open_marker(0).unwrap();
        let old_handles: Vec<_> = board.snapshot().markers.iter().map(|m| m.handle).collect();

        catalog.replace(normalize(vec![RawRow::from_pairs([("lat", "9"), ("lng", "9")])], 0).venues);
        sync.rebuild(&catalog);

        let snapshot = board.snapshot();
        assert_eq!(snapshot.markers.len(), 1);
        assert!(snapshot
            .markers
            .iter()
            .all(|m| !old_handles.contains(&m.handle)));
    }

    #[test]
    fn test_stale_photo_result_is_ignored() {
        let mut catalog = catalog(&["Rock"]);
        let (mut sync, _board, _list) = view();
        sync.rebuild(&catalog);
        let old_generation = sync.generation();

        catalog.replace(normalize(vec![RawRow::from_pairs([("lat", "1"), ("lng", "1")])], 0).venues);
        sync.rebuild(&catalog);

        let applied = sync.apply_photos(old_generation, 0, PhotoState::Found(vec!["u".into()]));
        assert!(!applied);
        assert_eq!(sync.panel(0).unwrap().photos(), &PhotoState::Loading);
    }

    #[test]
    fn test_photo_result_updates_open_panel() {
        let catalog = catalog(&["Rock"]);
        let (mut sync, board, _list) = view();
        sync.rebuild(&catalog);
        sync.open_marker(0).unwrap();

        let generation = sync.generation();
        assert!(sync.apply_photos(generation, 0, PhotoState::NotFound));
        let panel = board.snapshot().marker_for(0).unwrap().open_panel.clone().unwrap();
        assert_eq!(panel.photos(), &PhotoState::NotFound);
        assert_eq!(panel.photo_caption(), Some("No photos found."));
    }

    #[test]
    fn test_zoom_to_centers_and_opens() {
        let catalog = catalog(&["Rock", "Jazz"]);
        let (mut sync, board, _list) = view();
        sync.rebuild(&catalog);

        let venue = catalog.find_by_id(1).unwrap();
        sync.zoom_to(venue, 16).unwrap();

        let snapshot = board.snapshot();
        assert_eq!(snapshot.zoom, 16);
        assert_eq!(snapshot.center, LatLng::new(1.0, 0.0));
        assert!(snapshot.marker_for(1).unwrap().open_panel.is_some());
    }

    #[test]
    fn test_open_unknown_marker() {
        let (mut sync, _board, _list) = view();
        assert!(matches!(sync.open_marker(3), Err(AppError::NotFound(_))));
    }
}
