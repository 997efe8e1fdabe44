use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use super::{ListSink, MapSink};
use crate::domain::map::{InfoPanel, LatLng, ListItem, MarkerHandle};
use crate::domain::venue::{Venue, ALL_GENRES};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerState {
    pub handle: MarkerHandle,
    pub venue_id: u64,
    pub position: LatLng,
    pub title: String,
    pub visible: bool,
    /// Present while the info panel is open
    pub open_panel: Option<InfoPanel>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapSnapshot {
    pub center: LatLng,
    pub zoom: u8,
    pub markers: Vec<MarkerState>,
}

impl MapSnapshot {
    pub fn visible_venue_ids(&self) -> Vec<u64> {
        self.markers
            .iter()
            .filter(|marker| marker.visible)
            .map(|marker| marker.venue_id)
            .collect()
    }

    pub fn marker_for(&self, venue_id: u64) -> Option<&MarkerState> {
        self.markers.iter().find(|marker| marker.venue_id == venue_id)
    }
}

struct BoardState {
    next_handle: u64,
    center: LatLng,
    zoom: u8,
    markers: BTreeMap<MarkerHandle, MarkerState>,
    visibility_changes: u64,
}

/// In-memory map. Clones share the same board.
#[derive(Clone)]
pub struct MarkerBoard {
    inner: Arc<Mutex<BoardState>>,
}

impl MarkerBoard {
    pub fn new(center: LatLng, zoom: u8) -> Self {
        Self {
            inner: Arc::new(Mutex::new(BoardState {
                next_handle: 0,
                center,
                zoom,
                markers: BTreeMap::new(),
                visibility_changes: 0,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> MapSnapshot {
        let state = self.state();
        MapSnapshot {
            center: state.center,
            zoom: state.zoom,
            markers: state.markers.values().cloned().collect(),
        }
    }

    /// Number of `set_visible` calls that actually flipped a marker
    pub fn visibility_changes(&self) -> u64 {
        self.state().visibility_changes
    }
}

impl MapSink for MarkerBoard {
    fn create_marker(&mut self, venue_id: u64, position: LatLng, title: &str) -> MarkerHandle {
        let mut state = self.state();
        let handle = MarkerHandle(state.next_handle);
        state.next_handle += 1;
        state.markers.insert(
            handle,
            MarkerState {
                handle,
                venue_id,
                position,
                title: title.to_string(),
                visible: true,
                open_panel: None,
            },
        );
        handle
    }

    fn set_visible(&mut self, marker: MarkerHandle, visible: bool) {
        let mut state = self.state();
        let changed = match state.markers.get_mut(&marker) {
            Some(entry) if entry.visible != visible => {
                entry.visible = visible;
                true
            }
            _ => false,
        };
        if changed {
            state.visibility_changes += 1;
        }
    }

    fn open_info_panel(&mut self, marker: MarkerHandle, content: &InfoPanel) {
        if let Some(entry) = self.state().markers.get_mut(&marker) {
            entry.open_panel = Some(content.clone());
        }
    }

    fn close_info_panel(&mut self, marker: MarkerHandle) {
        if let Some(entry) = self.state().markers.get_mut(&marker) {
            entry.open_panel = None;
        }
    }

    fn refresh_info_panel(&mut self, marker: MarkerHandle, content: &InfoPanel) {
        if let Some(panel) = self
            .state()
            .markers
            .get_mut(&marker)
            .and_then(|entry| entry.open_panel.as_mut())
        {
            *panel = content.clone();
        }
    }

    fn set_center_and_zoom(&mut self, center: LatLng, zoom: u8) {
        let mut state = self.state();
        state.center = center;
        state.zoom = zoom;
    }

    fn release_marker(&mut self, marker: MarkerHandle) {
        self.state().markers.remove(&marker);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListSnapshot {
    pub items: Vec<ListItem>,
    pub selected_genre: String,
    /// Selector entries, starting with the "All" sentinel
    pub genre_options: Vec<String>,
    pub renders: u64,
}

/// In-memory venue list and genre selector. Clones share state.
#[derive(Clone, Default)]
pub struct VenueListView {
    inner: Arc<Mutex<ListSnapshot>>,
}

impl VenueListView {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ListSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.state().clone()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.state().items.iter().map(|item| item.id).collect()
    }
}

impl ListSink for VenueListView {
    fn render(&mut self, venues: &[&Venue]) {
        let mut state = self.state();
        state.items = venues.iter().map(|venue| ListItem::from(*venue)).collect();
        state.renders += 1;
    }

    fn render_genre_options(&mut self, selected: &str, genres: &[String]) {
        let mut state = self.state();
        state.selected_genre = selected.to_string();
        state.genre_options = std::iter::once(ALL_GENRES.to_string())
            .chain(genres.iter().cloned())
            .collect();
    }
}
