//! Presentation sinks
//!
//! The map and the list are external collaborators. These traits are the
//! only way the view synchronizer talks to them; `memory` holds the
//! in-process implementations served over HTTP.

pub mod memory;

use crate::domain::map::{InfoPanel, LatLng, MarkerHandle};
use crate::domain::venue::Venue;

pub use memory::{MapSnapshot, MarkerBoard, VenueListView};

pub trait MapSink: Send {
    fn create_marker(&mut self, venue_id: u64, position: LatLng, title: &str) -> MarkerHandle;

    fn set_visible(&mut self, marker: MarkerHandle, visible: bool);

    fn open_info_panel(&mut self, marker: MarkerHandle, content: &InfoPanel);

    fn close_info_panel(&mut self, marker: MarkerHandle);

    /// Replace the content of a panel in place. Unknown handles are ignored.
    fn refresh_info_panel(&mut self, marker: MarkerHandle, content: &InfoPanel);

    fn set_center_and_zoom(&mut self, center: LatLng, zoom: u8);

    /// Drop a marker for good. The handle is invalid afterwards.
    fn release_marker(&mut self, marker: MarkerHandle);
}

pub trait ListSink: Send {
    /// Rebuild the whole list from `venues`, in the given order.
    fn render(&mut self, venues: &[&Venue]);

    /// Rebuild the genre selector: the "All" entry followed by `genres`.
    fn render_genre_options(&mut self, selected: &str, genres: &[String]);
}
