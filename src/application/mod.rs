pub mod use_cases;

pub use use_cases::export_projector::project;
pub use use_cases::venue_catalog::VenueCatalog;
pub use use_cases::venue_normalizer::normalize;
pub use use_cases::venue_session::{SharedVenueSession, VenueSession};
pub use use_cases::view_sync::ViewSync;
