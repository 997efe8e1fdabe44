pub mod export_projector;
pub mod venue_catalog;
pub mod venue_normalizer;
pub mod venue_session;
pub mod view_sync;
