pub mod error;
pub mod map;
pub mod venue;

// Raw CSV rows and export tables
pub mod csv;
