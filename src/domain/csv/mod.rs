// ============================================================
// CSV DOMAIN LAYER
// ============================================================
// Row mappings as parsed from venue CSV input and as projected for export
// No I/O, no async

mod csv_row;

pub use csv_row::{ExportTable, RawRow};
