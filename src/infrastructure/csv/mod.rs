// ============================================================
// CSV INFRASTRUCTURE LAYER
// ============================================================
// CSV decoding, byte-encoding detection, and export encoding

mod csv_parser;
mod csv_writer;

pub use csv_parser::CsvParser;
pub use csv_writer::CsvWriter;
