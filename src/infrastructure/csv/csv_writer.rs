// ============================================================
// CSV WRITER
// ============================================================
// Encode an export table as CSV text

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::csv::{ExportTable, RawRow};
use crate::domain::error::{AppError, Result};

/// Writes a header line, then one fully quoted line per row.
#[derive(Default)]
pub struct CsvWriter;

impl CsvWriter {
    pub fn new() -> Self {
        Self
    }

    pub fn encode_table(&self, table: &ExportTable) -> Result<String> {
        self.encode(&table.headers, &table.rows)
    }

    /// Field order follows `headers`, not the row's own key order.
    /// Columns a row lacks are written as `""`.
    pub fn encode(&self, headers: &[String], rows: &[RawRow]) -> Result<String> {
        let mut buffer = Vec::new();

        {
            let mut writer = WriterBuilder::new()
                .quote_style(QuoteStyle::Necessary)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(&mut buffer);
            writer
                .write_record(headers)
                .map_err(|e| AppError::Internal(format!("Failed to write CSV header: {}", e)))?;
            writer.flush()?;
        }

        {
            let mut writer = WriterBuilder::new()
                .quote_style(QuoteStyle::Always)
                .terminator(Terminator::Any(b'\n'))
                .from_writer(&mut buffer);
            for (index, row) in rows.iter().enumerate() {
                let fields = headers
                    .iter()
                    .map(|header| row.get(header).unwrap_or(""));
                writer.write_record(fields).map_err(|e| {
                    AppError::Internal(format!("Failed to write CSV row {}: {}", index + 1, e))
                })?;
            }
            writer.flush()?;
        }

        if buffer.last() == Some(&b'\n') {
            buffer.pop();
        }

        String::from_utf8(buffer)
            .map_err(|e| AppError::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}
