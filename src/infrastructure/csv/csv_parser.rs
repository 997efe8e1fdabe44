// ============================================================
// CSV PARSER
// ============================================================
// Decode venue CSV text into header-keyed row mappings

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::domain::csv::RawRow;
use crate::domain::error::{AppError, Result};

/// CSV parser producing one `RawRow` per non-empty data line
pub struct CsvParser {
    /// Delimiter character (default: comma)
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvParser {
    /// Create a new CSV parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode raw bytes (uploaded file or HTTP body) into text.
    ///
    /// A BOM picks the encoding; otherwise UTF-8 is tried first and
    /// windows-1252 is the fallback, so the result is always usable text.
    pub fn decode_bytes(bytes: &[u8]) -> String {
        if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
            let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
            return text.into_owned();
        }

        match std::str::from_utf8(bytes) {
            Ok(text) => text.to_string(),
            Err(_) => {
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                text.into_owned()
            }
        }
    }

    /// Parse CSV content. The first line is the header.
    pub fn parse_content(&self, content: &str) -> Result<Vec<RawRow>> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        check_quoting(content, self.delimiter)?;

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(Trim::None)
            .flexible(true) // Allow rows with different lengths
            .from_reader(content.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| AppError::ParseError(format!("Failed to read CSV headers: {}", e)))?
            .clone();

        let mut rows = Vec::new();
        for (index, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                AppError::ParseError(format!("Failed to parse CSV row {}: {}", index + 1, e))
            })?;

            if is_blank(&record) {
                continue;
            }

            if record.len() > headers.len() {
                debug!(
                    row = index + 1,
                    extra = record.len() - headers.len(),
                    "Ignoring fields beyond the header"
                );
            }

            rows.push(Self::parse_row(&headers, &record));
        }

        Ok(rows)
    }

    /// Map one record onto the header. Short records fill with empty strings.
    fn parse_row(headers: &StringRecord, record: &StringRecord) -> RawRow {
        RawRow::from_pairs(
            headers
                .iter()
                .enumerate()
                .map(|(idx, header)| (header, record.get(idx).unwrap_or(""))),
        )
    }
}

fn is_blank(record: &StringRecord) -> bool {
    record.len() == 0 || (record.len() == 1 && record[0].is_empty())
}

#[derive(Clone, Copy, PartialEq)]
enum QuoteScan {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Reject malformed quoting up front; the csv reader itself is lenient.
///
/// A quoted field must be closed before end of input, and its closing quote
/// must be followed by a delimiter, a line break, or end of input.
fn check_quoting(content: &str, delimiter: u8) -> Result<()> {
    let delimiter = delimiter as char;
    let mut state = QuoteScan::FieldStart;
    let mut line = 1usize;
    let mut opened_on = 1usize;

    for ch in content.chars() {
        state = match (state, ch) {
            (QuoteScan::FieldStart, '"') => {
                opened_on = line;
                QuoteScan::Quoted
            }
            (QuoteScan::FieldStart | QuoteScan::Unquoted, c) if c == delimiter => {
                QuoteScan::FieldStart
            }
            (QuoteScan::FieldStart | QuoteScan::Unquoted, '\r' | '\n') => QuoteScan::FieldStart,
            (QuoteScan::FieldStart | QuoteScan::Unquoted, _) => QuoteScan::Unquoted,
            (QuoteScan::Quoted, '"') => QuoteScan::QuoteInQuoted,
            (QuoteScan::Quoted, _) => QuoteScan::Quoted,
            (QuoteScan::QuoteInQuoted, '"') => QuoteScan::Quoted,
            (QuoteScan::QuoteInQuoted, c) if c == delimiter => QuoteScan::FieldStart,
            (QuoteScan::QuoteInQuoted, '\r' | '\n') => QuoteScan::FieldStart,
            (QuoteScan::QuoteInQuoted, c) => {
                return Err(AppError::ParseError(format!(
                    "Unexpected character {:?} after closing quote on line {}",
                    c, line
                )));
            }
        };

        if ch == '\n' {
            line += 1;
        }
    }

    if state == QuoteScan::Quoted {
        return Err(AppError::ParseError(format!(
            "Unterminated quoted field starting on line {}",
            opened_on
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_csv() {
        let content = "name,lat,lng\nAlice,51.5,-0.1\nBob,40.7,-74.0";
        let rows = CsvParser::new().parse_content(content).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Alice"));
        assert_eq!(rows[1].get("lng"), Some("-74.0"));
        assert_eq!(rows[0].keys().collect::<Vec<_>>(), vec!["name", "lat", "lng"]);
    }

    #[test]
    fn test_skips_empty_lines() {
        let content = "name,genre\n\nA,Rock\n\n\nB,Jazz\n";
        let rows = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get("genre"), Some("Jazz"));
    }

    #[test]
    fn test_quoted_fields_and_doubled_quotes() {
        let content = "name,notes\n\"Smith, J\",\"said \"\"hi\"\"\"\n\"multi\nline\",x";
        let rows = CsvParser::new().parse_content(content).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get("name"), Some("Smith, J"));
        assert_eq!(rows[0].get("notes"), Some("said \"hi\""));
        assert_eq!(rows[1].get("name"), Some("multi\nline"));
    }

    #[test]
    fn test_short_rows_fill_with_empty() {
        let rows = CsvParser::new().parse_content("a,b,c\n1").unwrap();
        assert_eq!(rows[0].get("a"), Some("1"));
        assert_eq!(rows[0].get("c"), Some(""));
    }

    #[test]
    fn test_values_are_not_trimmed() {
        let rows = CsvParser::new().parse_content("name\n  padded  ").unwrap();
        assert_eq!(rows[0].get("name"), Some("  padded  "));
    }

    #[test]
    fn test_unterminated_quote_is_parse_error() {
        let err = CsvParser::new()
            .parse_content("name,notes\nA,\"open")
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(msg) if msg.contains("line 2")));
    }

    #[test]
    fn test_garbage_after_closing_quote_is_parse_error() {
        let err = CsvParser::new()
            .parse_content("name\n\"A\"b")
            .unwrap_err();
        assert!(matches!(err, AppError::ParseError(_)));
    }

    #[test]
    fn test_empty_input_yields_no_rows() {
        assert!(CsvParser::new().parse_content("").unwrap().is_empty());
        assert!(CsvParser::new().parse_content("name,genre\n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_bytes_strips_bom_and_falls_back() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"name\nA");
        assert_eq!(CsvParser::decode_bytes(&bytes), "name\nA");

        // 0xE9 is 'é' in windows-1252 and invalid as standalone UTF-8
        assert_eq!(CsvParser::decode_bytes(b"caf\xE9"), "café");
    }
}
