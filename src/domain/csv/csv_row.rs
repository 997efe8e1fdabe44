// ============================================================
// CSV ROW TYPES
// ============================================================
// Header-ordered row mappings and the export table built from them

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One parsed CSV line, keyed by header name.
///
/// Keys keep the insertion order of the header line so that export can
/// reproduce columns the catalog never interprets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: Vec<(String, String)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a row from `(name, value)` pairs. A repeated name overwrites the
    /// earlier value but keeps the earlier position.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new();
        for (name, value) in pairs {
            row.set(name, value);
        }
        row
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(key, _)| *key == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(key, _)| key.as_str())
    }
}

impl Serialize for RawRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Column schema plus rows, ready to be encoded as CSV
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportTable {
    /// Output column order
    pub headers: Vec<String>,

    /// One mapping per venue; columns missing from a row encode as empty
    pub rows: Vec<RawRow>,
}
