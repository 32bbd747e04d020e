//! Reference table of reporting standards.
//!
//! The table is read once from a CSV file at startup and shared read-only
//! between requests. Header names are tolerant: surrounding whitespace is
//! ignored, "Standards" is accepted for "Standard", and any header beginning
//! with "publication" stands in for "Publication Date".

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::TableError;
use crate::model::StandardRecord;

const STANDARD: &str = "Standard";
const STANDARDS: &str = "Standards";
const PUBLICATION_DATE: &str = "Publication Date";
const TFIDF_KEYWORDS: &str = "TFIDF Keywords";
const CONTEXTUAL_KEYWORDS: &str = "Contextual Keywords";

#[derive(Debug, Default, Clone)]
pub struct ReferenceTable {
    names: Vec<String>,
    records: HashMap<String, StandardRecord>,
}

/// Column positions resolved from the header row. `None` columns read as "".
#[derive(Debug, Default, PartialEq, Eq)]
struct ColumnMap {
    standard: Option<usize>,
    publication_date: Option<usize>,
    tfidf_keywords: Option<usize>,
    contextual_keywords: Option<usize>,
}

impl ColumnMap {
    fn resolve(headers: &[String]) -> Self {
        let exact = |name: &str| headers.iter().position(|h| h == name);

        let standard = exact(STANDARD).or_else(|| exact(STANDARDS));
        let publication_date = exact(PUBLICATION_DATE).or_else(|| {
            headers
                .iter()
                .position(|h| h.to_lowercase().starts_with("publication"))
        });

        ColumnMap {
            standard,
            publication_date,
            tfidf_keywords: exact(TFIDF_KEYWORDS),
            contextual_keywords: exact(CONTEXTUAL_KEYWORDS),
        }
    }
}

fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}

fn cell(record: &csv::StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

impl ReferenceTable {
    pub fn load(path: &Path) -> Result<Self, TableError> {
        let file = File::open(path).map_err(|source| TableError::Open {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            standards = table.len(),
            "loaded reference table"
        );
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, TableError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .has_headers(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(normalize_header).collect();
        let columns = ColumnMap::resolve(&headers);
        if columns.standard.is_none() {
            tracing::warn!(?headers, "reference table has no Standard column");
        }

        let mut records = HashMap::new();
        for row in reader.records() {
            let row = row?;
            let name = cell(&row, columns.standard);
            if name.is_empty() {
                continue;
            }
            if records.contains_key(&name) {
                tracing::warn!(standard = %name, "duplicate standard row ignored");
                continue;
            }

            let record = StandardRecord {
                name: name.clone(),
                publication_date: cell(&row, columns.publication_date),
                tfidf_keywords: cell(&row, columns.tfidf_keywords),
                contextual_keywords: cell(&row, columns.contextual_keywords),
            };
            records.insert(name, record);
        }

        let mut names: Vec<String> = records.keys().cloned().collect();
        names.sort();

        Ok(ReferenceTable { names, records })
    }

    /// Sorted, deduplicated standard names for the selection control.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Exact, case-sensitive match on the trimmed name.
    pub fn lookup(&self, name: &str) -> Option<&StandardRecord> {
        self.records.get(name.trim())
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
