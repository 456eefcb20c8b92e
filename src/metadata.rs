//src/metadata.rs

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use ahash::AHashMap;

use crate::error::ReportError;

/// Default name of the metadata column holding run accessions.
pub const DEFAULT_RUN_COLUMN: &str = "run_accession";

/// One metadata row: the run identifier plus every column as text.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleMetadata {
    pub run_id: String,
    fields: AHashMap<String, String>,
}

impl SampleMetadata {
    pub fn new(run_id: impl Into<String>, fields: AHashMap<String, String>) -> Self {
        Self {
            run_id: run_id.into(),
            fields,
        }
    }

    /// Value of `field` for this sample.
    ///
    /// Fails with `ColumnNotFound` if the metadata file has no such column.
    pub fn get(&self, field: &str) -> Result<&str, ReportError> {
        self.fields
            .get(field)
            .map(String::as_str)
            .ok_or_else(|| ReportError::ColumnNotFound {
                column: field.to_string(),
            })
    }

}

/// A parsed metadata file.
#[derive(Debug, Clone, PartialEq)]
pub struct MetadataTable {
    /// Column names in file order.
    pub header: Vec<String>,
    pub run_column: String,
    pub rows: Vec<SampleMetadata>,
}

impl MetadataTable {
    pub fn has_column(&self, field: &str) -> bool {
        self.header.iter().any(|h| h == field)
    }

    /// Checks that a report may reference `field`.
    pub fn require_column(&self, field: &str) -> Result<(), ReportError> {
        if self.has_column(field) {
            Ok(())
        } else {
            Err(ReportError::ColumnNotFound {
                column: field.to_string(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Loads a tab-separated metadata file with a header row.
///
/// Values are kept verbatim as text: no quoting rules, no numeric parsing,
/// so accessions like `000123` survive untouched.
pub fn load_metadata<P: AsRef<Path>>(path: P, run_column: &str) -> Result<MetadataTable, ReportError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| ReportError::io(path, e))?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .quoting(false)
        .from_reader(BufReader::new(file));

    let header: Vec<String> = rdr
        .headers()
        .map_err(|e| ReportError::csv(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let run_idx = header
        .iter()
        .position(|h| h == run_column)
        .ok_or_else(|| ReportError::ColumnNotFound {
            column: run_column.to_string(),
        })?;

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| ReportError::csv(path, e))?;

        let run_id = record.get(run_idx).unwrap_or_default().trim().to_string();
        if run_id.is_empty() {
            log::warn!("Metadata row with empty `{}` in {}", run_column, path.display());
        }

        // the run column holds the same trimmed key the join uses
        let fields: AHashMap<String, String> = header
            .iter()
            .cloned()
            .zip(record.iter().map(str::to_string))
            .enumerate()
            .map(|(i, (name, value))| if i == run_idx { (name, run_id.clone()) } else { (name, value) })
            .collect();
        rows.push(SampleMetadata::new(run_id, fields));
    }

    log::info!(
        "Loaded {} metadata row(s) with {} column(s) from {}",
        rows.len(),
        header.len(),
        path.display()
    );

    Ok(MetadataTable {
        header,
        run_column: run_column.to_string(),
        rows,
    })
}
