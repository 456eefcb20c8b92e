//src/join.rs

use ahash::AHashMap;

use crate::error::ReportError;
use crate::metadata::{MetadataTable, SampleMetadata};
use crate::types::{AlignmentRecord, AlignmentTable};

/// Which side of the join is kept when a row has no partner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinMode {
    /// Every metadata row is kept; alignment rows without metadata are dropped.
    #[default]
    MetadataAnchored,
    /// Like `MetadataAnchored`, plus unmatched alignment rows appended with no metadata.
    Full,
}

/// One row of the joined table. At least one side is always present.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub alignment: Option<AlignmentRecord>,
    pub metadata: Option<SampleMetadata>,
}

impl JoinedRecord {
    /// Run identifier: the metadata key when present, else the alignment sample.
    pub fn run_id(&self) -> &str {
        match (&self.metadata, &self.alignment) {
            (Some(meta), _) => &meta.run_id,
            (None, Some(aln)) => &aln.sample_id,
            (None, None) => "",
        }
    }

    /// True for alignment rows kept by a `Full` join without metadata.
    pub fn is_unmatched_alignment(&self) -> bool {
        self.metadata.is_none() && self.alignment.is_some()
    }
}

/// Result of joining alignments onto metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedTable {
    pub mode: JoinMode,
    pub metadata_columns: Vec<String>,
    pub rows: Vec<JoinedRecord>,
    /// Alignment rows whose sample had no metadata row.
    unmatched_alignments: usize,
}

impl JoinedTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of alignment rows with no metadata; dropped or flagged depending on the mode.
    pub fn unmatched_alignments(&self) -> usize {
        self.unmatched_alignments
    }

    pub fn require_column(&self, field: &str) -> Result<(), ReportError> {
        if self.metadata_columns.iter().any(|c| c == field) {
            Ok(())
        } else {
            Err(ReportError::ColumnNotFound {
                column: field.to_string(),
            })
        }
    }
}

/// Left-joins `alignments` onto `metadata` by run identifier = sample identifier.
///
/// Output follows metadata file order; within one run, alignment rows keep
/// their aggregated order. A metadata row with no hits appears once with no
/// alignment.
pub fn join_metadata(
    alignments: &AlignmentTable,
    metadata: &MetadataTable,
    mode: JoinMode,
) -> JoinedTable {
    // sample_id -> row indices in the alignment table
    let mut by_sample: AHashMap<&str, Vec<usize>> = AHashMap::new();
    for (i, rec) in alignments.rows.iter().enumerate() {
        by_sample.entry(rec.sample_id.as_str()).or_default().push(i);
    }

    let mut matched = vec![false; alignments.len()];
    let mut rows = Vec::with_capacity(alignments.len().max(metadata.len()));

    for meta in &metadata.rows {
        match by_sample.get(meta.run_id.as_str()) {
            Some(indices) => {
                for &i in indices {
                    matched[i] = true;
                    rows.push(JoinedRecord {
                        alignment: Some(alignments.rows[i].clone()),
                        metadata: Some(meta.clone()),
                    });
                }
            }
            None => rows.push(JoinedRecord {
                alignment: None,
                metadata: Some(meta.clone()),
            }),
        }
    }

    let unmatched: Vec<usize> = (0..matched.len()).filter(|&i| !matched[i]).collect();

    if !unmatched.is_empty() {
        match mode {
            JoinMode::MetadataAnchored => log::warn!(
                "Dropped {} alignment row(s) whose sample has no metadata",
                unmatched.len()
            ),
            JoinMode::Full => log::warn!(
                "Keeping {} alignment row(s) without metadata",
                unmatched.len()
            ),
        }
    }

    if mode == JoinMode::Full {
        for &i in &unmatched {
            rows.push(JoinedRecord {
                alignment: Some(alignments.rows[i].clone()),
                metadata: None,
            });
        }
    }

    log::info!("Joined table has {} row(s)", rows.len());

    JoinedTable {
        mode,
        metadata_columns: metadata.header.clone(),
        rows,
        unmatched_alignments: unmatched.len(),
    }
}
