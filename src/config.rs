//src/config.rs

use std::path::PathBuf;

use crate::aggregate::DEFAULT_RESULT_EXTENSIONS;
use crate::join::JoinMode;
use crate::metadata::DEFAULT_RUN_COLUMN;
use crate::report_stats::{FieldFilter, HistogramSpec};

/// Inputs and knobs for one report run.
///
/// `Default` points at the fixed locations the report has always used:
/// `blast_results/` for hits and `metadata.tsv` for samples.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub results_dir: PathBuf,
    /// Explicit result files. When non-empty, `results_dir` is not scanned.
    pub result_files: Vec<PathBuf>,
    pub result_extensions: Vec<String>,
    pub metadata_path: PathBuf,
    pub run_column: String,
    pub join_mode: JoinMode,
    pub histogram: HistogramSpec,
    /// One extra histogram section per filter.
    pub filters: Vec<FieldFilter>,
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("blast_results"),
            result_files: Vec::new(),
            result_extensions: DEFAULT_RESULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            metadata_path: PathBuf::from("metadata.tsv"),
            run_column: DEFAULT_RUN_COLUMN.to_string(),
            join_mode: JoinMode::default(),
            histogram: HistogramSpec::default(),
            filters: Vec::new(),
            title: "BLAST hits by sample".to_string(),
        }
    }
}
