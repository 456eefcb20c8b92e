// src/lib.rs
pub mod types;
pub mod error;
pub mod config;
pub mod blast_results;
pub mod aggregate;
pub mod metadata;
pub mod join;
pub mod report_stats;

use std::fmt::Write as FmtWrite;
use std::path::{Path, PathBuf};

use crate::aggregate::{aggregate_results, list_result_files};
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::join::{join_metadata, JoinMode, JoinedRecord, JoinedTable};
use crate::metadata::load_metadata;
use crate::report_stats::{
    filter_by_field, pident_values, CountTable, FieldFilter, Histogram, SummaryStats,
};
use crate::types::ALIGNMENT_COLUMNS;

/// Width in characters of the longest histogram bar.
const HISTOGRAM_BAR_WIDTH: usize = 40;

/// Percent identity distribution for one subset of the joined table.
#[derive(Debug, Clone)]
pub struct IdentitySection {
    /// `None` for the section covering every hit.
    pub filter: Option<FieldFilter>,
    /// Joined rows selected, including metadata rows without hits.
    pub rows: usize,
    pub summary: Option<SummaryStats>,
    pub histogram: Histogram,
}

/// Everything computed for one report run. Text is rendered on demand.
pub struct ReportResults {
    pub title: String,
    pub result_files: Vec<PathBuf>,
    /// Rows read from all result files, before the join.
    pub alignment_rows: usize,
    pub metadata_rows: usize,
    pub metadata_columns: Vec<String>,

    pub joined: JoinedTable,
    pub sections: Vec<IdentitySection>,
    pub count_table: CountTable,
}

impl ReportResults {
    /// Render the full Markdown document.
    pub fn get_markdown_report(&self) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "# {}\n", self.title);

        output.push_str("## Inputs\n\n");
        let _ = writeln!(output, "- Result files: {}", self.result_files.len());
        let _ = writeln!(output, "- Alignment rows: {}", self.alignment_rows);
        let _ = writeln!(
            output,
            "- Metadata rows: {} ({} columns: {})",
            self.metadata_rows,
            self.metadata_columns.len(),
            self.metadata_columns.join(", ")
        );
        let unmatched = self.joined.unmatched_alignments();
        match self.joined.mode {
            JoinMode::MetadataAnchored => {
                let _ = writeln!(output, "- Join: metadata-anchored left join");
                let _ = writeln!(output, "- Alignment rows without metadata (dropped): {}", unmatched);
            }
            JoinMode::Full => {
                let _ = writeln!(output, "- Join: full outer join");
                let _ = writeln!(output, "- Alignment rows without metadata (kept): {}", unmatched);
            }
        }
        let _ = writeln!(output, "- Joined rows: {}\n", self.joined.len());

        for section in &self.sections {
            match &section.filter {
                Some(filter) => {
                    let _ = writeln!(output, "## Percent identity: {}\n", filter);
                }
                None => output.push_str("## Percent identity: all hits\n\n"),
            }
            match &section.summary {
                Some(s) => {
                    let _ = writeln!(
                        output,
                        "{} hits over {} joined rows; min {:.2}, median {:.2}, mean {:.2}, max {:.2}\n",
                        s.count, section.rows, s.min, s.median, s.mean, s.max
                    );
                }
                None => {
                    let _ = writeln!(output, "No hits ({} joined rows).\n", section.rows);
                }
            }
            output.push_str("```text\n");
            output.push_str(&section.histogram.render(HISTOGRAM_BAR_WIDTH));
            output.push_str("```\n\n");
        }

        output.push_str("## Hits per scientific name and run\n\n");
        if self.count_table.rows.is_empty() {
            output.push_str("No hits.\n");
        } else {
            output.push_str("| sscinames |");
            for run in &self.count_table.runs {
                let _ = write!(output, " {} |", escape_cell(run));
            }
            output.push_str("\n|---|");
            for _ in &self.count_table.runs {
                output.push_str("---:|");
            }
            output.push('\n');
            for (name, counts) in &self.count_table.rows {
                let _ = write!(output, "| {} |", escape_cell(name));
                for c in counts {
                    let _ = write!(output, " {} |", c);
                }
                output.push('\n');
            }
        }

        output
    }

    /// Render the count table as TSV.
    pub fn get_count_table_tsv(&self) -> String {
        self.count_table.to_tsv()
    }

    /// Write the joined table as TSV: alignment columns, metadata columns,
    /// then `metadata_match` (`yes`/`no`).
    pub fn write_joined_tsv<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let path = path.as_ref();
        let mut w = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_path(path)
            .map_err(|e| ReportError::csv(path, e))?;

        let mut header: Vec<&str> = ALIGNMENT_COLUMNS.to_vec();
        header.extend(self.joined.metadata_columns.iter().map(String::as_str));
        header.push("metadata_match");
        w.write_record(&header).map_err(|e| ReportError::csv(path, e))?;

        for row in &self.joined.rows {
            let mut record: Vec<String> = match &row.alignment {
                Some(aln) => Vec::from(aln.to_fields()),
                None => vec![String::new(); ALIGNMENT_COLUMNS.len()],
            };
            for column in &self.joined.metadata_columns {
                let value = row
                    .metadata
                    .as_ref()
                    .and_then(|m| m.get(column).ok())
                    .unwrap_or_default();
                record.push(value.to_string());
            }
            record.push(if row.is_unmatched_alignment() { "no" } else { "yes" }.to_string());
            w.write_record(&record).map_err(|e| ReportError::csv(path, e))?;
        }

        w.flush().map_err(|e| ReportError::io(path, e))?;
        Ok(())
    }
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

fn identity_section(
    filter: Option<FieldFilter>,
    rows: Vec<&JoinedRecord>,
    config: &ReportConfig,
) -> Result<IdentitySection, ReportError> {
    let n_rows = rows.len();
    let values = pident_values(rows);
    Ok(IdentitySection {
        filter,
        rows: n_rows,
        summary: SummaryStats::from_values(&values),
        histogram: Histogram::from_values(&values, config.histogram)?,
    })
}

/// Run the whole pipeline: gather result files, parse, join, summarise.
pub fn build_report(config: &ReportConfig) -> Result<ReportResults, ReportError> {
    config.histogram.validate()?;

    // 1. Gather result files
    let result_files = if config.result_files.is_empty() {
        let extensions: Vec<&str> = config.result_extensions.iter().map(String::as_str).collect();
        list_result_files(&config.results_dir, &extensions)?
    } else {
        config.result_files.clone()
    };

    // 2. Parse and concatenate
    let alignments = aggregate_results(&result_files)?;

    // 3. Metadata; every referenced column must exist before any work is done on it
    let metadata = load_metadata(&config.metadata_path, &config.run_column)?;
    for filter in &config.filters {
        metadata.require_column(&filter.field)?;
    }

    // 4. Join
    let joined = join_metadata(&alignments, &metadata, config.join_mode);

    // 5. Statistics
    let mut sections = Vec::with_capacity(config.filters.len() + 1);
    sections.push(identity_section(None, joined.rows.iter().collect(), config)?);
    for filter in &config.filters {
        let rows = filter_by_field(&joined, &filter.field, &filter.value)?;
        if rows.is_empty() {
            log::warn!("Filter {} matched no rows", filter);
        }
        sections.push(identity_section(Some(filter.clone()), rows, config)?);
    }
    let count_table = CountTable::from_joined(&joined);

    Ok(ReportResults {
        title: config.title.clone(),
        result_files,
        alignment_rows: alignments.len(),
        metadata_rows: metadata.len(),
        metadata_columns: metadata.header.clone(),
        joined,
        sections,
        count_table,
    })
}
