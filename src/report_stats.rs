//src/report_stats.rs

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ReportError;
use crate::join::{JoinedRecord, JoinedTable};

/// A categorical filter on one metadata column, e.g. `sex=female`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    pub field: String,
    pub value: String,
}

impl FieldFilter {
    /// Parses `FIELD=VALUE`. The value may be empty or contain further `=`.
    pub fn parse(expr: &str) -> Result<Self, ReportError> {
        match expr.split_once('=') {
            Some((field, value)) if !field.trim().is_empty() => Ok(FieldFilter {
                field: field.trim().to_string(),
                value: value.to_string(),
            }),
            _ => Err(ReportError::InvalidFilter(expr.to_string())),
        }
    }
}

impl std::fmt::Display for FieldFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.field, self.value)
    }
}

/// Keeps joined records whose metadata `field` equals `value`.
///
/// An unknown column is an error; a value that never occurs just gives no rows.
/// Rows without metadata never match.
pub fn filter_by_field<'a>(
    joined: &'a JoinedTable,
    field: &str,
    value: &str,
) -> Result<Vec<&'a JoinedRecord>, ReportError> {
    joined.require_column(field)?;

    let mut kept = Vec::new();
    for row in &joined.rows {
        if let Some(meta) = &row.metadata {
            if meta.get(field)? == value {
                kept.push(row);
            }
        }
    }
    Ok(kept)
}

/// Percent identity of every record in `rows` that carries an alignment.
pub fn pident_values<'a, I>(rows: I) -> Vec<f64>
where
    I: IntoIterator<Item = &'a JoinedRecord>,
{
    rows.into_iter()
        .filter_map(|r| r.alignment.as_ref())
        .map(|a| a.pident)
        .collect()
}

/// Fixed-range, equal-width binning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistogramSpec {
    pub lower: f64,
    pub upper: f64,
    pub bins: usize,
}

impl Default for HistogramSpec {
    fn default() -> Self {
        Self {
            lower: 0.0,
            upper: 100.0,
            bins: 20,
        }
    }
}

impl HistogramSpec {
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.bins == 0 || !(self.lower < self.upper) || !self.lower.is_finite() || !self.upper.is_finite() {
            return Err(ReportError::InvalidHistogram {
                lower: self.lower,
                upper: self.upper,
            });
        }
        Ok(())
    }

    pub fn bin_width(&self) -> f64 {
        (self.upper - self.lower) / self.bins as f64
    }

    /// `[start, end)` of bin `i`; the last bin also includes `upper`.
    pub fn bin_range(&self, i: usize) -> (f64, f64) {
        let w = self.bin_width();
        (self.lower + w * i as f64, self.lower + w * (i + 1) as f64)
    }

    fn bin_of(&self, value: f64) -> Option<usize> {
        if !(value >= self.lower && value <= self.upper) {
            return None;
        }
        let idx = ((value - self.lower) / self.bin_width()).floor() as usize;
        Some(idx.min(self.bins - 1))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub spec: HistogramSpec,
    pub counts: Vec<u64>,
    /// Values below `lower`, above `upper`, or NaN.
    pub out_of_range: u64,
}

impl Histogram {
    pub fn from_values(values: &[f64], spec: HistogramSpec) -> Result<Self, ReportError> {
        spec.validate()?;

        let mut counts = vec![0u64; spec.bins];
        let mut out_of_range = 0;
        for &v in values {
            match spec.bin_of(v) {
                Some(i) => counts[i] += 1,
                None => out_of_range += 1,
            }
        }
        Ok(Histogram {
            spec,
            counts,
            out_of_range,
        })
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum::<u64>() + self.out_of_range
    }

    /// Text rendering, one line per bin with a proportional bar.
    pub fn render(&self, bar_width: usize) -> String {
        use std::fmt::Write as _;

        let max = self.counts.iter().copied().max().unwrap_or(0);
        let mut out = String::new();
        for (i, &count) in self.counts.iter().enumerate() {
            let (start, end) = self.spec.bin_range(i);
            let close = if i + 1 == self.counts.len() { ']' } else { ')' };
            let bar_len = if max == 0 {
                0
            } else {
                ((count as f64 / max as f64) * bar_width as f64).round() as usize
            };
            let _ = writeln!(
                out,
                "[{:>6.2}, {:>6.2}{} {:>7} {}",
                start,
                end,
                close,
                count,
                "#".repeat(bar_len)
            );
        }
        if self.out_of_range > 0 {
            let _ = writeln!(out, "out of range: {}", self.out_of_range);
        }
        out
    }
}

/// Descriptive statistics over a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SummaryStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

impl SummaryStats {
    /// `None` when there are no finite values.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return None;
        }
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = sorted.iter().sum::<f64>() / count as f64;
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        Some(SummaryStats {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median,
        })
    }
}

/// Hit counts of scientific name × run identifier.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountTable {
    /// Sorted run identifiers (columns).
    pub runs: Vec<String>,
    /// Scientific name -> counts aligned with `runs`.
    pub rows: BTreeMap<String, Vec<u64>>,
}

impl CountTable {
    /// Cross-tabulates the joined table.
    ///
    /// Runs present in the metadata but without hits still get a column of zeros.
    pub fn from_joined(joined: &JoinedTable) -> Self {
        let runs: BTreeSet<&str> = joined.rows.iter().map(|r| r.run_id()).collect();
        let runs: Vec<String> = runs.into_iter().map(str::to_string).collect();

        let mut rows: BTreeMap<String, Vec<u64>> = BTreeMap::new();
        for row in &joined.rows {
            let Some(aln) = &row.alignment else {
                continue;
            };
            // `runs` is sorted, so the column is found by binary search
            let Ok(col) = runs.binary_search_by(|r| r.as_str().cmp(row.run_id())) else {
                continue;
            };
            let counts = rows
                .entry(aln.sscinames.clone())
                .or_insert_with(|| vec![0; runs.len()]);
            counts[col] += 1;
        }

        CountTable { runs, rows }
    }

    pub fn get(&self, sciname: &str, run_id: &str) -> u64 {
        let Ok(col) = self.runs.binary_search_by(|r| r.as_str().cmp(run_id)) else {
            return 0;
        };
        self.rows.get(sciname).map(|c| c[col]).unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.rows.values().flatten().sum()
    }

    /// Tab-separated rendering with a header row.
    pub fn to_tsv(&self) -> String {
        use std::fmt::Write as _;

        let mut out = String::from("sscinames");
        for run in &self.runs {
            out.push('\t');
            out.push_str(run);
        }
        out.push('\n');
        for (name, counts) in &self.rows {
            out.push_str(name);
            for c in counts {
                let _ = write!(out, "\t{}", c);
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::{join_metadata, JoinMode};
    use crate::metadata::{MetadataTable, SampleMetadata};
    use crate::types::{AlignmentRecord, AlignmentTable};
    use ahash::AHashMap;

    fn aln(sample: &str, name: &str, pident: f64) -> AlignmentRecord {
        AlignmentRecord {
            sscinames: name.to_string(),
            sample_id: sample.to_string(),
            seq_number: "1".to_string(),
            sseqid: "subj".to_string(),
            pident,
            length: 100,
            mismatch: 0,
            gapopen: 0,
            qstart: 1,
            qend: 100,
            sstart: 1,
            send: 100,
            evalue: 1e-50,
            bitscore: 180.0,
        }
    }

    fn joined_fixture() -> JoinedTable {
        let header = ["run_accession", "sex", "material"];
        let meta_rows = [
            ("ERR1", "female", "blood"),
            ("ERR2", "male", "saliva"),
            ("ERR3", "female", "saliva"),
        ];
        let metadata = MetadataTable {
            header: header.iter().map(|h| h.to_string()).collect(),
            run_column: "run_accession".to_string(),
            rows: meta_rows
                .iter()
                .map(|(run, sex, material)| {
                    let mut fields = AHashMap::new();
                    fields.insert("run_accession".to_string(), run.to_string());
                    fields.insert("sex".to_string(), sex.to_string());
                    fields.insert("material".to_string(), material.to_string());
                    SampleMetadata::new(*run, fields)
                })
                .collect(),
        };
        let table = AlignmentTable {
            rows: vec![
                aln("ERR1", "Homo sapiens", 100.0),
                aln("ERR1", "Staphylococcus epidermidis", 98.5),
                aln("ERR2", "Homo sapiens", 91.0),
                aln("ERR1", "Homo sapiens", 99.0),
            ],
        };
        join_metadata(&table, &metadata, JoinMode::MetadataAnchored)
    }

    #[test]
    fn test_field_filter_parse() {
        let f = FieldFilter::parse("sex=female").unwrap();
        assert_eq!(f.field, "sex");
        assert_eq!(f.value, "female");
        assert_eq!(f.to_string(), "sex=female");

        assert_eq!(FieldFilter::parse("note=a=b").unwrap().value, "a=b");
        assert!(matches!(
            FieldFilter::parse("female"),
            Err(ReportError::InvalidFilter(_))
        ));
        assert!(FieldFilter::parse("=female").is_err());
    }

    #[test]
    fn test_filter_by_field() {
        let joined = joined_fixture();
        let female = filter_by_field(&joined, "sex", "female").unwrap();
        // three ERR1 hits plus the hit-less ERR3 row
        assert_eq!(female.len(), 4);
        assert_eq!(pident_values(female).len(), 3);

        let saliva = filter_by_field(&joined, "material", "saliva").unwrap();
        assert_eq!(pident_values(saliva), vec![91.0]);
    }

    #[test]
    fn test_filter_unknown_value_is_empty() {
        let joined = joined_fixture();
        let rows = filter_by_field(&joined, "sex", "unknown").unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_filter_unknown_column_is_error() {
        let joined = joined_fixture();
        assert!(matches!(
            filter_by_field(&joined, "age", "40"),
            Err(ReportError::ColumnNotFound { .. })
        ));
    }

    #[test]
    fn test_histogram_binning() {
        let spec = HistogramSpec {
            lower: 90.0,
            upper: 100.0,
            bins: 5,
        };
        let h = Histogram::from_values(&[90.0, 91.9, 92.0, 99.0, 100.0, 85.0, f64::NAN], spec).unwrap();
        assert_eq!(h.counts, vec![2, 1, 0, 0, 2]);
        assert_eq!(h.out_of_range, 2);
        assert_eq!(h.total(), 7);
        assert_eq!(spec.bin_range(1), (92.0, 94.0));
    }

    #[test]
    fn test_histogram_rejects_bad_spec() {
        let spec = HistogramSpec {
            lower: 10.0,
            upper: 10.0,
            bins: 4,
        };
        assert!(Histogram::from_values(&[], spec).is_err());
        let spec = HistogramSpec {
            bins: 0,
            ..HistogramSpec::default()
        };
        assert!(Histogram::from_values(&[], spec).is_err());
    }

    #[test]
    fn test_histogram_render() {
        let h = Histogram::from_values(&[10.0, 60.0, 70.0], HistogramSpec {
            lower: 0.0,
            upper: 100.0,
            bins: 2,
        })
        .unwrap();
        let text = h.render(10);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("1 #####"));
        assert!(lines[1].ends_with("2 ##########"));
        assert!(lines[1].contains(']'));
    }

    #[test]
    fn test_summary_stats() {
        let s = SummaryStats::from_values(&[100.0, 98.5, 91.0, 99.0]).unwrap();
        assert_eq!(s.count, 4);
        assert_eq!(s.min, 91.0);
        assert_eq!(s.max, 100.0);
        assert_eq!(s.median, 98.75);
        assert!((s.mean - 97.125).abs() < 1e-9);

        assert_eq!(SummaryStats::from_values(&[3.0, 1.0, 2.0]).unwrap().median, 2.0);
        assert!(SummaryStats::from_values(&[]).is_none());
    }

    #[test]
    fn test_count_table() {
        let joined = joined_fixture();
        let table = CountTable::from_joined(&joined);

        assert_eq!(table.runs, vec!["ERR1", "ERR2", "ERR3"]);
        assert_eq!(table.get("Homo sapiens", "ERR1"), 2);
        assert_eq!(table.get("Homo sapiens", "ERR2"), 1);
        assert_eq!(table.get("Staphylococcus epidermidis", "ERR1"), 1);
        assert_eq!(table.get("Homo sapiens", "ERR3"), 0);
        assert_eq!(table.get("Homo sapiens", "ERR404"), 0);
        assert_eq!(table.total(), 4);

        let tsv = table.to_tsv();
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines[0], "sscinames\tERR1\tERR2\tERR3");
        assert_eq!(lines[1], "Homo sapiens\t2\t1\t0");
        assert_eq!(lines[2], "Staphylococcus epidermidis\t1\t0\t0");
    }
}
