//src/aggregate.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::blast_results::read_alignment_records;
use crate::error::ReportError;
use crate::types::AlignmentTable;

/// File name suffixes treated as BLAST result files when scanning a directory.
/// Each one is also accepted with a trailing `.gz`.
pub const DEFAULT_RESULT_EXTENSIONS: &[&str] = &[".csv", ".tsv", ".txt", ".out", ".blast"];

fn is_result_file(name: &str, extensions: &[&str]) -> bool {
    let name = name.to_lowercase();
    let name = name.strip_suffix(".gz").unwrap_or(&name);
    extensions.iter().any(|ext| name.ends_with(&ext.to_lowercase()))
}

/// Lists result files directly under `dir`.
///
/// Hidden files and subdirectories are skipped. The order is whatever the
/// filesystem returns.
pub fn list_result_files<P: AsRef<Path>>(
    dir: P,
    extensions: &[&str],
) -> Result<Vec<PathBuf>, ReportError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|e| ReportError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ReportError::io(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if file_name.starts_with('.') {
            continue;
        }
        if is_result_file(&file_name, extensions) {
            files.push(path);
        }
    }

    log::info!("Found {} result file(s) in {}", files.len(), dir.display());
    Ok(files)
}

/// Parses every file and concatenates the rows into one table.
///
/// No deduplication is done. An empty path list yields an empty table.
pub fn aggregate_results<P: AsRef<Path>>(paths: &[P]) -> Result<AlignmentTable, ReportError> {
    let mut combined = AlignmentTable::new();
    for path in paths {
        let table = read_alignment_records(path)?;
        combined.append(table);
    }
    log::info!(
        "Aggregated {} alignment rows from {} file(s)",
        combined.len(),
        paths.len()
    );
    Ok(combined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ALIGNMENT_COLUMNS;
    use tempfile::tempdir;

    fn row(id: &str) -> String {
        format!("Homo sapiens,{id},s1,99.1,120,1,0,1,120,1,120,1e-30,200\n")
    }

    #[test]
    fn test_zero_files_gives_empty_table_with_schema() {
        let paths: Vec<PathBuf> = Vec::new();
        let table = aggregate_results(&paths).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns(), &ALIGNMENT_COLUMNS[..]);
    }

    #[test]
    fn test_row_count_is_sum_of_files() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        let c = dir.path().join("c.csv");
        std::fs::write(&a, row("ERR1.1") + &row("ERR1.2")).unwrap();
        std::fs::write(&b, row("ERR2.1")).unwrap();
        std::fs::write(&c, row("ERR3.1") + &row("ERR3.2") + &row("ERR3.2")).unwrap();

        let table = aggregate_results(&[&a, &b, &c]).unwrap();
        assert_eq!(table.len(), 6);
        // duplicates are kept
        let dupes = table.rows.iter().filter(|r| r.query_id() == "ERR3.2").count();
        assert_eq!(dupes, 2);
    }

    #[test]
    fn test_one_bad_file_aborts() {
        let dir = tempdir().unwrap();
        let good = dir.path().join("good.csv");
        let bad = dir.path().join("bad.csv");
        std::fs::write(&good, row("ERR1.1")).unwrap();
        std::fs::write(&bad, row("ERR2")).unwrap();

        assert!(aggregate_results(&[&good, &bad]).is_err());
    }

    #[test]
    fn test_list_result_files_filters_names() {
        let dir = tempdir().unwrap();
        for name in ["s1.csv", "s2.out.gz", "S3.TXT", ".hidden.csv", "notes.md"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

        let mut names: Vec<String> = list_result_files(dir.path(), DEFAULT_RESULT_EXTENSIONS)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["S3.TXT", "s1.csv", "s2.out.gz"]);
    }

    #[test]
    fn test_listed_upper_case_gz_is_decompressed() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let dir = tempdir().unwrap();
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(row("ERR1942280.1").as_bytes()).unwrap();
        std::fs::write(dir.path().join("BATCH.CSV.GZ"), enc.finish().unwrap()).unwrap();

        let files = list_result_files(dir.path(), DEFAULT_RESULT_EXTENSIONS).unwrap();
        assert_eq!(files.len(), 1);
        let table = aggregate_results(&files).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows[0].sample_id, "ERR1942280");
    }

    #[test]
    fn test_list_missing_dir_is_error() {
        let dir = tempdir().unwrap();
        let result = list_result_files(dir.path().join("missing"), DEFAULT_RESULT_EXTENSIONS);
        assert!(matches!(result, Err(ReportError::Io { .. })));
    }
}
