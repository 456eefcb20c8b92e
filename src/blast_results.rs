//src/blast_results.rs

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;

use flate2::read::MultiGzDecoder;

use crate::error::{CompositeIdError, ReportError};
use crate::types::{AlignmentRecord, AlignmentTable, CompositeId, RAW_FIELD_COUNT};

/// Splits a query identifier such as `ERR1942280.1` into sample and sequence number.
///
/// Exactly one `.` is accepted, with text on both sides.
pub fn parse_composite_id(raw: &str) -> Result<CompositeId, CompositeIdError> {
    let (sample_id, seq_number) = raw
        .split_once('.')
        .ok_or(CompositeIdError::MissingSeparator)?;

    if seq_number.contains('.') {
        return Err(CompositeIdError::RepeatedSeparator);
    }
    if sample_id.is_empty() {
        return Err(CompositeIdError::EmptySample);
    }
    if seq_number.is_empty() {
        return Err(CompositeIdError::EmptySequenceNumber);
    }

    Ok(CompositeId {
        sample_id: sample_id.to_string(),
        seq_number: seq_number.to_string(),
    })
}

/// Opens a result file, decompressing it when the name ends in `.gz`.
fn open_maybe_gz(path: &Path) -> Result<Box<dyn Read>, ReportError> {
    let f = File::open(path).map_err(|e| ReportError::io(path, e))?;

    let is_gz = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gz {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(f))))
    } else {
        Ok(Box::new(BufReader::new(f)))
    }
}

fn parse_number<T: FromStr>(
    value: &str,
    column: &'static str,
    path: &Path,
    line: u64,
) -> Result<T, ReportError> {
    value.trim().parse().map_err(|_| ReportError::InvalidNumber {
        path: path.to_path_buf(),
        line,
        column,
        value: value.to_string(),
    })
}

/// Percent identity must be a finite value in `0..=100`.
fn parse_pident(value: &str, path: &Path, line: u64) -> Result<f64, ReportError> {
    let pident: f64 = parse_number(value, "pident", path, line)?;
    if !(0.0..=100.0).contains(&pident) {
        return Err(ReportError::InvalidNumber {
            path: path.to_path_buf(),
            line,
            column: "pident",
            value: value.to_string(),
        });
    }
    Ok(pident)
}

/// Builds one record from the 13 raw fields of a result line.
fn parse_alignment_line(
    fields: &csv::StringRecord,
    path: &Path,
    line: u64,
) -> Result<AlignmentRecord, ReportError> {
    if fields.len() != RAW_FIELD_COUNT {
        return Err(ReportError::FieldCount {
            path: path.to_path_buf(),
            line,
            expected: RAW_FIELD_COUNT,
            found: fields.len(),
        });
    }

    let raw_id = &fields[1];
    let id = parse_composite_id(raw_id).map_err(|reason| ReportError::MalformedCompositeId {
        path: path.to_path_buf(),
        line,
        value: raw_id.to_string(),
        reason,
    })?;

    Ok(AlignmentRecord {
        sscinames: fields[0].to_string(),
        sample_id: id.sample_id,
        seq_number: id.seq_number,
        sseqid: fields[2].to_string(),
        pident: parse_pident(&fields[3], path, line)?,
        length: parse_number(&fields[4], "length", path, line)?,
        mismatch: parse_number(&fields[5], "mismatch", path, line)?,
        gapopen: parse_number(&fields[6], "gapopen", path, line)?,
        qstart: parse_number(&fields[7], "qstart", path, line)?,
        qend: parse_number(&fields[8], "qend", path, line)?,
        sstart: parse_number(&fields[9], "sstart", path, line)?,
        send: parse_number(&fields[10], "send", path, line)?,
        evalue: parse_number(&fields[11], "evalue", path, line)?,
        bitscore: parse_number(&fields[12], "bitscore", path, line)?,
    })
}

/// Reads one comma-separated BLAST result file (no header) into a table.
///
/// The whole read fails on the first bad line; nothing is skipped.
pub fn read_alignment_records<P: AsRef<Path>>(path: P) -> Result<AlignmentTable, ReportError> {
    let path = path.as_ref();
    let reader = open_maybe_gz(path)?;

    // Field counts are checked per line so errors can name the expected width.
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut table = AlignmentTable::new();
    let mut record = csv::StringRecord::new();
    loop {
        let more = rdr
            .read_record(&mut record)
            .map_err(|e| ReportError::csv(path, e))?;
        if !more {
            break;
        }
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        table.rows.push(parse_alignment_line(&record, path, line)?);
    }

    log::debug!("Parsed {} alignment rows from {}", table.len(), path.display());
    Ok(table)
}
