//src/types.rs

/// Column names of an alignment table, in positional order.
///
/// The raw BLAST line carries 13 fields; the second one (`qseqid`) is split
/// into `sample_id` and `seq_number`, which gives these 14 columns.
pub const ALIGNMENT_COLUMNS: [&str; 14] = [
    "sscinames",
    "sample_id",
    "seq_number",
    "sseqid",
    "pident",
    "length",
    "mismatch",
    "gapopen",
    "qstart",
    "qend",
    "sstart",
    "send",
    "evalue",
    "bitscore",
];

/// Number of comma-separated fields on one raw result line.
pub const RAW_FIELD_COUNT: usize = ALIGNMENT_COLUMNS.len() - 1;

/// A query identifier of the form `<sample>.<sequence number>`, e.g. `ERR1942280.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeId {
    pub sample_id: String,
    pub seq_number: String,
}

impl std::fmt::Display for CompositeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.sample_id, self.seq_number)
    }
}

/// One alignment hit from a BLAST tabular result file.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentRecord {
    /// Subject scientific name(s), `;`-joined when BLAST reports several.
    pub sscinames: String,
    pub sample_id: String,
    /// Kept as text so `sample_id.seq_number` always reproduces the raw id.
    pub seq_number: String,
    pub sseqid: String,
    pub pident: f64,
    pub length: u32,
    pub mismatch: u32,
    pub gapopen: u32,
    pub qstart: u64,
    pub qend: u64,
    pub sstart: u64,
    pub send: u64,
    pub evalue: f64,
    pub bitscore: f64,
}

impl AlignmentRecord {
    /// The composite query identifier this record was parsed from.
    pub fn query_id(&self) -> String {
        format!("{}.{}", self.sample_id, self.seq_number)
    }

    /// Values in `ALIGNMENT_COLUMNS` order, formatted for text output.
    pub fn to_fields(&self) -> [String; 14] {
        [
            self.sscinames.clone(),
            self.sample_id.clone(),
            self.seq_number.clone(),
            self.sseqid.clone(),
            self.pident.to_string(),
            self.length.to_string(),
            self.mismatch.to_string(),
            self.gapopen.to_string(),
            self.qstart.to_string(),
            self.qend.to_string(),
            self.sstart.to_string(),
            self.send.to_string(),
            format!("{:e}", self.evalue),
            self.bitscore.to_string(),
        ]
    }
}

/// A table of alignment records sharing the `ALIGNMENT_COLUMNS` schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AlignmentTable {
    pub rows: Vec<AlignmentRecord>,
}

impl AlignmentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &'static [&'static str] {
        &ALIGNMENT_COLUMNS
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Row-wise concatenation; the schema is fixed so nothing else to merge.
    pub fn append(&mut self, other: AlignmentTable) {
        self.rows.extend(other.rows);
    }
}
