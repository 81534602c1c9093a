use crate::config::LabConfig;
use crate::errors::SubmissionError;
use crate::fasta::build_header;
use crate::scan::SampleRecord;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Sentinel rendered for metadata fields with no looked-up value.
pub const UNKNOWN: &str = "unknown";

/// QC metrics for one sample, as loaded from the pipeline QC summary.
#[derive(Debug, Clone, Default)]
pub struct QcRecord {
    pub mean_depth: Option<String>,
    pub collection_date: Option<String>,
    pub ct: Option<String>,
}

pub type QcTable = HashMap<String, QcRecord>;

/// Collection date and qPCR Ct for one sample, as loaded from the
/// lab-provided sample-date table.
#[derive(Debug, Clone, Default)]
pub struct SampleDate {
    pub collection_date: Option<String>,
    pub ct: Option<String>,
}

pub type DateTable = HashMap<String, SampleDate>;

/// Loads the per-sample QC summary, a tab-separated table with one row per
/// sample. The depth column may be named either `mean_depth` or
/// `mean_sequencing_depth` depending on the pipeline version; `qpcr_ct` and
/// `collection_date` are optional columns. Empty cells are treated as
/// absent so they render as the [`UNKNOWN`] sentinel downstream.
pub fn load_qc_table(path: &Path) -> Result<QcTable> {
    let mut reader = open_tsv(path)?;

    let headers = reader.headers()?.clone();
    let sample_col = headers
        .iter()
        .position(|h| h == "sample")
        .ok_or_else(|| SubmissionError::MissingColumn {
            column: String::from("sample"),
            path: path.to_path_buf(),
        })?;
    let depth_col = headers
        .iter()
        .position(|h| h == "mean_depth" || h == "mean_sequencing_depth")
        .ok_or_else(|| SubmissionError::MissingColumn {
            column: String::from("mean_depth"),
            path: path.to_path_buf(),
        })?;
    let date_col = headers.iter().position(|h| h == "collection_date");
    let ct_col = headers.iter().position(|h| h == "qpcr_ct");

    let mut table = QcTable::new();
    for row in reader.records() {
        let row = row.with_context(|| format!("could not parse QC row in {}", path.display()))?;
        let Some(sample) = row.get(sample_col).map(str::trim).filter(|s| !s.is_empty()) else {
            continue;
        };

        table.insert(
            sample.to_string(),
            QcRecord {
                mean_depth: field(&row, Some(depth_col)),
                collection_date: field(&row, date_col),
                ct: field(&row, ct_col),
            },
        );
    }

    Ok(table)
}

/// Loads the lab sample-date table: tab-separated with columns `sample`,
/// `external_name`, `date` and `ct`. Only `sample`, `date` and `ct` are
/// consumed.
pub fn load_sample_dates(path: &Path) -> Result<DateTable> {
    #[derive(Deserialize)]
    struct DateRow {
        sample: String,
        #[serde(default)]
        date: Option<String>,
        #[serde(default)]
        ct: Option<String>,
    }

    let mut reader = open_tsv(path)?;

    let mut table = DateTable::new();
    for row in reader.deserialize() {
        let row: DateRow =
            row.with_context(|| format!("could not parse date row in {}", path.display()))?;
        table.insert(
            row.sample,
            SampleDate {
                collection_date: row.date.filter(|v| !v.trim().is_empty()),
                ct: row.ct.filter(|v| !v.trim().is_empty()),
            },
        );
    }

    Ok(table)
}

/// Loads a newline-delimited sample-id list into a set. Trailing whitespace
/// is stripped and blank lines are skipped; ids are matched exactly, with no
/// other normalization.
pub fn load_id_set(path: &Path) -> Result<HashSet<String>> {
    if !path.is_file() {
        return Err(SubmissionError::InputNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("could not read sample list {}", path.display()))?;

    Ok(contents
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect())
}

fn open_tsv(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    if !path.is_file() {
        return Err(SubmissionError::InputNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .with_context(|| format!("could not open {}", path.display()))
}

fn field(row: &csv::StringRecord, col: Option<usize>) -> Option<String> {
    col.and_then(|c| row.get(c))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

/// Outcome of the include/exclude policy for one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    /// On the exclude list. Checked first, so a sample on both lists is
    /// dropped.
    Excluded,
    /// An include list is active and the sample is not on it.
    NotIncluded,
}

pub fn filter_decision(
    sample_id: &str,
    include: &HashSet<String>,
    exclude: &HashSet<String>,
) -> FilterDecision {
    if !exclude.is_empty() && exclude.contains(sample_id) {
        FilterDecision::Excluded
    } else if !include.is_empty() && !include.contains(sample_id) {
        FilterDecision::NotIncluded
    } else {
        FilterDecision::Keep
    }
}

/// One sample's normalized metadata after the join: everything the portal
/// formatters need, before any portal-specific column mapping.
#[derive(Debug, Clone)]
pub struct SubmissionRecord {
    pub sample_id: String,
    pub consensus_path: PathBuf,
    pub fasta_header: String,
    pub collection_date: Option<String>,
    pub mean_depth: Option<String>,
    pub ct: Option<String>,
}

impl SubmissionRecord {
    /// Basename of the consensus file, used for the GISAID `fn` column.
    pub fn consensus_filename(&self) -> String {
        self.consensus_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// The FASTA header without its leading `>`, used for the GISAID virus
    /// name and the VirusSeq isolate columns.
    pub fn virus_name(&self) -> &str {
        self.fasta_header.trim_start_matches('>')
    }
}

/// Merges scanned samples with QC metrics, collection dates and the run
/// configuration, applying the include/exclude policy.
///
/// Dropped samples are logged and omitted from the result; a sample missing
/// from the QC table is kept, with its metric fields left unset so they
/// render as [`UNKNOWN`]. A single missing QC row must not abort the batch.
/// Output order follows the input sample order.
pub fn join(
    samples: &[SampleRecord],
    qc: &QcTable,
    dates: &DateTable,
    include: &HashSet<String>,
    exclude: &HashSet<String>,
    config: &LabConfig,
) -> Vec<SubmissionRecord> {
    let mut records = Vec::with_capacity(samples.len());

    for sample in samples {
        match filter_decision(&sample.sample_id, include, exclude) {
            FilterDecision::Excluded => {
                info!("excluding {}: on the exclude list", sample.sample_id);
                continue;
            }
            FilterDecision::NotIncluded => {
                info!("excluding {}: not on the include list", sample.sample_id);
                continue;
            }
            FilterDecision::Keep => {}
        }

        let qc_record = qc.get(&sample.sample_id);
        if qc_record.is_none() {
            warn!("no QC entry for {}", sample.sample_id);
        }
        let date_record = dates.get(&sample.sample_id);

        // the lab-provided date table is authoritative over the QC summary
        let collection_date = date_record
            .and_then(|d| d.collection_date.clone())
            .or_else(|| qc_record.and_then(|q| q.collection_date.clone()));
        let ct = date_record
            .and_then(|d| d.ct.clone())
            .or_else(|| qc_record.and_then(|q| q.ct.clone()));

        // the header embeds a region-qualified composite id, e.g. ON-sampleA
        let composite_id = format!("{}-{}", config.region_code, sample.sample_id);
        let fasta_header = build_header(&config.virus, &config.country, &composite_id, &config.year);

        records.push(SubmissionRecord {
            sample_id: sample.sample_id.clone(),
            consensus_path: sample.consensus_path.clone(),
            fasta_header,
            collection_date,
            mean_depth: qc_record.and_then(|q| q.mean_depth.clone()),
            ct,
        });
    }

    records
}
