use crate::config::LabConfig;
use crate::fasta::build_record;
use crate::metadata::{join, DateTable, QcTable};
use crate::portal::Portal;
use crate::scan::SampleRecord;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

/// The two output line sequences for one submission batch.
pub struct Submission {
    pub metadata_lines: Vec<String>,
    pub fasta_lines: Vec<String>,
}

/// Builds the complete submission package in memory: the metadata file
/// lines (header rows first) and the concatenated multi-sample FASTA lines,
/// both in filter-surviving sample order.
///
/// Everything is assembled before anything is written, so a failure while
/// reading any consensus file leaves no partial output behind.
pub fn assemble(
    portal: Portal,
    samples: &[SampleRecord],
    qc: &QcTable,
    dates: &DateTable,
    include: &HashSet<String>,
    exclude: &HashSet<String>,
    config: &LabConfig,
) -> Result<Submission> {
    let records = join(samples, qc, dates, include, exclude, config);
    info!(
        "assembling {} of {} scanned samples for {}",
        records.len(),
        samples.len(),
        portal.schema().portal
    );

    let schema = portal.schema();
    let mut metadata_lines = Vec::with_capacity(records.len() + 2);
    metadata_lines.push(schema.header_row()?);
    if schema.name_row {
        metadata_lines.push(schema.header_name_row()?);
    }

    let mut fasta_lines = Vec::new();
    for record in &records {
        metadata_lines.push(schema.format_row(&portal.row(record, config))?);
        fasta_lines.extend(
            build_record(&record.consensus_path, &record.fasta_header)
                .with_context(|| format!("could not assemble sample {}", record.sample_id))?,
        );
    }

    Ok(Submission {
        metadata_lines,
        fasta_lines,
    })
}

/// Writes lines to `path` atomically: the content goes to a temporary file
/// in the destination directory, which is renamed into place only after a
/// successful write. A failure part-way never leaves a truncated file at
/// the destination.
pub fn write_lines(lines: &[String], path: &Path) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("could not create temporary file in {}", dir.display()))?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file_mut());
        for line in lines {
            writeln!(writer, "{line}")?;
        }
        writer.flush()?;
    }

    temp.persist(path)
        .with_context(|| format!("could not write {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan;

    fn test_config() -> LabConfig {
        serde_json::from_str(
            r#"{
                "submitter": "jdoe",
                "continent": "North America",
                "country": "Canada",
                "province": "Ontario",
                "region_code": "ON",
                "year": "2020",
                "platform": "Oxford Nanopore",
                "assembly_method": "ARTIC-nanopolish 1.1.2",
                "originating_lab": "Unity Health Toronto",
                "originating_lab_address": "30 Bond Street, Toronto, ON, M5B 1W8",
                "submitting_lab": "Ontario Institute for Cancer Research",
                "submitting_lab_address": "661 University Avenue, Toronto, ON, M5G 1M1",
                "authors": "A. Author,B. Author"
            }"#,
        )
        .unwrap()
    }

    #[test]
    fn excluded_samples_are_left_out_of_both_outputs() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("s1.consensus.fasta"), ">s1\nACGT\n").unwrap();
        std::fs::write(dir.path().join("s2.consensus.fasta"), ">s2\nTTTT\n").unwrap();

        let samples = scan(dir.path()).unwrap();
        let exclude: HashSet<String> = ["s1".to_string()].into_iter().collect();

        let submission = assemble(
            Portal::Gisaid,
            &samples,
            &QcTable::new(),
            &DateTable::new(),
            &HashSet::new(),
            &exclude,
            &test_config(),
        )
        .unwrap();

        // two header rows plus exactly one data row, for s2
        assert_eq!(submission.metadata_lines.len(), 3);
        assert!(submission.metadata_lines[2].contains("s2.consensus.fasta"));
        assert_eq!(
            submission.fasta_lines,
            vec![">hCoV-19/Canada/ON-s2/2020".to_string(), "TTTT".to_string()]
        );
    }

    #[test]
    fn empty_scan_still_produces_header_rows() {
        let dir = tempfile::TempDir::new().unwrap();
        let samples = scan(dir.path()).unwrap();

        let submission = assemble(
            Portal::Virusseq,
            &samples,
            &QcTable::new(),
            &DateTable::new(),
            &HashSet::new(),
            &HashSet::new(),
            &test_config(),
        )
        .unwrap();

        assert_eq!(submission.metadata_lines.len(), 1);
        assert!(submission.fasta_lines.is_empty());
    }

    #[test]
    fn write_lines_produces_newline_terminated_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.tsv");

        write_lines(&["a".to_string(), "b".to_string()], &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "a\nb\n");
    }
}
