use crate::errors::SubmissionError;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Suffix patterns identifying a consensus FASTA file, most specific first.
///
/// A single canonical list backs both identification and sample-id
/// extraction, so a file is always stripped of exactly the pattern that
/// matched it. Order matters: the alternation prefers earlier patterns, so
/// `sample.primertrimmed.consensus.fasta` reduces to `sample` rather than to
/// a partial strip from one of the shorter suffixes.
const CONSENSUS_PATTERNS: [&str; 4] = [
    r"\.primertrimmed\.consensus\.fasta",
    r"\.primertrimmed\.consensus\.fa",
    r"\.consensus\.fasta",
    r"\.consensus\.fa",
];

fn consensus_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let alternation = format!("(?:{})", CONSENSUS_PATTERNS.join("|"));
        Regex::new(&alternation).expect("consensus patterns must be a valid regex")
    })
}

/// One consensus FASTA file discovered under the scan root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleRecord {
    pub sample_id: String,
    pub consensus_path: PathBuf,
}

/// Returns true when the basename contains one of the consensus suffix
/// patterns. Matching is substring based, not extension based.
pub fn is_consensus_fasta(basename: &str) -> bool {
    consensus_regex().is_match(basename)
}

/// Extracts the sample name by removing the matched consensus pattern from
/// the basename. Idempotent: an already-stripped name is returned unchanged.
pub fn sample_name_from_fasta(basename: &str) -> String {
    consensus_regex().replace(basename, "").into_owned()
}

/// Walks the directory tree under `root` and emits one [`SampleRecord`] per
/// consensus FASTA file found. Files not matching any pattern are silently
/// skipped. Entries are visited in sorted order within each directory, so
/// the result order is deterministic across platforms.
///
/// # Errors
///
/// Fails when `root` does not exist, when a directory cannot be read, or
/// when two files reduce to the same sample id. The duplicate case is a hard
/// error rather than last-one-wins: overwriting would silently drop a sample
/// from the batch.
pub fn scan(root: &Path) -> Result<Vec<SampleRecord>> {
    if !root.is_dir() {
        return Err(SubmissionError::InputNotFound {
            path: root.to_path_buf(),
        }
        .into());
    }

    let mut found: IndexMap<String, PathBuf> = IndexMap::new();
    walk(root, &mut found)?;

    Ok(found
        .into_iter()
        .map(|(sample_id, consensus_path)| SampleRecord {
            sample_id,
            consensus_path,
        })
        .collect())
}

fn walk(dir: &Path, found: &mut IndexMap<String, PathBuf>) -> Result<()> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("could not read directory {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<_>>()
        .with_context(|| format!("could not read directory {}", dir.display()))?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            walk(&path, found)?;
            continue;
        }

        let Some(basename) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !is_consensus_fasta(basename) {
            continue;
        }

        let sample_id = sample_name_from_fasta(basename);
        if let Some(first) = found.get(&sample_id) {
            return Err(SubmissionError::DuplicateSample {
                id: sample_id,
                first: first.clone(),
                second: path,
            }
            .into());
        }
        debug!("found consensus FASTA for {sample_id}: {}", path.display());
        found.insert(sample_id, path);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_consensus_suffixes() {
        assert!(is_consensus_fasta("sampleA.consensus.fasta"));
        assert!(is_consensus_fasta("sampleA.consensus.fa"));
        assert!(is_consensus_fasta("sampleA.primertrimmed.consensus.fa"));
        assert!(is_consensus_fasta("sampleA.primertrimmed.consensus.fasta"));
        assert!(!is_consensus_fasta("sampleA.fasta"));
        assert!(!is_consensus_fasta("sampleA.fastq"));
        assert!(!is_consensus_fasta("notes.txt"));
    }

    #[test]
    fn strips_exactly_the_matched_pattern() {
        assert_eq!(sample_name_from_fasta("sampleA.consensus.fasta"), "sampleA");
        assert_eq!(sample_name_from_fasta("sampleA.consensus.fa"), "sampleA");
        assert_eq!(
            sample_name_from_fasta("sampleA.primertrimmed.consensus.fa"),
            "sampleA"
        );
        // the longest pattern wins; a shorter suffix must not leave debris
        assert_eq!(
            sample_name_from_fasta("sampleA.primertrimmed.consensus.fasta"),
            "sampleA"
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let stripped = sample_name_from_fasta("sampleA.consensus.fasta");
        assert_eq!(sample_name_from_fasta(&stripped), stripped);
    }

    #[test]
    fn scans_nested_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("runA");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("s1.consensus.fasta"), ">s1\nACGT\n").unwrap();
        std::fs::write(nested.join("s2.consensus.fa"), ">s2\nACGT\n").unwrap();
        std::fs::write(dir.path().join("skipped.fastq"), "@r\nACGT\n+\nIIII\n").unwrap();

        let records = scan(dir.path()).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.sample_id.as_str()).collect();
        assert_eq!(records.len(), 2);
        assert!(ids.contains(&"s1"));
        assert!(ids.contains(&"s2"));
    }

    #[test]
    fn duplicate_sample_ids_are_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("rerun");
        std::fs::create_dir(&nested).unwrap();
        std::fs::write(dir.path().join("s1.consensus.fasta"), ">s1\nACGT\n").unwrap();
        std::fs::write(nested.join("s1.consensus.fa"), ">s1\nACGT\n").unwrap();

        let err = scan(dir.path()).unwrap_err();
        assert!(err.to_string().contains("duplicate sample id 's1'"));
    }

    #[test]
    fn missing_root_is_input_not_found() {
        let err = scan(Path::new("no/such/dir")).unwrap_err();
        assert!(err.to_string().contains("input not found"));
    }
}
