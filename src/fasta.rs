use crate::errors::SubmissionError;
use anyhow::Result;
use needletail::parse_fastx_file;
use std::path::Path;

/// Column width for wrapped sequence lines in the output FASTA.
pub const WRAP_WIDTH: usize = 60;

/// Renders a portal-compatible FASTA header:
/// `>hCoV-19/Canada/ON-samplename/2020`.
///
/// The sample id is usually a composite (region code + bare sample id) built
/// by the caller; this function only joins the four fields with `/` and is
/// otherwise domain-agnostic. No character-set validation is performed, the
/// header is emitted as-is.
pub fn build_header(virus: &str, country: &str, sample_id: &str, year: &str) -> String {
    let fasta_id = [virus, country, sample_id, year].join("/");
    format!(">{fasta_id}")
}

/// Splits a sequence into chunks of at most `width` characters, preserving
/// character order. The last chunk may be shorter.
pub fn wrap_sequence(seq: &str, width: usize) -> Vec<String> {
    seq.as_bytes()
        .chunks(width)
        .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
        .collect()
}

/// Reads the single sequence record from `fasta_path` and returns the output
/// lines for it: the given header first, then the sequence wrapped at
/// [`WRAP_WIDTH`] characters. Consumers reconstruct the sequence by
/// concatenating every line after the header, so line order is significant.
///
/// # Errors
///
/// * [`SubmissionError::InputNotFound`] when the path does not exist.
/// * [`SubmissionError::EmptyFasta`] when the file holds no sequence record.
/// * [`SubmissionError::MultiRecordFasta`] when the file holds more than one
///   record; consensus files are expected to contain exactly one sequence,
///   and taking the first would be silent data loss.
pub fn build_record(fasta_path: &Path, header: &str) -> Result<Vec<String>> {
    if !fasta_path.is_file() {
        return Err(SubmissionError::InputNotFound {
            path: fasta_path.to_path_buf(),
        }
        .into());
    }

    let mut reader = parse_fastx_file(fasta_path).map_err(|source| SubmissionError::FastaParse {
        path: fasta_path.to_path_buf(),
        source,
    })?;

    let record = match reader.next() {
        Some(record) => record.map_err(|source| SubmissionError::FastaParse {
            path: fasta_path.to_path_buf(),
            source,
        })?,
        None => {
            return Err(SubmissionError::EmptyFasta {
                path: fasta_path.to_path_buf(),
            }
            .into())
        }
    };

    let sequence = String::from_utf8_lossy(&record.seq()).into_owned();

    if reader.next().is_some() {
        return Err(SubmissionError::MultiRecordFasta {
            path: fasta_path.to_path_buf(),
        }
        .into());
    }

    let mut lines = Vec::with_capacity(1 + sequence.len() / WRAP_WIDTH + 1);
    lines.push(header.to_string());
    lines.extend(wrap_sequence(&sequence, WRAP_WIDTH));
    Ok(lines)
}
