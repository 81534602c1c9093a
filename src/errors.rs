use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a submission package.
///
/// Fatal variants unwind to `main`, which reports the cause chain and exits
/// non-zero before any output file has been moved into place. Lookup misses
/// in the QC table are deliberately *not* represented here: a missing QC row
/// is substituted with a sentinel and logged, never raised.
#[derive(Debug, Error)]
pub enum SubmissionError {
    /// A required file or directory argument does not exist.
    #[error("input not found: {path:?}")]
    InputNotFound { path: PathBuf },

    /// A consensus FASTA file could not be parsed at all.
    #[error("could not parse FASTA {path:?}")]
    FastaParse {
        path: PathBuf,
        #[source]
        source: needletail::errors::ParseError,
    },

    /// A consensus FASTA file contained no sequence records.
    #[error("no sequence records in {path:?}")]
    EmptyFasta { path: PathBuf },

    /// A consensus FASTA file contained more than one sequence record.
    /// Consensus files hold exactly one assembled genome; using only the
    /// first record would silently drop data.
    #[error("expected exactly one sequence record in {path:?}, found more than one")]
    MultiRecordFasta { path: PathBuf },

    /// Two scanned files reduced to the same sample id.
    #[error("duplicate sample id '{id}': {first:?} and {second:?}")]
    DuplicateSample {
        id: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// A tabular input is missing a column the join depends on.
    #[error("required column '{column}' not found in {path:?}")]
    MissingColumn { column: String, path: PathBuf },
}
