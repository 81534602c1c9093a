use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::{Args, Parser, Subcommand};

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧬 seqsubmit version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   prepare consensus genome batches for portal submission";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    flatten_help = true,
    styles = STYLES
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Inputs and outputs shared by every submission target.
#[derive(Args)]
pub struct SubmissionArgs {
    /// directory to search for consensus FASTA files
    #[arg(short, long)]
    pub directory: String,

    /// run configuration in JSON format
    #[arg(short, long)]
    pub config: String,

    /// per-sample QC summary table (TSV). samples without a QC row are
    /// reported with 'unknown' metrics rather than dropped
    #[arg(short, long)]
    pub qc: Option<String>,

    /// lab sample-date table (TSV with sample, external_name, date, ct)
    #[arg(long)]
    pub dates: Option<String>,

    /// newline-delimited list of sample ids to submit; all other samples
    /// are skipped
    #[arg(long)]
    pub include: Option<String>,

    /// newline-delimited list of sample ids to withhold. a sample on both
    /// lists is withheld
    #[arg(long)]
    pub exclude: Option<String>,

    /// the output metadata file
    #[arg(short = 'o', long)]
    pub metadata: String,

    /// the output multi-sample FASTA file
    #[arg(short, long)]
    pub fasta: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the metadata spreadsheet and multi-sample FASTA for a GISAID
    /// batch upload
    #[command(arg_required_else_help = true)]
    Gisaid {
        #[command(flatten)]
        args: SubmissionArgs,
    },

    /// Create the metadata file and multi-sample FASTA for a VirusSeq
    /// portal upload
    #[command(arg_required_else_help = true)]
    Virusseq {
        #[command(flatten)]
        args: SubmissionArgs,
    },
}
