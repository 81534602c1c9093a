extern crate env_logger;
#[macro_use]
extern crate log;

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use clap::Parser;

mod assemble;
mod cli;
mod config;
mod errors;
mod fasta;
mod metadata;
mod portal;
mod scan;

use cli::{Cli, Commands, SubmissionArgs};
use portal::Portal;

/// Runs one submission batch end to end: load the run inputs, scan for
/// consensus FASTA files, join and filter, then write the metadata file and
/// the multi-sample FASTA. Both writes are atomic, so a failure anywhere
/// leaves no partial output behind.
fn run_submission(portal: Portal, args: &SubmissionArgs) -> Result<()> {
    let config = config::LabConfig::from_path(Path::new(&args.config))?;

    let samples = scan::scan(Path::new(&args.directory))?;
    info!(
        "found {} consensus FASTA files under {}",
        samples.len(),
        args.directory
    );

    let qc = match &args.qc {
        Some(path) => metadata::load_qc_table(Path::new(path))?,
        None => metadata::QcTable::new(),
    };
    let dates = match &args.dates {
        Some(path) => metadata::load_sample_dates(Path::new(path))?,
        None => metadata::DateTable::new(),
    };
    let include = match &args.include {
        Some(path) => metadata::load_id_set(Path::new(path))?,
        None => HashSet::new(),
    };
    let exclude = match &args.exclude {
        Some(path) => metadata::load_id_set(Path::new(path))?,
        None => HashSet::new(),
    };

    let submission = assemble::assemble(
        portal, &samples, &qc, &dates, &include, &exclude, &config,
    )?;

    assemble::write_lines(&submission.metadata_lines, Path::new(&args.metadata))?;
    assemble::write_lines(&submission.fasta_lines, Path::new(&args.fasta))?;

    info!("wrote metadata to {}", args.metadata);
    info!("wrote multi-sample FASTA to {}", args.fasta);

    Ok(())
}

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Gisaid { args } => run_submission(Portal::Gisaid, args)?,
        Commands::Virusseq { args } => run_submission(Portal::Virusseq, args)?,
    };
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        std::process::exit(1);
    }
}
