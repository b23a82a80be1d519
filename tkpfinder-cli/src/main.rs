//! # TKP Finder CLI
//!
//! Finds tandem protein kinases in protein FASTA files and annotates them
//! with Pfam profiles.
//!
//! ## Usage
//!
//! ```bash
//! # One proteome, profiles in ./hmm, results in ./tkp-finder
//! tkp-finder proteome.fasta
//!
//! # Several proteomes on four workers
//! tkp-finder -n 4 -o results a.fasta b.fasta c.fasta
//!
//! # Only family and domain profiles, stricter coverage
//! tkp-finder -t Family -t Domain -c 0.7 proteome.fasta
//! ```
//!
//! ## HMM directory
//!
//! ```text
//! hmm/PF00069.hmm                  kinase profile (or pass -p)
//! hmm/profiles/Family/*.hmm
//! hmm/profiles/Domain/*.hmm
//! hmm/profiles/Motif/*.hmm
//! ```
//!
//! ## Outputs
//!
//! For every input with hits, `<output>/<input file name>/` holds
//! `chains/*.json`, `domains.fasta`, `motifs.tsv` and `summary.tsv`.
//!
//! Logging goes to stderr; set `RUST_LOG` to override `-q`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use tkpfinder_core::constants::{
    DEFAULT_TIMEOUT_SECS, MIN_HMM_COVERAGE, MIN_HMM_SCORE, MIN_PK_DOMAINS, MIN_PK_DOMAIN_SIZE,
    PK_NAME, PPK_NAME, REFERENCE_MOTIF,
};
use tkpfinder_core::output::write_results;
use tkpfinder_core::types::Category;
use tkpfinder_core::{HmmsearchScorer, ProfileLibrary, SequenceInput, TkpAnnotator, TkpConfig};

fn build_cli() -> Command {
    Command::new("tkp-finder")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find and annotate tandem protein kinases")
        .long_about(
            "Finds proteins with at least `--min-pk-domains` protein kinase domains in each \
             input FASTA file, annotates them with Pfam profiles grouped by type, keeping the \
             non-overlapping annotations with the highest cumulative bit score within each \
             type, and calls every kinase domain active or pseudo from its conserved residues.",
        )
        .arg(
            Arg::new("fasta")
                .value_name("FASTA")
                .num_args(1..)
                .value_parser(value_parser!(PathBuf))
                .help("Input protein FASTA files"),
        )
        .arg(
            Arg::new("hmm-dir")
                .short('H')
                .long("hmm-dir")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("hmm")
                .help("Directory with the kinase profile and a `profiles` sub-directory"),
        )
        .arg(
            Arg::new("hmm-type")
                .short('t')
                .long("hmm-type")
                .value_name("TYPE")
                .action(ArgAction::Append)
                .default_values(["Family", "Domain", "Motif"])
                .help("Profile types to annotate with, in order"),
        )
        .arg(
            Arg::new("pk-profile")
                .short('p')
                .long("pk-profile")
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("Kinase profile (default: <hmm-dir>/PF00069.hmm)"),
        )
        .arg(
            Arg::new("motif")
                .short('m')
                .long("motif")
                .value_name("MOTIF")
                .default_value(REFERENCE_MOTIF)
                .help("Motif over b3-Lys, aC-Glu, HRD and DFG telling kinases from pseudokinases"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("DIR")
                .value_parser(value_parser!(PathBuf))
                .default_value("tkp-finder")
                .help("Output directory"),
        )
        .arg(
            Arg::new("pk-map-name")
                .long("pk-map-name")
                .value_name("NAME")
                .default_value(PK_NAME)
                .help("Label of protein kinase domains"),
        )
        .arg(
            Arg::new("ppk-map-name")
                .long("ppk-map-name")
                .value_name("NAME")
                .default_value(PPK_NAME)
                .help("Label of pseudokinase domains"),
        )
        .arg(
            Arg::new("min-pk-domain-size")
                .short('s')
                .long("min-pk-domain-size")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("150")
                .help("Minimum number of residues in a kinase domain"),
        )
        .arg(
            Arg::new("min-pk-domains")
                .long("min-pk-domains")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .default_value("2")
                .help("Minimum number of kinase domains of a tandem kinase"),
        )
        .arg(
            Arg::new("min-hmm-score")
                .short('S')
                .long("min-hmm-score")
                .value_name("SCORE")
                .value_parser(value_parser!(f64))
                .default_value("0.0")
                .help("Minimum bit score of an annotation"),
        )
        .arg(
            Arg::new("min-hmm-cov")
                .short('c')
                .long("min-hmm-cov")
                .value_name("FRACTION")
                .value_parser(value_parser!(f64))
                .default_value("0.5")
                .help("Minimum fraction of a profile covered by an annotation"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .value_parser(value_parser!(u64))
                .default_value("300")
                .help("Time to wait for the result of one input in parallel mode"),
        )
        .arg(
            Arg::new("num-proc")
                .short('n')
                .long("num-proc")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Number of inputs processed in parallel"),
        )
        .arg(
            Arg::new("hmmsearch")
                .long("hmmsearch")
                .value_name("PATH")
                .value_parser(value_parser!(PathBuf))
                .default_value("hmmsearch")
                .help("hmmsearch executable"),
        )
        .arg(
            Arg::new("cpu")
                .long("cpu")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Threads given to each hmmsearch run"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Only log warnings and errors"),
        )
}

fn init_logging(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn config_from_matches(matches: &ArgMatches) -> Result<TkpConfig> {
    let categories = matches
        .get_many::<String>("hmm-type")
        .into_iter()
        .flatten()
        .map(|name| name.parse::<Category>())
        .collect::<Result<Vec<_>, _>>()?;

    let config = TkpConfig {
        min_pk_domain_size: *matches
            .get_one::<usize>("min-pk-domain-size")
            .unwrap_or(&MIN_PK_DOMAIN_SIZE),
        min_pk_domains: *matches
            .get_one::<usize>("min-pk-domains")
            .unwrap_or(&MIN_PK_DOMAINS),
        min_hmm_score: *matches
            .get_one::<f64>("min-hmm-score")
            .unwrap_or(&MIN_HMM_SCORE),
        min_hmm_cov: *matches
            .get_one::<f64>("min-hmm-cov")
            .unwrap_or(&MIN_HMM_COVERAGE),
        reference_motif: matches
            .get_one::<String>("motif")
            .map_or_else(|| REFERENCE_MOTIF.to_string(), Clone::clone),
        categories,
        pk_name: matches
            .get_one::<String>("pk-map-name")
            .map_or_else(|| PK_NAME.to_string(), Clone::clone),
        ppk_name: matches
            .get_one::<String>("ppk-map-name")
            .map_or_else(|| PPK_NAME.to_string(), Clone::clone),
        num_workers: matches.get_one::<usize>("num-proc").copied(),
        timeout: Duration::from_secs(
            *matches
                .get_one::<u64>("timeout")
                .unwrap_or(&DEFAULT_TIMEOUT_SECS),
        ),
        ..Default::default()
    };
    config.validate()?;
    Ok(config)
}

fn run(matches: &ArgMatches) -> Result<()> {
    let inputs: Vec<PathBuf> = matches
        .get_many::<PathBuf>("fasta")
        .into_iter()
        .flatten()
        .cloned()
        .collect();
    if inputs.is_empty() {
        bail!("No inputs provided. Use -h or --help to invoke help.");
    }
    for input in &inputs {
        if !input.is_file() {
            bail!("File {} does not exist", input.display());
        }
    }

    let config = config_from_matches(matches).context("invalid options")?;

    let hmm_dir = matches
        .get_one::<PathBuf>("hmm-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("hmm"));
    let library = ProfileLibrary::from_dir(
        &hmm_dir,
        &config.categories,
        matches.get_one::<PathBuf>("pk-profile").map(PathBuf::as_path),
    )
    .with_context(|| format!("failed to load profiles from {}", hmm_dir.display()))?;

    let mut scorer = HmmsearchScorer::new(
        matches
            .get_one::<PathBuf>("hmmsearch")
            .cloned()
            .unwrap_or_else(|| PathBuf::from("hmmsearch")),
    );
    if let Some(&cpus) = matches.get_one::<usize>("cpu") {
        scorer = scorer.with_cpus(cpus);
    }

    let output = matches
        .get_one::<PathBuf>("output")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("tkp-finder"));
    std::fs::create_dir_all(&output)
        .with_context(|| format!("cannot create output dir {}", output.display()))?;
    info!(path = %output.display(), "writing results");

    let annotator = Arc::new(TkpAnnotator::new(config, scorer, library)?);
    if annotator.config().is_parallel(inputs.len()) {
        info!(inputs = inputs.len(), "processing files in parallel");
    }
    let results = annotator.annotate_batch(
        inputs
            .iter()
            .cloned()
            .map(SequenceInput::Fasta)
            .collect(),
    )?;

    let mut found = 0;
    let mut failed = 0;
    for (input, result) in inputs.iter().zip(&results) {
        let Some(result) = result else {
            warn!(input = %input.display(), "no result");
            failed += 1;
            continue;
        };
        found += result.chains.len();
        if let Err(e) = write_results(&output, result) {
            error!(input = %input.display(), error = %e, "failed to write results");
            failed += 1;
        }
    }

    info!(tkps = found, inputs = inputs.len(), failed, "analysis complete");
    if failed > 0 {
        bail!("{failed} of {} inputs failed", inputs.len());
    }
    Ok(())
}

/// Main entry point for the TKP Finder CLI application.
///
/// Parses command-line arguments, loads the profile library, annotates
/// every input and writes the per-input results.
fn main() -> Result<()> {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("quiet"));
    run(&matches)
}
