//! # TKP Finder - Tandem Kinase Discovery
//!
//! Discovers proteins carrying two or more protein kinase domains in protein
//! sequence collections, annotates them with Pfam families, domains and
//! motifs, and tells active kinase domains apart from pseudokinases.
//!
//! ## Overview
//!
//! Each input runs through a fixed pipeline:
//!
//! 1. **Discover**: score every chain with the kinase profile and keep chains
//!    with at least `min_pk_domains` non-overlapping domains
//! 2. **Categorize**: annotate the kept chains with every secondary profile
//!    and resolve overlaps within each category
//! 3. **Extract**: read the conserved residues of each kinase domain
//! 4. **Classify**: call each domain active or pseudo from those residues
//! 5. **Aggregate**: flatten the annotations into a sorted table
//!
//! Profile scores come from an external engine behind the
//! [`scoring::ProfileScorer`] trait; [`scoring::HmmsearchScorer`] drives
//! HMMER's `hmmsearch`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::{Path, PathBuf};
//! use tkpfinder_core::{HmmsearchScorer, ProfileLibrary, SequenceInput, TkpAnnotator, TkpConfig};
//!
//! let config = TkpConfig::default();
//! let library = ProfileLibrary::from_dir(Path::new("hmm"), &config.categories, None)?;
//! let annotator = TkpAnnotator::new(config, HmmsearchScorer::default(), library)?;
//!
//! let results = annotator.annotate(SequenceInput::Fasta(PathBuf::from("proteome.fasta")))?;
//! println!("Found {} tandem kinases", results.chains.len());
//! # Ok::<(), tkpfinder_core::types::TkpError>(())
//! ```
//!
//! ## Module Organization
//!
//! - [`config`]: Pipeline settings
//! - [`engine`]: Per-input annotation pipeline
//! - [`runner`]: Parallel multi-input execution with failure isolation
//! - [`types`]: Chains, annotations and errors
//! - [`results`]: Annotation results of one input
//! - [`sequence`]: Input shapes and FASTA I/O
//! - [`scoring`]: Profile library and the scoring engine adapter
//! - [`algorithms`]: Overlap resolution and motif classification
//! - [`output`]: Summary tables and per-input output files
//! - [`transmembrane`]: Transmembrane region prediction contract
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, TkpError>`](types::TkpError),
//! covering:
//!
//! - Missing or malformed inputs and profiles
//! - Failures of the external scoring engine
//! - Overlap resolution exceeding its iteration bound
//! - Failed, panicked or timed-out parallel units

pub mod algorithms;
pub mod config;
pub mod constants;
pub mod engine;
pub mod output;
pub mod results;
pub mod runner;
pub mod scoring;
pub mod sequence;
pub mod transmembrane;
pub mod types;

pub use config::TkpConfig;
pub use engine::TkpAnnotator;
pub use results::TkpResults;
pub use scoring::{HmmsearchScorer, ProfileLibrary, ProfileScorer};
pub use sequence::SequenceInput;
pub use types::TkpError;
