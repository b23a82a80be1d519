//! Sequence input handling.
//!
//! Every accepted input shape is a variant of [`SequenceInput`] and is turned
//! into plain [`Chain`]s before any pipeline logic runs.
//!
//! ## Modules
//!
//! - [`io`]: FASTA reading and domain sequence writing
//!
//! ## Examples
//!
//! ```rust
//! use tkpfinder_core::sequence::SequenceInput;
//!
//! let input = SequenceInput::Records(vec![
//!     ("p1".to_string(), "MKVLAAG".to_string()),
//!     ("p2".to_string(), "MKVLAAG".to_string()),
//!     ("p3".to_string(), "GKSTLLR".to_string()),
//! ]);
//! let chains = input.into_chains()?;
//!
//! // p2 repeats p1's residues and is dropped
//! assert_eq!(chains.len(), 2);
//! # Ok::<(), tkpfinder_core::types::TkpError>(())
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::PathBuf;

use crate::types::{Chain, TkpError};

pub mod io;

pub use io::{read_fasta_records, write_domains_fasta, FastaRecord};

/// Accepted sequence input shapes.
#[derive(Debug, Clone)]
pub enum SequenceInput {
    /// In-memory (identifier, residues) pairs
    Records(Vec<FastaRecord>),
    /// Already constructed chains, possibly carrying annotations
    Chains(Vec<Chain>),
    /// Path to a FASTA file
    Fasta(PathBuf),
}

impl SequenceInput {
    /// Short label used in logs and output directory names.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Records(records) => format!("<{} records>", records.len()),
            Self::Chains(chains) => format!("<{} chains>", chains.len()),
            Self::Fasta(path) => path
                .file_name()
                .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned()),
        }
    }

    /// Converts the input into chains.
    ///
    /// Records repeating an earlier record's residues are dropped, keeping
    /// the first occurrence. Identifiers must be unique among the rest.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::InvalidInput`] for unreadable files, empty
    /// sequences and annotations reaching past their sequence, and [`TkpError::ParseError`] for malformed FASTA.
    pub fn into_chains(self) -> Result<Vec<Chain>, TkpError> {
        let chains = match self {
            Self::Records(records) => records
                .into_iter()
                .map(|(id, seq)| Chain::new(id, seq))
                .collect(),
            Self::Chains(chains) => chains,
            Self::Fasta(path) => read_fasta_records(&path)?
                .into_iter()
                .map(|(id, seq)| Chain::new(id, seq))
                .collect(),
        };
        unique_by_sequence(chains)
    }
}

impl From<PathBuf> for SequenceInput {
    fn from(path: PathBuf) -> Self {
        Self::Fasta(path)
    }
}

impl From<Vec<FastaRecord>> for SequenceInput {
    fn from(records: Vec<FastaRecord>) -> Self {
        Self::Records(records)
    }
}

impl From<Vec<Chain>> for SequenceInput {
    fn from(chains: Vec<Chain>) -> Self {
        Self::Chains(chains)
    }
}

impl fmt::Display for SequenceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

fn unique_by_sequence(chains: Vec<Chain>) -> Result<Vec<Chain>, TkpError> {
    let mut seen = HashSet::new();
    let mut ids = HashSet::new();
    let mut unique = Vec::with_capacity(chains.len());
    for chain in chains {
        if chain.is_empty() {
            return Err(TkpError::InvalidInput(format!(
                "sequence {} is empty",
                chain.id
            )));
        }
        if !chain.seq.is_ascii() {
            return Err(TkpError::InvalidInput(format!(
                "sequence {} contains non-ASCII residues",
                chain.id
            )));
        }
        if let Some(annotation) = chain.annotations().iter().find(|a| a.end() > chain.len()) {
            return Err(TkpError::InvalidInput(format!(
                "annotation {} ends past sequence {} of length {}",
                annotation.id,
                chain.id,
                chain.len()
            )));
        }
        if !seen.insert(chain.seq.clone()) {
            continue;
        }
        if !ids.insert(chain.id.clone()) {
            return Err(TkpError::InvalidInput(format!(
                "identifier {} names two different sequences",
                chain.id
            )));
        }
        unique.push(chain);
    }
    Ok(unique)
}
