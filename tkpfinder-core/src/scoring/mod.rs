//! Profile scoring.
//!
//! The raw match scores come from an external engine reached through the
//! [`ProfileScorer`] trait. This module turns engine hits into chain
//! annotations that pass the acceptance thresholds.
//!
//! ## Modules
//!
//! - [`library`]: HMM profile discovery and header parsing
//! - [`hmmer`]: [`ProfileScorer`] backed by the `hmmsearch` binary
//!
//! ## Examples
//!
//! ```rust
//! use tkpfinder_core::scoring::{
//!     annotate_chains, BitCutoff, Profile, ProfileHit, ProfileScorer, Thresholds,
//! };
//! use tkpfinder_core::types::{Category, Chain, Interval, TkpError};
//!
//! struct OneHit;
//!
//! impl ProfileScorer for OneHit {
//!     fn score(
//!         &self,
//!         chains: &[Chain],
//!         _profile: &Profile,
//!         _cutoff: Option<BitCutoff>,
//!     ) -> Result<Vec<ProfileHit>, TkpError> {
//!         Ok(vec![ProfileHit::new(&chains[0].id, Interval::new(0, 4)?, 12.0, 1, 4)])
//!     }
//! }
//!
//! let mut chains = vec![Chain::new("p1", "MKVLAAG")];
//! let profile = Profile::new("PF00001", Category::Family, 4);
//! let added = annotate_chains(&mut chains, &OneHit, &profile, &Thresholds::default())?;
//! assert_eq!(added, 1);
//! # Ok::<(), TkpError>(())
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::types::{Annotation, Category, Chain, Interval, Numbering, TkpError};

pub mod hmmer;
pub mod library;

pub use hmmer::HmmsearchScorer;
pub use library::ProfileLibrary;

/// Score cutoffs stored inside a profile and applied by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitCutoff {
    /// Gathering threshold (`GA`)
    Gathering,
    /// Trusted cutoff (`TC`)
    Trusted,
    /// Noise cutoff (`NC`)
    Noise,
}

/// A profile model of one family, domain or motif.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    /// Identifier, the file stem of the profile (usually the Pfam accession)
    pub id: String,
    /// Model name from the `NAME` header line
    pub name: String,
    /// Accession from the `ACC` header line
    pub accession: Option<String>,
    /// Number of match states (`LENG`)
    pub length: usize,
    /// Category the profile annotates
    pub category: Category,
    /// Location of the profile on disk, if any
    pub path: Option<PathBuf>,
}

impl Profile {
    /// Creates an in-memory profile whose name equals its id.
    #[must_use]
    pub fn new(id: impl Into<String>, category: Category, length: usize) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            accession: None,
            length,
            category,
            path: None,
        }
    }
}

/// One domain match reported by the scoring engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileHit {
    /// Identifier of the matched chain
    pub chain_id: String,
    /// Aligned residues on the chain
    pub interval: Interval,
    /// Domain bit score
    pub score: f64,
    /// First aligned profile node (1-based)
    pub profile_from: usize,
    /// Last aligned profile node (1-based, inclusive)
    pub profile_to: usize,
    /// Profile node per aligned residue
    pub numbering: Option<Numbering>,
}

impl ProfileHit {
    #[must_use]
    pub fn new(
        chain_id: impl Into<String>,
        interval: Interval,
        score: f64,
        profile_from: usize,
        profile_to: usize,
    ) -> Self {
        Self {
            chain_id: chain_id.into(),
            interval,
            score,
            profile_from,
            profile_to,
            numbering: None,
        }
    }

    #[must_use]
    pub fn with_numbering(mut self, numbering: Numbering) -> Self {
        self.numbering = Some(numbering);
        self
    }

    /// Fraction of the profile's match states covered by the alignment.
    #[must_use]
    pub fn coverage(&self, profile_length: usize) -> f64 {
        if profile_length == 0 || self.profile_to < self.profile_from {
            return 0.0;
        }
        (self.profile_to - self.profile_from + 1) as f64 / profile_length as f64
    }
}

/// External profile scoring capability.
///
/// Implementations score one profile against a collection of chains and
/// report every domain match. They do not filter by coverage or length and
/// do not retry.
pub trait ProfileScorer: Send + Sync {
    /// Scores `profile` against `chains`.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::ScoringError`] when the engine fails.
    fn score(
        &self,
        chains: &[Chain],
        profile: &Profile,
        cutoff: Option<BitCutoff>,
    ) -> Result<Vec<ProfileHit>, TkpError>;
}

impl<S: ProfileScorer + ?Sized> ProfileScorer for Box<S> {
    fn score(
        &self,
        chains: &[Chain],
        profile: &Profile,
        cutoff: Option<BitCutoff>,
    ) -> Result<Vec<ProfileHit>, TkpError> {
        (**self).score(chains, profile, cutoff)
    }
}

/// Acceptance thresholds for engine hits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Thresholds {
    /// Minimum domain bit score
    pub min_score: Option<f64>,
    /// Minimum fraction of the profile covered
    pub min_coverage: Option<f64>,
    /// Minimum number of aligned residues
    pub min_length: Option<usize>,
    /// Cutoff the engine applies before reporting
    pub cutoff: Option<BitCutoff>,
}

impl Thresholds {
    fn accepts(&self, hit: &ProfileHit, coverage: f64) -> bool {
        self.min_score.map_or(true, |min| hit.score >= min)
            && self.min_coverage.map_or(true, |min| coverage >= min)
            && self.min_length.map_or(true, |min| hit.interval.len() >= min)
    }
}

/// Adds one annotation per accepted hit of `profile` to `chains`.
///
/// Existing annotations are never removed; a hit whose id already exists
/// replaces the stored annotation, so re-scoring is idempotent.
///
/// Returns the number of new annotation ids.
///
/// # Errors
///
/// Propagates engine failures, and returns [`TkpError::ScoringError`] when
/// a hit lies outside its chain.
pub fn annotate_chains<S: ProfileScorer + ?Sized>(
    chains: &mut [Chain],
    scorer: &S,
    profile: &Profile,
    thresholds: &Thresholds,
) -> Result<usize, TkpError> {
    if chains.is_empty() {
        return Ok(0);
    }

    let hits = scorer.score(chains, profile, thresholds.cutoff)?;
    let positions: HashMap<String, usize> = chains
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id.clone(), i))
        .collect();

    let mut added = 0;
    for hit in hits {
        let Some(&position) = positions.get(&hit.chain_id) else {
            warn!(profile = %profile.id, chain = %hit.chain_id, "hit on unknown chain ignored");
            continue;
        };
        let coverage = hit.coverage(profile.length);
        if !thresholds.accepts(&hit, coverage) {
            continue;
        }

        let chain = &mut chains[position];
        let mut annotation = Annotation::new(
            chain,
            profile.category,
            profile.id.as_str(),
            hit.interval,
            hit.score,
        )
        .map_err(|e| TkpError::ScoringError {
            profile: profile.id.clone(),
            reason: e.to_string(),
        })?;
        annotation.name = profile.name.clone();
        annotation.coverage = Some(coverage);
        annotation.numbering = hit
            .numbering
            .filter(|numbering| numbering.len() == hit.interval.len());

        if chain.insert(annotation) {
            added += 1;
        }
    }

    debug!(profile = %profile.id, added, "profile scored");
    Ok(added)
}
