use std::time::Duration;

use crate::constants::{
    CONSERVED_POSITIONS, DEFAULT_TIMEOUT_SECS, MAX_RESOLVER_ITERATIONS, MIN_HMM_COVERAGE,
    MIN_HMM_SCORE, MIN_PK_DOMAIN_SIZE, MIN_PK_DOMAINS, PK_NAME, PPK_NAME, REFERENCE_MOTIF,
};
use crate::types::{Category, TkpError};

/// Configuration settings for tandem kinase discovery and annotation.
///
/// # Examples
///
/// ## Default configuration
///
/// ```rust
/// use tkpfinder_core::config::TkpConfig;
///
/// let config = TkpConfig::default();
/// assert!(config.validate().is_ok());
/// ```
///
/// ## Parallel run with relaxed discovery
///
/// ```rust
/// use std::time::Duration;
/// use tkpfinder_core::config::TkpConfig;
///
/// let config = TkpConfig {
///     min_pk_domain_size: 120,
///     num_workers: Some(8),
///     timeout: Duration::from_secs(60),
///     ..Default::default()
/// };
/// ```
#[derive(Debug, Clone)]
pub struct TkpConfig {
    /// Minimum number of residues in a target kinase domain.
    ///
    /// **Default**: 150
    pub min_pk_domain_size: usize,

    /// Minimum number of non-overlapping target domains for a chain to be
    /// called a tandem kinase.
    ///
    /// Applied both before and after overlap resolution.
    ///
    /// **Default**: 2
    pub min_pk_domains: usize,

    /// Minimum bit score of a secondary annotation.
    ///
    /// **Default**: 0.0
    pub min_hmm_score: f64,

    /// Minimum fraction of the profile a secondary annotation must cover.
    ///
    /// **Default**: 0.5
    pub min_hmm_cov: f64,

    /// Motif discriminating active from pseudo kinases.
    ///
    /// `X` tolerates any residue. Must be as long as
    /// [`TkpConfig::conserved_positions`].
    ///
    /// **Default**: `KXXXDDXX`
    pub reference_motif: String,

    /// 1-based conserved positions read from each target domain.
    pub conserved_positions: Vec<usize>,

    /// Secondary categories, annotated and resolved in this order.
    ///
    /// **Default**: Family, Domain, Motif
    pub categories: Vec<Category>,

    /// Display prefix of target domains.
    pub pk_name: String,

    /// Display prefix replacing [`TkpConfig::pk_name`] on pseudo kinases.
    pub ppk_name: String,

    /// Number of worker threads for multi-input runs.
    ///
    /// `None` or `Some(1)` runs inputs sequentially.
    pub num_workers: Option<usize>,

    /// Time the coordinator waits for each input's result.
    ///
    /// **Default**: 300 s
    pub timeout: Duration,

    /// Iteration bound of the overlap resolver.
    ///
    /// **Default**: 1 000 000
    pub max_resolver_iterations: usize,
}

impl Default for TkpConfig {
    fn default() -> Self {
        Self {
            min_pk_domain_size: MIN_PK_DOMAIN_SIZE,
            min_pk_domains: MIN_PK_DOMAINS,
            min_hmm_score: MIN_HMM_SCORE,
            min_hmm_cov: MIN_HMM_COVERAGE,
            reference_motif: REFERENCE_MOTIF.to_string(),
            conserved_positions: CONSERVED_POSITIONS.to_vec(),
            categories: Category::SECONDARY.to_vec(),
            pk_name: PK_NAME.to_string(),
            ppk_name: PPK_NAME.to_string(),
            num_workers: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_resolver_iterations: MAX_RESOLVER_ITERATIONS,
        }
    }
}

impl TkpConfig {
    /// Checks the settings that would otherwise fail every input.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::InvalidConfig`] when the reference motif length
    /// differs from the number of conserved positions, a conserved position
    /// is zero, `min_pk_domains` is zero, the coverage is outside `[0, 1]`,
    /// the category order is empty, repeats a category or names `Target`,
    /// or the PK/PPK names are empty.
    pub fn validate(&self) -> Result<(), TkpError> {
        let motif_len = self.reference_motif.chars().count();
        if motif_len != self.conserved_positions.len() {
            return Err(TkpError::InvalidConfig(format!(
                "reference motif `{}` has {} residues but {} conserved positions are read",
                self.reference_motif,
                motif_len,
                self.conserved_positions.len()
            )));
        }
        if self.conserved_positions.contains(&0) {
            return Err(TkpError::InvalidConfig(
                "conserved positions are 1-based".to_string(),
            ));
        }
        if self.min_pk_domains == 0 {
            return Err(TkpError::InvalidConfig(
                "min_pk_domains must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_hmm_cov) {
            return Err(TkpError::InvalidConfig(format!(
                "min_hmm_cov must lie in [0, 1], got {}",
                self.min_hmm_cov
            )));
        }
        if self.categories.is_empty() {
            return Err(TkpError::InvalidConfig(
                "at least one annotation category is required".to_string(),
            ));
        }
        for (i, category) in self.categories.iter().enumerate() {
            if *category == Category::Target {
                return Err(TkpError::InvalidConfig(
                    "Target is reserved for the kinase discovery step".to_string(),
                ));
            }
            if self.categories[..i].contains(category) {
                return Err(TkpError::InvalidConfig(format!(
                    "category {category} is listed twice"
                )));
            }
        }
        if self.pk_name.is_empty() || self.ppk_name.is_empty() {
            return Err(TkpError::InvalidConfig(
                "PK and PPK names must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether multi-input runs fan out to worker threads.
    #[must_use]
    pub fn is_parallel(&self, num_inputs: usize) -> bool {
        matches!(self.num_workers, Some(n) if n > 1) && num_inputs > 1
    }
}
