use crate::output::{aggregate, SummaryRow};
use crate::types::{Category, Chain};

/// Annotated tandem kinases found in one input.
///
/// An empty result is the regular outcome for an input without tandem
/// kinases; it is not an error.
///
/// # Examples
///
/// ```rust
/// use tkpfinder_core::results::TkpResults;
///
/// let results = TkpResults::empty("proteome.fasta");
/// assert!(results.is_empty());
/// assert!(results.summary().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TkpResults {
    /// Label of the input the chains came from
    pub source: String,

    /// Chains with at least `min_pk_domains` target domains, each carrying
    /// its resolved secondary annotations.
    pub chains: Vec<Chain>,
}

impl TkpResults {
    #[must_use]
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            chains: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Number of target kinase domains over all chains.
    #[must_use]
    pub fn num_domains(&self) -> usize {
        self.chains
            .iter()
            .map(|chain| chain.count_of(Category::Target))
            .sum()
    }

    /// Flattened, sorted annotation table.
    #[must_use]
    pub fn summary(&self) -> Vec<SummaryRow> {
        aggregate(&self.chains)
    }
}
