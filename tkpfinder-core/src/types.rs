use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MISSING_RESIDUE, TARGET_LABEL};

/// Per-residue profile numbering of a domain.
///
/// Entry `i` holds the 1-based profile node aligned to the `i`-th residue of
/// the domain, or `None` when the residue sits in an insert state.
pub type Numbering = Vec<Option<usize>>;

/// Annotation categories recognised by the pipeline.
///
/// `Target` marks the kinase domains found during discovery. The remaining
/// variants are the secondary profile collections, each resolved on its own.
///
/// # Examples
///
/// ```rust
/// use tkpfinder_core::types::Category;
///
/// let category: Category = "Family".parse().unwrap();
/// assert_eq!(category, Category::Family);
/// assert_eq!(Category::Target.label(), "Target");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    /// Kinase domains found with the target profile
    Target,
    /// Pfam "Family" profiles
    Family,
    /// Pfam "Domain" profiles
    Domain,
    /// Pfam "Motif" profiles
    Motif,
}

impl Category {
    /// Default processing order of the secondary categories.
    pub const SECONDARY: [Category; 3] = [Category::Family, Category::Domain, Category::Motif];

    /// Label used in file names, ids and the summary table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Target => TARGET_LABEL,
            Self::Family => "Family",
            Self::Domain => "Domain",
            Self::Motif => "Motif",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = TkpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Target" => Ok(Self::Target),
            "Family" => Ok(Self::Family),
            "Domain" => Ok(Self::Domain),
            "Motif" => Ok(Self::Motif),
            other => Err(TkpError::InvalidConfig(format!(
                "unknown annotation category `{other}` (expected Family, Domain or Motif)"
            ))),
        }
    }
}

/// Half-open residue interval `[start, end)` on a parent chain.
///
/// Deserialization goes through [`Interval::new`], so stored intervals are
/// never empty or inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawInterval")]
pub struct Interval {
    /// 0-based first residue
    pub start: usize,
    /// 0-based position one past the last residue
    pub end: usize,
}

impl Interval {
    /// Creates an interval, rejecting empty or inverted ranges.
    pub fn new(start: usize, end: usize) -> Result<Self, TkpError> {
        if start >= end {
            return Err(TkpError::InvalidInput(format!(
                "empty or inverted interval [{start}, {end})"
            )));
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Two half-open intervals overlap iff they share at least one residue.
    #[must_use]
    pub const fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

#[derive(Deserialize)]
struct RawInterval {
    start: usize,
    end: usize,
}

impl TryFrom<RawInterval> for Interval {
    type Error = TkpError;

    fn try_from(raw: RawInterval) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Activity call for a target kinase domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activity {
    /// Every conserved residue of the reference motif is present
    Active,
    /// At least one conserved residue is substituted
    Pseudo,
}

impl Activity {
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

/// A scored region of a chain produced by one profile.
///
/// The id is derived from the category, the profile and the interval, so
/// scoring the same profile twice replaces rather than duplicates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Deterministic identifier, see [`Annotation::make_id`]
    pub id: String,
    /// Display label (`PK_1`, `PPK_2`, or the profile name)
    pub name: String,
    /// Residue interval on the parent chain
    pub interval: Interval,
    /// Category the source profile belongs to
    pub category: Category,
    /// Source profile identifier
    pub profile: String,
    /// Domain bit score reported by the scoring engine
    pub score: f64,
    /// Fraction of the profile covered by the alignment
    pub coverage: Option<f64>,
    /// Profile node per residue, when the engine reported an alignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
    /// Residues at the conserved positions, concatenated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motif: Option<String>,
    /// Activity call derived from [`Annotation::motif`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity: Option<Activity>,
}

impl Annotation {
    /// Builds the deterministic annotation id.
    #[must_use]
    pub fn make_id(category: Category, profile: &str, interval: Interval) -> String {
        format!("{}_{}_{}", category.label(), profile, interval)
    }

    /// Creates an annotation checked against the parent's length.
    pub fn new(
        parent: &Chain,
        category: Category,
        profile: impl Into<String>,
        interval: Interval,
        score: f64,
    ) -> Result<Self, TkpError> {
        if interval.is_empty() || interval.end > parent.len() {
            return Err(TkpError::InvalidInput(format!(
                "interval [{}, {}) does not fit chain {} of length {}",
                interval.start,
                interval.end,
                parent.id,
                parent.len()
            )));
        }
        let profile = profile.into();
        Ok(Self {
            id: Self::make_id(category, &profile, interval),
            name: profile.clone(),
            interval,
            category,
            profile,
            score,
            coverage: None,
            numbering: None,
            motif: None,
            activity: None,
        })
    }

    #[must_use]
    pub const fn start(&self) -> usize {
        self.interval.start
    }

    #[must_use]
    pub const fn end(&self) -> usize {
        self.interval.end
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.interval.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.interval.is_empty()
    }

    /// Motif string or the `-` placeholder for unclassified annotations.
    #[must_use]
    pub fn motif_label(&self) -> &str {
        self.motif.as_deref().unwrap_or("-")
    }
}

/// A named protein sequence with its domain annotations.
///
/// Annotations are kept in insertion order and keyed by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    /// Identifier taken from the first word of the FASTA header
    pub id: String,
    /// Residues in one-letter code
    pub seq: String,
    annotations: Vec<Annotation>,
}

impl Chain {
    #[must_use]
    pub fn new(id: impl Into<String>, seq: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            seq: seq.into(),
            annotations: Vec::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.seq.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seq.is_empty()
    }

    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> impl Iterator<Item = &mut Annotation> {
        self.annotations.iter_mut()
    }

    /// Annotations of one category, in insertion order.
    pub fn annotations_of(&self, category: Category) -> impl Iterator<Item = &Annotation> {
        self.annotations
            .iter()
            .filter(move |a| a.category == category)
    }

    #[must_use]
    pub fn count_of(&self, category: Category) -> usize {
        self.annotations_of(category).count()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    /// Inserts an annotation, replacing one with the same id in place.
    ///
    /// Returns `true` when the id was new.
    pub fn insert(&mut self, annotation: Annotation) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == annotation.id) {
            Some(existing) => {
                *existing = annotation;
                false
            }
            None => {
                self.annotations.push(annotation);
                true
            }
        }
    }

    /// Keeps only annotations for which `keep` returns `true`.
    pub fn retain(&mut self, keep: impl FnMut(&Annotation) -> bool) {
        self.annotations.retain(keep);
    }

    /// Residues covered by an annotation of this chain.
    #[must_use]
    pub fn subsequence(&self, annotation: &Annotation) -> &str {
        &self.seq[annotation.start()..annotation.end()]
    }

    /// Residue at a 0-based position, or the placeholder when out of range.
    #[must_use]
    pub fn residue_at(&self, position: usize) -> char {
        self.seq
            .as_bytes()
            .get(position)
            .map_or(MISSING_RESIDUE, |&b| b as char)
    }
}

/// Error types raised by the annotation pipeline
#[derive(Error, Debug)]
pub enum TkpError {
    /// Missing, unreadable or malformed input for one pipeline run
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Configuration rejected before any input is processed
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    /// File I/O operation failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    /// Error parsing FASTA, HMM, domtblout, Stockholm or GFF3 data
    #[error("Parse error: {0}")]
    ParseError(String),
    /// The external profile scoring engine failed for one profile
    #[error("Scoring failed for profile {profile}: {reason}")]
    ScoringError { profile: String, reason: String },
    /// Overlap resolution exceeded its iteration bound
    #[error("Overlap resolution did not converge: {candidates} candidates exceed the limit of {limit} iterations")]
    ConvergenceError { candidates: usize, limit: usize },
    /// A parallel unit of work panicked, timed out or vanished
    #[error("Worker failed on {input}: {reason}")]
    WorkerFailure { input: String, reason: String },
}
