//! Core annotation algorithms.
//!
//! ## Modules
//!
//! - [`overlap_resolution`]: Maximum-score selection of non-overlapping annotations
//! - [`motif`]: Conserved residue extraction and active/pseudo kinase calls
//!
//! ## Overlap Resolution
//!
//! Profiles of one category routinely report several hits on the same
//! residues. Within a resolution group (one chain, one category) the kept
//! subset is the one with the highest cumulative value among all pairwise
//! non-overlapping subsets, the classical weighted interval scheduling
//! problem. Annotations of other categories never compete.

pub mod motif;
pub mod overlap_resolution;

pub use motif::{classify, extract_motif};
pub use overlap_resolution::{resolve_chain_overlaps, OverlapResolver, Span};
