use crate::constants::{MISSING_RESIDUE, MOTIF_WILDCARD};
use crate::types::{Activity, Annotation, Chain};

/// Reads the residues at the conserved positions of a domain.
///
/// Positions are 1-based. When the domain carries a profile numbering the
/// residue aligned to that profile node is read; otherwise the position is
/// counted from the domain start. Positions the domain does not cover yield
/// [`MISSING_RESIDUE`], so the result always has one character per position.
///
/// # Examples
///
/// ```rust
/// use tkpfinder_core::algorithms::extract_motif;
/// use tkpfinder_core::types::{Annotation, Category, Chain, Interval};
///
/// let chain = Chain::new("p1", "MMKLEHRD");
/// let domain = Annotation::new(
///     &chain, Category::Target, "PF00069", Interval::new(2, 8).unwrap(), 40.0,
/// )?;
/// assert_eq!(extract_motif(&chain, &domain, &[1, 3, 6, 9]), "KEDX");
/// # Ok::<(), tkpfinder_core::types::TkpError>(())
/// ```
#[must_use]
pub fn extract_motif(chain: &Chain, domain: &Annotation, positions: &[usize]) -> String {
    positions
        .iter()
        .map(|&position| residue_at_position(chain, domain, position))
        .collect()
}

fn residue_at_position(chain: &Chain, domain: &Annotation, position: usize) -> char {
    if position == 0 {
        return MISSING_RESIDUE;
    }
    match &domain.numbering {
        Some(numbering) => numbering
            .iter()
            .position(|node| *node == Some(position))
            .map_or(MISSING_RESIDUE, |offset| {
                chain.residue_at(domain.start() + offset)
            }),
        None if position <= domain.len() => chain.residue_at(domain.start() + position - 1),
        None => MISSING_RESIDUE,
    }
}

/// Classifies a domain from its motif string.
///
/// Every non-wildcard position of `reference` must match `observed` for the
/// domain to be active.
///
/// # Panics
///
/// Panics when the two strings differ in length; configurations are checked
/// for this before any input is processed.
///
/// # Examples
///
/// ```rust
/// use tkpfinder_core::algorithms::classify;
/// use tkpfinder_core::types::Activity;
///
/// assert_eq!(classify("KDDDD", "KXXXD"), Activity::Active);
/// assert_eq!(classify("KEEEE", "KXXXD"), Activity::Pseudo);
/// ```
#[must_use]
pub fn classify(observed: &str, reference: &str) -> Activity {
    assert_eq!(
        observed.chars().count(),
        reference.chars().count(),
        "motif sizes must match"
    );
    let substituted = reference
        .chars()
        .zip(observed.chars())
        .any(|(expected, found)| expected != MOTIF_WILDCARD && expected != found);
    if substituted {
        Activity::Pseudo
    } else {
        Activity::Active
    }
}
