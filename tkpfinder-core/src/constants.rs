// =============================================================================
// Conserved kinase positions
// =============================================================================

/// Conserved positions read from every target kinase domain (1-based).
///
/// In order: beta-3 Lys, alphaC Glu, the HRD triad and the DFG triad.
pub const CONSERVED_POSITIONS: [usize; 8] = [30, 48, 121, 122, 123, 141, 142, 143];

/// Reference motif of an active kinase over [`CONSERVED_POSITIONS`].
pub const REFERENCE_MOTIF: &str = "KXXXDDXX";

/// Reference motif character matching any residue.
pub const MOTIF_WILDCARD: char = 'X';

/// Placeholder for a conserved position the domain does not cover.
pub const MISSING_RESIDUE: char = 'X';

// =============================================================================
// Naming
// =============================================================================

/// Display prefix of active kinase domains.
pub const PK_NAME: &str = "PK";

/// Display prefix of pseudo kinase domains.
pub const PPK_NAME: &str = "PPK";

/// Reserved summary label of target kinase domains.
pub const TARGET_LABEL: &str = "Target";

/// Accession of the Pfam protein kinase profile.
pub const PFAM_PK_NAME: &str = "PF00069";

/// Sub-directory of the HMM directory holding per-category profiles.
pub const PROFILES_DIR: &str = "profiles";

/// Extension of HMMER3 profile files.
pub const HMM_EXTENSION: &str = "hmm";

// =============================================================================
// Thresholds
// =============================================================================

/// Minimum number of residues in a target kinase domain
pub const MIN_PK_DOMAIN_SIZE: usize = 150;

/// Minimum number of target domains for a tandem kinase call
pub const MIN_PK_DOMAINS: usize = 2;

/// Minimum bit score of a secondary annotation
pub const MIN_HMM_SCORE: f64 = 0.0;

/// Minimum profile coverage of a secondary annotation
pub const MIN_HMM_COVERAGE: f64 = 0.5;

/// Iteration bound of the overlap resolver
pub const MAX_RESOLVER_ITERATIONS: usize = 1_000_000;

/// Per-input timeout in seconds when running in parallel
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

// =============================================================================
// Output
// =============================================================================

/// Column header of the aggregated summary table
pub const SUMMARY_HEADER: [&str; 7] = [
    "HMM_type",
    "HMM",
    "ObjectID",
    "ParentName",
    "Start",
    "End",
    "BitScore",
];

/// File name of the aggregated summary table
pub const SUMMARY_FILE: &str = "summary.tsv";

/// File name of the per-domain motif table
pub const MOTIFS_FILE: &str = "motifs.tsv";

/// File name of the annotated domain sequences
pub const DOMAINS_FILE: &str = "domains.fasta";

/// Directory holding one JSON document per annotated chain
pub const CHAINS_DIR: &str = "chains";
