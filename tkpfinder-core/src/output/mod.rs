//! Output writers for annotation results.
//!
//! ## Files per input
//!
//! [`write_results`] creates `<out_dir>/<input label>/` holding:
//!
//! - `chains/<chain id>.json`: annotated chains
//! - `domains.fasta`: residues of every annotation
//! - `motifs.tsv`: conserved motif and activity of every target domain
//! - `summary.tsv`: the table produced by [`aggregate`]
//!
//! ## Examples
//!
//! ```rust
//! use tkpfinder_core::output::{aggregate, write_summary};
//! use tkpfinder_core::types::{Annotation, Category, Chain, Interval};
//!
//! let mut chain = Chain::new("p1", "A".repeat(400));
//! let domain = Annotation::new(
//!     &chain, Category::Target, "PF00069", Interval::new(0, 300)?, 120.0,
//! )?;
//! chain.insert(domain);
//!
//! let mut table = Vec::new();
//! write_summary(&mut table, &aggregate(&[chain]))?;
//! assert!(String::from_utf8_lossy(&table).contains("Target\tPF00069"));
//! # Ok::<(), tkpfinder_core::types::TkpError>(())
//! ```

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::{CHAINS_DIR, DOMAINS_FILE, MOTIFS_FILE, SUMMARY_FILE};
use crate::results::TkpResults;
use crate::sequence::write_domains_fasta;
use crate::types::TkpError;

mod formats {
    pub mod motifs;
    pub mod summary;
}

pub use formats::motifs::write_motifs;
pub use formats::summary::{aggregate, write_summary, SummaryRow};

/// Writes every output file of one input.
///
/// Returns the created directory, or `None` when the result is empty and
/// nothing was written.
///
/// # Errors
///
/// Returns [`TkpError::IoError`] when a file cannot be written.
pub fn write_results(out_dir: &Path, results: &TkpResults) -> Result<Option<PathBuf>, TkpError> {
    if results.is_empty() {
        return Ok(None);
    }

    let base = out_dir.join(&results.source);
    let chains_dir = base.join(CHAINS_DIR);
    fs::create_dir_all(&chains_dir)?;

    let mut stems = HashSet::with_capacity(results.chains.len());
    for chain in &results.chains {
        let stem = unique_file_stem(&chain.id, &mut stems);
        let path = chains_dir.join(format!("{stem}.json"));
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, chain).map_err(io::Error::from)?;
        writer.flush()?;
    }

    write_domains_fasta(BufWriter::new(File::create(base.join(DOMAINS_FILE))?), &results.chains)?;

    let mut motifs = BufWriter::new(File::create(base.join(MOTIFS_FILE))?);
    write_motifs(&mut motifs, &results.chains)?;
    motifs.flush()?;

    let mut summary = BufWriter::new(File::create(base.join(SUMMARY_FILE))?);
    write_summary(&mut summary, &results.summary())?;
    summary.flush()?;

    info!(path = %base.display(), chains = results.chains.len(), "wrote results");
    Ok(Some(base))
}

/// Chain ids may carry path separators; clashing stems get a `_<n>` suffix.
fn unique_file_stem(id: &str, used: &mut HashSet<String>) -> String {
    let base: String = id
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    let mut stem = base.clone();
    let mut n = 1;
    while !used.insert(stem.clone()) {
        n += 1;
        stem = format!("{base}_{n}");
    }
    stem
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Activity, Annotation, Category, Chain, Interval};
    use tempfile::TempDir;

    fn create_test_results() -> TkpResults {
        let mut chain = Chain::new("sp/P1", "A".repeat(700));
        for (start, end) in [(0, 300), (350, 650)] {
            let mut domain = Annotation::new(
                &chain,
                Category::Target,
                "PF00069",
                Interval::new(start, end).unwrap(),
                100.0,
            )
            .unwrap();
            domain.motif = Some("KAAADDAA".to_string());
            domain.activity = Some(Activity::Active);
            chain.insert(domain);
        }
        TkpResults {
            source: "proteome.fasta".to_string(),
            chains: vec![chain],
        }
    }

    #[test]
    fn test_write_results_creates_files() {
        let dir = TempDir::new().unwrap();
        let base = write_results(dir.path(), &create_test_results())
            .unwrap()
            .unwrap();

        assert_eq!(base, dir.path().join("proteome.fasta"));
        for file in [SUMMARY_FILE, MOTIFS_FILE, DOMAINS_FILE] {
            assert!(base.join(file).is_file(), "{file} missing");
        }

        let json = fs::read_to_string(base.join(CHAINS_DIR).join("sp_P1.json")).unwrap();
        let chain: Chain = serde_json::from_str(&json).unwrap();
        assert_eq!(chain.annotations().len(), 2);

        let summary = fs::read_to_string(base.join(SUMMARY_FILE)).unwrap();
        assert_eq!(summary.lines().count(), 3);
    }

    #[test]
    fn test_chain_files_do_not_clash() {
        let dir = TempDir::new().unwrap();
        let mut results = create_test_results();
        let mut twin = results.chains[0].clone();
        twin.id = "sp_P1".to_string();
        twin.seq.push('W');
        results.chains.push(twin);

        let base = write_results(dir.path(), &results).unwrap().unwrap();

        let chains_dir = base.join(CHAINS_DIR);
        let first: Chain =
            serde_json::from_str(&fs::read_to_string(chains_dir.join("sp_P1.json")).unwrap())
                .unwrap();
        let second: Chain =
            serde_json::from_str(&fs::read_to_string(chains_dir.join("sp_P1_2.json")).unwrap())
                .unwrap();
        assert_eq!(first.id, "sp/P1");
        assert_eq!(second.id, "sp_P1");
    }

    #[test]
    fn test_unique_file_stem() {
        let mut used = HashSet::new();
        assert_eq!(unique_file_stem("a/b", &mut used), "a_b");
        assert_eq!(unique_file_stem("a_b", &mut used), "a_b_2");
        assert_eq!(unique_file_stem("a\\b", &mut used), "a_b_3");
        assert_eq!(unique_file_stem("c", &mut used), "c");
    }

    #[test]
    fn test_empty_results_write_nothing() {
        let dir = TempDir::new().unwrap();
        let written = write_results(dir.path(), &TkpResults::empty("empty.fasta")).unwrap();

        assert!(written.is_none());
        assert!(!dir.path().join("empty.fasta").exists());
    }
}
