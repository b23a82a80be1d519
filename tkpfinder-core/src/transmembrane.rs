//! Transmembrane region prediction contract.
//!
//! Predictions come from an external model. The crate ships the parser of
//! its GFF3-like `TMRs.gff3` output and a predictor that serves such a file.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use tracing::debug;

use crate::sequence::SequenceInput;
use crate::types::TkpError;

/// A predicted region, 1-based and inclusive as written by the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    pub start: usize,
    pub end: usize,
    /// Topology label such as `TMhelix`, `inside` or `outside`
    pub label: String,
}

/// External transmembrane region predictor.
pub trait RegionPredictor {
    /// Predicts regions for every sequence of `input`.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError`] when the input cannot be read or the
    /// prediction cannot be parsed.
    fn predict_regions(&self, input: &SequenceInput)
        -> Result<Vec<(String, Vec<Region>)>, TkpError>;
}

/// Parses the `TMRs.gff3` output of the transmembrane model.
///
/// Blank and `#` lines are skipped. Records of consecutive sequences are
/// separated by lines starting with `//`. Each record line holds the
/// sequence id, the region label, start and end, separated by tabs.
///
/// # Examples
///
/// ```rust
/// use tkpfinder_core::transmembrane::parse_tmr_gff3;
///
/// let text = "##gff-version 3\n# p1 Length: 40\np1\tinside\t1\t10\np1\tTMhelix\t11\t30\n//\n";
/// let parsed = parse_tmr_gff3(text)?;
/// assert_eq!(parsed[0].0, "p1");
/// assert_eq!(parsed[0].1[1].label, "TMhelix");
/// # Ok::<(), tkpfinder_core::types::TkpError>(())
/// ```
pub fn parse_tmr_gff3(text: &str) -> Result<Vec<(String, Vec<Region>)>, TkpError> {
    let mut parsed = Vec::new();
    let mut chunk: Vec<&str> = Vec::new();

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with("//") {
            if !chunk.is_empty() {
                parsed.push(parse_chunk(&chunk)?);
                chunk.clear();
            }
            continue;
        }
        chunk.push(line);
    }
    if !chunk.is_empty() {
        parsed.push(parse_chunk(&chunk)?);
    }

    Ok(parsed)
}

fn parse_chunk(lines: &[&str]) -> Result<(String, Vec<Region>), TkpError> {
    let mut chain_id = None;
    let mut regions = Vec::with_capacity(lines.len());
    for line in lines {
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 4 {
            return Err(TkpError::ParseError(format!(
                "expected at least 4 tab-separated fields in `{line}`"
            )));
        }
        let coordinate = |field: &str| {
            field.trim().parse::<usize>().map_err(|_| {
                TkpError::ParseError(format!("invalid coordinate `{field}` in `{line}`"))
            })
        };
        chain_id.get_or_insert_with(|| fields[0].to_string());
        regions.push(Region {
            start: coordinate(fields[2])?,
            end: coordinate(fields[3])?,
            label: fields[1].to_string(),
        });
    }
    let chain_id = chain_id.ok_or_else(|| TkpError::ParseError("empty GFF3 record".to_string()))?;
    Ok((chain_id, regions))
}

/// Serves regions from a previously produced `TMRs.gff3`.
#[derive(Debug, Clone)]
pub struct Gff3RegionFile {
    path: PathBuf,
}

impl Gff3RegionFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RegionPredictor for Gff3RegionFile {
    /// Returns the records of the file that belong to sequences of `input`.
    fn predict_regions(
        &self,
        input: &SequenceInput,
    ) -> Result<Vec<(String, Vec<Region>)>, TkpError> {
        let ids: HashSet<String> = input
            .clone()
            .into_chains()?
            .into_iter()
            .map(|chain| chain.id)
            .collect();
        let text = fs::read_to_string(&self.path)?;
        let regions: Vec<_> = parse_tmr_gff3(&text)?
            .into_iter()
            .filter(|(id, _)| ids.contains(id))
            .collect();
        debug!(path = %self.path.display(), sequences = regions.len(), "read transmembrane regions");
        Ok(regions)
    }
}
