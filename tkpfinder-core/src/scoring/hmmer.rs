use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::process::Command;

use bio::io::fasta;
use tempfile::TempDir;
use tracing::debug;

use crate::scoring::{BitCutoff, Profile, ProfileHit, ProfileScorer};
use crate::types::{Chain, Interval, Numbering, TkpError};

/// Fields in a `--domtblout` line before the free-text description
const DOMTBL_FIELDS: usize = 22;

/// [`ProfileScorer`] that runs HMMER's `hmmsearch` once per profile.
///
/// Hits are read from the per-domain table (`--domtblout`); the alignment
/// (`-A`, Stockholm) supplies the profile numbering of every hit.
#[derive(Debug, Clone)]
pub struct HmmsearchScorer {
    binary: PathBuf,
    cpus: Option<usize>,
}

impl Default for HmmsearchScorer {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("hmmsearch"),
            cpus: None,
        }
    }
}

impl HmmsearchScorer {
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            cpus: None,
        }
    }

    /// Number of worker threads passed to `--cpu`.
    #[must_use]
    pub const fn with_cpus(mut self, cpus: usize) -> Self {
        self.cpus = Some(cpus);
        self
    }

    fn failure(profile: &Profile, reason: impl Into<String>) -> TkpError {
        TkpError::ScoringError {
            profile: profile.id.clone(),
            reason: reason.into(),
        }
    }

    fn command(
        &self,
        profile_path: &Path,
        targets: &Path,
        workdir: &Path,
        cutoff: Option<BitCutoff>,
    ) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-o")
            .arg(workdir.join("hmmsearch.out"))
            .arg("--domtblout")
            .arg(workdir.join("hits.domtbl"))
            .arg("-A")
            .arg(workdir.join("hits.sto"));
        match cutoff {
            Some(BitCutoff::Gathering) => {
                cmd.arg("--cut_ga");
            }
            Some(BitCutoff::Trusted) => {
                cmd.arg("--cut_tc");
            }
            Some(BitCutoff::Noise) => {
                cmd.arg("--cut_nc");
            }
            None => {}
        }
        if let Some(cpus) = self.cpus {
            cmd.arg("--cpu").arg(cpus.to_string());
        }
        cmd.arg(profile_path).arg(targets);
        cmd
    }
}

impl ProfileScorer for HmmsearchScorer {
    fn score(
        &self,
        chains: &[Chain],
        profile: &Profile,
        cutoff: Option<BitCutoff>,
    ) -> Result<Vec<ProfileHit>, TkpError> {
        let profile_path = profile
            .path
            .as_deref()
            .ok_or_else(|| Self::failure(profile, "profile has no file on disk"))?;

        let workdir = TempDir::new()?;
        let targets = workdir.path().join("targets.fasta");
        write_targets(&targets, chains)?;

        let output = self
            .command(profile_path, &targets, workdir.path(), cutoff)
            .output()
            .map_err(|e| {
                Self::failure(
                    profile,
                    format!("cannot run {}: {}", self.binary.display(), e),
                )
            })?;
        if !output.status.success() {
            return Err(Self::failure(
                profile,
                format!(
                    "hmmsearch exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        let table = fs::read_to_string(workdir.path().join("hits.domtbl"))?;
        let mut hits = parse_domtblout(&table)?;

        let alignment_path = workdir.path().join("hits.sto");
        if alignment_path.is_file() {
            let mut numberings = parse_stockholm_numbering(&fs::read_to_string(alignment_path)?)?;
            for hit in &mut hits {
                let key = (
                    hit.chain_id.clone(),
                    hit.interval.start + 1,
                    hit.interval.end,
                );
                hit.numbering = numberings.remove(&key);
            }
        }

        debug!(profile = %profile.id, hits = hits.len(), "hmmsearch finished");
        Ok(hits)
    }
}

fn write_targets(path: &Path, chains: &[Chain]) -> Result<(), TkpError> {
    let mut writer = fasta::Writer::new(BufWriter::new(File::create(path)?));
    for chain in chains {
        writer.write(&chain.id, None, chain.seq.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Parses the per-domain table written by `hmmsearch --domtblout`.
///
/// Intervals use the alignment coordinates; the score is the domain bit score.
pub fn parse_domtblout(text: &str) -> Result<Vec<ProfileHit>, TkpError> {
    let mut hits = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < DOMTBL_FIELDS {
            return Err(TkpError::ParseError(format!(
                "domtblout line {}: expected {} fields, found {}",
                line_no + 1,
                DOMTBL_FIELDS,
                fields.len()
            )));
        }
        let number = |index: usize| -> Result<usize, TkpError> {
            fields[index].parse().map_err(|_| {
                TkpError::ParseError(format!(
                    "domtblout line {}: invalid coordinate `{}`",
                    line_no + 1,
                    fields[index]
                ))
            })
        };
        let score: f64 = fields[13].parse().map_err(|_| {
            TkpError::ParseError(format!(
                "domtblout line {}: invalid score `{}`",
                line_no + 1,
                fields[13]
            ))
        })?;
        let (hmm_from, hmm_to) = (number(15)?, number(16)?);
        let (ali_from, ali_to) = (number(17)?, number(18)?);
        if ali_from == 0 {
            return Err(TkpError::ParseError(format!(
                "domtblout line {}: coordinates are 1-based",
                line_no + 1
            )));
        }

        hits.push(ProfileHit::new(
            fields[0],
            Interval::new(ali_from - 1, ali_to)?,
            score,
            hmm_from,
            hmm_to,
        ));
    }
    Ok(hits)
}

/// Derives per-residue profile numbering from a Stockholm alignment.
///
/// Sequence names must be `<id>/<from>-<to>`, as written by `hmmsearch -A`.
/// Columns marked in the `#=GC RF` line are match states; residues in other
/// columns are inserts. Keys are `(id, from, to)` with 1-based coordinates.
pub fn parse_stockholm_numbering(
    text: &str,
) -> Result<HashMap<(String, usize, usize), Numbering>, TkpError> {
    let mut order: Vec<String> = Vec::new();
    let mut rows: HashMap<String, String> = HashMap::new();
    let mut reference = String::new();

    for line in text.lines() {
        let line = line.trim_end();
        if line.is_empty() || line == "//" {
            continue;
        }
        if let Some(rest) = line.strip_prefix("#=GC RF") {
            reference.push_str(rest.trim());
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        let mut fields = line.split_whitespace();
        let (Some(name), Some(aligned)) = (fields.next(), fields.next()) else {
            return Err(TkpError::ParseError(format!(
                "malformed Stockholm line `{line}`"
            )));
        };
        if !rows.contains_key(name) {
            order.push(name.to_string());
        }
        rows.entry(name.to_string()).or_default().push_str(aligned);
    }

    let mut numberings = HashMap::with_capacity(order.len());
    for name in order {
        let aligned = &rows[&name];
        if aligned.len() != reference.len() {
            return Err(TkpError::ParseError(format!(
                "Stockholm row {name} has {} columns, RF line has {}",
                aligned.len(),
                reference.len()
            )));
        }
        let key = parse_hit_name(&name)?;
        numberings.insert(key, number_residues(aligned, &reference));
    }
    Ok(numberings)
}

fn parse_hit_name(name: &str) -> Result<(String, usize, usize), TkpError> {
    let invalid = || TkpError::ParseError(format!("Stockholm name `{name}` lacks /from-to"));
    let (id, range) = name.rsplit_once('/').ok_or_else(invalid)?;
    let (from, to) = range.split_once('-').ok_or_else(invalid)?;
    Ok((
        id.to_string(),
        from.parse().map_err(|_| invalid())?,
        to.parse().map_err(|_| invalid())?,
    ))
}

fn number_residues(aligned: &str, reference: &str) -> Numbering {
    let mut node = 0;
    let mut numbering = Vec::new();
    for (residue, marker) in aligned.chars().zip(reference.chars()) {
        let is_match = marker != '.' && marker != '-';
        if is_match {
            node += 1;
        }
        if residue.is_ascii_alphabetic() {
            numbering.push(is_match.then_some(node));
        }
    }
    numbering
}
