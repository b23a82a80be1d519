#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Kinase domain of 300 residues: Lys at 30 (Arg when inactive), Asp at 123 and 141.
pub fn kinase_domain(active: bool) -> String {
    let mut residues = vec![b'A'; 300];
    residues[29] = if active { b'K' } else { b'R' };
    residues[122] = b'D';
    residues[140] = b'D';
    String::from_utf8(residues).unwrap()
}

/// Active kinase at 1-300, pseudokinase at 351-650.
pub fn tandem_kinase() -> String {
    format!(
        "{}{}{}{}",
        kinase_domain(true),
        "G".repeat(50),
        kinase_domain(false),
        "G".repeat(50)
    )
}

pub fn hmm_text(name: &str, acc: &str, length: usize) -> String {
    format!(
        "HMMER3/f [3.3.2 | Nov 2020]\nNAME  {name}\nACC   {acc}\nLENG  {length}\nALPH  amino\nHMM          A        C\n//\n"
    )
}

/// HMM directory with the kinase profile and one Family profile.
pub fn create_hmm_dir(root: &Path) -> PathBuf {
    let hmm_dir = root.join("hmm");
    let family = hmm_dir.join("profiles").join("Family");
    fs::create_dir_all(&family).unwrap();
    fs::write(hmm_dir.join("PF00069.hmm"), hmm_text("Pkinase", "PF00069.28", 264)).unwrap();
    fs::write(family.join("PF07714.hmm"), hmm_text("PK_Tyr_Ser-Thr", "PF07714.20", 259)).unwrap();
    hmm_dir
}

pub fn write_fasta(path: &Path, records: &[(&str, String)]) {
    let text: String = records
        .iter()
        .map(|(id, seq)| format!(">{id}\n{seq}\n"))
        .collect();
    fs::write(path, text).unwrap();
}

/// Stand-in for `hmmsearch`: reports two kinase domains on `tkp1` and
/// nothing for any other profile.
#[cfg(unix)]
pub fn create_fake_hmmsearch(root: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    --domtblout) tbl="$2"; shift 2 ;;
    -o|-A|--cpu) shift 2 ;;
    --cut_tc|--cut_ga|--cut_nc) shift ;;
    *) break ;;
  esac
done
case "$1" in
  *PF00069.hmm)
    cat > "$tbl" <<'TBL'
# target name accession tlen query name accession qlen E-value score bias # of c-Evalue i-Evalue score bias from to from to from to acc description
tkp1 - 700 Pkinase PF00069.28 264 1e-80 270.1 0.1 1 2 1e-45 3e-42 145.2 0.0 1 264 1 300 1 300 0.95 -
tkp1 - 700 Pkinase PF00069.28 264 1e-80 270.1 0.1 2 2 1e-40 1e-36 126.4 0.0 1 264 351 650 351 650 0.93 -
TBL
    ;;
  *) : > "$tbl" ;;
esac
"#;
    let path = root.join("fake-hmmsearch");
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Workspace with a proteome, an HMM directory and an output path.
pub struct Workspace {
    pub dir: TempDir,
    pub fasta: PathBuf,
    pub hmm_dir: PathBuf,
    pub output: PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let fasta = dir.path().join("proteome.fasta");
        write_fasta(
            &fasta,
            &[("tkp1", tandem_kinase()), ("single1", kinase_domain(true))],
        );
        let hmm_dir = create_hmm_dir(dir.path());
        let output = dir.path().join("out");
        Self {
            dir,
            fasta,
            hmm_dir,
            output,
        }
    }

    /// `tkp-finder` pointed at this workspace's HMM and output directories.
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("tkp-finder").unwrap();
        cmd.arg("--hmm-dir")
            .arg(&self.hmm_dir)
            .arg("--output")
            .arg(&self.output)
            .arg("--hmm-type")
            .arg("Family");
        cmd
    }
}
