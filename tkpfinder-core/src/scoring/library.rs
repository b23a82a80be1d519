use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::constants::{HMM_EXTENSION, PFAM_PK_NAME, PROFILES_DIR};
use crate::scoring::Profile;
use crate::types::{Category, TkpError};

/// Target profile plus the secondary profiles of every category.
#[derive(Debug, Clone)]
pub struct ProfileLibrary {
    /// Profile used to discover kinase domains
    pub target: Profile,
    categories: Vec<(Category, Vec<Profile>)>,
}

impl ProfileLibrary {
    /// Assembles a library from already loaded profiles.
    #[must_use]
    pub fn new(target: Profile, categories: Vec<(Category, Vec<Profile>)>) -> Self {
        Self { target, categories }
    }

    /// Loads the library from an HMM directory.
    ///
    /// The layout is the one produced by splitting Pfam-A:
    ///
    /// ```text
    /// <hmm_dir>/PF00069.hmm                  target profile (unless given)
    /// <hmm_dir>/profiles/<Category>/*.hmm    secondary profiles
    /// ```
    ///
    /// Profiles are sorted by file name within each category.
    ///
    /// # Errors
    ///
    /// Returns [`TkpError::InvalidConfig`] when the directories or the target
    /// profile are missing, and [`TkpError::ParseError`] for unreadable
    /// profile headers.
    pub fn from_dir(
        hmm_dir: &Path,
        categories: &[Category],
        target_profile: Option<&Path>,
    ) -> Result<Self, TkpError> {
        let profiles_dir = hmm_dir.join(PROFILES_DIR);
        if !profiles_dir.is_dir() {
            return Err(TkpError::InvalidConfig(format!(
                "expected to find `{}` dir in {}",
                PROFILES_DIR,
                hmm_dir.display()
            )));
        }

        let target_path = target_profile.map_or_else(
            || hmm_dir.join(format!("{PFAM_PK_NAME}.{HMM_EXTENSION}")),
            Path::to_path_buf,
        );
        if !target_path.is_file() {
            return Err(TkpError::InvalidConfig(format!(
                "expected to find target profile {}",
                target_path.display()
            )));
        }
        let target = read_profile(&target_path, Category::Target)?;

        let mut loaded = Vec::with_capacity(categories.len());
        for &category in categories {
            let dir = profiles_dir.join(category.label());
            if !dir.is_dir() {
                return Err(TkpError::InvalidConfig(format!(
                    "no profile directory for category {} in {}",
                    category,
                    profiles_dir.display()
                )));
            }
            let profiles = list_profiles(&dir)?
                .iter()
                .map(|path| read_profile(path, category))
                .collect::<Result<Vec<_>, _>>()?;
            info!(%category, count = profiles.len(), "loaded profiles");
            loaded.push((category, profiles));
        }

        Ok(Self::new(target, loaded))
    }

    /// Profiles of one category, empty when the category was not loaded.
    #[must_use]
    pub fn profiles(&self, category: Category) -> &[Profile] {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, profiles)| profiles.as_slice())
            .unwrap_or_default()
    }

    /// Loaded categories in load order.
    pub fn categories(&self) -> impl Iterator<Item = Category> + '_ {
        self.categories.iter().map(|(c, _)| *c)
    }
}

fn list_profiles(dir: &Path) -> Result<Vec<PathBuf>, TkpError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == HMM_EXTENSION) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Reads `NAME`, `ACC` and `LENG` from the header of an HMMER3 profile.
///
/// The profile id is the file stem.
pub fn read_profile(path: &Path, category: Category) -> Result<Profile, TkpError> {
    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| TkpError::InvalidConfig(format!("bad profile path {}", path.display())))?;
    let reader = BufReader::new(File::open(path)?);
    let header = parse_hmm_header(reader)
        .map_err(|e| TkpError::ParseError(format!("{}: {}", path.display(), e)))?;

    Ok(Profile {
        name: header.name.unwrap_or_else(|| id.clone()),
        id,
        accession: header.accession,
        length: header.length,
        category,
        path: Some(path.to_path_buf()),
    })
}

#[derive(Debug, Default)]
struct HmmHeader {
    name: Option<String>,
    accession: Option<String>,
    length: usize,
}

fn parse_hmm_header<R: BufRead>(reader: R) -> Result<HmmHeader, String> {
    let mut lines = reader.lines();
    let first = lines
        .next()
        .transpose()
        .map_err(|e| e.to_string())?
        .ok_or("empty profile file")?;
    if !first.starts_with("HMMER3") {
        return Err(format!("not an HMMER3 profile (header `{first}`)"));
    }

    let mut header = HmmHeader::default();
    for line in lines {
        let line = line.map_err(|e| e.to_string())?;
        let mut fields = line.split_whitespace();
        match (fields.next(), fields.next()) {
            (Some("NAME"), Some(value)) => header.name = Some(value.to_string()),
            (Some("ACC"), Some(value)) => header.accession = Some(value.to_string()),
            (Some("LENG"), Some(value)) => {
                header.length = value
                    .parse()
                    .map_err(|_| format!("invalid LENG `{value}`"))?;
            }
            (Some("HMM"), _) => break,
            _ => {}
        }
    }

    if header.length == 0 {
        return Err("missing LENG".to_string());
    }
    Ok(header)
}
