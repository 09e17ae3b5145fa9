//! Collector - TokenID Discovery
//!
//! Scans a directory for `<digits>.<ext>` files and maps each parsed ID to its path.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;
use tracing::{debug, warn};

/// Identifier parsed from a filename stem. `01.png` and `1.png` share an ID.
pub type TokenId = u64;

static IMAGE_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^([0-9]+)\.png$").unwrap());
static METADATA_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^([0-9]+)\.json$").unwrap());

#[derive(Debug, Error)]
pub enum CollectError {
    #[error("Failed to scan {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Image,
    Metadata,
}

impl FileKind {
    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Image => "png",
            FileKind::Metadata => "json",
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            FileKind::Image => &IMAGE_NAME,
            FileKind::Metadata => &METADATA_NAME,
        }
    }

    /// Parse a bare filename into a TokenId, or `None` if it does not follow
    /// the naming convention for this kind.
    pub fn parse_name(&self, name: &str) -> Option<TokenId> {
        let has_ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(self.extension()));
        if !has_ext {
            return None;
        }

        let caps = self.pattern().captures(name)?;
        caps.get(1)?.as_str().parse::<TokenId>().ok()
    }
}

/// A file that matched the naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedFile {
    pub id: TokenId,
    pub path: PathBuf,
}

/// Two filenames that parsed to the same ID. The later filename wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdCollision {
    pub id: TokenId,
    pub kept: PathBuf,
    pub overwritten: PathBuf,
}

#[derive(Debug, Clone, Default)]
pub struct FileIndex {
    entries: BTreeMap<TokenId, PathBuf>,
    collisions: Vec<IdCollision>,
}

impl FileIndex {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: TokenId) -> Option<&Path> {
        self.entries.get(&id).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: TokenId) -> bool {
        self.entries.contains_key(&id)
    }

    /// IDs in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = TokenId> + '_ {
        self.entries.keys().copied()
    }

    pub fn collisions(&self) -> &[IdCollision] {
        &self.collisions
    }

    fn insert(&mut self, file: IndexedFile) {
        if let Some(previous) = self.entries.insert(file.id, file.path.clone()) {
            warn!(
                id = file.id,
                kept = %file.path.display(),
                overwritten = %previous.display(),
                "duplicate token id in filenames"
            );
            self.collisions.push(IdCollision {
                id: file.id,
                kept: file.path,
                overwritten: previous,
            });
        }
    }
}

impl FromIterator<IndexedFile> for FileIndex {
    fn from_iter<T: IntoIterator<Item = IndexedFile>>(iter: T) -> Self {
        let mut index = FileIndex::default();
        for file in iter {
            index.insert(file);
        }
        index
    }
}

/// List every regular file in `dir` that follows the naming convention for
/// `kind`, in ascending filename order. A missing directory yields nothing.
pub fn scan_dir(dir: &Path, kind: FileKind) -> Result<Vec<IndexedFile>, CollectError> {
    if !dir.exists() {
        debug!(dir = %dir.display(), "directory does not exist, treating as empty");
        return Ok(vec![]);
    }

    let io_err = |source| CollectError::Io { path: dir.to_path_buf(), source };

    let mut names = vec![];
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        names.push((entry.file_name(), path));
    }
    names.sort_by(|a, b| a.0.cmp(&b.0));

    let mut files = vec![];
    for (name, path) in names {
        let parsed = name.to_str().and_then(|n| kind.parse_name(n));
        match parsed {
            Some(id) => files.push(IndexedFile { id, path }),
            None => debug!(file = %path.display(), "skipping file outside naming convention"),
        }
    }

    Ok(files)
}

/// Build the TokenID index for one corpus.
pub fn collect_ids(dir: &Path, kind: FileKind) -> Result<FileIndex, CollectError> {
    Ok(scan_dir(dir, kind)?.into_iter().collect())
}
