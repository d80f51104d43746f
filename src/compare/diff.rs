//! Recursive directory comparison.
//!
//! Walks a baseline tree and a trace tree, keyed by relative path, and
//! produces a list of `DiffEntry` values sorted by path. File contents are
//! compared byte for byte.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::{RegressError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// What kind of difference was found at a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffKind {
    /// Present in the baseline, missing from the fresh trace
    OnlyInBaseline,
    /// Produced by the fresh trace, absent from the baseline
    OnlyInTrace,
    /// Regular file on both sides with different bytes
    ContentDiffers,
    /// Entry types differ, or either side is neither a regular file nor a
    /// directory (FIFO, socket, device); such entries are never opened
    KindMismatch,
}

impl std::fmt::Display for DiffKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiffKind::OnlyInBaseline => write!(f, "only in baseline"),
            DiffKind::OnlyInTrace => write!(f, "only in trace"),
            DiffKind::ContentDiffers => write!(f, "content differs"),
            DiffKind::KindMismatch => write!(f, "entry type mismatch"),
        }
    }
}

/// A single difference between the two trees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffEntry {
    /// Path relative to the compared roots
    pub path: PathBuf,
    pub kind: DiffKind,
}

impl std::fmt::Display for DiffEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.path.display())
    }
}

/// Result of comparing two directory trees.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirDiff {
    pub entries: Vec<DiffEntry>,
    /// Number of file pairs whose contents were compared
    pub files_compared: usize,
}

impl DirDiff {
    /// True when the trees are identical.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn count(&self, kind: DiffKind) -> usize {
        self.entries.iter().filter(|e| e.kind == kind).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    File(u64),
    Dir,
    Special,
}

/// Compare `baseline` against `trace`, recursively.
pub fn compare_dirs(baseline: &Path, trace: &Path) -> Result<DirDiff> {
    let left = index_tree(baseline)?;
    let right = index_tree(trace)?;

    let paths: BTreeSet<&PathBuf> = left.keys().chain(right.keys()).collect();

    let mut diff = DirDiff::default();
    // Directories already reported as a whole; their descendants are skipped.
    let mut reported_dirs: Vec<&PathBuf> = Vec::new();

    for path in paths {
        if reported_dirs.iter().any(|dir| path.starts_with(dir)) {
            continue;
        }

        let kind = match (left.get(path), right.get(path)) {
            (Some(l), None) => {
                if *l == NodeKind::Dir {
                    reported_dirs.push(path);
                }
                Some(DiffKind::OnlyInBaseline)
            }
            (None, Some(r)) => {
                if *r == NodeKind::Dir {
                    reported_dirs.push(path);
                }
                Some(DiffKind::OnlyInTrace)
            }
            (Some(NodeKind::Dir), Some(NodeKind::Dir)) => None,
            (Some(NodeKind::File(l_len)), Some(NodeKind::File(r_len))) => {
                diff.files_compared += 1;
                if l_len != r_len || !files_equal(&baseline.join(path), &trace.join(path))? {
                    Some(DiffKind::ContentDiffers)
                } else {
                    None
                }
            }
            (Some(_), Some(_)) => {
                reported_dirs.push(path);
                Some(DiffKind::KindMismatch)
            }
            (None, None) => None,
        };

        if let Some(kind) = kind {
            tracing::debug!(path = %path.display(), %kind, "Trace difference");
            diff.entries.push(DiffEntry {
                path: path.clone(),
                kind,
            });
        }
    }

    Ok(diff)
}

fn index_tree(root: &Path) -> Result<BTreeMap<PathBuf, NodeKind>> {
    if !root.is_dir() {
        return Err(RegressError::NotADirectory(root.to_path_buf()));
    }

    let mut nodes = BTreeMap::new();
    for entry in WalkDir::new(root).min_depth(1).follow_links(true) {
        let entry = entry.map_err(io::Error::from)?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(io::Error::other)?
            .to_path_buf();
        let file_type = entry.file_type();
        let kind = if file_type.is_dir() {
            NodeKind::Dir
        } else if file_type.is_file() {
            NodeKind::File(entry.metadata().map_err(io::Error::from)?.len())
        } else {
            NodeKind::Special
        };
        nodes.insert(relative, kind);
    }
    Ok(nodes)
}

fn files_equal(a: &Path, b: &Path) -> Result<bool> {
    let mut a = BufReader::new(File::open(a)?);
    let mut b = BufReader::new(File::open(b)?);
    let mut buf_a = vec![0u8; CHUNK_SIZE];
    let mut buf_b = vec![0u8; CHUNK_SIZE];

    loop {
        let n_a = fill(&mut a, &mut buf_a)?;
        let n_b = fill(&mut b, &mut buf_b)?;
        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or EOF; returns the number of bytes read.
fn fill<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
