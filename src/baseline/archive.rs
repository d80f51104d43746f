use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use bzip2::write::BzEncoder;
use bzip2::Compression;
use tar::{EntryType, HeaderMode};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::error::{RegressError, Result};

/// bzip2-compressed tar archive holding one directory tree under a fixed
/// top-level name.
pub struct BaselineArchive;

impl BaselineArchive {
    /// Pack `src_dir` into `archive_path` under `root_name/`.
    ///
    /// Entries are added in sorted order with deterministic headers, so the
    /// same tree always produces the same bytes. The archive is written to a
    /// temporary file next to `archive_path` and moved into place at the end.
    /// Returns the number of regular files packed.
    pub fn create(src_dir: &Path, root_name: &str, archive_path: &Path) -> Result<usize> {
        if !src_dir.is_dir() {
            return Err(RegressError::NotADirectory(src_dir.to_path_buf()));
        }

        let parent = archive_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;

        let archive_err = |source: io::Error| RegressError::Archive {
            path: archive_path.to_path_buf(),
            source,
        };

        let mut tmp = NamedTempFile::new_in(parent)?;
        let files = {
            let encoder = BzEncoder::new(tmp.as_file_mut(), Compression::best());
            let mut builder = tar::Builder::new(encoder);
            builder.mode(HeaderMode::Deterministic);

            let files = append_tree(&mut builder, src_dir, root_name).map_err(archive_err)?;

            let encoder = builder.into_inner().map_err(archive_err)?;
            let file = encoder.finish().map_err(archive_err)?;
            file.flush().map_err(archive_err)?;
            files
        };

        tmp.persist(archive_path)
            .map_err(|e| archive_err(e.error))?;

        tracing::info!(
            archive = %archive_path.display(),
            src = %src_dir.display(),
            files,
            "Wrote baseline archive"
        );
        Ok(files)
    }

    /// Unpack the `root_name/` tree of `archive_path` into `dest_dir`.
    ///
    /// The leading `root_name` component is stripped. Entries outside it,
    /// absolute paths, `..` components and non-file/non-directory entries are
    /// rejected. Returns the number of regular files extracted.
    pub fn extract(archive_path: &Path, root_name: &str, dest_dir: &Path) -> Result<usize> {
        let archive_err = |source: io::Error| RegressError::Archive {
            path: archive_path.to_path_buf(),
            source,
        };

        let file = File::open(archive_path).map_err(archive_err)?;
        let mut archive = tar::Archive::new(BzDecoder::new(BufReader::new(file)));

        fs::create_dir_all(dest_dir)?;

        let mut files = 0;
        for entry in archive.entries().map_err(archive_err)? {
            let mut entry = entry.map_err(archive_err)?;
            let entry_path = entry.path().map_err(archive_err)?.into_owned();

            let rejected = || RegressError::ArchiveEntry {
                path: archive_path.to_path_buf(),
                entry: entry_path.display().to_string(),
            };
            let relative = strip_root(&entry_path, root_name).ok_or_else(rejected)?;
            let target = dest_dir.join(&relative);

            match entry.header().entry_type() {
                EntryType::Directory => fs::create_dir_all(&target)?,
                EntryType::Regular | EntryType::Continuous => {
                    if relative.as_os_str().is_empty() {
                        return Err(rejected());
                    }
                    if let Some(parent) = target.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    entry.unpack(&target).map_err(archive_err)?;
                    files += 1;
                }
                _ => return Err(rejected()),
            }
        }

        tracing::debug!(
            archive = %archive_path.display(),
            dest = %dest_dir.display(),
            files,
            "Extracted baseline archive"
        );
        Ok(files)
    }

    /// Entry paths stored in `archive_path`, in archive order.
    pub fn list(archive_path: &Path) -> Result<Vec<PathBuf>> {
        let archive_err = |source: io::Error| RegressError::Archive {
            path: archive_path.to_path_buf(),
            source,
        };

        let file = File::open(archive_path).map_err(archive_err)?;
        let mut archive = tar::Archive::new(BzDecoder::new(BufReader::new(file)));

        let mut paths = Vec::new();
        for entry in archive.entries().map_err(archive_err)? {
            let entry = entry.map_err(archive_err)?;
            paths.push(entry.path().map_err(archive_err)?.into_owned());
        }
        Ok(paths)
    }
}

fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    src_dir: &Path,
    root_name: &str,
) -> io::Result<usize> {
    builder.append_dir(root_name, src_dir)?;

    let mut files = 0;
    for entry in WalkDir::new(src_dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(src_dir)
            .map_err(io::Error::other)?;
        let name = Path::new(root_name).join(relative);

        if entry.file_type().is_dir() {
            builder.append_dir(&name, entry.path())?;
        } else {
            builder.append_path_with_name(entry.path(), &name)?;
            files += 1;
        }
    }
    Ok(files)
}

/// `root/a/b` -> `a/b`; `None` when the path escapes or lies outside `root`.
fn strip_root(path: &Path, root_name: &str) -> Option<PathBuf> {
    let mut components = path
        .components()
        .skip_while(|c| matches!(c, Component::CurDir));

    match components.next() {
        Some(Component::Normal(first)) if first == root_name => {}
        _ => return None,
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            _ => return None,
        }
    }
    Some(relative)
}
