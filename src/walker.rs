//! Depth-first traversal of the input paths
//!
//! Each input expands to its own entry followed, for directories, by every
//! descendant in byte-wise name order. A directory's entry always precedes
//! its contents. Directory archive paths carry a trailing `/`.

use crate::archive::MAX_WALK_PATH_LENGTH;
use crate::error::{Result, TarError};
use std::fs::{self, Metadata};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// One file or directory found during traversal
#[derive(Debug)]
pub struct Entry {
    /// Path as stored in the archive
    pub archive_path: String,
    /// Path on disk
    pub fs_path: PathBuf,
    pub metadata: Metadata,
}

impl Entry {
    pub fn is_dir(&self) -> bool {
        self.metadata.is_dir()
    }
}

/// Expands input paths, resolved against a base directory, into entries
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    base_dir: PathBuf,
}

impl DirectoryWalker {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Traverse one input path.
    ///
    /// Failures come out of the iterator as `Err` items and never stop it:
    /// a directory that cannot be read, or whose path is longer than
    /// [`MAX_WALK_PATH_LENGTH`], is reported and its subtree skipped.
    pub fn walk(&self, input: &str) -> Walk {
        Walk {
            input: input.to_string(),
            root_fs: self.base_dir.join(input),
            root_archive: String::new(),
            started: false,
            inner: None,
            pending: None,
        }
    }
}

/// Iterator over the entries below one input path
pub struct Walk {
    input: String,
    root_fs: PathBuf,
    root_archive: String,
    started: bool,
    inner: Option<walkdir::IntoIter>,
    pending: Option<TarError>,
}

impl Walk {
    fn start(&mut self) -> Option<Result<Entry>> {
        let metadata = match fs::metadata(&self.root_fs) {
            Ok(metadata) => metadata,
            Err(source) => {
                return Some(Err(TarError::Stat {
                    path: self.input.clone(),
                    source,
                }))
            }
        };

        if !is_representable(&metadata) {
            tracing::warn!(path = %self.input, "skipping entry that is neither file nor directory");
            return None;
        }

        let mut archive_path = self.input.clone();
        if metadata.is_dir() {
            if !archive_path.ends_with('/') {
                archive_path.push('/');
            }
            self.root_archive = archive_path.clone();

            if let Some(err) = check_length(&archive_path) {
                self.pending = Some(err);
            } else {
                self.inner = Some(
                    WalkDir::new(&self.root_fs)
                        .min_depth(1)
                        .follow_links(true)
                        .sort_by_file_name()
                        .into_iter(),
                );
            }
        }

        Some(Ok(Entry {
            archive_path,
            fs_path: self.root_fs.clone(),
            metadata,
        }))
    }
}

impl Iterator for Walk {
    type Item = Result<Entry>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return Some(Err(err));
        }

        if !self.started {
            self.started = true;
            return self.start();
        }

        loop {
            let inner = self.inner.as_mut()?;
            let dent = match inner.next()? {
                Ok(dent) => dent,
                Err(err) => return Some(Err(err.into())),
            };

            let metadata = match dent.metadata() {
                Ok(metadata) => metadata,
                Err(err) => return Some(Err(err.into())),
            };
            if !is_representable(&metadata) {
                tracing::warn!(
                    path = %dent.path().display(),
                    "skipping entry that is neither file nor directory"
                );
                continue;
            }

            let relative = dent
                .path()
                .strip_prefix(&self.root_fs)
                .ok()
                .and_then(Path::to_str);
            let Some(relative) = relative else {
                return Some(Err(TarError::PathError(format!(
                    "Cannot archive path: {}",
                    dent.path().display()
                ))));
            };

            let mut archive_path = format!("{}{}", self.root_archive, relative);
            if metadata.is_dir() {
                archive_path.push('/');
                if let Some(err) = check_length(&archive_path) {
                    inner.skip_current_dir();
                    self.pending = Some(err);
                }
            }

            return Some(Ok(Entry {
                archive_path,
                fs_path: dent.into_path(),
                metadata,
            }));
        }
    }
}

fn is_representable(metadata: &Metadata) -> bool {
    metadata.is_file() || metadata.is_dir()
}

fn check_length(archive_path: &str) -> Option<TarError> {
    (archive_path.len() > MAX_WALK_PATH_LENGTH).then(|| TarError::PathTooLong {
        path: archive_path.to_string(),
        len: archive_path.len(),
        max: MAX_WALK_PATH_LENGTH,
    })
}
