//! Archive extraction
//!
//! Unlike creation, extraction stops at the first failure: a checksum
//! mismatch, an unparseable field, an existing target file, or any I/O error
//! aborts the run. An already existing directory is not an error.

use crate::archive::{ArchiveReader, EntryType, Header};
use crate::config::Config;
use crate::error::{Result, TarError};
use nix::sys::stat::utimes;
use nix::sys::time::TimeVal;
use std::fs::{self, OpenOptions, Permissions};
use std::io::{BufWriter, Read, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};

/// Mode of a freshly created directory until its entries are written
const PENDING_DIR_MODE: u32 = 0o700;

/// Counts from a completed extraction
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExtractReport {
    pub directories: u64,
    pub files: u64,
    /// Directories that were already present
    pub existing: u64,
    /// Entries with an unknown typeflag
    pub skipped: u64,
}

/// Materializes archive entries below a destination directory
pub struct Extractor {
    dest: PathBuf,
    config: Config,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(".")
    }
}

impl Extractor {
    pub fn new<P: AsRef<Path>>(dest: P) -> Self {
        Self {
            dest: dest.as_ref().to_path_buf(),
            config: Config::default(),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Extract the archive file at `archive`
    pub fn extract<P: AsRef<Path>>(&self, archive: P) -> Result<ExtractReport> {
        let reader = ArchiveReader::open(archive)?.with_zero_blocks(self.config.zero_blocks);
        self.extract_from(reader)
    }

    /// Extract every entry of an open archive stream
    pub fn extract_from<R: Read>(&self, mut reader: ArchiveReader<R>) -> Result<ExtractReport> {
        let mut report = ExtractReport::default();
        let mut created_dirs: Vec<(PathBuf, u32, u64)> = Vec::new();

        while let Some(header) = reader.next_header()? {
            if self.config.log_headers {
                tracing::info!("\n{}", header);
            }
            let path = header.path();
            if self.config.verbose {
                tracing::info!("{}", path);
            }
            self.check_fields(&header)?;

            let target = self.target_path(&path)?;
            match header.entry_type {
                EntryType::Directory => {
                    if self.extract_dir(&target, &header)? {
                        created_dirs.push((target, header.mode, header.mtime));
                        report.directories += 1;
                    } else {
                        report.existing += 1;
                    }
                }
                EntryType::Regular => {
                    self.extract_file(&mut reader, &target, &header)?;
                    report.files += 1;
                }
                EntryType::Other(flag) => {
                    // Content blocks are not consumed
                    tracing::warn!(path = %path, typeflag = %(flag as char), "skipping unsupported entry");
                    report.skipped += 1;
                }
            }
        }

        // Deepest first: children are in place and their writes no longer
        // bump the parent's mtime
        for (dir, mode, mtime) in created_dirs.iter().rev() {
            fs::set_permissions(dir, Permissions::from_mode(*mode))?;
            set_mtime(dir, *mtime)?;
        }

        Ok(report)
    }

    /// Mode and mtime must be present; with `reject_zero_fields` a zero value
    /// counts as unparseable too.
    fn check_fields(&self, header: &Header) -> Result<()> {
        if !self.config.reject_zero_fields {
            return Ok(());
        }
        if header.mode == 0 {
            return Err(TarError::FieldParse {
                field: "mode",
                value: "0".to_string(),
            });
        }
        if header.mtime == 0 {
            return Err(TarError::FieldParse {
                field: "mtime",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Archived paths land below the destination, leading `/` removed.
    /// Paths climbing out through `..` are refused.
    fn target_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(TarError::PathError(format!(
                "Refusing to extract outside the destination: {}",
                path
            )));
        }
        Ok(self.dest.join(relative))
    }

    /// Create a directory with its ancestors. Returns `false` if it already existed.
    ///
    /// The directory stays owner-writable until the stream ends; its own mode
    /// and mtime are applied afterwards.
    fn extract_dir(&self, target: &Path, header: &Header) -> Result<bool> {
        if target.symlink_metadata().is_ok() {
            tracing::debug!(path = %target.display(), "directory already exists");
            return Ok(false);
        }

        fs::create_dir_all(target).map_err(|source| TarError::DirectoryCreate {
            path: header.path(),
            source,
        })?;
        fs::set_permissions(target, Permissions::from_mode(PENDING_DIR_MODE))?;
        Ok(true)
    }

    /// Write a regular file from the content blocks following its header
    fn extract_file<R: Read>(
        &self,
        reader: &mut ArchiveReader<R>,
        target: &Path,
        header: &Header,
    ) -> Result<()> {
        if target.symlink_metadata().is_ok() {
            return Err(TarError::TargetExists(header.path()));
        }

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|source| TarError::DirectoryCreate {
                    path: parent.display().to_string(),
                    source,
                })?;
            }
        }

        let file = OpenOptions::new().write(true).create_new(true).open(target)?;
        file.set_permissions(Permissions::from_mode(header.mode))?;

        let mut out = BufWriter::new(file);
        reader.read_content(header.size, &mut out)?;
        out.flush()?;
        drop(out);

        set_mtime(target, header.mtime)
    }
}

/// Set access and modification time to `mtime` seconds
fn set_mtime(path: &Path, mtime: u64) -> Result<()> {
    let time = TimeVal::new(mtime as _, 0);
    utimes(path, &time, &time)?;
    Ok(())
}
