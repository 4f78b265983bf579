//! Archive creation
//!
//! Creation is best-effort: an entry that cannot be stat'ed, read, or encoded
//! is reported and recorded, and the remaining entries are still packed.

use crate::archive::{ArchiveWriter, Header, END_MARKER_SIZE};
use crate::config::Config;
use crate::error::{Result, TarError};
use crate::owner::{NameLookup, SystemLookup};
use crate::walker::{DirectoryWalker, Entry};
use std::fs;
use std::io::Write;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// Outcome of a pack run that produced an archive
#[derive(Debug, Default)]
pub struct PackReport {
    /// Headers written, failed entries included
    pub entries: u64,
    /// Archive size in bytes, end marker included
    pub bytes: u64,
    /// Every entry-level failure, in the order encountered
    pub failures: Vec<TarError>,
}

impl PackReport {
    /// True if every entry was packed
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, err: TarError) {
        tracing::error!("{}", err);
        self.failures.push(err);
    }
}

/// Packs input paths into a new archive
pub struct Packer {
    base_dir: PathBuf,
    config: Config,
    lookup: Box<dyn NameLookup>,
}

impl Default for Packer {
    fn default() -> Self {
        Self::new()
    }
}

impl Packer {
    /// Packer resolving inputs against the current directory
    pub fn new() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            config: Config::default(),
            lookup: Box::new(SystemLookup),
        }
    }

    /// Resolve input paths against `base_dir` instead of the current directory.
    /// Archive paths are stored exactly as given.
    pub fn with_base_dir<P: AsRef<Path>>(mut self, base_dir: P) -> Self {
        self.base_dir = base_dir.as_ref().to_path_buf();
        self
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Replace the owner/group name service
    pub fn with_lookup<L: NameLookup + 'static>(mut self, lookup: L) -> Self {
        self.lookup = Box::new(lookup);
        self
    }

    /// Create `output` from `inputs`.
    ///
    /// Fails up front with [`TarError::ArchiveExists`] if `output` exists.
    /// Inputs are packed in sorted order. If no entry made it into the
    /// archive, the file is removed and [`TarError::EmptyArchive`] returned.
    pub fn create<P: AsRef<Path>, S: AsRef<str>>(&self, output: P, inputs: &[S]) -> Result<PackReport> {
        let output = output.as_ref();
        if output.symlink_metadata().is_ok() {
            return Err(TarError::ArchiveExists(output.to_path_buf()));
        }

        let mut writer = ArchiveWriter::create(output)?;
        let archive_id = fs::metadata(output).map(|m| (m.dev(), m.ino())).ok();

        let mut inputs: Vec<&str> = inputs.iter().map(AsRef::as_ref).collect();
        inputs.sort_unstable();

        let walker = DirectoryWalker::new(&self.base_dir);
        let mut report = PackReport::default();

        for input in inputs {
            for item in walker.walk(input) {
                match item {
                    Ok(entry) => {
                        if archive_id == Some((entry.metadata.dev(), entry.metadata.ino())) {
                            tracing::warn!(path = %entry.archive_path, "skipping the archive itself");
                            continue;
                        }
                        if let Err(err) = self.append(&mut writer, &entry) {
                            report.record(err);
                        }
                    }
                    Err(err) => report.record(err),
                }
            }
        }

        report.entries = writer.entries_written();
        report.bytes = writer.bytes_written() + END_MARKER_SIZE as u64;
        writer.finalize()?;

        if report.entries == 0 {
            fs::remove_file(output)?;
            return Err(TarError::EmptyArchive);
        }

        Ok(report)
    }

    /// Encode and append one entry
    fn append<W: Write>(&self, writer: &mut ArchiveWriter<W>, entry: &Entry) -> Result<()> {
        if self.config.verbose {
            tracing::info!("{}", entry.archive_path);
        }

        let header = Header::from_metadata(&entry.archive_path, &entry.metadata, self.lookup.as_ref())?;
        if self.config.log_headers {
            tracing::info!("\n{}", header);
        }

        if entry.is_dir() {
            writer.write_header(&header)
        } else {
            writer.write_file(&header, &entry.fs_path)
        }
    }
}
