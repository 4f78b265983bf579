use crate::archive::format::{padded_len, read_block, BLOCK_SIZE, END_MARKER_SIZE};
use crate::archive::header::Header;
use crate::error::{Result, TarError};
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

/// Sequential archive writer
///
/// Appends header and content blocks to the underlying stream and never
/// seeks. Nothing is retracted on failure: a header written before its
/// content failed stays in the stream.
pub struct ArchiveWriter<W: Write> {
    writer: W,
    entries_written: u64,
    bytes_written: u64,
}

impl ArchiveWriter<BufWriter<File>> {
    /// Create a new archive file. Fails if `path` already exists.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => TarError::ArchiveExists(path.to_path_buf()),
                _ => TarError::Io(e),
            })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> ArchiveWriter<W> {
    /// Wrap an output stream
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            entries_written: 0,
            bytes_written: 0,
        }
    }

    /// Number of headers appended so far
    pub fn entries_written(&self) -> u64 {
        self.entries_written
    }

    /// Number of bytes appended so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append a header record
    pub fn write_header(&mut self, header: &Header) -> Result<()> {
        let block = header.to_bytes()?;
        self.writer.write_all(&block)?;
        self.entries_written += 1;
        self.bytes_written += BLOCK_SIZE as u64;
        Ok(())
    }

    /// Append a header followed by the contents of `source`.
    ///
    /// Exactly `header.size` bytes are framed. If the file shrank since it
    /// was stat'ed the missing tail is zero-filled; if it grew the excess is
    /// left out. Either way the entry fails with [`TarError::SizeChanged`]
    /// while the stream stays well-formed.
    pub fn write_file(&mut self, header: &Header, source: &Path) -> Result<()> {
        self.write_header(header)?;
        let mut file = File::open(source)?;
        let copied = self.write_content(&mut file, header.size)?;

        let mut extra = [0u8; 1];
        let grew = copied == header.size && file.read(&mut extra)? > 0;
        if copied < header.size || grew {
            let actual = if grew { file.metadata()?.len() } else { copied };
            return Err(TarError::SizeChanged {
                path: header.path(),
                expected: header.size,
                actual,
            });
        }
        Ok(())
    }

    /// Append a header followed by in-memory contents
    pub fn write_entry(&mut self, header: &Header, data: &[u8]) -> Result<()> {
        self.write_header(header)?;
        self.write_content(data, header.size)?;
        Ok(())
    }

    /// Stream up to `size` bytes of `source` in whole blocks.
    ///
    /// Always emits [`padded_len`]`(size)` bytes: the last block is
    /// zero-padded, and blocks the source could not fill are zeros. Returns
    /// the number of content bytes actually read.
    pub fn write_content<R: Read>(&mut self, source: R, size: u64) -> Result<u64> {
        let mut source = source.take(size);
        let mut block = [0u8; BLOCK_SIZE];
        let mut copied = 0u64;
        let mut framed = 0u64;

        while framed < padded_len(size) {
            let filled = read_block(&mut source, &mut block)?;
            block[filled..].fill(0);
            self.writer.write_all(&block)?;
            self.bytes_written += BLOCK_SIZE as u64;
            copied += filled as u64;
            framed += BLOCK_SIZE as u64;
        }

        Ok(copied)
    }

    /// Append the end marker, flush, and hand back the stream
    pub fn finalize(mut self) -> Result<W> {
        self.writer.write_all(&[0u8; END_MARKER_SIZE])?;
        self.bytes_written += END_MARKER_SIZE as u64;
        self.writer.flush()?;
        Ok(self.writer)
    }
}
