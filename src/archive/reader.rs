use crate::archive::checksum;
use crate::archive::format::{is_zero_block, read_block, BLOCK_SIZE};
use crate::archive::header::Header;
use crate::config::ZeroBlockPolicy;
use crate::error::{Result, TarError};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

/// Sequential block scanner over an archive stream
///
/// Hands out one verified header at a time. After a regular-file header the
/// caller consumes its content with [`read_content`](Self::read_content) or
/// [`skip_content`](Self::skip_content) before asking for the next header.
pub struct ArchiveReader<R: Read> {
    reader: R,
    zero_blocks: ZeroBlockPolicy,
    offset: u64,
    previous_zero: bool,
    finished: bool,
}

impl ArchiveReader<BufReader<File>> {
    /// Open an archive file for reading
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TarError::ArchiveNotFound(path.to_path_buf()),
            _ => TarError::Io(e),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read> ArchiveReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            zero_blocks: ZeroBlockPolicy::default(),
            offset: 0,
            previous_zero: false,
            finished: false,
        }
    }

    pub fn with_zero_blocks(mut self, policy: ZeroBlockPolicy) -> Self {
        self.zero_blocks = policy;
        self
    }

    /// Byte offset of the next unread block
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Next header in the stream, or `None` at the end.
    ///
    /// Fails with [`TarError::ChecksumMismatch`] if the stored checksum
    /// matches neither the unsigned nor the signed byte sum of the block.
    pub fn next_header(&mut self) -> Result<Option<Header>> {
        let mut block = [0u8; BLOCK_SIZE];

        loop {
            if self.finished || !self.next_block(&mut block)? {
                return Ok(None);
            }

            if is_zero_block(&block) {
                match self.zero_blocks {
                    ZeroBlockPolicy::Skip => continue,
                    ZeroBlockPolicy::Terminate if self.previous_zero => {
                        self.finished = true;
                        return Ok(None);
                    }
                    ZeroBlockPolicy::Terminate => {
                        self.previous_zero = true;
                        continue;
                    }
                }
            }
            self.previous_zero = false;

            let expected = checksum::stored(&block);
            if !expected.is_some_and(|sum| checksum::matches(&block, sum)) {
                return Err(TarError::ChecksumMismatch {
                    expected: expected.unwrap_or(0),
                    actual: checksum::compute(&block),
                });
            }

            return Header::decode(&block).map(Some);
        }
    }

    /// Copy the `size` content bytes following a header into `out`,
    /// consuming the padding of the last block.
    pub fn read_content<W: Write>(&mut self, size: u64, out: &mut W) -> Result<()> {
        let mut block = [0u8; BLOCK_SIZE];
        let mut remaining = size;

        while remaining > 0 {
            if !self.next_block(&mut block)? {
                return Err(TarError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("archive ended with {} content bytes missing", remaining),
                )));
            }
            let keep = remaining.min(BLOCK_SIZE as u64) as usize;
            out.write_all(&block[..keep])?;
            remaining -= keep as u64;
        }

        Ok(())
    }

    /// Discard the `size` content bytes following a header
    pub fn skip_content(&mut self, size: u64) -> Result<()> {
        self.read_content(size, &mut io::sink())
    }

    /// Decode every header in the stream, skipping regular-file content
    pub fn list_entries(mut self) -> Result<Vec<Header>> {
        let mut headers = Vec::new();
        while let Some(header) = self.next_header()? {
            if header.is_file() {
                self.skip_content(header.size)?;
            }
            headers.push(header);
        }
        Ok(headers)
    }

    /// Read one whole block. `false` at end of stream; a trailing partial
    /// block also ends the stream.
    fn next_block(&mut self, block: &mut [u8; BLOCK_SIZE]) -> Result<bool> {
        let filled = read_block(&mut self.reader, block)?;
        if filled < BLOCK_SIZE {
            if filled > 0 {
                tracing::warn!(
                    offset = self.offset,
                    bytes = filled,
                    "ignoring trailing partial block"
                );
            }
            self.finished = true;
            return Ok(false);
        }
        self.offset += BLOCK_SIZE as u64;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::format::{EntryType, CHECKSUM_OFFSET};
    use crate::archive::writer::ArchiveWriter;
    use std::io::Cursor;

    fn header(path: &str, entry_type: EntryType, size: u64) -> Header {
        let mut header = Header::new(path, entry_type).unwrap();
        header.mode = 0o755;
        header.mtime = 1_600_000_000;
        header.size = size;
        header.update_checksum().unwrap();
        header
    }

    fn sample_archive() -> Vec<u8> {
        let mut writer = ArchiveWriter::new(Vec::new());
        writer
            .write_header(&header("d/", EntryType::Directory, 0))
            .unwrap();
        writer
            .write_entry(&header("d/f.txt", EntryType::Regular, 5), b"hello")
            .unwrap();
        writer.finalize().unwrap()
    }

    #[test]
    fn test_reads_headers_and_content() {
        let mut reader = ArchiveReader::new(Cursor::new(sample_archive()));

        let dir = reader.next_header().unwrap().unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.path(), "d/");

        let file = reader.next_header().unwrap().unwrap();
        assert_eq!(file.path(), "d/f.txt");
        let mut content = Vec::new();
        reader.read_content(file.size, &mut content).unwrap();
        assert_eq!(content, b"hello");

        assert!(reader.next_header().unwrap().is_none());
        assert_eq!(reader.offset(), 5 * BLOCK_SIZE as u64);
    }

    #[test]
    fn test_zero_blocks_skipped_mid_stream() {
        let mut data = vec![0u8; 3 * BLOCK_SIZE];
        let mut writer = ArchiveWriter::new(Vec::new());
        writer
            .write_header(&header("late/", EntryType::Directory, 0))
            .unwrap();
        data.extend(writer.finalize().unwrap());

        let headers = ArchiveReader::new(Cursor::new(data)).list_entries().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].path(), "late/");
    }

    #[test]
    fn test_terminate_policy_stops_at_marker() {
        let mut data = sample_archive();
        let mut writer = ArchiveWriter::new(Vec::new());
        writer
            .write_header(&header("after/", EntryType::Directory, 0))
            .unwrap();
        data.extend(writer.finalize().unwrap());

        let skip = ArchiveReader::new(Cursor::new(data.clone()))
            .list_entries()
            .unwrap();
        assert_eq!(skip.len(), 3);

        let strict = ArchiveReader::new(Cursor::new(data))
            .with_zero_blocks(ZeroBlockPolicy::Terminate)
            .list_entries()
            .unwrap();
        assert_eq!(strict.len(), 2);
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut data = sample_archive();
        data[CHECKSUM_OFFSET] = if data[CHECKSUM_OFFSET] == b'1' { b'2' } else { b'1' };

        let mut reader = ArchiveReader::new(Cursor::new(data));
        let err = reader.next_header().unwrap_err();
        assert!(matches!(err, TarError::ChecksumMismatch { .. }));
    }

    #[test]
    fn test_signed_checksum_header_accepted() {
        let mut block = header("café.txt", EntryType::Regular, 0).to_bytes().unwrap();
        let signed = checksum::compute_signed(&block);
        assert_ne!(signed, i64::from(checksum::compute(&block)));
        checksum::write(&mut block, signed as u32);

        let mut data = block.to_vec();
        data.extend_from_slice(&[0u8; 2 * BLOCK_SIZE]);
        let headers = ArchiveReader::new(Cursor::new(data)).list_entries().unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers[0].path(), "café.txt");
    }

    #[test]
    fn test_truncated_content() {
        let mut data = sample_archive();
        data.truncate(2 * BLOCK_SIZE);

        let mut reader = ArchiveReader::new(Cursor::new(data));
        reader.next_header().unwrap();
        let file = reader.next_header().unwrap().unwrap();
        let err = reader.read_content(file.size, &mut io::sink()).unwrap_err();
        assert!(matches!(err, TarError::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn test_partial_trailing_block_ends_stream() {
        let mut data = sample_archive();
        data.truncate(3 * BLOCK_SIZE);
        data.extend_from_slice(&[7u8; 100]);

        let headers = ArchiveReader::new(Cursor::new(data)).list_entries().unwrap();
        assert_eq!(headers.len(), 2);
    }
}
