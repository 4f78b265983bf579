use crate::error::{Result, TarError};
use std::io::{self, Read};

/// Size of every header and data block
pub const BLOCK_SIZE: usize = 512;

/// Size of the all-zero region closing an archive (two blocks)
pub const END_MARKER_SIZE: usize = 2 * BLOCK_SIZE;

/// Magic number stored in every header: "ustar" followed by NUL
pub const MAGIC: [u8; 6] = *b"ustar\0";

/// Format version stored after the magic (no terminator)
pub const VERSION: [u8; 2] = *b"00";

/// Paths shorter than this are stored in the name field unsplit
pub const SPLIT_THRESHOLD: usize = 99;

/// Longest path representable with the name/prefix split (99 + 155)
pub const MAX_PATH_LENGTH: usize = NAME_MAX + PREFIX_LEN;

/// Directories whose path exceeds this length are not descended into
pub const MAX_WALK_PATH_LENGTH: usize = 248;

/// Longest text the name field can hold with its terminator
pub const NAME_MAX: usize = NAME_LEN - 1;

// Field widths, in header order
pub const NAME_LEN: usize = 100;
pub const MODE_LEN: usize = 8;
pub const ID_LEN: usize = 8;
pub const SIZE_LEN: usize = 12;
pub const MTIME_LEN: usize = 12;
pub const CHECKSUM_LEN: usize = 8;
pub const LINKNAME_LEN: usize = 100;
pub const OWNER_NAME_LEN: usize = 32;
pub const DEVICE_LEN: usize = 8;
pub const PREFIX_LEN: usize = 155;

// Field offsets within the 512-byte block
pub const NAME_OFFSET: usize = 0;
pub const MODE_OFFSET: usize = 100;
pub const UID_OFFSET: usize = 108;
pub const GID_OFFSET: usize = 116;
pub const SIZE_OFFSET: usize = 124;
pub const MTIME_OFFSET: usize = 136;
pub const CHECKSUM_OFFSET: usize = 148;
pub const TYPEFLAG_OFFSET: usize = 156;
pub const LINKNAME_OFFSET: usize = 157;
pub const MAGIC_OFFSET: usize = 257;
pub const VERSION_OFFSET: usize = 263;
pub const UNAME_OFFSET: usize = 265;
pub const GNAME_OFFSET: usize = 297;
pub const DEVMAJOR_OFFSET: usize = 329;
pub const DEVMINOR_OFFSET: usize = 337;
pub const PREFIX_OFFSET: usize = 345;

/// Entry kind encoded in the typeflag byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryType {
    /// `'0'`
    Regular,
    /// `'5'`
    Directory,
    /// Any other typeflag; never produced by this crate
    Other(u8),
}

impl EntryType {
    pub fn from_u8(value: u8) -> Self {
        match value {
            b'0' => Self::Regular,
            b'5' => Self::Directory,
            other => Self::Other(other),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            Self::Regular => b'0',
            Self::Directory => b'5',
            Self::Other(value) => value,
        }
    }
}

/// Write `value` as zero-padded octal filling all but the last byte of `dst`,
/// which stays NUL.
pub fn write_octal(dst: &mut [u8], value: u64, field: &'static str) -> Result<()> {
    let digits = dst.len() - 1;
    let text = format!("{:0width$o}", value, width = digits);
    if text.len() > digits {
        return Err(TarError::FieldOverflow { field, value });
    }
    dst[..digits].copy_from_slice(text.as_bytes());
    dst[digits] = 0;
    Ok(())
}

/// Parse an octal field the way the header is written: optional leading
/// spaces, octal digits, then anything (NUL, space) ends the number.
///
/// Returns `None` if the field holds no digits at all.
pub fn parse_octal(field: &[u8]) -> Option<u64> {
    let mut value: u64 = 0;
    let mut seen_digit = false;

    for &byte in field.iter().skip_while(|&&b| b == b' ') {
        match byte {
            b'0'..=b'7' => {
                value = value.checked_mul(8)?.checked_add(u64::from(byte - b'0'))?;
                seen_digit = true;
            }
            _ => break,
        }
    }

    seen_digit.then_some(value)
}

/// Copy `text` into a NUL-padded field. Text longer than the field is cut.
pub fn write_str(dst: &mut [u8], text: &str) {
    let bytes = text.as_bytes();
    let len = bytes.len().min(dst.len());
    dst[..len].copy_from_slice(&bytes[..len]);
    dst[len..].fill(0);
}

/// Read a NUL-terminated (or full-width) text field
pub fn read_str(field: &[u8]) -> &[u8] {
    let end = field.iter().position(|&b| b == 0).unwrap_or(field.len());
    &field[..end]
}

/// Longest prefix of `text` that is at most `max` bytes and ends on a char boundary
pub fn truncate_str(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// True if the block holds only zero bytes
pub fn is_zero_block(block: &[u8]) -> bool {
    block.iter().all(|&b| b == 0)
}

/// Read until the block is full or the source is exhausted.
///
/// Returns the number of bytes filled; anything short of [`BLOCK_SIZE`]
/// means the source ended.
pub fn read_block<R: Read>(source: &mut R, block: &mut [u8; BLOCK_SIZE]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < BLOCK_SIZE {
        match source.read(&mut block[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Number of bytes `len` occupies once padded to whole blocks
pub fn padded_len(len: u64) -> u64 {
    len.div_ceil(BLOCK_SIZE as u64) * BLOCK_SIZE as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_type_from_u8() {
        assert_eq!(EntryType::from_u8(b'0'), EntryType::Regular);
        assert_eq!(EntryType::from_u8(b'5'), EntryType::Directory);
        assert_eq!(EntryType::from_u8(b'2'), EntryType::Other(b'2'));
        assert_eq!(EntryType::Other(b'2').as_u8(), b'2');
    }

    #[test]
    fn test_write_octal_pads_and_terminates() {
        let mut field = [0xFFu8; 8];
        write_octal(&mut field, 0o644, "mode").unwrap();
        assert_eq!(&field, b"0000644\0");

        let mut size = [0u8; 12];
        write_octal(&mut size, 600, "size").unwrap();
        assert_eq!(&size, b"00000001130\0");
    }

    #[test]
    fn test_write_octal_overflow() {
        let mut field = [0u8; 8];
        let err = write_octal(&mut field, 0o10000000, "uid").unwrap_err();
        assert!(matches!(err, TarError::FieldOverflow { field: "uid", .. }));
    }

    #[test]
    fn test_parse_octal() {
        assert_eq!(parse_octal(b"0000644\0"), Some(0o644));
        assert_eq!(parse_octal(b"  17 \0\0"), Some(0o17));
        assert_eq!(parse_octal(b"0000000\0"), Some(0));
        assert_eq!(parse_octal(b"\0\0\0\0"), None);
        assert_eq!(parse_octal(b"zz"), None);
        assert_eq!(parse_octal(b"128"), Some(0o12));
    }

    #[test]
    fn test_str_fields() {
        let mut field = [0xAAu8; 8];
        write_str(&mut field, "root");
        assert_eq!(&field, b"root\0\0\0\0");
        assert_eq!(read_str(&field), b"root");

        write_str(&mut field, "much-too-long");
        assert_eq!(read_str(&field), b"much-too");
    }

    #[test]
    fn test_truncate_str_respects_char_boundary() {
        assert_eq!(truncate_str("abc", 5), "abc");
        assert_eq!(truncate_str("aé", 2), "a");
        assert_eq!(truncate_str("abcdef", 3), "abc");
    }

    #[test]
    fn test_padded_len() {
        assert_eq!(padded_len(0), 0);
        assert_eq!(padded_len(1), 512);
        assert_eq!(padded_len(512), 512);
        assert_eq!(padded_len(600), 1024);
    }
}
