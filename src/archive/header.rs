use crate::archive::checksum;
use crate::archive::format::*;
use crate::archive::path;
use crate::error::{Result, TarError};
use crate::owner::NameLookup;
use std::fmt;
use std::fs::Metadata;
use std::os::unix::fs::MetadataExt;

/// Permission bits kept in the mode field
const PERMISSION_MASK: u32 = 0o777;

/// Header record preceding every entry
///
/// Structure (512 bytes, numeric fields are NUL-terminated ASCII octal):
/// - name: 100
/// - mode: 8
/// - uid / gid: 8 each
/// - size: 12
/// - mtime: 12
/// - checksum: 8 (six digits, NUL, space)
/// - typeflag: 1
/// - linkname: 100
/// - magic: 6 ("ustar\0")
/// - version: 2 ("00")
/// - owner name / group name: 32 each
/// - device major / minor: 8 each
/// - prefix: 155
/// - padding: 12
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u64,
    pub mtime: u64,
    pub checksum: u32,
    pub entry_type: EntryType,
    pub linkname: String,
    pub magic: [u8; 6],
    pub version: [u8; 2],
    pub owner_name: String,
    pub group_name: String,
    pub dev_major: u32,
    pub dev_minor: u32,
    pub prefix: String,
}

impl Header {
    /// Create a header for `path` with zeroed metadata and a current checksum
    pub fn new(path: &str, entry_type: EntryType) -> Result<Self> {
        let split = path::split(path);
        let mut header = Self {
            name: split.name,
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            mtime: 0,
            checksum: 0,
            entry_type,
            linkname: String::new(),
            magic: MAGIC,
            version: VERSION,
            owner_name: String::new(),
            group_name: String::new(),
            dev_major: 0,
            dev_minor: 0,
            prefix: split.prefix,
        };
        header.update_checksum()?;
        Ok(header)
    }

    /// Build the header for a filesystem entry stored under `path`.
    ///
    /// Only regular files and directories are representable; anything else
    /// fails with [`TarError::UnsupportedEntry`] and must be skipped.
    pub fn from_metadata(path: &str, metadata: &Metadata, lookup: &dyn NameLookup) -> Result<Self> {
        let entry_type = if metadata.is_file() {
            EntryType::Regular
        } else if metadata.is_dir() {
            EntryType::Directory
        } else {
            return Err(TarError::UnsupportedEntry(path.to_string()));
        };

        let split = path::split(path);
        if split.is_truncated(path) {
            tracing::warn!(path, "path does not fit the name/prefix fields, truncated");
        }

        let mtime = u64::try_from(metadata.mtime()).map_err(|_| TarError::FieldParse {
            field: "mtime",
            value: metadata.mtime().to_string(),
        })?;

        let mut header = Self {
            name: split.name,
            mode: metadata.mode() & PERMISSION_MASK,
            uid: metadata.uid(),
            gid: metadata.gid(),
            size: if entry_type == EntryType::Regular { metadata.size() } else { 0 },
            mtime,
            checksum: 0,
            entry_type,
            linkname: String::new(),
            magic: MAGIC,
            version: VERSION,
            owner_name: truncate_str(&lookup.user_name(metadata.uid()), OWNER_NAME_LEN - 1)
                .to_string(),
            group_name: truncate_str(&lookup.group_name(metadata.gid()), OWNER_NAME_LEN - 1)
                .to_string(),
            dev_major: 0,
            dev_minor: 0,
            prefix: split.prefix,
        };
        header.update_checksum()?;
        Ok(header)
    }

    /// Decode a raw header block.
    ///
    /// The checksum is read but not verified; callers compare it against
    /// [`checksum::compute`] themselves.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let block: &[u8; BLOCK_SIZE] = bytes.try_into().map_err(|_| {
            TarError::InvalidHeader(format!(
                "header must be {} bytes, got {}",
                BLOCK_SIZE,
                bytes.len()
            ))
        })?;

        let mut magic = [0u8; 6];
        magic.copy_from_slice(&block[MAGIC_OFFSET..MAGIC_OFFSET + 6]);
        let mut version = [0u8; 2];
        version.copy_from_slice(&block[VERSION_OFFSET..VERSION_OFFSET + 2]);

        Ok(Self {
            name: path_field(block, NAME_OFFSET, NAME_LEN)?,
            mode: required_octal(block, MODE_OFFSET, MODE_LEN, "mode")? as u32,
            uid: optional_octal(block, UID_OFFSET, ID_LEN) as u32,
            gid: optional_octal(block, GID_OFFSET, ID_LEN) as u32,
            size: required_octal(block, SIZE_OFFSET, SIZE_LEN, "size")?,
            mtime: required_octal(block, MTIME_OFFSET, MTIME_LEN, "mtime")?,
            checksum: checksum::stored(block).unwrap_or(0),
            entry_type: EntryType::from_u8(block[TYPEFLAG_OFFSET]),
            linkname: text_field(block, LINKNAME_OFFSET, LINKNAME_LEN),
            magic,
            version,
            owner_name: text_field(block, UNAME_OFFSET, OWNER_NAME_LEN),
            group_name: text_field(block, GNAME_OFFSET, OWNER_NAME_LEN),
            dev_major: optional_octal(block, DEVMAJOR_OFFSET, DEVICE_LEN) as u32,
            dev_minor: optional_octal(block, DEVMINOR_OFFSET, DEVICE_LEN) as u32,
            prefix: path_field(block, PREFIX_OFFSET, PREFIX_LEN)?,
        })
    }

    /// Serialize to a 512-byte block carrying the stored checksum
    pub fn to_bytes(&self) -> Result<[u8; BLOCK_SIZE]> {
        let mut block = self.encode_fields()?;
        checksum::write(&mut block, self.checksum);
        Ok(block)
    }

    /// Recompute the checksum over the current field values
    pub fn update_checksum(&mut self) -> Result<()> {
        self.checksum = checksum::compute(&self.encode_fields()?);
        Ok(())
    }

    /// Full archived path: prefix followed by name
    pub fn path(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }

    pub fn is_file(&self) -> bool {
        self.entry_type == EntryType::Regular
    }

    /// Every field except the checksum, which is left zeroed
    fn encode_fields(&self) -> Result<[u8; BLOCK_SIZE]> {
        let mut block = [0u8; BLOCK_SIZE];

        write_str(&mut block[NAME_OFFSET..NAME_OFFSET + NAME_LEN], &self.name);
        write_octal(&mut block[MODE_OFFSET..MODE_OFFSET + MODE_LEN], u64::from(self.mode), "mode")?;
        write_octal(&mut block[UID_OFFSET..UID_OFFSET + ID_LEN], u64::from(self.uid), "uid")?;
        write_octal(&mut block[GID_OFFSET..GID_OFFSET + ID_LEN], u64::from(self.gid), "gid")?;
        write_octal(&mut block[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN], self.size, "size")?;
        write_octal(&mut block[MTIME_OFFSET..MTIME_OFFSET + MTIME_LEN], self.mtime, "mtime")?;
        block[TYPEFLAG_OFFSET] = self.entry_type.as_u8();
        write_str(&mut block[LINKNAME_OFFSET..LINKNAME_OFFSET + LINKNAME_LEN], &self.linkname);
        block[MAGIC_OFFSET..MAGIC_OFFSET + 6].copy_from_slice(&self.magic);
        block[VERSION_OFFSET..VERSION_OFFSET + 2].copy_from_slice(&self.version);
        write_str(&mut block[UNAME_OFFSET..UNAME_OFFSET + OWNER_NAME_LEN], &self.owner_name);
        write_str(&mut block[GNAME_OFFSET..GNAME_OFFSET + OWNER_NAME_LEN], &self.group_name);
        write_octal(
            &mut block[DEVMAJOR_OFFSET..DEVMAJOR_OFFSET + DEVICE_LEN],
            u64::from(self.dev_major),
            "devmajor",
        )?;
        write_octal(
            &mut block[DEVMINOR_OFFSET..DEVMINOR_OFFSET + DEVICE_LEN],
            u64::from(self.dev_minor),
            "devminor",
        )?;
        write_str(&mut block[PREFIX_OFFSET..PREFIX_OFFSET + PREFIX_LEN], &self.prefix);

        Ok(block)
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "----------")?;
        writeln!(f, "   name:     '{}'", self.name)?;
        writeln!(f, "   mode:     {:07o}", self.mode)?;
        writeln!(f, "   uid:      {:07o}", self.uid)?;
        writeln!(f, "   gid:      {:07o}", self.gid)?;
        writeln!(f, "   size:     {:011o}", self.size)?;
        writeln!(f, "   mtime:    {:011o}", self.mtime)?;
        writeln!(f, "   checksum: {:06o}", self.checksum)?;
        writeln!(f, "   type:     '{}'", self.entry_type.as_u8() as char)?;
        writeln!(f, "   linkname: '{}'", self.linkname)?;
        writeln!(f, "   magic:    '{}'", String::from_utf8_lossy(read_str(&self.magic)))?;
        writeln!(f, "   version:  '{}'", String::from_utf8_lossy(&self.version))?;
        writeln!(f, "   owner:    '{}'", self.owner_name)?;
        writeln!(f, "   group:    '{}'", self.group_name)?;
        writeln!(f, "   major:    {:07o}", self.dev_major)?;
        writeln!(f, "   minor:    {:07o}", self.dev_minor)?;
        writeln!(f, "   prefix:   '{}'", self.prefix)?;
        write!(f, "----------")
    }
}

fn path_field(block: &[u8; BLOCK_SIZE], offset: usize, len: usize) -> Result<String> {
    let raw = read_str(&block[offset..offset + len]);
    String::from_utf8(raw.to_vec())
        .map_err(|e| TarError::PathError(format!("Invalid UTF-8 in path: {}", e)))
}

fn text_field(block: &[u8; BLOCK_SIZE], offset: usize, len: usize) -> String {
    String::from_utf8_lossy(read_str(&block[offset..offset + len])).into_owned()
}

fn required_octal(
    block: &[u8; BLOCK_SIZE],
    offset: usize,
    len: usize,
    field: &'static str,
) -> Result<u64> {
    let raw = &block[offset..offset + len];
    parse_octal(raw).ok_or_else(|| TarError::FieldParse {
        field,
        value: String::from_utf8_lossy(read_str(raw)).into_owned(),
    })
}

fn optional_octal(block: &[u8; BLOCK_SIZE], offset: usize, len: usize) -> u64 {
    parse_octal(&block[offset..offset + len]).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::NoLookup;
    use std::fs;
    use tempfile::TempDir;

    fn file_header(path: &str, size: u64) -> Header {
        let mut header = Header::new(path, EntryType::Regular).unwrap();
        header.mode = 0o644;
        header.uid = 1000;
        header.gid = 1000;
        header.size = size;
        header.mtime = 1_700_000_000;
        header.owner_name = "alice".to_string();
        header.group_name = "staff".to_string();
        header.update_checksum().unwrap();
        header
    }

    #[test]
    fn test_layout() {
        let header = file_header("a.txt", 600);
        let block = header.to_bytes().unwrap();

        assert_eq!(&block[..6], b"a.txt\0");
        assert_eq!(&block[MODE_OFFSET..MODE_OFFSET + 8], b"0000644\0");
        assert_eq!(&block[UID_OFFSET..UID_OFFSET + 8], b"0001750\0");
        assert_eq!(&block[SIZE_OFFSET..SIZE_OFFSET + 12], b"00000001130\0");
        assert_eq!(block[TYPEFLAG_OFFSET], b'0');
        assert_eq!(&block[MAGIC_OFFSET..MAGIC_OFFSET + 6], b"ustar\0");
        assert_eq!(&block[VERSION_OFFSET..VERSION_OFFSET + 2], b"00");
        assert_eq!(&block[DEVMAJOR_OFFSET..DEVMAJOR_OFFSET + 8], b"0000000\0");
        assert_eq!(&block[UNAME_OFFSET..UNAME_OFFSET + 6], b"alice\0");
        assert!(block[PREFIX_OFFSET..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_checksum_matches_block() {
        let header = file_header("dir/file.bin", 12345);
        let block = header.to_bytes().unwrap();
        assert_eq!(checksum::compute(&block), header.checksum);
        assert_eq!(checksum::stored(&block), Some(header.checksum));
    }

    #[test]
    fn test_decode_roundtrip() {
        let header = file_header("dir/file.bin", 12345);
        let block = header.to_bytes().unwrap();
        let decoded = Header::decode(&block).unwrap();
        assert_eq!(decoded, header);
        assert_eq!(decoded.path(), "dir/file.bin");
    }

    #[test]
    fn test_long_path_uses_prefix() {
        let path = format!("{}/{}/leaf.txt", "p".repeat(70), "q".repeat(70));
        let header = file_header(&path, 1);
        assert!(!header.prefix.is_empty());
        assert!(header.name.len() < NAME_LEN);

        let decoded = Header::decode(&header.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.path(), path);
    }

    #[test]
    fn test_decode_wrong_length() {
        let err = Header::decode(&[0u8; 100]).unwrap_err();
        assert!(matches!(err, TarError::InvalidHeader(_)));
    }

    #[test]
    fn test_decode_unparseable_mode() {
        let mut block = file_header("a", 0).to_bytes().unwrap();
        block[MODE_OFFSET..MODE_OFFSET + MODE_LEN].fill(b'x');
        let err = Header::decode(&block).unwrap_err();
        assert!(matches!(err, TarError::FieldParse { field: "mode", .. }));
    }

    #[test]
    fn test_size_overflow() {
        let mut header = Header::new("huge", EntryType::Regular).unwrap();
        header.size = 1 << 33;
        let err = header.update_checksum().unwrap_err();
        assert!(matches!(err, TarError::FieldOverflow { field: "size", .. }));
    }

    #[test]
    fn test_from_metadata() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, vec![b'z'; 600]).unwrap();

        let metadata = fs::metadata(&file).unwrap();
        let header = Header::from_metadata("data.txt", &metadata, &NoLookup).unwrap();
        assert_eq!(header.entry_type, EntryType::Regular);
        assert_eq!(header.size, 600);
        assert_eq!(header.mode, metadata.mode() & 0o777);
        assert_eq!(header.mtime, metadata.mtime() as u64);
        assert_eq!(header.owner_name, "");

        let dir_meta = fs::metadata(dir.path()).unwrap();
        let header = Header::from_metadata("d/", &dir_meta, &NoLookup).unwrap();
        assert!(header.is_dir());
        assert_eq!(header.size, 0);
        assert_eq!(header.to_bytes().unwrap()[TYPEFLAG_OFFSET], b'5');
    }

    #[test]
    fn test_display_dump() {
        let dump = file_header("a.txt", 3).to_string();
        assert!(dump.contains("name:     'a.txt'"));
        assert!(dump.contains("mode:     0000644"));
        assert!(dump.contains("owner:    'alice'"));
    }
}
