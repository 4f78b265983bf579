pub mod checksum;
mod format;
mod header;
pub mod path;
mod reader;
mod writer;

pub use format::{
    is_zero_block, padded_len, EntryType, BLOCK_SIZE, CHECKSUM_OFFSET, END_MARKER_SIZE, MAGIC,
    MAGIC_OFFSET, MAX_PATH_LENGTH, MAX_WALK_PATH_LENGTH, MODE_OFFSET, MTIME_OFFSET, NAME_LEN,
    NAME_OFFSET, PREFIX_LEN, PREFIX_OFFSET, SIZE_OFFSET, SPLIT_THRESHOLD, TYPEFLAG_OFFSET,
    VERSION,
};
pub use header::Header;
pub use path::{split, SplitPath};
pub use reader::ArchiveReader;
pub use writer::ArchiveWriter;
