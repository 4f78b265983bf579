//! ustar-rs: sequential USTAR-style archiver
//!
//! Packs files and directory trees into a stream of 512-byte blocks and
//! unpacks such streams back onto the filesystem:
//! - Fixed-layout headers with octal ASCII fields and a byte-sum checksum
//! - Long paths split across the `prefix` and `name` fields
//! - Depth-first, name-sorted directory traversal
//! - Permission bits and modification times restored on extraction
//!
//! # Example
//!
//! ```no_run
//! use ustar_rs::{ArchiveReader, Extractor, Packer};
//!
//! // Pack a tree
//! let report = Packer::new().create("backup.tar", &["docs"])?;
//! assert!(report.is_success());
//!
//! // List it
//! for header in ArchiveReader::open("backup.tar")?.list_entries()? {
//!     println!("{} ({} bytes)", header.path(), header.size);
//! }
//!
//! // Unpack below another directory
//! Extractor::new("restore").extract("backup.tar")?;
//! # Ok::<(), ustar_rs::TarError>(())
//! ```

pub mod archive;
pub mod config;
pub mod error;
pub mod extract;
pub mod owner;
pub mod pack;
pub mod walker;

pub use archive::{
    ArchiveReader, ArchiveWriter, EntryType, Header, BLOCK_SIZE, END_MARKER_SIZE, MAX_PATH_LENGTH,
};
pub use config::{Config, ZeroBlockPolicy};
pub use error::{Result, TarError};
pub use extract::{ExtractReport, Extractor};
pub use owner::{NameLookup, NoLookup, SystemLookup};
pub use pack::{PackReport, Packer};
pub use walker::{DirectoryWalker, Entry};
