#![no_main]

use libfuzzer_sys::fuzz_target;
use std::io::Cursor;
use tempfile::TempDir;
use ustar_rs::{ArchiveReader, Config, Extractor, Header, ZeroBlockPolicy, BLOCK_SIZE};

fuzz_target!(|data: &[u8]| {
    // Decoding a single block - should never panic
    if data.len() >= BLOCK_SIZE {
        if let Ok(header) = Header::decode(&data[..BLOCK_SIZE]) {
            let _ = header.path();
            let _ = header.to_bytes();
        }
    }

    // Scan the whole stream under both zero-block policies
    for policy in [ZeroBlockPolicy::Skip, ZeroBlockPolicy::Terminate] {
        let reader = ArchiveReader::new(Cursor::new(data)).with_zero_blocks(policy);
        let _ = reader.list_entries();
    }

    // Extract into a scratch directory - should never panic or escape it
    let dest = match TempDir::new() {
        Ok(d) => d,
        Err(_) => return,
    };
    let config = Config::new().with_reject_zero_fields(false);
    let _ = Extractor::new(dest.path())
        .with_config(config)
        .extract_from(ArchiveReader::new(Cursor::new(data)));
});
