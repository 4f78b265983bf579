//! Splitting of long paths across the header's prefix and name fields
//!
//! The prefix keeps its trailing `/`, so `prefix + name` is the original
//! path byte for byte.

use crate::archive::format::{truncate_str, NAME_LEN, NAME_MAX, PREFIX_LEN, SPLIT_THRESHOLD};

/// A path laid out across the header's `prefix` and `name` fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitPath {
    pub prefix: String,
    pub name: String,
}

impl SplitPath {
    /// Rejoin the two fields into the archived path
    pub fn join(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }

    /// True if the split lost part of the original path
    pub fn is_truncated(&self, original: &str) -> bool {
        self.join() != original
    }
}

/// Lay a path out over the name/prefix fields.
///
/// Paths shorter than [`SPLIT_THRESHOLD`] go into `name` untouched. Longer
/// paths move leading components into `prefix`, one at a time, until the
/// remainder fits in `name`. If no separator gives a layout where both parts
/// fit, the path is cut into `name` alone.
pub fn split(path: &str) -> SplitPath {
    if path.len() < SPLIT_THRESHOLD {
        return SplitPath {
            prefix: String::new(),
            name: path.to_string(),
        };
    }

    // A trailing separator (directories) is part of the name, never a split point
    let body = path.strip_suffix('/').unwrap_or(path);

    for (idx, _) in body.match_indices('/') {
        let (prefix, name) = path.split_at(idx + 1);
        if prefix.len() > PREFIX_LEN {
            break;
        }
        if name.len() <= NAME_MAX {
            return SplitPath {
                prefix: prefix.to_string(),
                name: name.to_string(),
            };
        }
    }

    SplitPath {
        prefix: String::new(),
        name: truncate_str(path, NAME_LEN).to_string(),
    }
}
