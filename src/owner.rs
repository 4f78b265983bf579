//! Owner and group name resolution
//!
//! Headers carry display names next to the numeric ids. Resolution never
//! fails: an id without a name resolves to an empty string.

use nix::unistd::{Gid, Group, Uid, User};

/// Maps numeric owner/group ids to display names
pub trait NameLookup {
    /// Name of the user with `uid`, or an empty string
    fn user_name(&self, uid: u32) -> String;

    /// Name of the group with `gid`, or an empty string
    fn group_name(&self, gid: u32) -> String;
}

/// Resolves names through the system user and group databases
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLookup;

impl NameLookup for SystemLookup {
    fn user_name(&self, uid: u32) -> String {
        match User::from_uid(Uid::from_raw(uid)) {
            Ok(Some(user)) => user.name,
            _ => String::new(),
        }
    }

    fn group_name(&self, gid: u32) -> String {
        match Group::from_gid(Gid::from_raw(gid)) {
            Ok(Some(group)) => group.name,
            _ => String::new(),
        }
    }
}

/// Resolves every id to an empty name
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLookup;

impl NameLookup for NoLookup {
    fn user_name(&self, _uid: u32) -> String {
        String::new()
    }

    fn group_name(&self, _gid: u32) -> String {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_lookup_is_empty() {
        assert_eq!(NoLookup.user_name(0), "");
        assert_eq!(NoLookup.group_name(0), "");
    }

    #[test]
    fn test_system_lookup_unknown_id() {
        // Far outside any allocated range
        assert_eq!(SystemLookup.user_name(u32::MAX - 7), "");
        assert_eq!(SystemLookup.group_name(u32::MAX - 7), "");
    }
}
