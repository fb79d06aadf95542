use crate::package::Package;
use std::path::PathBuf;

/// Identifies one mounted location, for targeted unmounting.
///
/// Ids are unique for the lifetime of a [`Vfs`](crate::vfs::Vfs) and are
/// never reused, so a stale id after an unmount is an error rather than a
/// different mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountId(pub(crate) u64);

/// What a mount resolves lookups against.
#[derive(Debug)]
pub enum MountKind {
    /// A filesystem path prefix prepended to all lookups.
    Directory(PathBuf),
    /// A loaded package probed by entry name.
    Package(Package),
}

/// One node in the ordered mount chain.
#[derive(Debug)]
pub struct Mount {
    pub(crate) id: MountId,
    pub(crate) kind: MountKind,
}

impl Mount {
    /// The id handed out when this mount was created.
    pub fn id(&self) -> MountId {
        self.id
    }

    /// The location this mount resolves against.
    pub fn kind(&self) -> &MountKind {
        &self.kind
    }
}
