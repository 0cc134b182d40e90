//! Transaction isolation levels.

use std::fmt;

/// Isolation level of a transaction, ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IsolationLevel {
    /// No isolation guarantees.
    None,
    /// Reads may observe uncommitted writes of other transactions.
    ReadUncommitted,
    /// Reads observe only committed data.
    ReadCommitted,
    /// Each read observes a consistent snapshot.
    SnapshotRead,
    /// The whole transaction observes one snapshot.
    Snapshot,
    /// Snapshot plus conflict detection at commit.
    Serializable,
}

impl IsolationLevel {
    /// All levels, weakest first.
    pub const ALL: [Self; 6] = [
        Self::None,
        Self::ReadUncommitted,
        Self::ReadCommitted,
        Self::SnapshotRead,
        Self::Snapshot,
        Self::Serializable,
    ];

    /// Returns true if this level gives at least the guarantees of `requested`.
    #[must_use]
    pub fn is_compatible_with(self, requested: Self) -> bool {
        self >= requested
    }

    /// Picks the weakest supported level compatible with `requested`.
    #[must_use]
    pub fn compatible(requested: Self, supported: &[Self]) -> Option<Self> {
        supported
            .iter()
            .copied()
            .filter(|level| level.is_compatible_with(requested))
            .min()
    }

    /// Returns the level's name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::ReadUncommitted => "READ_UNCOMMITTED",
            Self::ReadCommitted => "READ_COMMITTED",
            Self::SnapshotRead => "SNAPSHOT_READ",
            Self::Snapshot => "SNAPSHOT",
            Self::Serializable => "SERIALIZABLE",
        }
    }
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
