use std::fmt::{self, Display};

pub type ShardId = u64;

/// One independently addressable database partition.
///
/// The location string is an opaque label owned by the routing layer
/// (a DSN, a host:port, a logical name); the coordinator only carries
/// it through to executor calls and failure reports.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ShardTarget {
    pub id: ShardId,
    pub location: String,
}

impl ShardTarget {
    pub fn new(id: ShardId, location: impl Into<String>) -> Self {
        Self {
            id,
            location: location.into(),
        }
    }
}

impl Display for ShardTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shard {} ({})", self.id, self.location)
    }
}
