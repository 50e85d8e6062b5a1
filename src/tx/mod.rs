//! Read transactions.
//!
//! Every engine operation opens exactly one read transaction and closes it
//! before returning, whether the operation succeeded or not.

use serde::{Deserialize, Serialize};

/// Opaque transaction identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl std::fmt::Display for TxId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "tx-{}", self.0)
    }
}

/// Transaction trait that all stores must implement.
pub trait Transaction: Send + Sync {
    fn id(&self) -> TxId;
}
