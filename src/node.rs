use crate::reference::Ref;
use crate::utils::{pairing3, HashKey};

/// An internal decision node: a variable split with two child functions.
///
/// Canonical form invariant maintained by the manager: `high` is never a
/// complement edge, and `low != high`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub(crate) struct Node {
    pub var: u32,
    pub low: Ref,
    pub high: Ref,
}

impl HashKey for Node {
    fn key_hash(&self) -> u64 {
        pairing3(self.var as u64, self.low.raw() as u64, self.high.raw() as u64)
    }
}
