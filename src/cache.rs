use crate::reference::Ref;
use crate::utils::HashKey;

/// Direct-mapped computed table.
///
/// A fixed-size cache keyed by the operands of an apply-style operation.
/// Colliding entries simply overwrite each other; the table is a pure
/// memoisation layer and losing an entry only costs recomputation.
pub(crate) struct OpCache<K> {
    entries: Vec<Option<(K, Ref)>>,
    mask: u64,
}

impl<K: Copy + Eq + HashKey> OpCache<K> {
    /// Create a table with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Bits should be in the range 0..=31");
        let size = 1usize << bits;
        Self {
            entries: vec![None; size],
            mask: (size - 1) as u64,
        }
    }

    fn slot(&self, key: &K) -> usize {
        (key.key_hash() & self.mask) as usize
    }

    pub fn get(&self, key: K) -> Option<Ref> {
        match self.entries[self.slot(&key)] {
            Some((k, v)) if k == key => Some(v),
            _ => None,
        }
    }

    pub fn insert(&mut self, key: K, value: Ref) {
        let slot = self.slot(&key);
        self.entries[slot] = Some((key, value));
    }
}
