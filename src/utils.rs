use crate::reference::Ref;

/// [Szudzik pairing function][szudzik-pairing].
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing2(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Pairing function for three `u64` values.
pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    pairing2(pairing2(a, b), c)
}

/// Hash used for unique-table buckets and computed-table slots.
pub trait HashKey {
    fn key_hash(&self) -> u64;
}

impl HashKey for (Ref, Ref) {
    fn key_hash(&self) -> u64 {
        pairing2(self.0.raw() as u64, self.1.raw() as u64)
    }
}

impl HashKey for (Ref, Ref, Ref) {
    fn key_hash(&self) -> u64 {
        pairing3(self.0.raw() as u64, self.1.raw() as u64, self.2.raw() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pairing2() {
        // a\b  0  1  2  3  4
        // ------------------
        // 0    0  1  4  9 16
        // 1    2  3  5 10 17
        // 2    6  7  8 11 18
        assert_eq!(pairing2(0, 0), 0);
        assert_eq!(pairing2(0, 1), 1);
        assert_eq!(pairing2(1, 0), 2);
        assert_eq!(pairing2(1, 1), 3);
        assert_eq!(pairing2(2, 1), 7);
        assert_eq!(pairing2(1, 2), 5);
    }

    #[test]
    fn test_pairing3_order_sensitive() {
        assert_ne!(pairing3(1, 2, 3), pairing3(3, 2, 1));
        assert_ne!(pairing3(1, 2, 3), pairing3(2, 1, 3));
    }
}
