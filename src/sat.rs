use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;

impl Bdd {
    /// One satisfying assignment of `node` as signed literals, or `None` for
    /// the zero function.
    ///
    /// The walk always explores the high branch first, so the result is
    /// deterministic for a given manager state. Variables the function does
    /// not depend on are absent from the result.
    pub fn one_sat(&self, node: Ref) -> Option<Vec<i32>> {
        let mut literals = Vec::new();
        if self.walk_one_sat(node, &mut literals) {
            Some(literals)
        } else {
            None
        }
    }

    fn walk_one_sat(&self, node: Ref, literals: &mut Vec<i32>) -> bool {
        if self.is_zero(node) {
            return false;
        }
        if self.is_one(node) {
            return true;
        }

        let v = self.variable(node.index()) as i32;

        literals.push(v);
        if self.walk_one_sat(self.high_node(node), literals) {
            return true;
        }
        literals.pop();

        literals.push(-v);
        if self.walk_one_sat(self.low_node(node), literals) {
            return true;
        }
        literals.pop();

        false
    }

    /// Number of satisfying assignments over the variables `1..=num_vars`.
    pub fn sat_count(&self, node: Ref, num_vars: u32) -> BigUint {
        let max = BigUint::from(2u32).pow(num_vars);
        let mut cache = HashMap::new();
        self.count(node, &max, &mut cache)
    }

    fn count(&self, node: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if self.is_zero(node) {
            return BigUint::ZERO;
        }
        if self.is_one(node) {
            return max.clone();
        }
        if let Some(count) = cache.get(&node) {
            return count.clone();
        }

        let low = self.low(node.index());
        let high = self.high(node.index());
        let count: BigUint = (self.count(low, max, cache) + self.count(high, max, cache)) >> 1;
        let count = if node.is_negated() { max - count } else { count };

        cache.insert(node, count.clone());
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sat_terminals() {
        let bdd = Bdd::default();
        assert_eq!(bdd.one_sat(bdd.zero()), None);
        assert_eq!(bdd.one_sat(bdd.one()), Some(vec![]));
    }

    #[test]
    fn test_one_sat_satisfies() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);

        let f = bdd.apply_and(bdd.apply_xor(x, y), -z);
        let literals = bdd.one_sat(f).unwrap();

        // The extracted cube must imply f.
        let cube = bdd.mk_cube(literals);
        assert_eq!(bdd.apply_and(cube, f), cube);
    }

    #[test]
    fn test_one_sat_prefers_high() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        assert_eq!(bdd.one_sat(x), Some(vec![1]));
        assert_eq!(bdd.one_sat(-x), Some(vec![-1]));
    }

    #[test]
    fn test_sat_count_terminals() {
        let bdd = Bdd::default();
        assert_eq!(bdd.sat_count(bdd.zero(), 3), BigUint::ZERO);
        assert_eq!(bdd.sat_count(bdd.one(), 3), BigUint::from(8u32));
    }

    #[test]
    fn test_sat_count_formulas() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);

        assert_eq!(bdd.sat_count(x, 2), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(bdd.apply_and(x, y), 2), BigUint::from(1u32));
        assert_eq!(bdd.sat_count(bdd.apply_or(x, y), 2), BigUint::from(3u32));
        assert_eq!(bdd.sat_count(bdd.apply_xor(x, y), 2), BigUint::from(2u32));
        assert_eq!(bdd.sat_count(-bdd.apply_and(x, y), 4), BigUint::from(12u32));
    }
}
