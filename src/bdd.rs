use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt::Debug;

use log::debug;

use crate::cache::OpCache;
use crate::node::Node;
use crate::reference::Ref;
use crate::storage::Store;

/// Shared ROBDD manager.
///
/// All boolean functions live in one hash-consed store, so every function has
/// exactly one canonical representation and equality of [`Ref`] handles is
/// equality of functions. Complement edges make negation free.
///
/// Variables are 1-indexed; index 0 marks the terminal node. Variables are
/// compared by index, which doubles as the level in the (fixed) ordering.
///
/// The manager is used through `&self`: the mutable tables sit behind
/// `RefCell`, so a single `Rc<Bdd>` can be shared by every object built on
/// top of it. It is strictly single-threaded.
pub struct Bdd {
    store: RefCell<Store>,
    ite_cache: RefCell<OpCache<(Ref, Ref, Ref)>>,
    exists_cache: RefCell<OpCache<(Ref, Ref)>>,
    forall_cache: RefCell<OpCache<(Ref, Ref)>>,
    relprod_cache: RefCell<OpCache<(Ref, Ref, Ref)>>,
}

const ONE: Ref = Ref::positive(1);
const ZERO: Ref = Ref::negative(1);

impl Bdd {
    pub fn new() -> Self {
        Self::with_cache_bits(16)
    }

    pub fn with_cache_bits(cache_bits: usize) -> Self {
        Self {
            store: RefCell::new(Store::new()),
            ite_cache: RefCell::new(OpCache::new(cache_bits)),
            exists_cache: RefCell::new(OpCache::new(cache_bits)),
            forall_cache: RefCell::new(OpCache::new(cache_bits)),
            relprod_cache: RefCell::new(OpCache::new(cache_bits)),
        }
    }

    /// The constant true function.
    pub fn one(&self) -> Ref {
        ONE
    }

    /// The constant false function.
    pub fn zero(&self) -> Ref {
        ZERO
    }

    pub fn constant(&self, value: bool) -> Ref {
        if value {
            ONE
        } else {
            ZERO
        }
    }

    /// Number of allocated nodes (including reserved slots).
    pub fn num_nodes(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_zero(&self, node: Ref) -> bool {
        node == ZERO
    }

    pub fn is_one(&self, node: Ref) -> bool {
        node == ONE
    }

    pub fn is_terminal(&self, node: Ref) -> bool {
        node.index() == 1
    }

    /// Splitting variable of the referenced node (0 for the terminal).
    pub fn variable(&self, index: u32) -> u32 {
        self.store.borrow().var(index)
    }

    pub(crate) fn low(&self, index: u32) -> Ref {
        self.store.borrow().low(index)
    }

    pub(crate) fn high(&self, index: u32) -> Ref {
        self.store.borrow().high(index)
    }

    /// Low child with the node's complement flag pushed down.
    pub(crate) fn low_node(&self, node: Ref) -> Ref {
        let low = self.low(node.index());
        if node.is_negated() {
            -low
        } else {
            low
        }
    }

    /// High child with the node's complement flag pushed down.
    pub(crate) fn high_node(&self, node: Ref) -> Ref {
        let high = self.high(node.index());
        if node.is_negated() {
            -high
        } else {
            high
        }
    }

    /// Find or create the node `(v, low, high)`, restoring canonicity.
    fn mk_node(&self, v: u32, low: Ref, high: Ref) -> Ref {
        assert_ne!(v, 0, "Variable index must not be zero");

        // Canonical form: the high edge is never complemented.
        if high.is_negated() {
            return -self.mk_node(v, -low, -high);
        }
        if low == high {
            return low;
        }
        Ref::positive(self.store.borrow_mut().put(Node { var: v, low, high }))
    }

    /// The function of a single variable (1-indexed).
    pub fn mk_var(&self, v: u32) -> Ref {
        self.mk_node(v, ZERO, ONE)
    }

    /// Both cofactors of `node` with respect to variable `v`, which must not
    /// be below the node's splitting variable.
    pub(crate) fn top_cofactors(&self, node: Ref, v: u32) -> (Ref, Ref) {
        debug_assert_ne!(v, 0, "Variable index must not be zero");

        if self.is_terminal(node) || v < self.variable(node.index()) {
            return (node, node);
        }
        debug_assert_eq!(v, self.variable(node.index()));
        (self.low_node(node), self.high_node(node))
    }

    /// Apply the if-then-else operation:
    ///
    /// ```text
    /// ITE(f, g, h) = (f ∧ g) ∨ (¬f ∧ h)
    /// ```
    ///
    /// All binary combinators are instances of this single operation, which
    /// keeps the computed table shared between them.
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> Ref {
        // ite(1,G,H) => G, ite(0,G,H) => H
        if self.is_one(f) {
            return g;
        }
        if self.is_zero(f) {
            return h;
        }

        let (mut f, mut g, mut h) = (f, g, h);

        // Replace G/H by constants where they repeat F.
        if g == f {
            g = ONE;
        } else if g == -f {
            g = ZERO;
        }
        if h == f {
            h = ZERO;
        } else if h == -f {
            h = ONE;
        }

        // ite(F,G,G) => G, ite(F,1,0) => F, ite(F,0,1) => ~F
        if g == h {
            return g;
        }
        if self.is_one(g) && self.is_zero(h) {
            return f;
        }
        if self.is_zero(g) && self.is_one(h) {
            return -f;
        }

        // Normalize: ite(~F,G,H) => ite(F,H,G)
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }

        // Normalize: ite(F,~G,H) => ~ite(F,G,~H)
        let mut negate = false;
        if g.is_negated() {
            negate = true;
            g = -g;
            h = -h;
        }

        if let Some(res) = self.ite_cache.borrow().get((f, g, h)) {
            return if negate { -res } else { res };
        }

        // Top variable among the non-terminal arguments.
        let mut m = self.variable(f.index());
        if !self.is_terminal(g) {
            m = m.min(self.variable(g.index()));
        }
        if !self.is_terminal(h) {
            m = m.min(self.variable(h.index()));
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let (h0, h1) = self.top_cofactors(h, m);

        let low = self.apply_ite(f0, g0, h0);
        let high = self.apply_ite(f1, g1, h1);
        let res = self.mk_node(m, low, high);

        self.ite_cache.borrow_mut().insert((f, g, h), res);
        if negate {
            -res
        } else {
            res
        }
    }

    pub fn apply_not(&self, f: Ref) -> Ref {
        -f
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, ZERO)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, ONE, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> Ref {
        self.apply_ite(u, v, ONE)
    }

    /// Product of positive literals over the given variable indices.
    pub fn cube(&self, vars: impl IntoIterator<Item = u32>) -> Ref {
        let mut vars: Vec<u32> = vars.into_iter().collect();
        vars.sort_unstable_by(|a, b| b.cmp(a));
        vars.dedup();

        let mut res = ONE;
        for v in vars {
            res = self.mk_node(v, ZERO, res);
        }
        res
    }

    /// Product of signed literals: positive `v` for the variable, `-v` for
    /// its negation.
    pub fn mk_cube(&self, literals: impl IntoIterator<Item = i32>) -> Ref {
        let mut literals: Vec<i32> = literals.into_iter().collect();
        literals.sort_unstable_by_key(|lit| std::cmp::Reverse(lit.unsigned_abs()));

        let mut res = ONE;
        for lit in literals {
            let v = lit.unsigned_abs();
            res = if lit > 0 {
                self.mk_node(v, ZERO, res)
            } else {
                self.mk_node(v, res, ZERO)
            };
        }
        res
    }

    /// Existential abstraction `∃X. f` over the variables of a positive cube.
    pub fn exists(&self, f: Ref, cube: Ref) -> Ref {
        debug_assert!(!self.is_zero(cube), "Quantifier cube must not be zero");

        if self.is_terminal(f) || self.is_one(cube) {
            return f;
        }

        let fv = self.variable(f.index());
        // Skip quantified variables above the top of f: they are don't-cares.
        let mut c = cube;
        while !self.is_one(c) && self.variable(c.index()) < fv {
            c = self.high(c.index());
        }
        if self.is_one(c) {
            return f;
        }

        if let Some(res) = self.exists_cache.borrow().get((f, c)) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, fv);
        let res = if self.variable(c.index()) == fv {
            let rest = self.high(c.index());
            let r0 = self.exists(f0, rest);
            if self.is_one(r0) {
                // Disjunction is already saturated.
                r0
            } else {
                let r1 = self.exists(f1, rest);
                self.apply_or(r0, r1)
            }
        } else {
            let r0 = self.exists(f0, c);
            let r1 = self.exists(f1, c);
            self.mk_node(fv, r0, r1)
        };

        self.exists_cache.borrow_mut().insert((f, c), res);
        res
    }

    /// Universal abstraction `∀X. f` over the variables of a positive cube.
    pub fn forall(&self, f: Ref, cube: Ref) -> Ref {
        debug_assert!(!self.is_zero(cube), "Quantifier cube must not be zero");

        if self.is_terminal(f) || self.is_one(cube) {
            return f;
        }

        let fv = self.variable(f.index());
        let mut c = cube;
        while !self.is_one(c) && self.variable(c.index()) < fv {
            c = self.high(c.index());
        }
        if self.is_one(c) {
            return f;
        }

        if let Some(res) = self.forall_cache.borrow().get((f, c)) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, fv);
        let res = if self.variable(c.index()) == fv {
            let rest = self.high(c.index());
            let r0 = self.forall(f0, rest);
            if self.is_zero(r0) {
                r0
            } else {
                let r1 = self.forall(f1, rest);
                self.apply_and(r0, r1)
            }
        } else {
            let r0 = self.forall(f0, c);
            let r1 = self.forall(f1, c);
            self.mk_node(fv, r0, r1)
        };

        self.forall_cache.borrow_mut().insert((f, c), res);
        res
    }

    /// Relational product `∃X. (f ∧ g)` computed in a single pass.
    ///
    /// The workhorse of image computation: conjoining a relation with a state
    /// set and abstracting the matched variables without materialising the
    /// intermediate conjunction.
    pub fn and_exists(&self, f: Ref, g: Ref, cube: Ref) -> Ref {
        debug_assert!(!self.is_zero(cube), "Quantifier cube must not be zero");

        if self.is_zero(f) || self.is_zero(g) || f == -g {
            return ZERO;
        }
        if self.is_one(f) {
            return self.exists(g, cube);
        }
        if self.is_one(g) || f == g {
            return self.exists(f, cube);
        }

        let m = self
            .variable(f.index())
            .min(self.variable(g.index()));
        let mut c = cube;
        while !self.is_one(c) && self.variable(c.index()) < m {
            c = self.high(c.index());
        }
        if self.is_one(c) {
            return self.apply_and(f, g);
        }

        if let Some(res) = self.relprod_cache.borrow().get((f, g, c)) {
            return res;
        }

        let (f0, f1) = self.top_cofactors(f, m);
        let (g0, g1) = self.top_cofactors(g, m);
        let res = if self.variable(c.index()) == m {
            let rest = self.high(c.index());
            let r0 = self.and_exists(f0, g0, rest);
            if self.is_one(r0) {
                r0
            } else {
                let r1 = self.and_exists(f1, g1, rest);
                self.apply_or(r0, r1)
            }
        } else {
            let r0 = self.and_exists(f0, g0, c);
            let r1 = self.and_exists(f1, g1, c);
            self.mk_node(m, r0, r1)
        };

        self.relprod_cache.borrow_mut().insert((f, g, c), res);
        res
    }

    /// Indices of all nodes reachable from the given roots, sorted.
    pub(crate) fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut stack: Vec<u32> = roots.into_iter().map(|r| r.index()).collect();
        while let Some(index) = stack.pop() {
            if !seen.insert(index) {
                continue;
            }
            if index != 1 {
                stack.push(self.low(index).index());
                stack.push(self.high(index).index());
            }
        }
        let mut seen: Vec<u32> = seen.into_iter().collect();
        seen.sort_unstable();
        debug!("descendants: {} nodes", seen.len());
        seen
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new()
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bdd")
            .field("num_nodes", &self.num_nodes())
            .finish()
    }
}
