use std::cell::RefCell;
use std::rc::Rc;

use log::debug;

use crate::bdd::Bdd;
use crate::error::Error;
use crate::predicate::{Form, Predicate};
use crate::reference::Ref;
use crate::space::{var_u, var_v, StateSpace};
use crate::state::State;

/// A binary relation on states, carried in both reading directions at once.
///
/// `t_u_v` relates a present-copy source to a next-copy target; `t_v_u` is
/// the same relation with the copies swapped. Keeping the mirror around means
/// the pre-image of a predicate is a single relational product against
/// whichever direction matches the predicate's active form, with no renaming.
///
/// The relation also hosts the CTL evaluators: one-step operators, the eight
/// fixpoint operators, and their counterparts under generalized Büchi
/// fairness. The set of fair states is computed lazily and cached until the
/// fairness list changes.
#[derive(Debug, Clone)]
pub struct Transition {
    space: Rc<StateSpace>,
    t_u_v: Ref,
    t_v_u: Ref,
    fairness: Vec<Predicate>,
    fair_cache: RefCell<Option<Predicate>>,
}

impl Transition {
    fn from_parts(space: Rc<StateSpace>, t_u_v: Ref, t_v_u: Ref) -> Self {
        Self {
            space,
            t_u_v,
            t_v_u,
            fairness: Vec::new(),
            fair_cache: RefCell::new(None),
        }
    }

    /// The full or empty relation.
    pub fn constant(space: &Rc<StateSpace>, value: bool) -> Self {
        let repr = space.bdd().constant(value);
        Self::from_parts(space.clone(), repr, repr)
    }

    /// The relation testing a single bit of either endpoint.
    ///
    /// With `of_target = false` the literal reads bit `bit` of the source
    /// state; with `of_target = true` it reads the target state. The mirror
    /// component swaps the roles.
    pub fn literal(space: &Rc<StateSpace>, bit: usize, of_target: bool) -> Self {
        assert!(bit < space.state_bits(), "State bit out of range");
        let bdd = space.bdd();
        let u = bdd.mk_var(var_u(bit));
        let v = bdd.mk_var(var_v(bit));
        let (t_u_v, t_v_u) = if of_target { (v, u) } else { (u, v) };
        Self::from_parts(space.clone(), t_u_v, t_v_u)
    }

    pub fn space(&self) -> &Rc<StateSpace> {
        &self.space
    }

    fn bdd(&self) -> &Bdd {
        self.space.bdd()
    }

    /// Source-to-target component (present-copy source).
    pub fn forward_bdd(&self) -> Ref {
        self.t_u_v
    }

    /// Target-to-source component (the structural mirror).
    pub fn backward_bdd(&self) -> Ref {
        self.t_v_u
    }

    fn check_trans(&self, other: &Transition) -> Result<(), Error> {
        if self.space == other.space {
            Ok(())
        } else {
            Err(Error::DomainMismatch {
                left: self.space.state_bits(),
                right: other.space.state_bits(),
            })
        }
    }

    fn check_pred(&self, pred: &Predicate) -> Result<(), Error> {
        if self.space == *pred.space() {
            Ok(())
        } else {
            Err(Error::DomainMismatch {
                left: self.space.state_bits(),
                right: pred.space().state_bits(),
            })
        }
    }

    fn combine(&self, other: &Transition, op: fn(&Bdd, Ref, Ref) -> Ref) -> Result<Self, Error> {
        self.check_trans(other)?;
        let bdd = self.bdd();
        Ok(Self::from_parts(
            self.space.clone(),
            op(bdd, self.t_u_v, other.t_u_v),
            op(bdd, self.t_v_u, other.t_v_u),
        ))
    }

    pub fn and(&self, other: &Transition) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_and)
    }

    pub fn or(&self, other: &Transition) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_or)
    }

    pub fn xor(&self, other: &Transition) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_xor)
    }

    pub fn not(&self) -> Self {
        Self::from_parts(self.space.clone(), -self.t_u_v, -self.t_v_u)
    }

    /// Attach a fairness predicate; fair paths must visit it infinitely
    /// often. Invalidates the cached fair-state set.
    pub fn add_fairness(&mut self, pred: Predicate) -> Result<(), Error> {
        self.check_pred(&pred)?;
        self.fair_cache.borrow_mut().take();
        self.fairness.push(pred);
        Ok(())
    }

    pub fn fairness(&self) -> &[Predicate] {
        &self.fairness
    }

    pub fn has_fairness(&self) -> bool {
        !self.fairness.is_empty()
    }

    /// One-step successors of a concrete state, as a next-copy predicate.
    pub fn next(&self, state: &State) -> Result<Predicate, Error> {
        if self.space != *state.space() {
            return Err(Error::DomainMismatch {
                left: self.space.state_bits(),
                right: state.space().state_bits(),
            });
        }
        let image = self
            .bdd()
            .and_exists(self.t_u_v, state.bdd_u(), self.space.cube_u());
        Ok(Predicate::from_v(self.space.clone(), image))
    }

    /// EX: states with some successor in `pred`.
    ///
    /// The relational product runs against whichever direction of the
    /// relation matches the operand's active form, so the result lands in
    /// the opposite form and no rename is ever needed.
    pub fn ex(&self, pred: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(pred)?;
        Ok(self.ex_image(pred))
    }

    fn ex_image(&self, pred: &Predicate) -> Predicate {
        let bdd = self.bdd();
        match pred.form() {
            Form::U(p) => {
                let pre = bdd.and_exists(self.t_v_u, p, self.space.cube_u());
                Predicate::from_v(self.space.clone(), pre)
            }
            Form::V(p) => {
                let pre = bdd.and_exists(self.t_u_v, p, self.space.cube_v());
                Predicate::from_u(self.space.clone(), pre)
            }
        }
    }

    /// AX: states all of whose successors are in `pred`. Computed directly
    /// as `∀target. T → pred` instead of negating an EX pass.
    pub fn ax(&self, pred: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(pred)?;
        Ok(self.ax_image(pred))
    }

    fn ax_image(&self, pred: &Predicate) -> Predicate {
        let bdd = self.bdd();
        match pred.form() {
            Form::U(p) => {
                let all = bdd.forall(bdd.apply_imply(self.t_v_u, p), self.space.cube_u());
                Predicate::from_v(self.space.clone(), all)
            }
            Form::V(p) => {
                let all = bdd.forall(bdd.apply_imply(self.t_u_v, p), self.space.cube_v());
                Predicate::from_u(self.space.clone(), all)
            }
        }
    }

    /// EF: least fixpoint of `X ↦ f ∨ EX X`.
    pub fn ef(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let mut x = Predicate::constant(&self.space, false);
        let mut rounds = 0usize;
        loop {
            let next = f.or(&self.ex_image(&x))?;
            rounds += 1;
            if next == x {
                debug!("EF converged after {} rounds", rounds);
                return Ok(next);
            }
            x = next;
        }
    }

    /// EG: greatest fixpoint of `X ↦ f ∧ EX X`.
    pub fn eg(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let mut x = Predicate::constant(&self.space, true);
        loop {
            let next = f.and(&self.ex_image(&x))?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// E[f U g]: least fixpoint of `X ↦ g ∨ (f ∧ EX X)`.
    pub fn eu(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let mut x = Predicate::constant(&self.space, false);
        loop {
            let next = g.or(&f.and(&self.ex_image(&x))?)?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// E[f R g]: greatest fixpoint of `X ↦ g ∧ (f ∨ EX X)`.
    pub fn er(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let mut x = Predicate::constant(&self.space, true);
        loop {
            let next = g.and(&f.or(&self.ex_image(&x))?)?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// AF: least fixpoint of `X ↦ f ∨ AX X`.
    pub fn af(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let mut x = Predicate::constant(&self.space, false);
        loop {
            let next = f.or(&self.ax_image(&x))?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// AG: greatest fixpoint of `X ↦ f ∧ AX X`.
    pub fn ag(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let mut x = Predicate::constant(&self.space, true);
        loop {
            let next = f.and(&self.ax_image(&x))?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// A[f U g]: least fixpoint of `X ↦ g ∨ (f ∧ AX X)`.
    pub fn au(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let mut x = Predicate::constant(&self.space, false);
        loop {
            let next = g.or(&f.and(&self.ax_image(&x))?)?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// A[f R g]: greatest fixpoint of `X ↦ g ∧ (f ∨ AX X)`.
    pub fn ar(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let mut x = Predicate::constant(&self.space, true);
        loop {
            let next = g.and(&f.or(&self.ax_image(&x))?)?;
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// The set of states from which some fair path starts: `EG_fair ⊤`.
    ///
    /// Cached per fairness configuration.
    pub fn fair_states(&self) -> Result<Predicate, Error> {
        if self.fairness.is_empty() {
            return Err(Error::EmptyFairness);
        }
        if let Some(fair) = self.fair_cache.borrow().as_ref() {
            return Ok(fair.clone());
        }
        let fair = self.fair_eg_inner(&Predicate::constant(&self.space, true))?;
        debug!("fair-state set: {:?} states", fair.count_states());
        *self.fair_cache.borrow_mut() = Some(fair.clone());
        Ok(fair)
    }

    /// EG under fairness (Emerson-Lei): greatest fixpoint of
    /// `X ↦ f ∧ ⋀ⱼ EX E[f U (Fⱼ ∧ X)]`.
    pub fn fair_eg(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        if self.fairness.is_empty() {
            return Err(Error::EmptyFairness);
        }
        self.fair_eg_inner(f)
    }

    fn fair_eg_inner(&self, f: &Predicate) -> Result<Predicate, Error> {
        let mut x = Predicate::constant(&self.space, true);
        loop {
            let mut next = f.clone();
            for constraint in &self.fairness {
                let target = constraint.and(&x)?;
                let reach = self.eu(f, &target)?;
                next = next.and(&self.ex_image(&reach))?;
            }
            if next == x {
                return Ok(next);
            }
            x = next;
        }
    }

    /// EX along fair paths: `EX (fair ∧ f)`.
    pub fn fair_ex(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let fair = self.fair_states()?;
        self.ex(&fair.and(f)?)
    }

    /// EF along fair paths: `EF (fair ∧ f)`.
    pub fn fair_ef(&self, f: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        let fair = self.fair_states()?;
        self.ef(&fair.and(f)?)
    }

    /// EU along fair paths: `E[f U (fair ∧ g)]`.
    pub fn fair_eu(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let fair = self.fair_states()?;
        self.eu(f, &fair.and(g)?)
    }

    /// ER along fair paths: `E[(fair ∧ f) R g]`.
    pub fn fair_er(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        self.check_pred(f)?;
        self.check_pred(g)?;
        let fair = self.fair_states()?;
        self.er(&fair.and(f)?, g)
    }

    /// AX under fairness, as the dual `¬EX_fair ¬f`.
    pub fn fair_ax(&self, f: &Predicate) -> Result<Predicate, Error> {
        Ok(self.fair_ex(&f.not())?.not())
    }

    /// AF under fairness, as the dual `¬EG_fair ¬f`.
    pub fn fair_af(&self, f: &Predicate) -> Result<Predicate, Error> {
        Ok(self.fair_eg(&f.not())?.not())
    }

    /// AG under fairness, as the dual `¬EF_fair ¬f`.
    pub fn fair_ag(&self, f: &Predicate) -> Result<Predicate, Error> {
        Ok(self.fair_ef(&f.not())?.not())
    }

    /// A[f U g] under fairness, as the dual `¬E[¬f R ¬g]_fair`.
    pub fn fair_au(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        Ok(self.fair_er(&f.not(), &g.not())?.not())
    }

    /// A[f R g] under fairness, as the dual `¬E[¬f U ¬g]_fair`.
    pub fn fair_ar(&self, f: &Predicate, g: &Predicate) -> Result<Predicate, Error> {
        Ok(self.fair_eu(&f.not(), &g.not())?.not())
    }
}

impl PartialEq for Transition {
    fn eq(&self, other: &Self) -> bool {
        self.space == other.space && self.t_u_v == other.t_u_v && self.t_v_u == other.t_v_u
    }
}

impl Eq for Transition {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::Bdd;

    fn space(bits: usize) -> Rc<StateSpace> {
        Rc::new(StateSpace::new(Rc::new(Bdd::default()), bits))
    }

    /// T(u, v) = u₀ ⊕ v₀, the mod-2 counter.
    fn toggle(space: &Rc<StateSpace>) -> Transition {
        Transition::literal(space, 0, false)
            .xor(&Transition::literal(space, 0, true))
            .unwrap()
    }

    /// Self-loops everywhere: T(u, v) = ∧ᵢ (uᵢ ⇔ vᵢ).
    fn identity(space: &Rc<StateSpace>) -> Transition {
        let mut t = Transition::constant(space, true);
        for i in 0..space.state_bits() {
            let stay = Transition::literal(space, i, false)
                .xor(&Transition::literal(space, i, true))
                .unwrap()
                .not();
            t = t.and(&stay).unwrap();
        }
        t
    }

    /// Nondeterministic one-bit system: stay or toggle.
    fn chaos(space: &Rc<StateSpace>) -> Transition {
        toggle(space).or(&identity(space)).unwrap()
    }

    #[test]
    fn test_mirror_components() {
        let space = space(1);
        let from = Transition::literal(&space, 0, false);
        let to = Transition::literal(&space, 0, true);
        let bdd = space.bdd();

        assert_eq!(from.forward_bdd(), bdd.mk_var(1));
        assert_eq!(from.backward_bdd(), bdd.mk_var(2));
        assert_eq!(to.forward_bdd(), bdd.mk_var(2));
        assert_eq!(to.backward_bdd(), bdd.mk_var(1));
    }

    #[test]
    fn test_mod2_counter() {
        let space = space(1);
        let t = toggle(&space);
        let p = Predicate::state_bit(&space, 0).not();

        // EX p = ¬p, EX EX p = p.
        let ex_p = t.ex(&p).unwrap();
        assert_eq!(ex_p, p.not());
        assert_eq!(t.ex(&ex_p).unwrap(), p);

        // AG(p ∨ EX p) = ⊤.
        let inv = p.or(&t.ex(&p).unwrap()).unwrap();
        assert!(t.ag(&inv).unwrap().is_true());
    }

    #[test]
    fn test_ex_alternates_form() {
        let space = space(1);
        let t = toggle(&space);
        let p = Predicate::state_bit(&space, 0);

        let once = t.ex(&p).unwrap();
        assert!(matches!(once.form(), Form::V(_)));
        let twice = t.ex(&once).unwrap();
        assert!(matches!(twice.form(), Form::U(_)));
        assert_eq!(twice, p);
    }

    #[test]
    fn test_self_loop_and_sink() {
        // T = (¬u₀ ∧ ¬v₀) ∨ (u₀ ∧ v₀): stay where you are.
        let space = space(1);
        let t = identity(&space);
        let zero = Predicate::state_bit(&space, 0).not();
        let one = Predicate::state_bit(&space, 0);

        // EF(u₀) from ¬u₀ is false.
        let ef_one = t.ef(&one).unwrap();
        assert!(!zero.implies(&ef_one).unwrap());
        // EG(¬u₀) from ¬u₀ is true.
        let eg_zero = t.eg(&zero).unwrap();
        assert!(zero.implies(&eg_zero).unwrap());
    }

    #[test]
    fn test_alternator_liveness() {
        let space = space(1);
        let t = toggle(&space);
        let one = Predicate::state_bit(&space, 0);

        // AG AF u₀ holds everywhere.
        let af_one = t.af(&one).unwrap();
        assert!(t.ag(&af_one).unwrap().is_true());
    }

    #[test]
    fn test_ctl_dualities() {
        let space = space(2);
        let t = chaos(&space)
            .and(&Transition::literal(&space, 1, false).xor(&Transition::literal(&space, 1, true)).unwrap())
            .unwrap();
        let f = Predicate::state_bit(&space, 0);
        let g = Predicate::state_bit(&space, 1);

        assert_eq!(t.ax(&f).unwrap(), t.ex(&f.not()).unwrap().not());
        assert_eq!(t.af(&f).unwrap(), t.eg(&f.not()).unwrap().not());
        assert_eq!(t.ag(&f).unwrap(), t.ef(&f.not()).unwrap().not());
        assert_eq!(
            t.au(&f, &g).unwrap(),
            t.er(&f.not(), &g.not()).unwrap().not()
        );
        assert_eq!(
            t.ar(&f, &g).unwrap(),
            t.eu(&f.not(), &g.not()).unwrap().not()
        );
    }

    #[test]
    fn test_fixpoint_reductions() {
        let space = space(2);
        let t = chaos(&space);
        let f = Predicate::state_bit(&space, 1);
        let top = Predicate::constant(&space, true);
        let bot = Predicate::constant(&space, false);

        assert_eq!(t.ef(&f).unwrap(), t.eu(&top, &f).unwrap());
        assert_eq!(t.eg(&f).unwrap(), t.er(&bot, &f).unwrap());
    }

    #[test]
    fn test_ex_distributes_over_or() {
        let space = space(2);
        let t = chaos(&space);
        let f = Predicate::state_bit(&space, 0);
        let g = Predicate::state_bit(&space, 1);

        let lhs = t.ex(&f.or(&g).unwrap()).unwrap();
        let rhs = t.ex(&f).unwrap().or(&t.ex(&g).unwrap()).unwrap();
        assert_eq!(lhs, rhs);

        let lhs = t.ax(&f.and(&g).unwrap()).unwrap();
        let rhs = t.ax(&f).unwrap().and(&t.ax(&g).unwrap()).unwrap();
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_monotonicity() {
        let space = space(2);
        let t = chaos(&space);
        let smaller = Predicate::state_bit(&space, 0)
            .and(&Predicate::state_bit(&space, 1))
            .unwrap();
        let larger = Predicate::state_bit(&space, 0);
        assert!(smaller.implies(&larger).unwrap());

        assert!(t.ef(&smaller).unwrap().implies(&t.ef(&larger).unwrap()).unwrap());
        assert!(t.eg(&smaller).unwrap().implies(&t.eg(&larger).unwrap()).unwrap());
        assert!(t.af(&smaller).unwrap().implies(&t.af(&larger).unwrap()).unwrap());
        assert!(t.ag(&smaller).unwrap().implies(&t.ag(&larger).unwrap()).unwrap());
    }

    #[test]
    fn test_deadlock_states() {
        // Transition with no outgoing edges at all.
        let space = space(1);
        let t = Transition::constant(&space, false);
        let p = Predicate::state_bit(&space, 0);
        let top = Predicate::constant(&space, true);

        // No successors: EX is empty, AX vacuously full.
        assert!(t.ex(&top).unwrap().is_false());
        assert!(t.ax(&Predicate::constant(&space, false)).unwrap().is_true());
        assert!(t.eg(&p).unwrap().is_false());
    }

    #[test]
    fn test_fairness_restores_liveness() {
        // Stay-where-you-are relation with fairness {u₀}: only states that
        // can visit u₀ infinitely often begin a fair path.
        let space = space(1);
        let mut t = identity(&space);
        let one = Predicate::state_bit(&space, 0);
        t.add_fairness(one.clone()).unwrap();

        let fair = t.fair_states().unwrap();
        assert!(one.implies(&fair).unwrap());
        assert!(!one.not().implies(&fair).unwrap());
        // From u₀ the fair EG ⊤ holds; from ¬u₀ it does not.
        assert_eq!(fair, one);
    }

    #[test]
    fn test_fair_duals() {
        let space = space(1);
        let mut t = chaos(&space);
        let one = Predicate::state_bit(&space, 0);
        t.add_fairness(one.clone()).unwrap();

        let f = one.clone();
        assert_eq!(t.fair_af(&f).unwrap(), t.fair_eg(&f.not()).unwrap().not());
        assert_eq!(t.fair_ag(&f).unwrap(), t.fair_ef(&f.not()).unwrap().not());
    }

    #[test]
    fn test_empty_fairness_is_an_error() {
        let space = space(1);
        let t = toggle(&space);
        let p = Predicate::state_bit(&space, 0);

        assert!(matches!(t.fair_states(), Err(Error::EmptyFairness)));
        assert!(matches!(t.fair_eg(&p), Err(Error::EmptyFairness)));
        assert!(matches!(t.fair_ex(&p), Err(Error::EmptyFairness)));
        assert!(matches!(t.fair_au(&p, &p), Err(Error::EmptyFairness)));
    }

    #[test]
    fn test_fair_cache_invalidation() {
        let space = space(1);
        let mut t = identity(&space);
        let one = Predicate::state_bit(&space, 0);

        t.add_fairness(one.clone()).unwrap();
        assert_eq!(t.fair_states().unwrap(), one);

        // Adding a disjoint constraint empties the fair set.
        t.add_fairness(one.not()).unwrap();
        assert!(t.fair_states().unwrap().is_false());
    }

    #[test]
    fn test_domain_mismatch() {
        let bdd = Rc::new(Bdd::default());
        let s1 = Rc::new(StateSpace::new(bdd.clone(), 1));
        let s2 = Rc::new(StateSpace::new(bdd.clone(), 2));

        let t = Transition::constant(&s1, true);
        let p = Predicate::state_bit(&s2, 0);
        assert!(matches!(t.ex(&p), Err(Error::DomainMismatch { .. })));
        assert!(matches!(
            t.and(&Transition::constant(&s2, true)),
            Err(Error::DomainMismatch { .. })
        ));

        let mut t = t;
        assert!(matches!(
            t.add_fairness(p),
            Err(Error::DomainMismatch { .. })
        ));
    }

    #[test]
    fn test_next_of_state() {
        let space = space(1);
        let t = toggle(&space);
        let zero_state = State::new(space.clone(), vec![false]).unwrap();
        let one = Predicate::state_bit(&space, 0);

        let succ = t.next(&zero_state).unwrap();
        assert!(matches!(succ.form(), Form::V(_)));
        assert_eq!(succ, one);
    }
}
