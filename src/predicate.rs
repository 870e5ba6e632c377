use std::rc::Rc;

use num_traits::ToPrimitive;

use crate::bdd::Bdd;
use crate::error::Error;
use crate::reference::Ref;
use crate::space::{var_u, StateSpace};
use crate::state::State;

/// Which variable copy the active representation of a [`Predicate`] uses.
#[derive(Debug, Copy, Clone)]
pub(crate) enum Form {
    U(Ref),
    V(Ref),
}

/// A set of states, represented as a boolean function over either the
/// present-copy ("u-form") or the next-copy ("v-form") of the state bits.
///
/// Keeping both forms first-class is what makes pre-image computation a pure
/// quantification step: applying [`Transition::ex`][crate::transition::Transition::ex]
/// alternates the active form instead of renaming variables. Renaming does
/// happen, but only on demand: when two operands of a combinator disagree on
/// their form, or when a caller asks for the canonical u-form via
/// [`get_bdd`][Predicate::get_bdd].
#[derive(Debug, Clone)]
pub struct Predicate {
    space: Rc<StateSpace>,
    form: Form,
}

impl Predicate {
    /// The full or empty state set.
    pub fn constant(space: &Rc<StateSpace>, value: bool) -> Self {
        let repr = space.bdd().constant(value);
        Self::from_u(space.clone(), repr)
    }

    /// The set of states whose bit `bit` is 1.
    pub fn state_bit(space: &Rc<StateSpace>, bit: usize) -> Self {
        assert!(bit < space.state_bits(), "State bit out of range");
        let repr = space.bdd().mk_var(var_u(bit));
        Self::from_u(space.clone(), repr)
    }

    pub(crate) fn from_u(space: Rc<StateSpace>, repr: Ref) -> Self {
        Self {
            space,
            form: Form::U(repr),
        }
    }

    pub(crate) fn from_v(space: Rc<StateSpace>, repr: Ref) -> Self {
        Self {
            space,
            form: Form::V(repr),
        }
    }

    pub fn space(&self) -> &Rc<StateSpace> {
        &self.space
    }

    pub(crate) fn form(&self) -> Form {
        self.form
    }

    fn bdd(&self) -> &Bdd {
        self.space.bdd()
    }

    /// The canonical u-form function for this set, renaming if the active
    /// representation is the v-form.
    ///
    /// The rename is one relational product with the copy-equality relation:
    /// `∃v. (p(v) ∧ (u = v))` reads the same set off the other copy.
    pub fn get_bdd(&self) -> Ref {
        match self.form {
            Form::U(repr) => repr,
            Form::V(repr) => {
                self.bdd()
                    .and_exists(repr, self.space.var_eq(), self.space.cube_v())
            }
        }
    }

    pub(crate) fn get_bdd_v(&self) -> Ref {
        match self.form {
            Form::V(repr) => repr,
            Form::U(repr) => {
                self.bdd()
                    .and_exists(repr, self.space.var_eq(), self.space.cube_u())
            }
        }
    }

    /// Re-express the set in the other variable copy.
    pub fn swap_form(&self) -> Self {
        match self.form {
            Form::U(_) => Self::from_v(self.space.clone(), self.get_bdd_v()),
            Form::V(_) => Self::from_u(self.space.clone(), self.get_bdd()),
        }
    }

    fn check_space(&self, other: &Predicate) -> Result<(), Error> {
        if self.space == other.space {
            Ok(())
        } else {
            Err(Error::DomainMismatch {
                left: self.space.state_bits(),
                right: other.space.state_bits(),
            })
        }
    }

    /// Combine two sets. When both operands are v-form the result stays
    /// v-form; any other pairing renames to u-form and produces u-form.
    fn combine(&self, other: &Predicate, op: fn(&Bdd, Ref, Ref) -> Ref) -> Result<Self, Error> {
        self.check_space(other)?;
        let bdd = self.bdd();
        Ok(match (self.form, other.form) {
            (Form::V(l), Form::V(r)) => Self::from_v(self.space.clone(), op(bdd, l, r)),
            _ => Self::from_u(self.space.clone(), op(bdd, self.get_bdd(), other.get_bdd())),
        })
    }

    pub fn and(&self, other: &Predicate) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_and)
    }

    pub fn or(&self, other: &Predicate) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_or)
    }

    pub fn xor(&self, other: &Predicate) -> Result<Self, Error> {
        self.combine(other, Bdd::apply_xor)
    }

    /// Complement. Preserves the active form.
    pub fn not(&self) -> Self {
        let space = self.space.clone();
        match self.form {
            Form::U(repr) => Self::from_u(space, -repr),
            Form::V(repr) => Self::from_v(space, -repr),
        }
    }

    /// Whether every state in this set is also in `other`.
    pub fn implies(&self, other: &Predicate) -> Result<bool, Error> {
        Ok(self.and(&other.not())?.is_false())
    }

    pub fn is_true(&self) -> bool {
        match self.form {
            Form::U(repr) | Form::V(repr) => self.bdd().is_one(repr),
        }
    }

    pub fn is_false(&self) -> bool {
        match self.form {
            Form::U(repr) | Form::V(repr) => self.bdd().is_zero(repr),
        }
    }

    /// Whether the set contains the given state.
    pub fn contains(&self, state: &State) -> Result<bool, Error> {
        if self.space.state_bits() != state.space().state_bits() {
            return Err(Error::DomainMismatch {
                left: self.space.state_bits(),
                right: state.space().state_bits(),
            });
        }
        let bdd = self.bdd();
        let overlap = match self.form {
            Form::U(repr) => bdd.apply_and(repr, state.bdd_u()),
            Form::V(repr) => bdd.apply_and(repr, state.bdd_v()),
        };
        Ok(!bdd.is_zero(overlap))
    }

    /// Number of states in the set, if it fits in a `u64`.
    pub fn count_states(&self) -> Option<u64> {
        let n = self.space.state_bits();
        // The u-form ignores all v-variables, so every state is counted once
        // per assignment of the free copy.
        let count = self.bdd().sat_count(self.get_bdd(), 2 * n as u32) >> n;
        count.to_u64()
    }
}

/// Set equality, insensitive to which form either side is in.
///
/// Same-form operands compare by function identity. Mixed forms hold the same
/// set iff the symmetric difference has no witness once the two copies are
/// identified: `(l ⊕ r) ∧ var_eq = ⊥`.
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        if self.space != other.space {
            return false;
        }
        let bdd = self.bdd();
        match (self.form, other.form) {
            (Form::U(l), Form::U(r)) | (Form::V(l), Form::V(r)) => l == r,
            (Form::U(l), Form::V(r)) | (Form::V(l), Form::U(r)) => {
                let diff = bdd.apply_xor(l, r);
                bdd.is_zero(bdd.apply_and(diff, self.space.var_eq()))
            }
        }
    }
}

impl Eq for Predicate {}
