use std::fmt;

use crate::error::Error;
use crate::path::Path;
use crate::predicate::Predicate;
use crate::transition::Transition;

/// A CTL formula over the state bits of a transition system.
///
/// Atoms are single state bits; the temporal operators pair a path
/// quantifier (E/A) with next, future, globally, until or release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlFormula {
    True,
    False,
    /// State bit `i` is 1.
    Var(usize),
    Not(Box<CtlFormula>),
    And(Box<CtlFormula>, Box<CtlFormula>),
    Or(Box<CtlFormula>, Box<CtlFormula>),
    Xor(Box<CtlFormula>, Box<CtlFormula>),
    EX(Box<CtlFormula>),
    EF(Box<CtlFormula>),
    EG(Box<CtlFormula>),
    AX(Box<CtlFormula>),
    AF(Box<CtlFormula>),
    AG(Box<CtlFormula>),
    EU(Box<CtlFormula>, Box<CtlFormula>),
    ER(Box<CtlFormula>, Box<CtlFormula>),
    AU(Box<CtlFormula>, Box<CtlFormula>),
    AR(Box<CtlFormula>, Box<CtlFormula>),
}

impl CtlFormula {
    pub fn var(bit: usize) -> Self {
        CtlFormula::Var(bit)
    }

    pub fn not(self) -> Self {
        CtlFormula::Not(Box::new(self))
    }

    pub fn and(self, other: Self) -> Self {
        CtlFormula::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Self) -> Self {
        CtlFormula::Or(Box::new(self), Box::new(other))
    }

    pub fn xor(self, other: Self) -> Self {
        CtlFormula::Xor(Box::new(self), Box::new(other))
    }

    pub fn ex(self) -> Self {
        CtlFormula::EX(Box::new(self))
    }

    pub fn ef(self) -> Self {
        CtlFormula::EF(Box::new(self))
    }

    pub fn eg(self) -> Self {
        CtlFormula::EG(Box::new(self))
    }

    pub fn ax(self) -> Self {
        CtlFormula::AX(Box::new(self))
    }

    pub fn af(self) -> Self {
        CtlFormula::AF(Box::new(self))
    }

    pub fn ag(self) -> Self {
        CtlFormula::AG(Box::new(self))
    }

    pub fn eu(self, other: Self) -> Self {
        CtlFormula::EU(Box::new(self), Box::new(other))
    }

    pub fn er(self, other: Self) -> Self {
        CtlFormula::ER(Box::new(self), Box::new(other))
    }

    pub fn au(self, other: Self) -> Self {
        CtlFormula::AU(Box::new(self), Box::new(other))
    }

    pub fn ar(self, other: Self) -> Self {
        CtlFormula::AR(Box::new(self), Box::new(other))
    }

    /// Compute the set of states satisfying the formula.
    ///
    /// When the transition carries fairness predicates, every temporal
    /// operator evaluates under fairness; without any, the plain operators
    /// are used. Callers wanting fair semantics must attach fairness before
    /// evaluating.
    pub fn eval(&self, trans: &Transition) -> Result<Predicate, Error> {
        let space = trans.space();
        let fair = trans.has_fairness();
        match self {
            CtlFormula::True => Ok(Predicate::constant(space, true)),
            CtlFormula::False => Ok(Predicate::constant(space, false)),
            CtlFormula::Var(bit) => Ok(Predicate::state_bit(space, *bit)),
            CtlFormula::Not(f) => Ok(f.eval(trans)?.not()),
            CtlFormula::And(f, g) => f.eval(trans)?.and(&g.eval(trans)?),
            CtlFormula::Or(f, g) => f.eval(trans)?.or(&g.eval(trans)?),
            CtlFormula::Xor(f, g) => f.eval(trans)?.xor(&g.eval(trans)?),
            CtlFormula::EX(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_ex(&f)
                } else {
                    trans.ex(&f)
                }
            }
            CtlFormula::EF(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_ef(&f)
                } else {
                    trans.ef(&f)
                }
            }
            CtlFormula::EG(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_eg(&f)
                } else {
                    trans.eg(&f)
                }
            }
            CtlFormula::AX(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_ax(&f)
                } else {
                    trans.ax(&f)
                }
            }
            CtlFormula::AF(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_af(&f)
                } else {
                    trans.af(&f)
                }
            }
            CtlFormula::AG(f) => {
                let f = f.eval(trans)?;
                if fair {
                    trans.fair_ag(&f)
                } else {
                    trans.ag(&f)
                }
            }
            CtlFormula::EU(f, g) => {
                let (f, g) = (f.eval(trans)?, g.eval(trans)?);
                if fair {
                    trans.fair_eu(&f, &g)
                } else {
                    trans.eu(&f, &g)
                }
            }
            CtlFormula::ER(f, g) => {
                let (f, g) = (f.eval(trans)?, g.eval(trans)?);
                if fair {
                    trans.fair_er(&f, &g)
                } else {
                    trans.er(&f, &g)
                }
            }
            CtlFormula::AU(f, g) => {
                let (f, g) = (f.eval(trans)?, g.eval(trans)?);
                if fair {
                    trans.fair_au(&f, &g)
                } else {
                    trans.au(&f, &g)
                }
            }
            CtlFormula::AR(f, g) => {
                let (f, g) = (f.eval(trans)?, g.eval(trans)?);
                if fair {
                    trans.fair_ar(&f, &g)
                } else {
                    trans.ar(&f, &g)
                }
            }
        }
    }

    /// Produce the path explaining the verdict on this formula, when its top
    /// operator supports one.
    ///
    /// A verified existential property (EF/EG/EU/ER) yields a witness; a
    /// failed universal one (AF/AG/AU/AR) yields a counterexample. Other
    /// verdicts, fair evaluation and an empty initial region yield `None`.
    pub fn explain(
        &self,
        trans: &Transition,
        init: &Predicate,
        holds: bool,
    ) -> Result<Option<Path>, Error> {
        if trans.has_fairness() || init.is_false() {
            return Ok(None);
        }
        let path = match self {
            CtlFormula::EF(f) if holds => trans.ef_witness(init, &f.eval(trans)?)?,
            CtlFormula::EG(f) if holds => trans.eg_witness(init, &f.eval(trans)?)?,
            CtlFormula::EU(f, g) if holds => {
                trans.eu_witness(init, &f.eval(trans)?, &g.eval(trans)?)?
            }
            CtlFormula::ER(f, g) if holds => {
                trans.er_witness(init, &f.eval(trans)?, &g.eval(trans)?)?
            }
            CtlFormula::AF(f) if !holds => trans.af_counterexample(init, &f.eval(trans)?)?,
            CtlFormula::AG(f) if !holds => trans.ag_counterexample(init, &f.eval(trans)?)?,
            CtlFormula::AU(f, g) if !holds => {
                trans.au_counterexample(init, &f.eval(trans)?, &g.eval(trans)?)?
            }
            CtlFormula::AR(f, g) if !holds => {
                trans.ar_counterexample(init, &f.eval(trans)?, &g.eval(trans)?)?
            }
            _ => return Ok(None),
        };
        Ok(Some(path))
    }
}

impl fmt::Display for CtlFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlFormula::True => write!(f, "true"),
            CtlFormula::False => write!(f, "false"),
            CtlFormula::Var(bit) => write!(f, "v{}", bit),
            CtlFormula::Not(g) => write!(f, "¬{}", g),
            CtlFormula::And(g, h) => write!(f, "({} ∧ {})", g, h),
            CtlFormula::Or(g, h) => write!(f, "({} ∨ {})", g, h),
            CtlFormula::Xor(g, h) => write!(f, "({} ⊕ {})", g, h),
            CtlFormula::EX(g) => write!(f, "EX {}", g),
            CtlFormula::EF(g) => write!(f, "EF {}", g),
            CtlFormula::EG(g) => write!(f, "EG {}", g),
            CtlFormula::AX(g) => write!(f, "AX {}", g),
            CtlFormula::AF(g) => write!(f, "AF {}", g),
            CtlFormula::AG(g) => write!(f, "AG {}", g),
            CtlFormula::EU(g, h) => write!(f, "E[{} U {}]", g, h),
            CtlFormula::ER(g, h) => write!(f, "E[{} R {}]", g, h),
            CtlFormula::AU(g, h) => write!(f, "A[{} U {}]", g, h),
            CtlFormula::AR(g, h) => write!(f, "A[{} R {}]", g, h),
        }
    }
}
