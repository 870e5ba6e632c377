//! # symbolic-ctl: BDD-based CTL model checking
//!
//! A symbolic model checker for Computation Tree Logic. States are boolean
//! vectors; sets of states, transition relations and temporal properties are
//! all boolean functions living in one shared, canonical
//! [ROBDD manager][crate::bdd::Bdd], so fixpoint computations reduce to a
//! handful of function applications and convergence checks are pointer
//! comparisons.
//!
//! ## Layout
//!
//! Three layers, bottom up:
//!
//! - **Engine** ([`bdd`], [`reference`], plus the [`sat`] and [`dot`]
//!   extensions): a self-contained decision-diagram package with complement
//!   edges, ITE-based combinators, quantification and relational products.
//! - **State algebra** ([`space`], [`predicate`], [`state`]): each state bit
//!   owns an interleaved pair of BDD variables (a present-copy and a
//!   next-copy), and a [`Predicate`] keeps whichever copy it was produced in.
//!   Image computations flip the copy instead of renaming variables.
//! - **Checking** ([`transition`], [`ctl`], [`witness`], [`path`]): the ten
//!   CTL fixpoint operators, their counterparts under generalized Büchi
//!   fairness, and extraction of concrete witness and counterexample paths.
//!
//! The [`parse`] module reads the S-expression specification format consumed
//! by the command-line driver.
//!
//! ## Example
//!
//! ```
//! use std::rc::Rc;
//! use symbolic_ctl::{Bdd, CtlFormula, Predicate, StateSpace, Transition};
//!
//! // A one-bit alternator: the bit flips on every step.
//! let bdd = Rc::new(Bdd::new());
//! let space = Rc::new(StateSpace::new(bdd, 1));
//! let toggle = Transition::literal(&space, 0, false)
//!     .xor(&Transition::literal(&space, 0, true))
//!     .unwrap();
//!
//! // Starting from 0, the bit is always eventually 1.
//! let init = Predicate::state_bit(&space, 0).not();
//! let property = CtlFormula::var(0).af().ag();
//! let sat = property.eval(&toggle).unwrap();
//! assert!(init.implies(&sat).unwrap());
//! ```

pub mod bdd;
pub mod cache;
pub mod ctl;
pub mod dot;
pub mod error;
pub mod node;
pub mod parse;
pub mod path;
pub mod predicate;
pub mod reference;
pub mod sat;
pub mod space;
pub mod state;
pub mod storage;
pub mod transition;
pub mod utils;
pub mod witness;

pub use bdd::Bdd;
pub use ctl::CtlFormula;
pub use error::Error;
pub use parse::{parse_system, SystemSpec};
pub use path::Path;
pub use predicate::Predicate;
pub use reference::Ref;
pub use space::{StateSpace, MAX_STATE_BITS};
pub use state::State;
pub use transition::Transition;
