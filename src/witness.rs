//! Concrete path extraction for verified existential properties and
//! violated universal ones.
//!
//! Each generator starts from a state picked out of the initial region,
//! walks the symbolic satisfying set one concrete successor at a time, and
//! never leaves it, so the produced path certifies the property by
//! construction. The universal counterexamples are witnesses of the dual
//! existential formula.

use log::debug;

use crate::error::Error;
use crate::path::Path;
use crate::predicate::Predicate;
use crate::state::State;
use crate::transition::Transition;

impl Transition {
    /// Whether `to` is a one-step successor of `from`.
    pub fn relates(&self, from: &State, to: &State) -> Result<bool, Error> {
        self.next(from)?.contains(to)
    }

    /// Witness for `EF f`: reduces to `E[⊤ U f]`.
    pub fn ef_witness(&self, init: &Predicate, f: &Predicate) -> Result<Path, Error> {
        let sat = self.ef(f)?;
        self.until_path(init, &sat, f)
    }

    /// Witness for `E[f U g]`: a finite path inside the satisfying set
    /// ending at the first `g`-state.
    pub fn eu_witness(
        &self,
        init: &Predicate,
        f: &Predicate,
        g: &Predicate,
    ) -> Result<Path, Error> {
        let sat = self.eu(f, g)?;
        self.until_path(init, &sat, g)
    }

    /// Witness for `E[f R g]`.
    ///
    /// Preferably a finite path of `g`-states reaching a releasing
    /// `f ∧ g`-state; when the initial region only satisfies the release
    /// through a forever-`g` path, a lasso inside `EG g` instead.
    pub fn er_witness(
        &self,
        init: &Predicate,
        f: &Predicate,
        g: &Predicate,
    ) -> Result<Path, Error> {
        let release = f.and(g)?;
        let certificate = self.eu(g, &release)?;
        if !init.and(&certificate)?.is_false() {
            self.until_path(init, &certificate, &release)
        } else {
            debug!("release state unreachable, falling back to an EG lasso");
            let stay = self.eg(g)?;
            self.lasso_path(init, &stay)
        }
    }

    /// Witness for `EG f`: a lasso whose every state satisfies `f`.
    pub fn eg_witness(&self, init: &Predicate, f: &Predicate) -> Result<Path, Error> {
        let sat = self.eg(f)?;
        self.lasso_path(init, &sat)
    }

    /// Counterexample to `AF f`: a witness of `EG ¬f`.
    pub fn af_counterexample(&self, init: &Predicate, f: &Predicate) -> Result<Path, Error> {
        self.eg_witness(init, &f.not())
    }

    /// Counterexample to `AG f`: a witness of `EF ¬f`.
    pub fn ag_counterexample(&self, init: &Predicate, f: &Predicate) -> Result<Path, Error> {
        self.ef_witness(init, &f.not())
    }

    /// Counterexample to `A[f U g]`: a witness of `E[¬f R ¬g]`.
    pub fn au_counterexample(
        &self,
        init: &Predicate,
        f: &Predicate,
        g: &Predicate,
    ) -> Result<Path, Error> {
        self.er_witness(init, &f.not(), &g.not())
    }

    /// Counterexample to `A[f R g]`: a witness of `E[¬f U ¬g]`.
    pub fn ar_counterexample(
        &self,
        init: &Predicate,
        f: &Predicate,
        g: &Predicate,
    ) -> Result<Path, Error> {
        self.eu_witness(init, &f.not(), &g.not())
    }

    /// Shortest path from `init ∩ sat` to the first `target`-state, staying
    /// inside `sat`.
    ///
    /// The satisfying set is layered backward from the target before any
    /// concrete state is committed to, so the forward walk always has a
    /// successor one layer closer to the target, no matter how the relation
    /// branches.
    fn until_path(
        &self,
        init: &Predicate,
        sat: &Predicate,
        target: &Predicate,
    ) -> Result<Path, Error> {
        // layers[i]: states of sat at shortest sat-internal distance i from
        // the target.
        let mut layers = vec![target.clone()];
        let mut covered = target.clone();
        while init.and(&covered)?.is_false() {
            let frontier = self
                .ex(&layers[layers.len() - 1])?
                .and(sat)?
                .and(&covered.not())?;
            if frontier.is_false() {
                return Err(Error::EmptyPredicate);
            }
            covered = covered.or(&frontier)?;
            layers.push(frontier);
        }

        // The entry state sits in the newest layer; each transition steps
        // down exactly one layer.
        let depth = layers.len() - 1;
        let mut current = State::from_predicate(&init.and(&layers[depth])?)?;
        let mut states = vec![current.clone()];
        for layer in layers[..depth].iter().rev() {
            let step = self.next(&current)?.and(layer)?;
            current = State::from_predicate(&step)?;
            states.push(current.clone());
        }

        debug!("extracted a finite path of {} states", states.len());
        Ok(Path::finite(states))
    }

    /// Walk from `init ∩ sat` inside `sat` until a state repeats; the first
    /// repetition closes the loop.
    fn lasso_path(&self, init: &Predicate, sat: &Predicate) -> Result<Path, Error> {
        let mut current = State::from_predicate(&init.and(sat)?)?;
        let mut states = vec![current.clone()];

        loop {
            let step = self.next(&current)?.and(sat)?;
            current = State::from_predicate(&step)?;
            if let Some(point) = states.iter().position(|s| s == &current) {
                debug!(
                    "extracted a lasso: {} states, loop at {}",
                    states.len(),
                    point
                );
                return Ok(Path::lasso(states, point));
            }
            states.push(current.clone());
        }
    }
}
