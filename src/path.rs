use std::fmt;

use crate::state::State;

/// A concrete trace through the transition system.
///
/// Either a finite state sequence, or an infinite path folded into a lasso:
/// the states up to `lasso_point` are the prefix, the rest repeat forever
/// (the last state steps back to `states[lasso_point]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    Finite(Vec<State>),
    Lasso {
        states: Vec<State>,
        lasso_point: usize,
    },
}

impl Path {
    pub fn finite(states: Vec<State>) -> Self {
        Path::Finite(states)
    }

    pub fn lasso(states: Vec<State>, lasso_point: usize) -> Self {
        debug_assert!(lasso_point < states.len());
        Path::Lasso {
            states,
            lasso_point,
        }
    }

    pub fn states(&self) -> &[State] {
        match self {
            Path::Finite(states) => states,
            Path::Lasso { states, .. } => states,
        }
    }

    pub fn lasso_point(&self) -> Option<usize> {
        match self {
            Path::Finite(_) => None,
            Path::Lasso { lasso_point, .. } => Some(*lasso_point),
        }
    }

    pub fn is_lasso(&self) -> bool {
        matches!(self, Path::Lasso { .. })
    }

    pub fn len(&self) -> usize {
        self.states().len()
    }

    pub fn is_empty(&self) -> bool {
        self.states().is_empty()
    }
}

/// Tabular rendering: a header naming each state bit, then one bit row per
/// state, with a `Begin Loop` separator ahead of the cycle entry.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let states = self.states();
        let Some(first) = states.first() else {
            return Ok(());
        };

        let labels: Vec<String> = (0..first.space().state_bits())
            .map(|i| format!("v{}", i))
            .collect();
        writeln!(f, "{}", labels.join(" "))?;

        for (i, state) in states.iter().enumerate() {
            if self.lasso_point() == Some(i) {
                writeln!(f, "Begin Loop")?;
            }
            let row: Vec<String> = labels
                .iter()
                .zip(state.assign())
                .map(|(label, &bit)| format!("{:>width$}", bit as u8, width = label.len()))
                .collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::bdd::Bdd;
    use crate::space::StateSpace;

    fn states(assigns: &[&[bool]]) -> Vec<State> {
        let bdd = Rc::new(Bdd::default());
        let space = Rc::new(StateSpace::new(bdd, assigns[0].len()));
        assigns
            .iter()
            .map(|a| State::new(space.clone(), a.to_vec()).unwrap())
            .collect()
    }

    #[test]
    fn test_display_finite() {
        let path = Path::finite(states(&[&[false, false], &[true, false], &[false, true]]));
        let expected = "\
v0 v1
 0  0
 1  0
 0  1
";
        assert_eq!(path.to_string(), expected);
    }

    #[test]
    fn test_display_lasso() {
        let path = Path::lasso(states(&[&[false], &[true]]), 1);
        let expected = "\
v0
 0
Begin Loop
 1
";
        assert_eq!(path.to_string(), expected);
    }

    #[test]
    fn test_accessors() {
        let path = Path::lasso(states(&[&[true], &[false]]), 0);
        assert!(path.is_lasso());
        assert_eq!(path.lasso_point(), Some(0));
        assert_eq!(path.len(), 2);

        let path = Path::finite(states(&[&[true]]));
        assert!(!path.is_lasso());
        assert_eq!(path.lasso_point(), None);
    }
}
