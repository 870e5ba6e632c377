use std::collections::BTreeMap;
use std::io;
use std::path::Path;

use crate::bdd::Bdd;
use crate::error::Error;
use crate::reference::Ref;

impl Bdd {
    /// Render the graphs rooted at `roots` in Graphviz DOT format.
    ///
    /// High edges are solid, low edges dashed, complemented low edges dotted.
    pub fn to_dot(&self, roots: &[Ref]) -> Result<String, std::fmt::Error> {
        use std::fmt::Write as _;

        let mut dot = String::new();
        writeln!(dot, "graph {{")?;
        writeln!(dot, "node [shape=circle, fixedsize=true];")?;

        writeln!(dot, "{{ rank=sink")?;
        writeln!(dot, "0 [shape=square, label=\"0\"];")?;
        writeln!(dot, "1 [shape=square, label=\"1\"];")?;
        writeln!(dot, "}}")?;

        let all_nodes = self.descendants(roots.iter().copied());

        // Group nodes by variable so each level shares a rank.
        let mut levels = BTreeMap::<u32, Vec<u32>>::new();
        for &id in all_nodes.iter() {
            if id == 1 {
                continue;
            }
            levels.entry(self.variable(id)).or_default().push(id);
        }
        for (var, ids) in &levels {
            writeln!(dot, "{{ rank=same")?;
            for &id in ids {
                writeln!(dot, "{} [label=<x<SUB>{}</SUB>>];", id, var)?;
            }
            writeln!(dot, "}}")?;
        }

        for &id in all_nodes.iter() {
            if id == 1 {
                continue;
            }

            let high = self.high(id);
            writeln!(dot, "{} -- {};", id, high.index())?;

            let low = self.low(id);
            match (low.is_negated(), low.index()) {
                (true, 1) => writeln!(dot, "{} -- 0 [style=dashed];", id)?,
                (true, target) => writeln!(dot, "{} -- {} [style=dotted];", id, target)?,
                (false, target) => writeln!(dot, "{} -- {} [style=dashed];", id, target)?,
            }
        }

        writeln!(dot, "{{ rank=source")?;
        for (i, root) in roots.iter().enumerate() {
            writeln!(dot, "r{} [shape=rect, label=\"{}\"];", i, root)?;
        }
        writeln!(dot, "}}")?;
        for (i, &root) in roots.iter().enumerate() {
            match (root.is_negated(), root.index()) {
                (true, 1) => writeln!(dot, "r{} -- 0;", i)?,
                (true, target) => writeln!(dot, "r{} -- {} [style=dotted];", i, target)?,
                (false, target) => writeln!(dot, "r{} -- {};", i, target)?,
            }
        }

        writeln!(dot, "}}")?;
        Ok(dot)
    }

    /// Write the DOT rendering of `roots` to a file.
    pub fn dump_dot(&self, roots: &[Ref], path: impl AsRef<Path>) -> Result<(), Error> {
        let path = path.as_ref();
        let dot = self.to_dot(roots).map_err(io::Error::other).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        std::fs::write(path, dot).map_err(|e| Error::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_dot_shape() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_and(x, y);

        let dot = bdd.to_dot(&[f]).unwrap();
        assert!(dot.starts_with("graph {"));
        assert!(dot.trim_end().ends_with('}'));
        // Two decision nodes plus both terminals.
        assert!(dot.contains("x<SUB>1</SUB>"));
        assert!(dot.contains("x<SUB>2</SUB>"));
        assert!(dot.contains("0 [shape=square"));
        assert!(dot.contains("1 [shape=square"));
    }

    #[test]
    fn test_dump_dot_bad_path() {
        let bdd = Bdd::default();
        let err = bdd.dump_dot(&[bdd.one()], "/nonexistent-dir/out.dot");
        assert!(matches!(err, Err(Error::Io { .. })));
    }
}
