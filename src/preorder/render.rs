//! Text renderings of a preordered set: compact summaries and Graphviz DOT.

use std::fmt::{Debug, Display, Write as _};
use std::hash::Hash;

use super::PreorderedSet;
use crate::relation::Relation;

impl<T: Clone + Eq + Hash + Debug + Ord> PreorderedSet<T> {
    /// Space-separated `a<b` / `a=b` terms for every known relation, sorted.
    pub fn summary(&self) -> String
    where
        T: Display,
    {
        self.summary_with(|x| x.to_string())
    }

    /// Like [`summary`](Self::summary) with a custom element namer.
    /// Terms are still sorted by the elements' own order.
    pub fn summary_with(&self, namer: impl Fn(&T) -> String) -> String {
        let mut terms: Vec<(&T, &T, Relation)> = self
            .known_relations()
            .map(|(a, b, rel)| match rel {
                Relation::Greater => (b, a, Relation::Less),
                Relation::Equal if b < a => (b, a, rel),
                _ => (a, b, rel),
            })
            .collect();
        terms.sort_by(|x, y| (x.0, x.1).cmp(&(y.0, y.1)));
        terms
            .into_iter()
            .map(|(a, b, rel)| format!("{}{}{}", namer(a), rel.symbol(), namer(b)))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Hasse diagram in DOT syntax. Equivalent elements share one node,
    /// and edges point from the better node to the worse one.
    pub fn graph(&self, namer: impl Fn(&T) -> String) -> String {
        let mut sorted: Vec<&T> = self.elements.iter().collect();
        sorted.sort();

        let mut classes: Vec<Vec<&T>> = Vec::new();
        for x in sorted {
            match classes
                .iter_mut()
                .find(|class| self.cmp(x, class[0]) == Relation::Equal)
            {
                Some(class) => class.push(x),
                None => classes.push(vec![x]),
            }
        }
        let labels: Vec<String> = classes
            .iter()
            .map(|class| {
                class
                    .iter()
                    .map(|x| namer(x))
                    .collect::<Vec<_>>()
                    .join(" / ")
            })
            .collect();

        let below = |a: usize, b: usize| self.cmp(classes[a][0], classes[b][0]) == Relation::Less;

        let mut out = String::from("digraph {\n");
        for label in &labels {
            let _ = writeln!(out, "    {}", quote(label));
        }
        for hi in 0..classes.len() {
            for lo in 0..classes.len() {
                if !below(lo, hi) {
                    continue;
                }
                // Transitive reduction: drop edges implied by a middle node.
                let covered = (0..classes.len()).any(|mid| below(lo, mid) && below(mid, hi));
                if !covered {
                    let _ = writeln!(out, "    {} -> {}", quote(&labels[hi]), quote(&labels[lo]));
                }
            }
        }
        out.push_str("}\n");
        out
    }
}

fn quote(label: &str) -> String {
    format!("\"{}\"", label.replace('\\', "\\\\").replace('"', "\\\""))
}
