//! Precedence graph with an incrementally maintained execution order.

use std::collections::{BTreeSet, HashMap};

/// `before`/`after` constraints between transform names.
///
/// Edges may name transforms that are not registered yet; they are kept and
/// take effect once that transform arrives.
#[derive(Debug, Clone, Default)]
pub(crate) struct PrecedenceGraph {
    /// Registered names in insertion order
    nodes: Vec<String>,
    index: HashMap<String, usize>,
    /// `(a, b)`: a must run before b
    edges: BTreeSet<(String, String)>,
    /// Edges between registered nodes
    successors: Vec<Vec<usize>>,
    predecessors: Vec<Vec<usize>>,
    /// Execution order, as node indices
    order: Vec<usize>,
}

impl PrecedenceGraph {
    /// Registered node indices in execution order.
    pub(crate) fn order(&self) -> &[usize] {
        &self.order
    }

    /// Register `name` and place it in the existing order.
    ///
    /// The new node goes just before its first successor, or last if it has
    /// none. When a successor sits at or before its last predecessor, only
    /// that window is revisited: the nodes reachable from the new node move,
    /// in their current relative order, to just after it. Everything else
    /// keeps its place.
    ///
    /// On a cycle the graph is unchanged and the names on the cycle are
    /// returned in insertion order.
    pub(crate) fn insert(
        &mut self,
        name: &str,
        before: &[String],
        after: &[String],
    ) -> Result<(), Vec<String>> {
        let node = self.nodes.len();
        let declared: Vec<(String, String)> = before
            .iter()
            .map(|later| (name.to_string(), later.clone()))
            .chain(after.iter().map(|earlier| (earlier.clone(), name.to_string())))
            .collect();

        let mut preds = BTreeSet::new();
        let mut succs = BTreeSet::new();
        for (from, to) in self.edges.iter().chain(&declared) {
            if from == name && to == name {
                return Err(vec![name.to_string()]);
            } else if to == name {
                preds.extend(self.index.get(from).copied());
            } else if from == name {
                succs.extend(self.index.get(to).copied());
            }
        }

        let mut position = vec![0usize; node];
        for (pos, &i) in self.order.iter().enumerate() {
            position[i] = pos;
        }

        let last_pred = preds.iter().map(|&p| position[p]).max();
        let first_succ = succs.iter().map(|&s| position[s]).min();

        match (first_succ, last_pred) {
            (Some(lo), Some(hi)) if lo <= hi => {
                let forward = reach(&succs, &self.successors, &position, |p| p <= hi);
                if !forward.is_disjoint(&preds) {
                    let backward = reach(&preds, &self.predecessors, &position, |p| p >= lo);
                    let mut cycle: Vec<String> = forward
                        .intersection(&backward)
                        .map(|&i| self.nodes[i].clone())
                        .collect();
                    cycle.push(name.to_string());
                    return Err(cycle);
                }

                let window = &self.order[lo..=hi];
                let mut placed: Vec<usize> = window
                    .iter()
                    .copied()
                    .filter(|i| !forward.contains(i))
                    .collect();
                placed.push(node);
                placed.extend(window.iter().copied().filter(|i| forward.contains(i)));
                self.order.splice(lo..=hi, placed);
            }
            (first_succ, _) => {
                let at = first_succ.unwrap_or(self.order.len());
                self.order.insert(at, node);
            }
        }

        self.index.insert(name.to_string(), node);
        self.nodes.push(name.to_string());
        self.edges.extend(declared);
        for &p in &preds {
            self.successors[p].push(node);
        }
        for &s in &succs {
            self.predecessors[s].push(node);
        }
        self.successors.push(succs.into_iter().collect());
        self.predecessors.push(preds.into_iter().collect());
        Ok(())
    }
}

/// Nodes reachable from `start` along `next`, restricted to positions
/// accepted by `within`.
fn reach(
    start: &BTreeSet<usize>,
    next: &[Vec<usize>],
    position: &[usize],
    within: impl Fn(usize) -> bool,
) -> BTreeSet<usize> {
    let mut seen = BTreeSet::new();
    let mut stack: Vec<usize> = start
        .iter()
        .copied()
        .filter(|&i| within(position[i]))
        .collect();

    while let Some(i) = stack.pop() {
        if !seen.insert(i) {
            continue;
        }
        stack.extend(
            next[i]
                .iter()
                .copied()
                .filter(|&j| within(position[j]) && !seen.contains(&j)),
        );
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    fn names(graph: &PrecedenceGraph) -> Vec<String> {
        graph
            .order()
            .iter()
            .map(|&i| graph.nodes[i].clone())
            .collect()
    }

    #[test]
    fn test_insertion_order_without_constraints() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("c", &[], &[]).unwrap();
        graph.insert("a", &[], &[]).unwrap();
        graph.insert("b", &[], &[]).unwrap();
        assert_eq!(names(&graph), s(&["c", "a", "b"]));
    }

    #[test]
    fn test_before_and_after() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("b", &[], &[]).unwrap();
        graph.insert("c", &[], &s(&["a"])).unwrap();
        graph.insert("a", &s(&["b"]), &[]).unwrap();
        assert_eq!(names(&graph), s(&["a", "b", "c"]));
    }

    #[test]
    fn test_pending_constraint_applies_later() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("b", &[], &s(&["a"])).unwrap();
        assert_eq!(names(&graph), s(&["b"]));

        graph.insert("a", &[], &[]).unwrap();
        assert_eq!(names(&graph), s(&["a", "b"]));
    }

    #[test]
    fn test_moves_only_dependents_of_new_node() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("a", &[], &[]).unwrap();
        graph.insert("b", &[], &s(&["a"])).unwrap();
        graph.insert("c", &[], &[]).unwrap();
        graph.insert("e", &[], &[]).unwrap();

        graph.insert("d", &s(&["a"]), &s(&["c"])).unwrap();
        assert_eq!(names(&graph), s(&["c", "d", "a", "b", "e"]));
    }

    #[test]
    fn test_cycle() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("a", &s(&["b"]), &[]).unwrap();
        graph.insert("z", &[], &[]).unwrap();
        assert_eq!(graph.insert("b", &s(&["a"]), &[]), Err(s(&["a", "b"])));
        assert_eq!(names(&graph), s(&["a", "z"]));
    }

    #[test]
    fn test_cycle_names_only_nodes_on_it() {
        let mut graph = PrecedenceGraph::default();
        graph.insert("a", &s(&["b"]), &[]).unwrap();
        graph.insert("c", &[], &s(&["b"])).unwrap();
        graph.insert("x", &s(&["a"]), &[]).unwrap();
        assert_eq!(graph.insert("b", &s(&["a"]), &[]), Err(s(&["a", "b"])));

        graph.insert("b", &[], &[]).unwrap();
        assert_eq!(names(&graph), s(&["x", "a", "b", "c"]));
    }

    #[test]
    fn test_self_precedence_is_a_cycle() {
        let mut graph = PrecedenceGraph::default();
        assert_eq!(graph.insert("a", &s(&["a"]), &[]), Err(s(&["a"])));
        assert!(graph.order().is_empty());
    }
}
