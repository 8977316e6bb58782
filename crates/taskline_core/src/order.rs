//! Dependency-respecting save order.

use std::collections::{BTreeMap, BTreeSet};

use crate::SyncError;

/// Lines paired with the lines they must be saved after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: BTreeMap<usize, BTreeSet<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a line and the lines it depends on.
    pub fn add(&mut self, line: usize, depends_on: impl IntoIterator<Item = usize>) {
        self.dependencies
            .entry(line)
            .or_default()
            .extend(depends_on);
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    /// Orders the lines so that each comes after everything it depends on.
    ///
    /// Each pass yields, in ascending line order, every line none of whose
    /// dependencies is still waiting. Dependencies on lines outside the graph
    /// are satisfied from the start. A pass that yields nothing means the
    /// remaining lines form a cycle.
    pub fn order(&self) -> Result<Vec<usize>, SyncError> {
        let mut pending = self.dependencies.clone();
        let mut result = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let mut removed = 0;
            let lines: Vec<usize> = pending.keys().copied().collect();

            for line in lines {
                let ready = pending
                    .get(&line)
                    .is_some_and(|deps| deps.iter().all(|dep| !pending.contains_key(dep)));
                if ready {
                    pending.remove(&line);
                    result.push(line);
                    removed += 1;
                }
            }

            if removed == 0 {
                return Err(SyncError::DependencyCycle {
                    lines: pending.into_keys().collect(),
                });
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn position(order: &[usize], line: usize) -> usize {
        order.iter().position(|&l| l == line).unwrap()
    }

    #[test]
    fn test_chain() {
        let mut graph = DependencyGraph::new();
        graph.add(0, [1]);
        graph.add(1, [2]);
        graph.add(2, []);

        assert_eq!(graph.order().unwrap(), vec![2, 1, 0]);
    }

    #[test]
    fn test_diamond() {
        let mut graph = DependencyGraph::new();
        graph.add(0, [1, 2]);
        graph.add(1, [3]);
        graph.add(2, [3]);
        graph.add(3, []);

        let order = graph.order().unwrap();
        assert_eq!(order.len(), 4);
        assert!(position(&order, 3) < position(&order, 1));
        assert!(position(&order, 3) < position(&order, 2));
        assert!(position(&order, 1) < position(&order, 0));
        assert!(position(&order, 2) < position(&order, 0));
    }

    #[test]
    fn test_dependency_outside_graph_is_satisfied() {
        let mut graph = DependencyGraph::new();
        graph.add(4, [9]);
        assert_eq!(graph.order().unwrap(), vec![4]);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = DependencyGraph::new();
        graph.add(0, []);
        graph.add(1, [2]);
        graph.add(2, [1]);

        let result = graph.order();
        assert!(matches!(
            result,
            Err(SyncError::DependencyCycle { ref lines }) if lines == &vec![1, 2]
        ));
    }

    #[test]
    fn test_self_dependency_is_a_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add(3, [3]);
        assert!(graph.order().is_err());
    }

    #[test]
    fn test_empty() {
        assert!(DependencyGraph::new().order().unwrap().is_empty());
    }
}
