//! Dependency graph construction and ordering
//!
//! Turns a flat declaration list into a DAG and a deterministic execution
//! order. An edge runs from a referenced declaration to the declaration
//! containing the reference. The order is computed once, at execution
//! creation, and stored with the execution; it is never recomputed mid-run.

use crate::error::{CoreError, Result};
use crate::script::ResourceDeclaration;
use std::collections::HashMap;

/// Builds the dependency graph for a declaration list and produces a
/// topological execution order.
///
/// Ties are broken by original declaration order, so the same script always
/// yields the same order. Breakpoint positions depend on this.
pub struct DependencyGraphBuilder<'a> {
    declarations: &'a [ResourceDeclaration],
    index: HashMap<&'a str, usize>,
    /// adjacency[i] lists declarations that depend on declaration i
    adjacency: Vec<Vec<usize>>,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(declarations: &'a [ResourceDeclaration]) -> Self {
        let index = declarations
            .iter()
            .enumerate()
            .map(|(i, d)| (d.name.as_str(), i))
            .collect();
        Self {
            declarations,
            index,
            adjacency: vec![Vec::new(); declarations.len()],
        }
    }

    /// Build edges and return the execution order as declaration names.
    pub fn build(mut self) -> Result<Vec<String>> {
        self.build_edges()?;
        self.check_cycles()?;
        let order = self.topological_order();
        tracing::debug!(nodes = order.len(), "Built execution order");
        Ok(order)
    }

    fn build_edges(&mut self) -> Result<()> {
        for (to, decl) in self.declarations.iter().enumerate() {
            for target in decl.references() {
                let from = *self.index.get(target).ok_or_else(|| {
                    CoreError::UnknownReference {
                        target: target.to_string(),
                        referenced_by: decl.name.clone(),
                    }
                })?;
                self.adjacency[from].push(to);
            }
        }
        Ok(())
    }

    /// Depth-first cycle check with three-colour marking. On a cycle the
    /// error names the participating declarations.
    fn check_cycles(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq)]
        enum Colour {
            White,
            Grey,
            Black,
        }

        fn visit(
            node: usize,
            adjacency: &[Vec<usize>],
            colours: &mut [Colour],
            stack: &mut Vec<usize>,
        ) -> Option<Vec<usize>> {
            colours[node] = Colour::Grey;
            stack.push(node);
            for &next in &adjacency[node] {
                match colours[next] {
                    Colour::Grey => {
                        // Unwind the stack back to `next` to name the cycle
                        let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                        let mut cycle = stack[start..].to_vec();
                        cycle.push(next);
                        return Some(cycle);
                    }
                    Colour::White => {
                        if let Some(cycle) = visit(next, adjacency, colours, stack) {
                            return Some(cycle);
                        }
                    }
                    Colour::Black => {}
                }
            }
            stack.pop();
            colours[node] = Colour::Black;
            None
        }

        let mut colours = vec![Colour::White; self.declarations.len()];
        for start in 0..self.declarations.len() {
            if colours[start] == Colour::White {
                let mut stack = Vec::new();
                if let Some(cycle) = visit(start, &self.adjacency, &mut colours, &mut stack) {
                    let names = cycle
                        .into_iter()
                        .map(|i| self.declarations[i].name.clone())
                        .collect();
                    return Err(CoreError::CycleDetected(names));
                }
            }
        }
        Ok(())
    }

    /// Kahn's algorithm, always taking the smallest original declaration
    /// index among ready nodes.
    fn topological_order(&self) -> Vec<String> {
        let n = self.declarations.len();
        let mut indegree = vec![0usize; n];
        for targets in &self.adjacency {
            for &to in targets {
                indegree[to] += 1;
            }
        }

        let mut ready: Vec<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);
        while let Some(pos) = ready.iter().enumerate().min_by_key(|&(_, &i)| i).map(|(p, _)| p) {
            let node = ready.swap_remove(pos);
            order.push(self.declarations[node].name.clone());
            for &next in &self.adjacency[node] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(next);
                }
            }
        }
        order
    }
}
