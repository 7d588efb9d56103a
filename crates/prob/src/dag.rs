//! Directed acyclic graphs over a fixed node set.
//!
//! The structure is stored as a dense adjacency matrix because the networks
//! in structure learning are small and the samplers flip single entries.
//! Cycle checks and orderings go through `petgraph`.

use petgraph::algo::{has_path_connecting, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::ProbError;

/// A directed graph whose edges are kept acyclic by `add_edge`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dag {
    n: usize,
    adj: Vec<Vec<bool>>,
}

impl Dag {
    /// Graph with `n` nodes and no edges.
    pub fn empty(n: usize) -> Self {
        Self {
            n,
            adj: vec![vec![false; n]; n],
        }
    }

    /// Build a DAG from an edge list, rejecting cycles.
    pub fn from_edges(n: usize, edges: &[(usize, usize)]) -> Result<Self, ProbError> {
        let mut dag = Self::empty(n);
        for &(from, to) in edges {
            dag.add_edge(from, to)?;
        }
        Ok(dag)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.adj.iter().flatten().filter(|&&e| e).count()
    }

    fn check(&self, node: usize) -> Result<(), ProbError> {
        if node >= self.n {
            return Err(ProbError::IndexOutOfBounds {
                index: node,
                size: self.n,
            });
        }
        Ok(())
    }

    /// Add `from -> to`, failing if it would introduce a cycle.
    pub fn add_edge(&mut self, from: usize, to: usize) -> Result<(), ProbError> {
        self.check(from)?;
        self.check(to)?;
        if from == to
            || has_path_connecting(&self.to_graph(), NodeIndex::new(to), NodeIndex::new(from), None)
        {
            return Err(ProbError::CycleDetected { from, to });
        }
        self.adj[from][to] = true;
        Ok(())
    }

    /// Whether `from -> to` is an edge.
    pub fn has_edge(&self, from: usize, to: usize) -> bool {
        from < self.n && to < self.n && self.adj[from][to]
    }

    /// Parents of `node` in increasing index order.
    pub fn parents(&self, node: usize) -> Vec<usize> {
        (0..self.n).filter(|&p| self.has_edge(p, node)).collect()
    }

    /// Children of `node` in increasing index order.
    pub fn children(&self, node: usize) -> Vec<usize> {
        (0..self.n).filter(|&c| self.has_edge(node, c)).collect()
    }

    /// All edges in row-major order.
    pub fn edges(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        for i in 0..self.n {
            for j in 0..self.n {
                if self.adj[i][j] {
                    out.push((i, j));
                }
            }
        }
        out
    }

    /// Dense 0/1 adjacency matrix.
    pub fn adjacency(&self) -> Vec<Vec<f64>> {
        self.adj
            .iter()
            .map(|row| row.iter().map(|&e| if e { 1.0 } else { 0.0 }).collect())
            .collect()
    }

    /// Convert into a `petgraph` graph; node `i` gets index `i`.
    pub fn to_graph(&self) -> DiGraph<usize, ()> {
        let mut g = DiGraph::with_capacity(self.n, self.edge_count());
        let nodes: Vec<NodeIndex> = (0..self.n).map(|i| g.add_node(i)).collect();
        for (from, to) in self.edges() {
            g.add_edge(nodes[from], nodes[to], ());
        }
        g
    }

    /// Whether the stored edges are acyclic.
    pub fn is_acyclic(&self) -> bool {
        toposort(&self.to_graph(), None).is_ok()
    }

    /// A topological order of the nodes (parents before children).
    pub fn topological_order(&self) -> Result<Vec<usize>, ProbError> {
        let g = self.to_graph();
        toposort(&g, None)
            .map(|order| order.into_iter().map(|ix| g[ix]).collect())
            .map_err(|cycle| {
                let node = g[cycle.node_id()];
                ProbError::CycleDetected {
                    from: node,
                    to: node,
                }
            })
    }
}
