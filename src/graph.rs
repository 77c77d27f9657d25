//! Directed multigraph stored as arenas of nodes and edges.
//!
//! Node and edge handles are plain indices. Every node keeps an ordered list of
//! adjacency entries, one per incident edge; this order is the (clockwise)
//! rotation system once an embedding has been written into the graph.

use std::collections::HashSet;
use log::trace;

pub type NodeRef = usize;
pub type EdgeRef = usize;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Edge {
    pub source :NodeRef,
    pub target :NodeRef,
}

/// One end of an edge, seen from the node it is attached to.
#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AdjEntry {
    pub node :NodeRef,
    pub edge :EdgeRef,
}

impl AdjEntry {
    /// The node at the other end of the edge.
    pub fn twin_node(&self, graph :&Graph) -> NodeRef {
        let e = graph.edge(self.edge);
        if e.source == self.node { e.target } else { e.source }
    }

    pub fn is_outgoing(&self, graph :&Graph) -> bool {
        graph.edge(self.edge).source == self.node
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Graph {
    edges :Vec<Edge>,
    adjacency :Vec<Vec<AdjEntry>>,
}

impl Graph {
    pub fn new() -> Self { Graph::default() }

    /// Build a graph with `n` nodes and the given `(source, target)` edges.
    /// Panics like [`add_edge`](Self::add_edge) on an endpoint `>= n`.
    pub fn from_edges(n :usize, edges :&[(NodeRef, NodeRef)]) -> Self {
        let mut g = Graph::new();
        for _ in 0..n { g.add_node(); }
        for &(a,b) in edges { g.add_edge(a,b); }
        g
    }

    pub fn add_node(&mut self) -> NodeRef {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    /// Add the edge `source -> target`, appending an adjacency entry at both ends.
    ///
    /// # Panics
    ///
    /// If either endpoint is not a node of the graph. Node handles are plain
    /// indices, so this is the same contract as indexing a slice.
    pub fn add_edge(&mut self, source :NodeRef, target :NodeRef) -> EdgeRef {
        assert!(source < self.num_nodes() && target < self.num_nodes(), "edge endpoint out of range");
        let edge = self.edges.len();
        self.edges.push(Edge { source, target });
        self.adjacency[source].push(AdjEntry { node: source, edge });
        if target != source {
            self.adjacency[target].push(AdjEntry { node: target, edge });
        }
        edge
    }

    pub fn num_nodes(&self) -> usize { self.adjacency.len() }
    pub fn num_edges(&self) -> usize { self.edges.len() }

    pub fn nodes(&self) -> std::ops::Range<NodeRef> { 0..self.num_nodes() }
    pub fn edges(&self) -> std::ops::Range<EdgeRef> { 0..self.num_edges() }

    pub fn edge(&self, e :EdgeRef) -> &Edge { &self.edges[e] }
    pub fn source(&self, e :EdgeRef) -> NodeRef { self.edges[e].source }
    pub fn target(&self, e :EdgeRef) -> NodeRef { self.edges[e].target }

    /// Adjacency entries of `v` in rotation order.
    pub fn adj(&self, v :NodeRef) -> &[AdjEntry] { &self.adjacency[v] }

    pub fn degree(&self, v :NodeRef) -> usize { self.adjacency[v].len() }

    pub fn out_degree(&self, v :NodeRef) -> usize {
        self.adjacency[v].iter().filter(|a| a.is_outgoing(self)).count()
    }

    pub fn in_degree(&self, v :NodeRef) -> usize {
        self.degree(v) - self.out_degree(v)
    }

    /// Replace the rotation at `v`. The new order must be a permutation of the
    /// current adjacency entries of `v`.
    pub fn set_adj_order(&mut self, v :NodeRef, order :Vec<AdjEntry>) -> Result<(), String> {
        let old :HashSet<AdjEntry> = self.adjacency[v].iter().cloned().collect();
        let new :HashSet<AdjEntry> = order.iter().cloned().collect();
        if order.len() != self.adjacency[v].len() || old != new {
            return Err(format!("New rotation at node {} is not a permutation of its adjacency entries.", v));
        }
        trace!("rotation at {}: {:?}", v, order.iter().map(|a| a.edge).collect::<Vec<_>>());
        self.adjacency[v] = order;
        Ok(())
    }

    /// The entry following `adj` in the rotation at `adj.node`, cyclically.
    pub fn cyclic_succ(&self, adj :AdjEntry) -> Option<AdjEntry> {
        let list = &self.adjacency[adj.node];
        let pos = list.iter().position(|a| *a == adj)?;
        Some(list[(pos + 1) % list.len()])
    }

    /// Count the faces of the current rotation system by walking every dart
    /// (an adjacency entry, read as leaving its node) exactly once.
    pub fn count_faces(&self) -> usize {
        let mut seen :HashSet<AdjEntry> = HashSet::new();
        let mut faces = 0;
        for v in self.nodes() {
            for &start in &self.adjacency[v] {
                if seen.contains(&start) { continue; }
                faces += 1;
                let mut dart = start;
                while seen.insert(dart) {
                    // Arrive at the other end and turn to the next entry there.
                    let w = dart.twin_node(self);
                    let arrival = AdjEntry { node: w, edge: dart.edge };
                    dart = match self.cyclic_succ(arrival) {
                        Some(d) => d,
                        None => break,
                    };
                }
            }
        }
        faces
    }
}

/// A copy of an original graph containing all of its nodes and a subset of its
/// edges.
#[derive(Debug, Clone)]
pub struct GraphCopy {
    pub graph :Graph,
    original :Graph,
    orig_edge :Vec<EdgeRef>,
    copy_edge :Vec<Option<EdgeRef>>,
}

impl GraphCopy {
    /// Copy all nodes of `original` and those edges for which `keep` holds.
    pub fn new<F :Fn(EdgeRef) -> bool>(original :&Graph, keep :F) -> Self {
        let mut graph = Graph::new();
        for _ in original.nodes() { graph.add_node(); }
        let mut orig_edge = Vec::new();
        let mut copy_edge = vec![None; original.num_edges()];
        for e in original.edges() {
            if !keep(e) { continue; }
            let Edge { source, target } = *original.edge(e);
            copy_edge[e] = Some(graph.add_edge(source, target));
            orig_edge.push(e);
        }
        GraphCopy { graph, original: original.clone(), orig_edge, copy_edge }
    }

    pub fn original(&self) -> &Graph { &self.original }

    /// Node of the copy representing an original node. Copies keep all nodes
    /// in their original order.
    pub fn copy_node(&self, v :NodeRef) -> NodeRef { v }

    pub fn copy_edge(&self, e :EdgeRef) -> Option<EdgeRef> { self.copy_edge[e] }
    pub fn orig_edge(&self, e :EdgeRef) -> EdgeRef { self.orig_edge[e] }

    /// Endpoints (as copy nodes) of original edges that have no copy.
    pub fn missing_original_edges(&self) -> Vec<(NodeRef, NodeRef)> {
        self.original.edges()
            .filter(|e| self.copy_edge[*e].is_none())
            .map(|e| {
                let Edge { source, target } = *self.original.edge(e);
                (self.copy_node(source), self.copy_node(target))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_entries_at_both_ends() {
        let g = Graph::from_edges(3, &[(0,1),(0,2),(1,2)]);
        assert_eq!(g.degree(0), 2);
        assert_eq!(g.out_degree(0), 2);
        assert_eq!(g.in_degree(2), 2);
        assert_eq!(g.adj(1)[0].twin_node(&g), 0);
        assert!(!g.adj(1)[0].is_outgoing(&g));
    }

    #[test]
    #[should_panic(expected = "edge endpoint out of range")]
    fn add_edge_to_unknown_node_panics() {
        let mut g = Graph::from_edges(2, &[]);
        g.add_edge(0, 2);
    }

    #[test]
    fn set_adj_order_rejects_foreign_entries() {
        let mut g = Graph::from_edges(3, &[(0,1),(0,2)]);
        let bad = vec![AdjEntry { node: 0, edge: 0 }, AdjEntry { node: 0, edge: 0 }];
        assert!(g.set_adj_order(0, bad).is_err());
        let good = vec![AdjEntry { node: 0, edge: 1 }, AdjEntry { node: 0, edge: 0 }];
        assert!(g.set_adj_order(0, good).is_ok());
        assert_eq!(g.adj(0)[0].edge, 1);
    }

    #[test]
    fn faces_of_a_triangle_and_a_path() {
        let g = Graph::from_edges(3, &[(0,1),(1,2),(0,2)]);
        assert_eq!(g.count_faces(), 2);
        let p = Graph::from_edges(3, &[(0,1),(1,2)]);
        assert_eq!(p.count_faces(), 1);
    }

    #[test]
    fn copy_reports_missing_edges() {
        let g = Graph::from_edges(3, &[(0,1),(1,2),(0,2)]);
        let c = GraphCopy::new(&g, |e| e != 2);
        assert_eq!(c.graph.num_edges(), 2);
        assert_eq!(c.copy_edge(2), None);
        assert_eq!(c.orig_edge(1), 1);
        assert_eq!(c.missing_original_edges(), vec![(0,2)]);
    }
}
