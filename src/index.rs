//! Dense indexing of the input graph and the dominating-edge table.
//!
//! Everything here is structural: no Boolean variables are involved. The
//! reachability relation decides which node/edge pairs can share a level in
//! some upward order, and therefore which pairs need variables at all.

use crate::error::UpSatError;
use crate::graph::{EdgeRef, Graph, NodeRef};
use std::collections::HashMap;
use log::{debug, trace};

/// Dense reachability matrix: `reach[u][v]` iff a directed path of length at
/// least one leads from `u` to `v`. One depth-first search per node.
pub fn reachability(n :usize, ends :&[(NodeRef, NodeRef)]) -> Vec<Vec<bool>> {
    let mut succ = vec![Vec::new(); n];
    for &(a,b) in ends { succ[a].push(b); }
    let mut reach = vec![vec![false; n]; n];
    for s in 0..n {
        let mut stack = succ[s].clone();
        while let Some(v) = stack.pop() {
            if reach[s][v] { continue; }
            reach[s][v] = true;
            stack.extend(succ[v].iter().cloned().filter(|w| !reach[s][*w]));
        }
    }
    reach
}

/// Shape summary used to pick a strategy before any solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Structure {
    pub nodes :usize,
    pub edges :usize,
    pub components :usize,
    pub isolated :usize,
    pub sources :usize,
    pub sinks :usize,
}

/// Dense identities, incidences, reachability and components of one graph.
#[derive(Debug, Clone)]
pub struct GraphIndex {
    n :usize,
    ends :Vec<(NodeRef, NodeRef)>,
    reach :Vec<Vec<bool>>,
    component :Vec<usize>,
    num_components :usize,
    feasible :Vec<(NodeRef, NodeRef)>,
    structure :Structure,
}

impl GraphIndex {
    /// Index `graph`. `feasible` lists extra node pairs `(u,v)` that the order
    /// must respect (original edges missing from a graph copy).
    pub fn build(graph :&Graph, feasible :&[(NodeRef, NodeRef)]) -> Result<Self, UpSatError> {
        let n = graph.num_nodes();
        let ends = graph.edges().map(|e| (graph.source(e), graph.target(e))).collect::<Vec<_>>();

        if let Some(e) = ends.iter().position(|(a,b)| a == b) {
            return Err(UpSatError::Precondition(format!("Edge {} is a self-loop.", e)));
        }
        if let Some((a,b)) = feasible.iter().find(|(a,b)| a == b || *a >= n || *b >= n) {
            return Err(UpSatError::Precondition(format!("Invalid feasible edge ({},{}).", a, b)));
        }

        let reach = reachability(n, &ends);
        if let Some(v) = (0..n).find(|v| reach[*v][*v]) {
            return Err(UpSatError::Precondition(format!("The graph has a directed cycle through node {}.", v)));
        }

        let mut incident = vec![Vec::new(); n];
        for (e,(a,b)) in ends.iter().enumerate() {
            incident[*a].push(e);
            incident[*b].push(e);
        }

        let (component, num_components) = {
            use disjoint_sets::UnionFind;
            let mut uf = UnionFind::new(n);
            for (a,b) in ends.iter().chain(feasible.iter()) { uf.union(*a,*b); }
            let mut ids :HashMap<usize,usize> = HashMap::new();
            let component = (0..n).map(|v| {
                let next = ids.len();
                *ids.entry(uf.find(v)).or_insert(next)
            }).collect::<Vec<_>>();
            (component, ids.len())
        };

        let structure = Structure {
            nodes: n,
            edges: ends.len(),
            components: num_components,
            isolated: (0..n).filter(|v| incident[*v].is_empty()).count(),
            sources: (0..n).filter(|v| !incident[*v].is_empty() && graph.in_degree(*v) == 0).count(),
            sinks: (0..n).filter(|v| !incident[*v].is_empty() && graph.out_degree(*v) == 0).count(),
        };
        debug!("Graph structure: {:?}", structure);

        Ok(GraphIndex { n, ends, reach, component, num_components,
                        feasible: feasible.to_vec(), structure })
    }

    pub fn num_nodes(&self) -> usize { self.n }
    pub fn num_edges(&self) -> usize { self.ends.len() }

    pub fn source(&self, e :EdgeRef) -> NodeRef { self.ends[e].0 }
    pub fn target(&self, e :EdgeRef) -> NodeRef { self.ends[e].1 }
    pub fn ends(&self, e :EdgeRef) -> (NodeRef, NodeRef) { self.ends[e] }

    /// Directed path of length at least one from `u` to `v`.
    pub fn reaches(&self, u :NodeRef, v :NodeRef) -> bool { self.reach[u][v] }

    pub fn reaches_or_eq(&self, u :NodeRef, v :NodeRef) -> bool { u == v || self.reach[u][v] }

    pub fn component(&self, v :NodeRef) -> usize { self.component[v] }
    pub fn num_components(&self) -> usize { self.num_components }

    /// Pairs the order has to respect in addition to the edges.
    pub fn feasible_pairs(&self) -> &[(NodeRef, NodeRef)] { &self.feasible }

    pub fn structure(&self) -> &Structure { &self.structure }

    /// Whether `w` can lie strictly between the endpoints of `g` in some upward order.
    pub fn is_pivot(&self, g :EdgeRef, w :NodeRef) -> bool {
        let (s,t) = self.ends[g];
        w != s && w != t && !self.reaches_or_eq(w, s) && !self.reaches_or_eq(t, w)
    }

    /// Whether `e` and `f` are forced apart: one ends where (or below where) the
    /// other one starts.
    pub fn separated(&self, e :EdgeRef, f :EdgeRef) -> bool {
        self.reaches_or_eq(self.target(e), self.source(f)) ||
            self.reaches_or_eq(self.target(f), self.source(e))
    }

    pub fn independent(&self, e :EdgeRef, f :EdgeRef) -> bool {
        let (a,b) = self.ends[e];
        let (c,d) = self.ends[f];
        a != c && a != d && b != c && b != d
    }
}

/// For each edge `e`, the edges whose left/right placement relative to `e`
/// has to be decided: the edges that share a level with `e` in at least one
/// upward order. The relation is symmetric.
#[derive(Debug, Clone)]
pub struct DominatingEdges {
    table :Vec<Vec<EdgeRef>>,
    matrix :Vec<Vec<bool>>,
}

impl DominatingEdges {
    pub fn compute(index :&GraphIndex) -> Self {
        let m = index.num_edges();
        let mut table = vec![Vec::new(); m];
        let mut matrix = vec![vec![false; m]; m];
        for e in 0..m {
            for f in 0..m {
                if e == f || index.separated(e, f) { continue; }
                table[e].push(f);
                matrix[e][f] = true;
            }
            trace!("D[{}] = {:?}", e, table[e]);
        }
        debug!("Dominating-edge table has {} pairs", table.iter().map(|d| d.len()).sum::<usize>());
        DominatingEdges { table, matrix }
    }

    pub fn get(&self, e :EdgeRef) -> &[EdgeRef] { &self.table[e] }

    pub fn contains(&self, e :EdgeRef, f :EdgeRef) -> bool { self.matrix[e][f] }

    /// All ordered dominating pairs `(e,f)`.
    pub fn pairs<'a>(&'a self) -> impl Iterator<Item=(EdgeRef, EdgeRef)> + 'a {
        self.table.iter().enumerate().flat_map(|(e,d)| d.iter().map(move |f| (e,*f)))
    }
}
