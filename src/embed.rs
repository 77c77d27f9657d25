//! Strategy selection and decoding of models into orders and rotation systems.

use crate::error::UpSatError;
use crate::graph::{AdjEntry, Graph, NodeRef};
use crate::index::{GraphIndex, Structure};
use crate::sat::Model;
use crate::variables::{Scope, Variables};
use log::{debug, trace};

/// How a test is carried out. Chosen from the graph's shape before solving.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Ordered embedding: order, rotation and selection variables over the
    /// whole graph. The only formulation a rotation system is read from directly.
    OrdinaryEmbedding,
    /// Order and selection variables with the Tutte closure. Decides, but
    /// cannot embed.
    FastFeasibilityOnly,
    /// Ordered embedding with every connected component encoded on its own.
    HybridFallback,
}

impl Strategy {
    pub fn scope(&self) -> Scope {
        match self {
            Strategy::HybridFallback => Scope::PerComponent,
            _ => Scope::Global,
        }
    }

    pub fn uses_rotation(&self) -> bool {
        match self {
            Strategy::FastFeasibilityOnly => false,
            _ => true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Purpose { Test, Embed }

pub fn classify(structure :&Structure, purpose :Purpose, fast_feasibility :bool) -> Strategy {
    if structure.edges == 0 {
        return Strategy::FastFeasibilityOnly;
    }
    if purpose == Purpose::Test && fast_feasibility {
        return Strategy::FastFeasibilityOnly;
    }
    if structure.components > 1 {
        return Strategy::HybridFallback;
    }
    Strategy::OrdinaryEmbedding
}

/// Rank every item by how many other items precede it. The ranks must form a
/// permutation of `0..items.len()`; anything else is a tie or a cycle.
fn ranks_by<F>(items :&[usize], precedes :F, what :&str) -> Result<Vec<usize>, UpSatError>
    where F :Fn(usize, usize) -> Result<bool, UpSatError>
{
    let mut ranks = Vec::with_capacity(items.len());
    for &x in items {
        let mut r = 0;
        for &y in items {
            if x == y { continue; }
            let (xy, yx) = (precedes(x,y)?, precedes(y,x)?);
            if xy == yx {
                return Err(UpSatError::Extraction(format!("{} {} and {} are not ordered.", what, x, y)));
            }
            if yx { r += 1; }
        }
        ranks.push(r);
    }
    let mut seen = vec![false; items.len()];
    for &r in &ranks {
        if seen[r] {
            return Err(UpSatError::Extraction(format!("The {} order in the model has a cycle.", what)));
        }
        seen[r] = true;
    }
    Ok(ranks)
}

/// Position of every node in the upward order of the model. Components that
/// were encoded separately are stacked in order of their smallest node, or,
/// when the caller fixed an order, interleaved by the caller's ranks.
pub fn node_order(index :&GraphIndex, vars :&Variables, model :&Model, scope :Scope,
                  fixed :Option<&[usize]>) -> Result<Vec<usize>, UpSatError> {
    let n = index.num_nodes();
    let groups :Vec<Vec<NodeRef>> = match scope {
        Scope::Global => vec![(0..n).collect()],
        Scope::PerComponent => {
            let mut groups = vec![Vec::new(); index.num_components()];
            for v in 0..n { groups[index.component(v)].push(v); }
            groups
        },
    };

    let mut local = vec![0; n];
    let mut order = vec![0; n];
    let mut offset = 0;
    for group in &groups {
        let ranks = ranks_by(group, |u,v| Ok(model.lit_value(vars.order(u,v)?)), "Node")?;
        for (v,r) in group.iter().zip(ranks.iter()) {
            local[*v] = *r;
            order[*v] = offset + r;
        }
        offset += group.len();
    }

    // Pins across components carry no clauses; any interleaving of the
    // components is upward, so take the one the caller asked for.
    if let (Scope::PerComponent, Some(fixed)) = (scope, fixed) {
        let mut nodes = (0..n).collect::<Vec<_>>();
        nodes.sort_by_key(|v| (fixed[*v], local[*v], index.component(*v)));
        for (pos, v) in nodes.into_iter().enumerate() { order[v] = pos; }
    }
    trace!("node order {:?}", order);
    Ok(order)
}

/// Clockwise rotation at `v`: out-entries left to right, then in-entries
/// right to left.
pub fn sort_by_rotation(graph :&Graph, v :NodeRef, vars :&Variables, model :&Model) -> Result<Vec<AdjEntry>, UpSatError> {
    let left_of = |e :usize, f :usize| -> Result<bool, UpSatError> { Ok(model.lit_value(vars.rotation(e,f)?)) };
    let (outgoing, incoming) :(Vec<AdjEntry>, Vec<AdjEntry>) =
        graph.adj(v).iter().partition(|a| a.is_outgoing(graph));

    let mut rotation = Vec::with_capacity(graph.degree(v));
    for (entries, reverse) in vec![(outgoing, false), (incoming, true)] {
        let edges = entries.iter().map(|a| a.edge).collect::<Vec<_>>();
        let ranks = ranks_by(&edges, &left_of, "Edge")?;
        let perm = permutation::sort_by_key(&ranks[..], |r| if reverse { edges.len() - r } else { *r });
        rotation.extend(perm.apply_slice(entries));
    }
    Ok(rotation)
}

/// Write the rotation system of the model into `graph` and return the
/// adjacency entry that has the outer face on its right. With `verify`, the
/// rotation system must pass Euler's formula. `graph` is only written when
/// every step succeeds.
pub fn embed_from_model(graph :&mut Graph, index :&GraphIndex, vars :&Variables, model :&Model,
                        scope :Scope, fixed :Option<&[usize]>, verify :bool) -> Result<AdjEntry, UpSatError> {
    let order = node_order(index, vars, model, scope, fixed)?;
    let rotations = graph.nodes()
        .map(|v| sort_by_rotation(&*graph, v, vars, model))
        .collect::<Result<Vec<_>, _>>()?;

    let mut embedded = graph.clone();
    for (v, rotation) in rotations.into_iter().enumerate() {
        embedded.set_adj_order(v, rotation).map_err(UpSatError::Extraction)?;
    }
    if verify {
        verify_planar_rotation(&embedded)?;
    }

    // The lowest node with an edge is a source of its component with nothing
    // below it; the outer face touches it on both sides of its out-edges.
    let bottom = embedded.nodes()
        .filter(|v| embedded.degree(*v) > 0)
        .min_by_key(|v| order[*v])
        .ok_or_else(|| UpSatError::Extraction(format!("No node with an edge to bound the outer face.")))?;
    let external = embedded.adj(bottom).iter()
        .filter(|a| a.is_outgoing(&embedded))
        .last().cloned()
        .ok_or_else(|| UpSatError::Extraction(format!("Lowest node {} has no outgoing edge.", bottom)))?;
    debug!("Outer face lies right of edge {} at node {}", external.edge, external.node);
    *graph = embedded;
    Ok(external)
}

/// Euler's formula on every connected component with edges.
pub fn verify_planar_rotation(graph :&Graph) -> Result<(), UpSatError> {
    use disjoint_sets::UnionFind;
    let mut uf = UnionFind::new(graph.num_nodes());
    for e in graph.edges() { uf.union(graph.source(e), graph.target(e)); }
    let mut roots = graph.nodes()
        .filter(|v| graph.degree(*v) > 0)
        .map(|v| uf.find(v))
        .collect::<Vec<_>>();
    roots.sort();
    roots.dedup();
    let components = roots.len() as isize;
    let nodes = graph.nodes().filter(|v| graph.degree(*v) > 0).count() as isize;
    let edges = graph.num_edges() as isize;
    let faces = graph.count_faces() as isize;
    if nodes - edges + faces != 2 * components {
        return Err(UpSatError::Extraction(format!(
            "Rotation system is not planar: V={} E={} F={} over {} component(s).", nodes, edges, faces, components)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(edges :usize, components :usize) -> Structure {
        Structure { nodes: 4, edges, components, isolated: 0, sources: 1, sinks: 1 }
    }

    #[test]
    fn classification() {
        assert_eq!(classify(&structure(0, 4), Purpose::Embed, false), Strategy::FastFeasibilityOnly);
        assert_eq!(classify(&structure(3, 1), Purpose::Test, true), Strategy::FastFeasibilityOnly);
        assert_eq!(classify(&structure(3, 1), Purpose::Embed, true), Strategy::OrdinaryEmbedding);
        assert_eq!(classify(&structure(2, 2), Purpose::Embed, false), Strategy::HybridFallback);
        assert_eq!(classify(&structure(3, 1), Purpose::Test, false), Strategy::OrdinaryEmbedding);
    }

    #[test]
    fn ranks_detect_cycles_and_ties() {
        let lt = |a :usize, b :usize| Ok(a < b);
        assert_eq!(ranks_by(&[2,0,1], lt, "Node").unwrap(), vec![2,0,1]);

        // 0 < 1 < 2 < 0
        let cyclic = |a :usize, b :usize| Ok((a + 1) % 3 == b);
        assert!(ranks_by(&[0,1,2], cyclic, "Node").is_err());

        let tie = |_a :usize, _b :usize| Ok(false);
        assert!(ranks_by(&[0,1], tie, "Node").is_err());
    }

    #[test]
    fn euler_check_rejects_crossing_rotation() {
        // K4 with a rotation that is not planar.
        let mut g = Graph::from_edges(4, &[(0,1),(0,2),(0,3),(1,2),(1,3),(2,3)]);
        let rot = |g :&Graph, v :usize, edges :&[usize]| -> Vec<AdjEntry> {
            edges.iter().map(|e| AdjEntry { node: v, edge: *e }).filter(|a| g.adj(v).contains(a)).collect()
        };
        let r0 = rot(&g, 0, &[0,1,2]);
        let r1 = rot(&g, 1, &[0,3,4]);
        let r2 = rot(&g, 2, &[1,3,5]);
        let r3 = rot(&g, 3, &[2,4,5]);
        g.set_adj_order(0, r0).unwrap();
        g.set_adj_order(1, r1).unwrap();
        g.set_adj_order(2, r2).unwrap();
        g.set_adj_order(3, r3).unwrap();
        assert!(verify_planar_rotation(&g).is_err());

        let planar = Graph::from_edges(3, &[(0,1),(1,2),(0,2)]);
        assert!(verify_planar_rotation(&planar).is_ok());

        // Two triangles side by side and an isolated node.
        let two = Graph::from_edges(7, &[(0,1),(1,2),(0,2),(3,4),(4,5),(3,5)]);
        assert!(verify_planar_rotation(&two).is_ok());
    }
}
