//! The three variable families of the encoding, kept in one id space.
//!
//!  * `Order(i,j)`: node `i` lies below node `j`.
//!  * `Rotation(e,f)`: edge `e` lies left of edge `f` wherever both cross the
//!    same horizontal line.
//!  * `Selection(g,w)`: edge `g` passes node `w` on its left side.

use crate::error::UpSatError;
use crate::index::{DominatingEdges, GraphIndex};
use crate::sat::{lit, Formula, Lit, Var};
use std::collections::HashMap;
use log::debug;

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Family { Order, Rotation, Selection }

#[derive(Debug, Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarKey {
    pub family :Family,
    pub i :usize,
    pub j :usize,
}

/// Which pairs of nodes may be related by variables. The hybrid strategy
/// encodes every connected component on its own.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope { Global, PerComponent }

impl Scope {
    pub fn nodes_related(&self, index :&GraphIndex, u :usize, v :usize) -> bool {
        match self {
            Scope::Global => true,
            Scope::PerComponent => index.component(u) == index.component(v),
        }
    }

    pub fn edges_related(&self, index :&GraphIndex, e :usize, f :usize) -> bool {
        self.nodes_related(index, index.source(e), index.source(f))
    }
}

#[derive(Debug, Default)]
pub struct Variables {
    ids :HashMap<VarKey, Var>,
}

impl Variables {
    pub fn new() -> Self { Variables::default() }

    /// Id for `key`, allocating a fresh solver variable the first time.
    pub fn allocate(&mut self, formula :&mut Formula, key :VarKey) -> Var {
        *self.ids.entry(key).or_insert_with(|| formula.new_var())
    }

    pub fn get(&self, key :VarKey) -> Result<Var, UpSatError> {
        self.ids.get(&key).cloned()
            .ok_or(UpSatError::MissingVariable { family: key.family, i: key.i, j: key.j })
    }

    pub fn contains(&self, key :VarKey) -> bool { self.ids.contains_key(&key) }

    pub fn len(&self) -> usize { self.ids.len() }

    pub fn clear(&mut self) { self.ids.clear(); }

    pub fn order(&self, i :usize, j :usize) -> Result<Lit, UpSatError> {
        Ok(lit(self.get(VarKey { family: Family::Order, i, j })?, true))
    }

    pub fn rotation(&self, e :usize, f :usize) -> Result<Lit, UpSatError> {
        Ok(lit(self.get(VarKey { family: Family::Rotation, i: e, j: f })?, true))
    }

    pub fn selection(&self, g :usize, w :usize) -> Result<Lit, UpSatError> {
        Ok(lit(self.get(VarKey { family: Family::Selection, i: g, j: w })?, true))
    }

    pub fn has_selection(&self, g :usize, w :usize) -> bool {
        self.contains(VarKey { family: Family::Selection, i: g, j: w })
    }

    /// One order variable per ordered pair of distinct related nodes.
    pub fn compute_order(&mut self, formula :&mut Formula, index :&GraphIndex, scope :Scope) {
        let n = index.num_nodes();
        for i in 0..n {
            for j in 0..n {
                if i == j || !scope.nodes_related(index, i, j) { continue; }
                self.allocate(formula, VarKey { family: Family::Order, i, j });
            }
        }
        debug!("Allocated order variables, {} in total", self.len());
    }

    /// One rotation variable per ordered dominating pair.
    pub fn compute_rotation(&mut self, formula :&mut Formula, index :&GraphIndex,
                            dominating :&DominatingEdges, scope :Scope) {
        for (e,f) in dominating.pairs() {
            if !scope.edges_related(index, e, f) { continue; }
            self.allocate(formula, VarKey { family: Family::Rotation, i: e, j: f });
        }
        debug!("Allocated rotation variables, {} in total", self.len());
    }

    /// One selection variable per edge `g` and pivot `w` of `g` that is an
    /// endpoint of an edge dominating `g`.
    pub fn compute_selection(&mut self, formula :&mut Formula, index :&GraphIndex,
                             dominating :&DominatingEdges, scope :Scope) {
        for (g,f) in dominating.pairs() {
            if !scope.edges_related(index, g, f) { continue; }
            let (a,b) = index.ends(f);
            for w in [a,b].iter().cloned() {
                if index.is_pivot(g, w) {
                    self.allocate(formula, VarKey { family: Family::Selection, i: g, j: w });
                }
            }
        }
        debug!("Allocated selection variables, {} in total", self.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;

    #[test]
    fn allocation_is_idempotent() {
        let mut f = Formula::new();
        let mut vars = Variables::new();
        let k = VarKey { family: Family::Order, i: 0, j: 1 };
        let a = vars.allocate(&mut f, k);
        let b = vars.allocate(&mut f, k);
        assert_eq!(a, b);
        assert_eq!(f.num_vars(), 1);
        assert!(vars.get(VarKey { family: Family::Order, i: 1, j: 0 }).is_err());
    }

    #[test]
    fn families_on_a_diamond() {
        let g = Graph::from_edges(4, &[(0,1),(0,2),(1,3),(2,3)]);
        let index = GraphIndex::build(&g, &[]).unwrap();
        let d = DominatingEdges::compute(&index);
        let mut f = Formula::new();
        let mut vars = Variables::new();
        vars.compute_order(&mut f, &index, Scope::Global);
        assert_eq!(vars.len(), 12);
        vars.compute_rotation(&mut f, &index, &d, Scope::Global);
        // dominating pairs: {0,1} {0,3} {1,2} {2,3}, both directions
        assert_eq!(vars.len(), 12 + 8);
        vars.compute_selection(&mut f, &index, &d, Scope::Global);
        assert!(vars.has_selection(1, 1));
        assert!(vars.has_selection(3, 1));
        assert!(vars.has_selection(0, 2));
        assert!(vars.has_selection(2, 2));
        assert_eq!(f.num_vars(), vars.len());
    }

    #[test]
    fn per_component_scope_skips_cross_pairs() {
        let g = Graph::from_edges(4, &[(0,1),(2,3)]);
        let index = GraphIndex::build(&g, &[]).unwrap();
        let d = DominatingEdges::compute(&index);
        let mut f = Formula::new();
        let mut vars = Variables::new();
        vars.compute_order(&mut f, &index, Scope::PerComponent);
        vars.compute_rotation(&mut f, &index, &d, Scope::PerComponent);
        vars.compute_selection(&mut f, &index, &d, Scope::PerComponent);
        assert_eq!(vars.len(), 4);
        assert!(vars.order(0, 2).is_err());
    }
}
