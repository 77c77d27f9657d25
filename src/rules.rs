//! Clause generation.
//!
//! Groups are emitted in a fixed order (order transitivity, rotation
//! transitivity, upward, planarity, Tutte closure, fixed order); each one only
//! appends to the formula. A group whose variable family is not in use by the
//! current strategy emits nothing.
//!
//! Picture a drawing where every node sits on its own horizontal line and every
//! edge is a curve going strictly up. Order variables give the heights,
//! rotation variables the left-to-right order of edges crossing a common
//! line, and selection variables the side on which an edge passes a node that
//! lies between its endpoints.

use crate::error::UpSatError;
use crate::index::{DominatingEdges, GraphIndex};
use crate::sat::{Formula, Lit};
use crate::variables::{Scope, Variables};
use log::debug;

pub struct RuleEngine<'a> {
    pub index :&'a GraphIndex,
    pub dominating :&'a DominatingEdges,
    pub vars :&'a Variables,
    pub scope :Scope,
}

impl<'a> RuleEngine<'a> {
    fn tau(&self, i :usize, j :usize) -> Result<Lit, UpSatError> { self.vars.order(i,j) }
    fn sigma(&self, e :usize, f :usize) -> Result<Lit, UpSatError> { self.vars.rotation(e,f) }
    fn mu(&self, g :usize, w :usize) -> Result<Lit, UpSatError> { self.vars.selection(g,w) }

    /// Exactly one direction per pair and transitivity over every triple.
    pub fn tau_transitive(&self, formula :&mut Formula) -> Result<(), UpSatError> {
        let n = self.index.num_nodes();
        let related = |a :usize, b :usize| a != b && self.scope.nodes_related(self.index, a, b);
        for i in 0..n {
            for j in (i+1)..n {
                if !related(i,j) { continue; }
                formula.add_clause(&[self.tau(i,j)?, self.tau(j,i)?]);
                formula.add_clause(&[!self.tau(i,j)?, !self.tau(j,i)?]);
            }
        }
        for i in 0..n {
            for j in 0..n {
                if !related(i,j) { continue; }
                for k in 0..n {
                    if k == i || !related(j,k) { continue; }
                    formula.add_clause(&[!self.tau(i,j)?, !self.tau(j,k)?, self.tau(i,k)?]);
                }
            }
        }
        debug!("Order transitivity: {} clauses so far", formula.num_clauses());
        Ok(())
    }

    /// The left-of relation is a strict total order on every set of edges
    /// that pairwise dominate each other.
    pub fn sigma_transitive(&self, formula :&mut Formula) -> Result<(), UpSatError> {
        let m = self.index.num_edges();
        let related = |e :usize, f :usize| self.dominating.contains(e,f) && self.scope.edges_related(self.index, e, f);
        for e in 0..m {
            for &f in self.dominating.get(e) {
                if f < e || !related(e,f) { continue; }
                formula.add_clause(&[self.sigma(e,f)?, self.sigma(f,e)?]);
                formula.add_clause(&[!self.sigma(e,f)?, !self.sigma(f,e)?]);
            }
        }
        for e in 0..m {
            for &f in self.dominating.get(e) {
                if !related(e,f) { continue; }
                for &g in self.dominating.get(f) {
                    if g == e || !related(e,g) { continue; }
                    formula.add_clause(&[!self.sigma(e,f)?, !self.sigma(f,g)?, self.sigma(e,g)?]);
                }
            }
        }
        debug!("Rotation transitivity: {} clauses so far", formula.num_clauses());
        Ok(())
    }

    /// Every edge (and every feasible original edge) points up.
    pub fn upward(&self, formula :&mut Formula) -> Result<(), UpSatError> {
        for e in 0..self.index.num_edges() {
            let (u,v) = self.index.ends(e);
            formula.add_clause(&[self.tau(u,v)?]);
        }
        for &(u,v) in self.index.feasible_pairs() {
            formula.add_clause(&[self.tau(u,v)?]);
        }
        debug!("Upward: {} clauses so far", formula.num_clauses());
        Ok(())
    }

    /// If `w` lies strictly between the endpoints of `g`, then `g` is on the
    /// side of `w` chosen by the selection variable, for every edge at `w`.
    pub fn planarity(&self, formula :&mut Formula) -> Result<(), UpSatError> {
        for (g,f) in self.dominating.pairs() {
            if !self.scope.edges_related(self.index, g, f) { continue; }
            let (s,t) = self.index.ends(g);
            let (a,b) = self.index.ends(f);
            for w in [a,b].iter().cloned() {
                if !self.index.is_pivot(g, w) { continue; }
                let between = [!self.tau(s,w)?, !self.tau(w,t)?];
                let left = self.mu(g,w)?;
                formula.add_clause(&[between[0], between[1], !left, self.sigma(g,f)?]);
                formula.add_clause(&[between[0], between[1], left, self.sigma(f,g)?]);
            }
        }
        debug!("Planarity: {} clauses so far", formula.num_clauses());
        Ok(())
    }

    /// Monotone Hanani-Tutte closure: independent edges whose spans overlap
    /// cross an even number of times, where the parity is read off the sides
    /// on which each edge passes the other one's endpoints.
    pub fn tutte(&self, formula :&mut Formula) -> Result<(), UpSatError> {
        for (e,f) in self.dominating.pairs() {
            if f < e || !self.index.independent(e,f) { continue; }
            if !self.scope.edges_related(self.index, e, f) { continue; }
            let (a,b) = self.index.ends(e);
            let (c,d) = self.index.ends(f);

            // f nested in e: a < c, d < b.
            self.parity(formula, &[(a,c),(d,b)], (e,c), (e,d), true)?;
            // e nested in f: c < a, b < d.
            self.parity(formula, &[(c,a),(b,d)], (f,a), (f,b), true)?;
            // e starts first: a < c < b < d.
            self.parity(formula, &[(a,c),(c,b),(b,d)], (e,c), (f,b), false)?;
            // f starts first: c < a < d < b.
            self.parity(formula, &[(c,a),(a,d),(d,b)], (f,a), (e,d), false)?;
        }
        debug!("Tutte closure: {} clauses so far", formula.num_clauses());
        Ok(())
    }

    /// Under the order premise, `mu(x) == mu(y)` if `equal`, else `mu(x) != mu(y)`.
    /// Skipped when a selection variable is missing, since the premise can then
    /// never hold.
    fn parity(&self, formula :&mut Formula, premise :&[(usize,usize)],
              x :(usize,usize), y :(usize,usize), equal :bool) -> Result<(), UpSatError> {
        if !self.vars.has_selection(x.0, x.1) || !self.vars.has_selection(y.0, y.1) {
            return Ok(());
        }
        let mut body = Vec::with_capacity(premise.len() + 2);
        for &(u,v) in premise { body.push(!self.tau(u,v)?); }
        let (mx, my) = (self.mu(x.0, x.1)?, self.mu(y.0, y.1)?);
        let my = if equal { my } else { !my };
        let mut c1 = body.clone();
        c1.extend_from_slice(&[!mx, my]);
        let mut c2 = body;
        c2.extend_from_slice(&[mx, !my]);
        formula.add_clause(&c1);
        formula.add_clause(&c2);
        Ok(())
    }

    /// Pin the order of every related pair whose ranks differ.
    pub fn fixed(&self, formula :&mut Formula, ranks :&[usize]) -> Result<(), UpSatError> {
        let n = self.index.num_nodes();
        for i in 0..n {
            for j in 0..n {
                if i == j || !self.scope.nodes_related(self.index, i, j) { continue; }
                if ranks[i] < ranks[j] {
                    formula.add_clause(&[self.tau(i,j)?]);
                }
            }
        }
        debug!("Fixed order: {} clauses so far", formula.num_clauses());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Graph;
    use crate::sat::{SatBackend, Varisat};

    struct Encoded {
        index :GraphIndex,
        dominating :DominatingEdges,
        vars :Variables,
        formula :Formula,
    }

    fn encode(g :&Graph) -> Encoded {
        let index = GraphIndex::build(g, &[]).unwrap();
        let dominating = DominatingEdges::compute(&index);
        let mut formula = Formula::new();
        let mut vars = Variables::new();
        vars.compute_order(&mut formula, &index, Scope::Global);
        vars.compute_rotation(&mut formula, &index, &dominating, Scope::Global);
        vars.compute_selection(&mut formula, &index, &dominating, Scope::Global);
        Encoded { index, dominating, vars, formula }
    }

    #[test]
    fn single_edge_clause_count() {
        let g = Graph::from_edges(2, &[(0,1)]);
        let mut enc = encode(&g);
        let rules = RuleEngine { index: &enc.index, dominating: &enc.dominating, vars: &enc.vars, scope: Scope::Global };
        rules.tau_transitive(&mut enc.formula).unwrap();
        assert_eq!(enc.formula.num_clauses(), 2);
        rules.upward(&mut enc.formula).unwrap();
        assert_eq!(enc.formula.num_clauses(), 3);
    }

    #[test]
    fn order_rules_force_topological_order() {
        //  0 -> 1 -> 2
        let g = Graph::from_edges(3, &[(0,1),(1,2)]);
        let mut enc = encode(&g);
        let rules = RuleEngine { index: &enc.index, dominating: &enc.dominating, vars: &enc.vars, scope: Scope::Global };
        rules.tau_transitive(&mut enc.formula).unwrap();
        rules.upward(&mut enc.formula).unwrap();
        let model = Varisat.solve(&enc.formula).unwrap().unwrap();
        assert!(model.lit_value(enc.vars.order(0,2).unwrap()));
        assert!(!model.lit_value(enc.vars.order(2,0).unwrap()));
    }

    #[test]
    fn fixed_order_against_an_edge_is_unsat() {
        let g = Graph::from_edges(2, &[(0,1)]);
        let mut enc = encode(&g);
        let rules = RuleEngine { index: &enc.index, dominating: &enc.dominating, vars: &enc.vars, scope: Scope::Global };
        rules.tau_transitive(&mut enc.formula).unwrap();
        rules.upward(&mut enc.formula).unwrap();
        rules.fixed(&mut enc.formula, &[1,0]).unwrap();
        assert!(Varisat.solve(&enc.formula).unwrap().is_none());
    }

    fn satisfiable(g :&Graph, scope :Scope) -> bool {
        let index = GraphIndex::build(g, &[]).unwrap();
        let dominating = DominatingEdges::compute(&index);
        let mut formula = Formula::new();
        let mut vars = Variables::new();
        vars.compute_order(&mut formula, &index, scope);
        vars.compute_rotation(&mut formula, &index, &dominating, scope);
        vars.compute_selection(&mut formula, &index, &dominating, scope);
        let rules = RuleEngine { index: &index, dominating: &dominating, vars: &vars, scope };
        rules.tau_transitive(&mut formula).unwrap();
        rules.sigma_transitive(&mut formula).unwrap();
        rules.upward(&mut formula).unwrap();
        rules.planarity(&mut formula).unwrap();
        Varisat.solve(&formula).unwrap().is_some()
    }

    #[test]
    fn component_scopes_agree_with_global_scope() {
        // diamond beside a single edge
        let planar = Graph::from_edges(6, &[(0,1),(0,2),(1,3),(2,3),(4,5)]);
        assert!(satisfiable(&planar, Scope::Global));
        assert!(satisfiable(&planar, Scope::PerComponent));

        // K3,3 beside a single edge
        let k33 = Graph::from_edges(8, &[(0,3),(0,4),(0,5),(1,3),(1,4),(1,5),(2,3),(2,4),(2,5),(6,7)]);
        assert!(!satisfiable(&k33, Scope::Global));
        assert!(!satisfiable(&k33, Scope::PerComponent));
    }

    #[test]
    fn missing_variable_fails_fast() {
        let g = Graph::from_edges(2, &[(0,1)]);
        let index = GraphIndex::build(&g, &[]).unwrap();
        let dominating = DominatingEdges::compute(&index);
        let vars = Variables::new();
        let mut formula = Formula::new();
        let rules = RuleEngine { index: &index, dominating: &dominating, vars: &vars, scope: Scope::Global };
        match rules.upward(&mut formula) {
            Err(UpSatError::MissingVariable { .. }) => {},
            other => panic!("expected missing variable, got {:?}", other),
        }
    }
}
