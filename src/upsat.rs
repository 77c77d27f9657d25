//! The test instance: owns the formula and variables of one upward planarity
//! test against a borrowed graph.

use crate::embed::{self, Purpose, Strategy};
use crate::error::UpSatError;
use crate::graph::{AdjEntry, Graph, GraphCopy, NodeRef};
use crate::index::{DominatingEdges, GraphIndex};
use crate::rules::RuleEngine;
use crate::sat::{Formula, Model, SatBackend, Varisat};
use crate::variables::Variables;
use log::{debug, info, trace};

/// Options for [`UpSat`].
#[derive(Debug, Clone)]
pub struct UpSatOptions {
    /// Decide test-only calls with the Tutte formulation, which needs no
    /// rotation variables.
    pub fast_feasibility :bool,

    /// Check the written rotation system with Euler's formula.
    pub verify_embedding :bool,
}

impl Default for UpSatOptions {
    fn default() -> Self {
        UpSatOptions { fast_feasibility: false, verify_embedding: true }
    }
}

fn built(index :&Option<(GraphIndex, DominatingEdges)>) -> Result<(&GraphIndex, &DominatingEdges), UpSatError> {
    index.as_ref().map(|(i,d)| (i,d))
        .ok_or_else(|| UpSatError::Precondition(format!("The graph index has not been built.")))
}

#[derive(Debug)]
enum Stage {
    Start,
    StructuralCheck,
    Run(Strategy),
    Done(bool),
}

/// Upward planarity test by reduction to SAT.
///
/// ```
/// use upsat::{Graph, UpSat};
///
/// let mut g = Graph::from_edges(4, &[(0,1),(0,2),(1,3),(2,3)]);
/// let mut order = Vec::new();
/// let mut external = None;
/// let ok = UpSat::new(&mut g).embed_upward_planar(&mut external, Some(&mut order)).unwrap();
/// assert!(ok);
/// assert_eq!(external.map(|a| a.node), Some(0));
/// assert!(order[0] < order[3]);
/// ```
pub struct UpSat<'g, B = Varisat> {
    graph :&'g mut Graph,
    feasible :Vec<(NodeRef, NodeRef)>,
    options :UpSatOptions,
    backend :B,
    index :Option<(GraphIndex, DominatingEdges)>,
    variables :Variables,
    formula :Formula,
    fixed_order :Option<Vec<usize>>,
    strategy :Option<Strategy>,
}

impl<'g> UpSat<'g, Varisat> {
    pub fn new(graph :&'g mut Graph) -> Self {
        UpSat {
            graph,
            feasible: Vec::new(),
            options: UpSatOptions::default(),
            backend: Varisat,
            index: None,
            variables: Variables::new(),
            formula: Formula::new(),
            fixed_order: None,
            strategy: None,
        }
    }

    /// Test the copy graph. With `feasible_original_edges`, original edges
    /// that have no copy still have to point upward in the order, so they can
    /// be inserted again later.
    pub fn from_copy(copy :&'g mut GraphCopy, feasible_original_edges :bool) -> Self {
        let feasible = if feasible_original_edges { copy.missing_original_edges() } else { Vec::new() };
        let mut upsat = UpSat::new(&mut copy.graph);
        upsat.feasible = feasible;
        upsat
    }
}

impl<'g, B :SatBackend> UpSat<'g, B> {
    pub fn with_options(mut self, options :UpSatOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_backend<C :SatBackend>(self, backend :C) -> UpSat<'g, C> {
        UpSat {
            graph: self.graph,
            feasible: self.feasible,
            options: self.options,
            backend,
            index: self.index,
            variables: self.variables,
            formula: self.formula,
            fixed_order: self.fixed_order,
            strategy: self.strategy,
        }
    }

    /// Restrict the next test to orders agreeing with `ranks` (one entry per
    /// node, lower rank below). Nodes of equal rank are left free.
    pub fn fix_node_order(&mut self, ranks :Vec<usize>) -> Result<(), UpSatError> {
        if ranks.len() != self.graph.num_nodes() {
            return Err(UpSatError::Precondition(format!(
                "Node order has {} entries for {} nodes.", ranks.len(), self.graph.num_nodes())));
        }
        self.fixed_order = Some(ranks);
        Ok(())
    }

    /// Whether the graph is upward planar (under the fixed node order, if
    /// any). On success `node_order` receives the rank of every node.
    pub fn test_upward_planarity(&mut self, node_order :Option<&mut Vec<usize>>) -> Result<bool, UpSatError> {
        self.run(Purpose::Test, None, node_order)
    }

    /// Like [`test_upward_planarity`](Self::test_upward_planarity), and on
    /// success rewrites the rotation at every node and sets `external` to an
    /// adjacency entry with the outer face on its right. On failure `external`
    /// and the graph are left untouched. Graphs without edges are trivially
    /// embedded: the result is `true` and `external` stays `None`.
    ///
    /// The embedding is one of possibly many; which one depends on the
    /// solver's choice of model.
    pub fn embed_upward_planar(&mut self, external :&mut Option<AdjEntry>,
                               node_order :Option<&mut Vec<usize>>) -> Result<bool, UpSatError> {
        self.run(Purpose::Embed, Some(external), node_order)
    }

    pub fn number_of_clauses(&self) -> u64 { self.formula.num_clauses() }
    pub fn number_of_variables(&self) -> usize { self.formula.num_vars() }

    /// Strategy used by the last call.
    pub fn strategy(&self) -> Option<Strategy> { self.strategy }

    /// Drop the formula, variables, counters and fixed node order. The graph
    /// index and dominating-edge table are kept.
    pub fn reset(&mut self) {
        self.formula.clear();
        self.variables.clear();
        self.fixed_order = None;
        self.strategy = None;
    }

    fn run(&mut self, purpose :Purpose, external :Option<&mut Option<AdjEntry>>,
           node_order :Option<&mut Vec<usize>>) -> Result<bool, UpSatError> {
        if !self.formula.is_empty() || self.strategy.is_some() {
            return Err(UpSatError::Precondition(format!("The instance already holds a formula; call reset() first.")));
        }
        let mut stage = Stage::Start;
        let mut external = external;
        let mut node_order = node_order;
        loop {
            trace!("stage {:?}", stage);
            stage = match stage {
                Stage::Start => {
                    if self.index.is_none() {
                        let index = GraphIndex::build(self.graph, &self.feasible)?;
                        let dominating = DominatingEdges::compute(&index);
                        self.index = Some((index, dominating));
                    }
                    Stage::StructuralCheck
                },
                Stage::StructuralCheck => {
                    let (index, _) = built(&self.index)?;
                    let strategy = embed::classify(index.structure(), purpose, self.options.fast_feasibility);
                    info!("Testing upward planarity of {} nodes and {} edges using {:?}",
                          index.num_nodes(), index.num_edges(), strategy);
                    Stage::Run(strategy)
                },
                Stage::Run(strategy) => {
                    self.strategy = Some(strategy);
                    let model = match self.build_and_solve(strategy)? {
                        Some(model) => model,
                        None => {
                            info!("Formula is unsatisfiable: not upward planar");
                            break Ok(false);
                        },
                    };
                    let order = if node_order.is_some() {
                        let (index, _) = built(&self.index)?;
                        let fixed = self.fixed_order.as_ref().map(|r| &r[..]);
                        Some(embed::node_order(index, &self.variables, &model, strategy.scope(), fixed)?)
                    } else {
                        None
                    };
                    let done = match (purpose, strategy) {
                        (Purpose::Test, _) => true,
                        (Purpose::Embed, Strategy::FastFeasibilityOnly) => {
                            // Only chosen for embedding when there are no edges.
                            debug!("Nothing to embed");
                            true
                        },
                        (Purpose::Embed, _) => {
                            let adj = self.extract(strategy, &model)?;
                            if let Some(out) = external.as_mut() { **out = Some(adj); }
                            true
                        },
                    };
                    if let (Some(out), Some(order)) = (node_order.as_mut(), order) { **out = order; }
                    Stage::Done(done)
                },
                Stage::Done(result) => break Ok(result),
            };
        }
    }

    fn build_and_solve(&mut self, strategy :Strategy) -> Result<Option<Model>, UpSatError> {
        let (index, dominating) = built(&self.index)?;
        let scope = strategy.scope();
        let formula = &mut self.formula;

        self.variables.compute_order(formula, index, scope);
        if strategy.uses_rotation() {
            self.variables.compute_rotation(formula, index, dominating, scope);
        }
        self.variables.compute_selection(formula, index, dominating, scope);
        debug!("{} variables allocated", formula.num_vars());

        let rules = RuleEngine { index, dominating, vars: &self.variables, scope };
        rules.tau_transitive(formula)?;
        if strategy.uses_rotation() {
            rules.sigma_transitive(formula)?;
        }
        rules.upward(formula)?;
        if strategy.uses_rotation() {
            rules.planarity(formula)?;
        } else {
            rules.tutte(formula)?;
        }
        if let Some(ranks) = &self.fixed_order {
            rules.fixed(formula, ranks)?;
        }
        info!("Formula has {} variables and {} clauses", formula.num_vars(), formula.num_clauses());

        self.backend.solve(formula)
    }

    fn extract(&mut self, strategy :Strategy, model :&Model) -> Result<AdjEntry, UpSatError> {
        let (index, _) = built(&self.index)?;
        let fixed = self.fixed_order.as_ref().map(|r| &r[..]);
        embed::embed_from_model(self.graph, index, &self.variables, model, strategy.scope(),
                                fixed, self.options.verify_embedding)
    }
}
