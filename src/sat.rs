//! Clause store and the bridge to the SAT engine.
//!
//! The formula is built once per test and handed to a [`SatBackend`] exactly
//! once. The bundled backend runs `varisat`; anything else that can decide a
//! CNF formula can be plugged in through the trait.

use crate::error::UpSatError;
pub use varisat::{Lit, Var};
use varisat::{CnfFormula, ExtendFormula};
use log::{debug, trace};

/// Conjunction of clauses plus the counters exposed as diagnostics.
pub struct Formula {
    cnf :CnfFormula,
    clauses :u64,
}

impl Default for Formula {
    fn default() -> Self { Formula::new() }
}

impl Formula {
    pub fn new() -> Self {
        Formula { cnf: CnfFormula::new(), clauses: 0 }
    }

    pub fn new_var(&mut self) -> Var { self.cnf.new_var() }

    pub fn add_clause(&mut self, lits :&[Lit]) {
        trace!("clause {:?}", lits);
        self.cnf.add_clause(lits);
        self.clauses += 1;
    }

    pub fn num_vars(&self) -> usize { self.cnf.var_count() }
    pub fn num_clauses(&self) -> u64 { self.clauses }

    pub fn is_empty(&self) -> bool { self.num_vars() == 0 && self.clauses == 0 }

    pub fn cnf(&self) -> &CnfFormula { &self.cnf }

    pub fn clear(&mut self) { *self = Formula::new(); }
}

/// Positive literal of `v` if `value`, negative otherwise.
pub fn lit(v :Var, value :bool) -> Lit {
    if value { v.positive() } else { v.negative() }
}

/// A satisfying assignment. Variables the engine did not mention (they occur
/// in no clause) read as false.
#[derive(Debug, Clone)]
pub struct Model {
    values :Vec<bool>,
}

impl Model {
    /// Build a model from the literals reported by an engine for a formula with
    /// `num_vars` variables.
    pub fn from_lits(num_vars :usize, lits :&[Lit]) -> Result<Self, UpSatError> {
        let mut values = vec![false; num_vars];
        for l in lits {
            if l.index() >= num_vars {
                return Err(UpSatError::Solver(format!(
                    "Model assigns variable {} but the formula has only {}.", l.index(), num_vars)));
            }
            values[l.index()] = l.is_positive();
        }
        Ok(Model { values })
    }

    pub fn value(&self, v :Var) -> bool {
        self.values.get(v.index()).cloned().unwrap_or(false)
    }

    pub fn lit_value(&self, l :Lit) -> bool {
        self.value(l.var()) == l.is_positive()
    }
}

/// A satisfiability engine. `Ok(None)` means unsatisfiable.
pub trait SatBackend {
    fn solve(&mut self, formula :&Formula) -> Result<Option<Model>, UpSatError>;
}

/// The bundled engine.
#[derive(Debug, Default, Copy, Clone)]
pub struct Varisat;

impl SatBackend for Varisat {
    fn solve(&mut self, formula :&Formula) -> Result<Option<Model>, UpSatError> {
        debug!("Solving formula with {} variables and {} clauses", formula.num_vars(), formula.num_clauses());
        let mut solver = varisat::Solver::new();
        solver.add_formula(formula.cnf());
        match solver.solve() {
            Ok(true) => {
                let lits = solver.model()
                    .ok_or_else(|| UpSatError::Solver(format!("Satisfiable, but no model was returned.")))?;
                Ok(Some(Model::from_lits(formula.num_vars(), &lits)?))
            },
            Ok(false) => Ok(None),
            Err(e) => Err(UpSatError::Solver(format!("{:?}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_clauses_and_vars() {
        let mut f = Formula::new();
        assert!(f.is_empty());
        let a = f.new_var();
        let b = f.new_var();
        f.add_clause(&[lit(a,true), lit(b,true)]);
        f.add_clause(&[lit(a,false)]);
        assert_eq!(f.num_vars(), 2);
        assert_eq!(f.num_clauses(), 2);
        f.clear();
        assert!(f.is_empty());
    }

    #[test]
    fn varisat_sat_and_unsat() {
        let mut f = Formula::new();
        let a = f.new_var();
        let b = f.new_var();
        f.add_clause(&[lit(a,true), lit(b,true)]);
        f.add_clause(&[lit(a,false)]);
        let m = Varisat.solve(&f).unwrap().expect("satisfiable");
        assert!(!m.value(a));
        assert!(m.value(b));
        assert!(m.lit_value(lit(a,false)));

        f.add_clause(&[lit(b,false)]);
        assert!(Varisat.solve(&f).unwrap().is_none());
    }

    #[test]
    fn malformed_model_is_a_solver_error() {
        let a = varisat::Var::from_index(5);
        match Model::from_lits(2, &[a.positive()]) {
            Err(UpSatError::Solver(_)) => {},
            other => panic!("expected solver error, got {:?}", other),
        }
    }
}
