//! Defines a `ConditionalInferenceEngine` that uses exact inference by variable elimination to
//! answer conditional inference queries.
//!
//! Implementation of Koller & Friedman Algorithm 9.1 - Sum-Product-VE

use factor::Factor;
use model::Network;
use super::ConditionalInferenceEngine;
use util::{LaplaceError, Result};
use variable::{Assignment, Variable};

use indexmap::IndexMap;
use ndarray::prelude as nd;

use std::collections::HashSet;

pub struct VariableEliminationEngine {

    /// the network's factors, reduced by the evidence at construction
    factors: Vec<Factor>,

    /// the unobserved variables remaining in the reduced factors
    remaining: Vec<Variable>,

    /// precomputed preferred elimination order based on the max-cardinality heuristic
    order: Vec<Variable>

}


impl VariableEliminationEngine {

    /// Construct an engine for the given network, conditioned on the given
    /// evidence. Each engine starts from pristine state; the memoizer builds
    /// one per query.
    ///
    /// # Errors
    /// * `LaplaceError::InvalidScope` if the evidence names a variable the
    ///   network does not contain
    /// * `LaplaceError::EvidenceOutOfRange` if an evidence index exceeds the
    ///   cardinality a variable has in this network
    pub fn new(network: &Network, evidence: &Assignment) -> Result<Self> {
        if evidence.names().iter().any(|name| !network.contains(name)) {
            return Err(LaplaceError::InvalidScope);
        }

        let mut factors = Vec::new();
        for node in network.nodes() {
            let reduced = node.factor()?.reduce(evidence)?;
            if !reduced.is_identity() {
                factors.push(reduced);
            }
        }

        // first-seen scope order over the (deterministically ordered) factors
        let mut remaining: Vec<Variable> = Vec::new();
        for f in factors.iter() {
            for v in f.scope() {
                if !remaining.contains(&v) {
                    remaining.push(v);
                }
            }
        }

        let order = max_cardinality_elimination_order(&factors, &remaining);

        Ok(VariableEliminationEngine { factors, remaining, order })
    }

}


/// Compute the preferred elimination order by the max-cardinality heuristic.
/// All bookkeeping is over insertion-ordered maps, so the order is a pure
/// function of the factor list.
fn max_cardinality_elimination_order(factors: &[Factor], vars: &[Variable]) -> Vec<Variable> {
    // since we do not explicitly hold the graph structure, we need to
    // determine the neighbors of each variable
    let mut neighbors: IndexMap<Variable, HashSet<Variable>> = vars
        .iter()
        .map(|v| (v.clone(), HashSet::new()))
        .collect();

    for f in factors.iter() {
        let scope = f.scope();
        for i in 0..scope.len() {
            for j in (i + 1)..scope.len() {
                neighbors.get_mut(&scope[i]).unwrap().insert(scope[j].clone());
                neighbors.get_mut(&scope[j]).unwrap().insert(scope[i].clone());
            }
        }
    }

    let mut marked: HashSet<Variable> = HashSet::new();
    let mut elimination: Vec<Variable> = Vec::new();

    for _ in 0..vars.len() {
        let mut best: Option<(usize, usize)> = None;

        for (idx, v) in vars.iter().enumerate() {
            if marked.contains(v) {
                continue;
            }

            let ct = neighbors.get(v)
                              .map(|ns| ns.iter().filter(|n| marked.contains(*n)).count())
                              .unwrap_or(0);

            // strict comparison keeps the first candidate on ties, so the
            // order is deterministic
            match best {
                Some((_, max)) if ct <= max => (),
                _ => best = Some((idx, ct))
            }
        }

        // invariant: there is always an unmarked variable left
        let (idx, _) = best.expect("max-cardinality selection exhausted variables early");
        elimination.push(vars[idx].clone());
        marked.insert(vars[idx].clone());
    }

    // the heuristic produces the reverse elimination order
    elimination.reverse();
    elimination
}


impl ConditionalInferenceEngine for VariableEliminationEngine {

    fn posterior(&mut self, target: &Variable) -> Result<nd::Array1<f64>> {
        if !self.remaining.contains(target) {
            // the target is either observed or unknown to the reduced model
            return Err(LaplaceError::InvalidScope);
        }

        let mut phis = self.factors.clone();
        for var in self.order.iter() {
            if var == target {
                // we are computing P(target | e), so the target survives
                continue;
            }

            // product step - multiply the factors mentioning var
            let (phi_prime, rest): (Vec<Factor>, Vec<Factor>) = phis
                .into_iter()
                .partition(|f| f.scope().contains(var));

            let mut psi = Factor::identity();
            for phi in phi_prime {
                psi = psi.product(&phi)?;
            }

            // sum step - marginalize psi over var
            let tau = psi.marginalize(var);

            phis = rest;
            if !tau.is_identity() {
                phis.push(tau);
            }
        }

        // multiply together the remaining factors; scopes may be disjoint here
        let mut phi_star = Factor::identity();
        for phi in phis {
            phi_star = phi_star.product(&phi)?;
        }

        // we now have an unnormalized distribution over the target; the
        // partition function turns it into a conditional probability
        let phi_star = phi_star.normalize()?;

        let mut posterior = nd::Array1::zeros(target.cardinality());
        for i in 0..target.cardinality() {
            let mut assn = Assignment::new();
            assn.set(target, i);
            posterior[i] = phi_star.value(&assn)?;
        }

        Ok(posterior)
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use estimators::estimate_cpd;
    use table::Table;

    #[test]
    /// The elimination order is a pure function of the factor list
    fn deterministic_order() {
        let data = Table::from_rows(
            &["A", "B", "C"],
            &[
                vec!["a0", "b0", "c0"],
                vec!["a0", "b1", "c1"],
                vec!["a1", "b0", "c1"],
                vec!["a1", "b1", "c0"]
            ]
        ).unwrap();

        let factors: Vec<Factor> = vec![
            estimate_cpd(&data, "A", &[]).unwrap().to_factor().unwrap(),
            estimate_cpd(&data, "B", &["A"]).unwrap().to_factor().unwrap(),
            estimate_cpd(&data, "C", &["B"]).unwrap().to_factor().unwrap()
        ];

        let mut vars: Vec<Variable> = Vec::new();
        for f in factors.iter() {
            for v in f.scope() {
                if !vars.contains(&v) {
                    vars.push(v);
                }
            }
        }

        let one = max_cardinality_elimination_order(&factors, &vars);
        let two = max_cardinality_elimination_order(&factors, &vars);
        assert_eq!(one, two);
        assert_eq!(vars.len(), one.len());
    }

}
