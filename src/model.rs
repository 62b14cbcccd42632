//! Defines a `Network`, a Bayesian (directed) graphical model over named
//! categorical variables, and the builder that assembles one from an edge
//! list plus a training table.
//!
//! # Representation
//! The network is a Directed Acyclic Graph. No explicit graph structure is
//! stored; each `Node` carries its parent list and its conditional
//! probability table, which together define the edges. Nodes are held in
//! sorted-name order in an `IndexMap`, so iteration is deterministic and two
//! builds from identical inputs produce bit-identical tables. The builder
//! trusts the caller's edge list to be acyclic.

use estimators::{estimate_cpd_for, Cpt};
use factor::Factor;
use table::Table;
use util::{LaplaceError, Result};
use variable::Variable;

use indexmap::IndexMap;
use itertools::Itertools;

/// A single variable in a `Network`: the variable, its parents (sorted by
/// name) and the CPT P(variable | parents) bound at build time.
#[derive(Clone, Debug)]
pub struct Node {

    /// The node's variable
    variable: Variable,

    /// The parent variables, sorted by name. The sort gives a stable join
    /// order between evidence tuples and the CPT columns they index into.
    parents: Vec<Variable>,

    /// The conditional probability table P(variable | parents)
    cpt: Cpt

}

impl Node {

    pub fn name(&self) -> &str {
        self.variable.name()
    }


    pub fn variable(&self) -> &Variable {
        &self.variable
    }


    /// The parents, in sorted-name order
    pub fn parents(&self) -> &[Variable] {
        &self.parents
    }


    pub fn cardinality(&self) -> usize {
        self.variable.cardinality()
    }


    pub fn cpt(&self) -> &Cpt {
        &self.cpt
    }


    /// The node's CPT as a `Factor` of scope ```parents + [variable]```
    pub fn factor(&self) -> Result<Factor> {
        self.cpt.to_factor()
    }

}


/// A directed probabilistic graphical model: one `Node` per variable, fixed
/// at construction and never mutated afterward.
#[derive(Clone, Debug)]
pub struct Network {
    nodes: IndexMap<String, Node>
}

impl Network {

    /// Look up a node by variable name
    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }


    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }


    /// The number of nodes in the `Network`
    pub fn len(&self) -> usize {
        self.nodes.len()
    }


    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }


    /// The nodes, in sorted-name order
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }


    /// The variables of the `Network`, in sorted-name order
    pub fn variables(&self) -> Vec<&Variable> {
        self.nodes.values().map(|n| n.variable()).collect()
    }

}


/// Assemble a `Network` from training data and an edge list, deriving every
/// state space from the training data itself.
///
/// The node set is the set of distinct names mentioned in any edge; a node's
/// parents are every `parent` of an edge whose `child` is the node, sorted by
/// name. The edge list's own order affects nothing.
pub fn build_model(training: &Table, edges: &[(&str, &str)]) -> Result<Network> {
    build_model_with_reference(training, edges, training)
}


/// Assemble a `Network` whose CPTs are counted from `training` but whose
/// state spaces come from `reference` (typically the full dataset).
///
/// With a wider reference, a state unseen in the training subset surfaces as
/// a degenerate CPT column (corrected by the estimator) rather than as an
/// out-of-range index at query time.
///
/// # Errors
/// * `LaplaceError::NotEnoughData` if the edge list is empty
/// * `LaplaceError::MissingColumn` if a table lacks a referenced column
/// * any estimator error, unchanged
pub fn build_model_with_reference(
    training: &Table,
    edges: &[(&str, &str)],
    reference: &Table
) -> Result<Network> {
    if edges.is_empty() {
        return Err(LaplaceError::NotEnoughData);
    }

    // explicit canonicalization: sorted node names, never hash order
    let names: Vec<&str> = edges.iter()
                                .flat_map(|&(p, c)| vec![p, c])
                                .unique()
                                .sorted();

    let mut variables: IndexMap<&str, Variable> = IndexMap::new();
    for name in names.iter() {
        if !training.has_column(name) {
            return Err(LaplaceError::MissingColumn(String::from(*name)));
        }

        variables.insert(*name, Variable::from_column(reference, name)?);
    }

    let mut nodes = IndexMap::new();
    for name in names.iter() {
        let parents: Vec<Variable> = edges.iter()
                                          .filter(|&&(_, c)| c == *name)
                                          .map(|&(p, _)| p)
                                          .unique()
                                          .sorted()
                                          .into_iter()
                                          .map(|p| variables[p].clone())
                                          .collect();

        let variable = variables[*name].clone();
        let cpt = estimate_cpd_for(training, &variable, &parents)?;

        nodes.insert(String::from(*name), Node { variable, parents, cpt });
    }

    Ok(Network { nodes })
}
