//! `laplace` estimates discrete Bayesian networks from tabular categorical data
//! and answers max-likelihood prediction queries by exact inference, with a
//! memoization layer that issues one inference query per distinct evidence
//! combination in a test set.
//!
//! The pipeline: a `Table` of categorical columns is turned into one
//! conditional probability table per node by the estimator in
//! `estimators::cpd`, assembled into a `Network` from an edge list, and
//! queried through a `Memoizer` backed by the exact
//! `VariableEliminationEngine`.

extern crate bidir_map;
extern crate indexmap;
#[macro_use]
extern crate itertools;
#[macro_use]
extern crate log;
#[macro_use]
extern crate ndarray;
extern crate rand;

pub mod estimators;
pub mod evaluate;
pub mod factor;
pub mod inference;
pub mod kfold;
pub mod model;
pub mod query;
pub mod table;
pub mod util;
pub mod variable;

pub use estimators::{estimate_cpd, estimate_cpd_for, Cpt};
pub use model::{build_model, build_model_with_reference, Network, Node};
pub use query::{LookupTable, Memoizer, QueryStats};
pub use table::Table;
pub use util::{LaplaceError, Result};
pub use variable::{Assignment, Variable};
