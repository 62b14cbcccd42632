//! Defines the interface to inference engines
//!
//! An engine is constructed per (model, evidence) pair and answers
//! conditional probability queries ```P(target | evidence)``` as a posterior
//! distribution over the target's states. The query memoizer treats whatever
//! implements `ConditionalInferenceEngine` as its oracle.

use util::Result;
use variable::Variable;

use ndarray::prelude as nd;

mod variable_elimination;

pub use self::variable_elimination::VariableEliminationEngine;


/// A `ConditionalInferenceEngine` is capable of answering Conditional Probability Queries of the
/// form ```P(Y | E = e)```.
///
/// `ConditionalInferenceEngine`s are stateful and must take the evidence `e` as an argument to
/// whatever construction mechanism they employ.
pub trait ConditionalInferenceEngine {

    /// Infer the posterior distribution ```P(target | evidence)```, indexed by
    /// the target's sorted state space.
    fn posterior(&mut self, target: &Variable) -> Result<nd::Array1<f64>>;

}
