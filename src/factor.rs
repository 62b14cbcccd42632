//! Definition of the factor module
//!
//! A `Factor` represents a relationship between some set of `Variable`s. The
//! network's conditional probability tables are converted to `Factor`s for
//! inference; the variable elimination engine manipulates nothing else.

use util::{LaplaceError, Result};
use variable::{all_assignments, Assignment, Variable};

use ndarray::prelude as nd;
use itertools::Itertools;

/// Alias f64 ndarray::Array as FactorTable
pub type FactorTable = nd::ArrayD<f64>;

/// Tolerance for validating that a conditional distribution sums to one
const CPD_TOLERANCE: f64 = 1e-6;


#[derive(Clone, Debug)]
pub enum Factor {
    /// The empty, identity `Factor` with no scope. This type exists for dealing with arithmetic
    /// operations of `Factor`s
    Identity,

    /// A `Factor` over some scope of variables, represented as a dense table.
    /// Axis `i` of the table is indexed by the state index of `scope[i]`.
    TableFactor {
        /// The scope of the `Factor`
        scope: Vec<Variable>,

        /// The values of the `Factor` table.
        table: FactorTable,

        /// `true`, if the `Factor` is a conditional probability distribution
        cpd: bool
    }
}


impl Factor {

    /// Get the identity factor
    pub fn identity() -> Self {
        Factor::Identity
    }


    /// Create a new `Factor`
    ///
    /// # Errors
    /// * `LaplaceError::InvalidScope` if the scope is empty, repeats a
    ///   variable, or does not match the table's dimensions
    /// * `LaplaceError::General` if the table holds a negative value
    pub fn new(scope: Vec<Variable>, table: FactorTable, cpd: bool) -> Result<Self> {
        if scope.is_empty() || scope.len() != table.ndim() {
            return Err(LaplaceError::InvalidScope);
        }

        if scope.iter().unique().count() != scope.len() {
            return Err(LaplaceError::InvalidScope);
        }

        for (v, t) in scope.iter().map(|v| v.cardinality()).zip(table.shape().iter()) {
            if v != *t {
                return Err(LaplaceError::InvalidScope);
            }
        }

        // factors may not have negative values; zero is legal even in a CPD,
        // since a deterministic table estimated from data contains zeros
        if table.iter().any(|&v| v < 0.0) {
            return Err(LaplaceError::General(String::from("factor values may not be negative")));
        }

        Ok(Factor::TableFactor { scope, table, cpd })
    }


    /// Create a `Factor` that is a conditional probability distribution
    /// P(target | givens). The scope is ```givens + [target]```; the target
    /// occupies the last axis.
    ///
    /// # Errors
    /// * `LaplaceError::General` if any conditional slice does not sum to 1
    pub fn cpd(target: Variable, givens: Vec<Variable>, table: FactorTable) -> Result<Self> {
        let sums = table.sum_axis(nd::Axis(table.ndim() - 1));
        if sums.iter().any(|&s| (s - 1.0).abs() > CPD_TOLERANCE) {
            return Err(LaplaceError::General(
                String::from("requested a CPD, but the values do not represent a CPD")
            ));
        }

        let mut scope = givens;
        scope.push(target);

        Factor::new(scope, table, true)
    }


    /// Check if the `Factor` is the identity `Factor`
    pub fn is_identity(&self) -> bool {
        match self {
            &Factor::Identity => true,
            _ => false
        }
    }


    /// Check if the `Factor` is a Conditional Probability Distribution - i.e. if the values in the
    /// `Factor` are normalized.
    ///
    /// # Note
    /// A conditional probability distribution is a specialization of a `Factor`. All CPDs are
    /// `Factor`s, but not all `Factor`s are CPDs. The identity `Factor` is considered a CPD.
    pub fn is_cpd(&self) -> bool {
        match self {
            &Factor::Identity => true,
            &Factor::TableFactor { cpd, .. } => cpd
        }
    }


    /// Retrieve the scope of the `Factor`.
    pub fn scope(&self) -> Vec<Variable> {
        match self {
            &Factor::Identity => vec![],
            &Factor::TableFactor { ref scope, .. } => scope.clone()
        }
    }


    /// Retrieve the value for a complete assignment over the scope of this `Factor`
    ///
    /// # Args
    /// assignment: a full assignment to the scope of a `Factor`. The assignment's scope may be a
    ///             superset of the `Factor`s scope.
    ///
    /// # Errors
    /// * `LaplaceError::General` if the `Factor` is the identity
    /// * `LaplaceError::IncompleteAssignment`, if the assignment does not cover the scope
    pub fn value(&self, assignment: &Assignment) -> Result<f64> {
        match self {
            &Factor::Identity => {
                Err(LaplaceError::General(String::from("the identity factor has no value")))
            },
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let idxs: Vec<Option<usize>> = scope.iter().map(|v| assignment.get(v)).collect();
                if idxs.iter().any(|v| v.is_none()) {
                    return Err(LaplaceError::IncompleteAssignment);
                }

                let idxs: Vec<usize> = idxs.into_iter().map(|v| v.unwrap()).collect();
                Ok(table[nd::IxDyn(&idxs)])
            }
        }
    }


    /// Product of this `Factor` and another `Factor`.
    ///
    /// Defined in Koller & Friedman Section 4.2.1. Unlike the textbook
    /// presentation, disjoint scopes are permitted: the result is then the
    /// outer product, which the elimination loop relies on when it multiplies
    /// the factors left over after elimination.
    ///
    /// # Returns
    /// A new `Factor` of scope union(self.scope(), other.scope())
    pub fn product(&self, other: &Self) -> Result<Self> {
        // Factor::Identity is the multiplicative identity
        if let &Factor::Identity = self {
            return Ok(other.clone());
        } else if let &Factor::Identity = other {
            return Ok(self.clone());
        }

        // We are computing a new factor Psi(X, Y, Z) = phi1(X, Y) * phi2(Y, Z).
        // See Koller & Friedman Definition 4.2
        let new_scope: Vec<Variable> = self.scope()
                                           .into_iter()
                                           .chain(other.scope())
                                           .unique()
                                           .collect();

        let new_shape: Vec<usize> = new_scope.iter().map(|v| v.cardinality()).collect();
        let mut tbl = nd::Array::ones(new_shape).into_dyn();

        for assn in all_assignments(&new_scope) {
            // For each assignment, multiply the values in each and store the
            // result in the new table. Lookups cannot fail on a complete
            // assignment to the union scope.
            let phi1_val = self.value(&assn)?;
            let phi2_val = other.value(&assn)?;

            let idx: Vec<usize> = new_scope.iter().map(|v| assn.get(v).unwrap()).collect();
            tbl[nd::IxDyn(&idx)] = phi1_val * phi2_val;
        }

        Factor::new(new_scope, tbl, false)
    }


    /// Reduce the `Factor` over the given partial assignment
    ///
    /// Defined in Koller & Friedman 4.2.3
    ///
    /// # Args
    /// assignment: a partial assignment to the `Factor`. Variables outside the
    ///             scope are ignored.
    ///
    /// # Returns
    /// A new `Factor` reduced over the given assignment. A complete assignment
    /// reduces to the identity.
    ///
    /// # Errors
    /// * `LaplaceError::EvidenceOutOfRange` if an assigned index exceeds the
    ///   cardinality a variable has in this `Factor`. Evidence encoded against
    ///   a larger reference state space than the table was trained on lands
    ///   here; callers treat it as recoverable.
    pub fn reduce(&self, assignment: &Assignment) -> Result<Self> {
        match self {
            &Factor::Identity => Ok(Factor::Identity),
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let mut view = table.view();
                let mut new_shape: Vec<usize> = Vec::new();
                let mut new_scope: Vec<Variable> = Vec::new();

                for (i, v) in scope.iter().enumerate() {
                    if let Some(val) = assignment.get(v) {
                        if val >= table.len_of(nd::Axis(i)) {
                            return Err(LaplaceError::EvidenceOutOfRange {
                                variable: String::from(v.name()),
                                index: val
                            });
                        }

                        view.subview_inplace(nd::Axis(i), val);
                    } else {
                        new_shape.push(table.len_of(nd::Axis(i)));
                        new_scope.push(v.clone());
                    }
                }

                if new_scope.is_empty() {
                    // complete assignment
                    Ok(Factor::Identity)
                } else if new_scope.len() == scope.len() {
                    // empty assignment (relative to scope)
                    Ok(self.clone())
                } else {
                    let table = view.to_owned()
                                    .into_shape(new_shape)
                                    .map_err(|e| LaplaceError::General(e.to_string()))?;

                    Factor::new(new_scope, table, false)
                }
            }
        }
    }


    /// Marginalize the `Factor` over the given `Variable`
    ///
    /// Defined in Koller & Friedman 9.3.1
    ///
    /// # Returns
    /// another `Factor`, summed over the states of the given `Variable`. If
    /// the variable is not in scope the `Factor` is returned unchanged; if it
    /// was the only variable in scope the result is the identity.
    pub fn marginalize(&self, other: &Variable) -> Self {
        match self {
            // the identity factor marginalized over anything is the identity
            &Factor::Identity => Factor::Identity,

            &Factor::TableFactor { ref scope, ref table, .. } => {
                if let Some(idx) = scope.iter().position(|v| v == other) {
                    if scope.len() == 1 {
                        return Factor::Identity;
                    }

                    let new_table = table.sum_axis(nd::Axis(idx));
                    let new_scope = scope.iter().filter(|&v| v != other).cloned().collect();

                    Factor::new(new_scope, new_table, false).expect(
                        "marginalize encountered error that should never occur"
                    )
                } else {
                    // variable not in the scope of this factor, so the factor
                    // is already marginalized over it
                    self.clone()
                }
            }
        }
    }


    /// Normalize the `Factor` so its values sum to 1.
    ///
    /// # Errors
    /// * `LaplaceError::DivideByZero` if the values sum to zero
    pub fn normalize(&self) -> Result<Self> {
        match self {
            &Factor::Identity => Ok(Factor::Identity),
            &Factor::TableFactor { ref scope, ref table, .. } => {
                let z = table.scalar_sum();
                if z == 0.0 {
                    return Err(LaplaceError::DivideByZero);
                }

                Ok(Factor::TableFactor {
                    scope: scope.clone(),
                    table: table.mapv(|v| v / z),
                    cpd: true
                })
            }
        }
    }

}
