//! Maximum likelihood estimation of a Conditional Probability Table from a
//! table of categorical observations.
//!
//! The estimator counts into a dense, zero-initialized table spanning the full
//! cartesian product of the given variables' state spaces. Counting densely is
//! what guarantees that a given-state combination absent from the data still
//! occupies its column (as zeros) instead of silently shifting every later
//! column one position left.

use factor::{Factor, FactorTable};
use table::Table;
use util::{LaplaceError, Result};
use variable::{joint_cardinality, joint_index, Variable};

use ndarray::prelude as nd;

/// Tolerance for deciding that a column's probability mass is 0 or 1
const MASS_TOLERANCE: f64 = 1e-9;


/// A Conditional Probability Table P(target | givens).
///
/// Rows are the states of the target, in sorted state-space order. Columns are
/// the joint states of the givens, in row-major order of the givens as
/// supplied (last given varies fastest). Every column sums to 1. Immutable
/// once estimated.
#[derive(Clone, Debug)]
pub struct Cpt {

    /// The target variable
    target: Variable,

    /// The given (conditioning) variables, in the order supplied
    givens: Vec<Variable>,

    /// The probability table: target cardinality x joint given cardinality
    values: nd::Array2<f64>

}

impl Cpt {

    pub fn target(&self) -> &Variable {
        &self.target
    }


    pub fn givens(&self) -> &[Variable] {
        &self.givens
    }


    /// The probability table, rows = target states, columns = joint given states
    pub fn values(&self) -> &nd::Array2<f64> {
        &self.values
    }


    /// A single column: the distribution of the target under one joint
    /// given-state combination
    pub fn column(&self, index: usize) -> nd::ArrayView1<f64> {
        self.values.column(index)
    }


    /// The number of joint given-state combinations (1 when there are no givens)
    pub fn joint_cardinality(&self) -> usize {
        self.values.shape()[1]
    }


    /// Convert the table into a `Factor` of scope ```givens + [target]``` for
    /// the inference engine. The target occupies the last axis.
    pub fn to_factor(&self) -> Result<Factor> {
        let tcard = self.target.cardinality();
        let joint = self.joint_cardinality();

        let mut shape: Vec<usize> = self.givens.iter().map(|v| v.cardinality()).collect();
        shape.push(tcard);

        // column j enumerates the givens in row-major order and the target is
        // the last (fastest) axis, so the flat element (j, t) lands at
        // j * tcard + t
        let mut flat = Vec::with_capacity(joint * tcard);
        for j in 0..joint {
            for t in 0..tcard {
                flat.push(self.values[[t, j]]);
            }
        }

        let table = FactorTable::from_shape_vec(nd::IxDyn(&shape), flat)
            .map_err(|e| LaplaceError::General(e.to_string()))?;

        Factor::cpd(self.target.clone(), self.givens.clone(), table)
    }

}


/// Estimate P(target | givens) from `data`, deriving every state space from
/// `data` itself.
///
/// With no givens the result is the empirical marginal distribution of the
/// target as a single column, rows ordered by the sorted state space (never by
/// frequency).
pub fn estimate_cpd(data: &Table, target: &str, givens: &[&str]) -> Result<Cpt> {
    let target = Variable::from_column(data, target)?;
    let givens = givens.iter()
                       .map(|g| Variable::from_column(data, g))
                       .collect::<Result<Vec<Variable>>>()?;

    estimate_cpd_for(data, &target, &givens)
}


/// Estimate P(target | givens) from `data` against caller-supplied state
/// spaces.
///
/// The variables may carry state spaces built from a larger reference dataset
/// than `data`; states of the givens that never occur in `data` then surface
/// as zero-count columns and are corrected below, rather than being absent.
///
/// # Errors
/// * `LaplaceError::InvalidScope` if the target repeats among the givens or a
///   given repeats
/// * `LaplaceError::MissingColumn` if `data` lacks a referenced column
/// * `LaplaceError::UnknownState` if a cell value is outside its variable's
///   state space
/// * `LaplaceError::NotEnoughData` if `data` has no rows at all
/// * `LaplaceError::CorruptColumn` if a column's mass is neither 0 nor 1
pub fn estimate_cpd_for(data: &Table, target: &Variable, givens: &[Variable]) -> Result<Cpt> {
    if givens.iter().any(|g| g.name() == target.name()) {
        return Err(LaplaceError::InvalidScope);
    }

    for (i, g) in givens.iter().enumerate() {
        if givens[i + 1..].iter().any(|h| h.name() == g.name()) {
            return Err(LaplaceError::InvalidScope);
        }
    }

    if data.is_empty() {
        return Err(LaplaceError::NotEnoughData);
    }

    let target_column = data.column(target.name())?;
    let given_columns = givens.iter()
                              .map(|g| data.column(g.name()))
                              .collect::<Result<Vec<&[String]>>>()?;

    let tcard = target.cardinality();
    let joint = joint_cardinality(givens);

    // dense counting performs the mandatory reindex: unobserved combinations
    // keep their (zero) columns
    let mut counts = nd::Array2::<f64>::zeros((tcard, joint));
    let mut given_indices = vec![0usize; givens.len()];

    for row in 0..data.len() {
        let t = target.index_of(&target_column[row]).ok_or_else(|| {
            LaplaceError::UnknownState(
                String::from(target.name()),
                target_column[row].clone()
            )
        })?;

        for ((slot, g), col) in given_indices.iter_mut().zip(givens.iter()).zip(given_columns.iter()) {
            *slot = g.index_of(&col[row]).ok_or_else(|| {
                LaplaceError::UnknownState(String::from(g.name()), col[row].clone())
            })?;
        }

        counts[[t, joint_index(givens, &given_indices)]] += 1.0;
    }

    normalize_columns(counts)
        .map(|values| Cpt { target: target.clone(), givens: givens.to_vec(), values })
}


/// Normalize each column of a count table into a probability distribution.
///
/// Zero-observation columns are intercepted before any division and filled
/// with the row-wise average over the well-formed columns; a column whose
/// normalized mass is strictly between 0 and 1 is a fatal upstream bug.
fn normalize_columns(counts: nd::Array2<f64>) -> Result<nd::Array2<f64>> {
    let (tcard, joint) = (counts.shape()[0], counts.shape()[1]);
    let totals = counts.sum_axis(nd::Axis(0));

    let mut table = nd::Array2::<f64>::zeros((tcard, joint));
    for j in 0..joint {
        let total = totals[j];
        if total == 0.0 {
            // intercept the division: the column stays all-zero and is
            // handled by the correction pass
            continue;
        }

        for t in 0..tcard {
            table[[t, j]] = counts[[t, j]] / total;
        }
    }

    correct_degenerate(table)
}


/// Classify each column of a frequency table by its probability mass. Mass 0
/// marks a degenerate column to be filled with the row-wise average over the
/// well-formed (mass 1) columns. Any other mass is a `CorruptColumn` error;
/// the zero-sum and partial-sum cases must never be conflated.
fn correct_degenerate(mut table: nd::Array2<f64>) -> Result<nd::Array2<f64>> {
    let (tcard, joint) = (table.shape()[0], table.shape()[1]);

    let mut observed: Vec<usize> = Vec::new();
    let mut degenerate: Vec<usize> = Vec::new();

    for j in 0..joint {
        let mass = table.column(j).scalar_sum();
        if mass.abs() <= MASS_TOLERANCE {
            degenerate.push(j);
        } else if (mass - 1.0).abs() <= MASS_TOLERANCE {
            observed.push(j);
        } else {
            return Err(LaplaceError::CorruptColumn { column: j, mass });
        }
    }

    if !degenerate.is_empty() {
        if observed.is_empty() {
            return Err(LaplaceError::NotEnoughData);
        }

        let denom = observed.len() as f64;
        for t in 0..tcard {
            let avg = observed.iter().map(|&j| table[[t, j]]).sum::<f64>() / denom;
            for &j in degenerate.iter() {
                table[[t, j]] = avg;
            }
        }
    }

    Ok(table)
}
