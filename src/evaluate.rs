//! Scores memoized predictions against held-out rows.
//!
//! Prediction is max-likelihood: the target state with the greatest posterior
//! mass wins. Each test row's evidence tuple is joined back to its fold's
//! `LookupTable`, the argmax state index is decoded through the model's
//! target variable and compared to the row's actual value as a string.

use model::Network;
use query::LookupTable;
use table::Table;
use util::{LaplaceError, Result};

use ndarray::prelude as nd;

/// The index of the maximum element; the first such index on ties.
pub fn max_likelihood(posterior: &nd::Array1<f64>) -> usize {
    let mut best = 0;
    for i in 1..posterior.len() {
        if posterior[i] > posterior[best] {
            best = i;
        }
    }
    best
}


/// Prediction counts for one fold.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FoldReport {

    /// Test rows scored
    pub total: usize,

    /// Rows whose predicted state matched the actual value
    pub correct: usize,

    /// Rows whose evidence tuple had no lookup entry
    pub skipped: usize,

    /// Queries the fold's lookup answered with the fallback posterior
    pub failed_queries: usize

}

impl FoldReport {

    /// Fraction of scored rows predicted correctly; 0 when nothing scored
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

}


/// Score each fold's `LookupTable` against its test partition.
///
/// `models`, `lookups` and `partitions` are parallel, one element per fold.
/// A row whose evidence tuple is absent from the lookup is counted as
/// skipped, not as wrong.
///
/// # Errors
/// * `LaplaceError::General` if the per-fold slices differ in length
/// * `LaplaceError::MissingColumn` if a model lacks the target node or the
///   data lacks a referenced column
pub fn evaluate(
    models: &[Network],
    lookups: &[LookupTable],
    data: &Table,
    partitions: &[Vec<usize>],
    target: &str
) -> Result<Vec<FoldReport>> {
    if models.len() != lookups.len() || models.len() != partitions.len() {
        return Err(LaplaceError::General(
            format!("{} models, {} lookups, {} partitions",
                    models.len(), lookups.len(), partitions.len())
        ));
    }

    let mut reports = Vec::with_capacity(models.len());

    for ((model, lookup), rows) in models.iter().zip(lookups.iter()).zip(partitions.iter()) {
        let target_var = model.node(target)
                              .map(|n| n.variable())
                              .ok_or_else(|| LaplaceError::MissingColumn(String::from(target)))?;

        let mut report = FoldReport {
            failed_queries: lookup.stats().failed_queries,
            ..Default::default()
        };

        for &row in rows.iter() {
            let posterior = match lookup.posterior_for_row(data, row)? {
                Some(posterior) => posterior,
                None => {
                    report.skipped += 1;
                    continue;
                }
            };

            let predicted = target_var.state(max_likelihood(posterior))
                                      .ok_or_else(|| LaplaceError::General(
                                          format!("posterior wider than target '{}'", target)
                                      ))?;

            report.total += 1;
            if predicted == data.value(row, target)? {
                report.correct += 1;
            }
        }

        reports.push(report);
    }

    Ok(reports)
}
