//! The query memoization engine.
//!
//! Exact inference is expensive and test sets repeat themselves: many rows
//! carry the same joint evidence values. The `Memoizer` enumerates the
//! distinct evidence tuples that actually occur in a served partition, asks
//! the inference oracle exactly once per distinct tuple, and hands back a
//! `LookupTable` keyed by tuple so downstream prediction is an O(1) lookup
//! per row.
//!
//! Failure handling is lenient by design: one bad evidence combination is
//! logged, answered with a constant fallback posterior, and counted in the
//! stats; the remaining combinations still run. This is the opposite of the
//! estimator's fatal-error policy for corrupt probability mass.

use inference::{ConditionalInferenceEngine, VariableEliminationEngine};
use model::Network;
use table::Table;
use util::{LaplaceError, Result};
use variable::{environment_map, Assignment};

use bidir_map::BidirMap;
use indexmap::IndexMap;
use ndarray::prelude as nd;

/// The default sentinel marking "no value given" for an evidence variable
pub const NO_VALUE: &str = "N";

/// Index of the target state treated as the positive outcome by the fallback
const POSITIVE_STATE: usize = 1;


/// Counts describing one `LookupTable`'s construction.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QueryStats {

    /// Distinct evidence tuples found in the served rows = oracle queries issued
    pub distinct_queries: usize,

    /// Served rows minus distinct tuples: queries the memoization avoided
    pub redundant_avoided: usize,

    /// Queries that failed and were answered with the fallback posterior
    pub failed_queries: usize

}


/// A map from each distinct evidence tuple occurring in a served partition to
/// the posterior the oracle returned for it. Read-only after construction;
/// valid for the (model, partition) pair it was built from.
#[derive(Clone, Debug)]
pub struct LookupTable {

    /// The evidence variable names, in the order tuple keys are built
    evidence_vars: Vec<String>,

    /// Posterior over the target's states, keyed by evidence tuple
    entries: IndexMap<Vec<String>, nd::Array1<f64>>,

    stats: QueryStats

}

impl LookupTable {

    /// The evidence variable names, in key order
    pub fn evidence_vars(&self) -> &[String] {
        &self.evidence_vars
    }


    /// Look up the posterior for an evidence tuple
    pub fn posterior(&self, key: &[String]) -> Option<&nd::Array1<f64>> {
        self.entries.get(key)
    }


    /// Look up the posterior for a row of `data` by building its evidence
    /// tuple. Returns `Ok(None)` for a tuple the table was not built over.
    pub fn posterior_for_row(&self, data: &Table, row: usize) -> Result<Option<&nd::Array1<f64>>> {
        let key = self.evidence_vars
                      .iter()
                      .map(|v| data.value(row, v).map(String::from))
                      .collect::<Result<Vec<String>>>()?;

        Ok(self.entries.get(&key))
    }


    /// The distinct evidence tuples, in first-occurrence order
    pub fn keys(&self) -> impl Iterator<Item = &Vec<String>> {
        self.entries.keys()
    }


    pub fn len(&self) -> usize {
        self.entries.len()
    }


    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }


    pub fn stats(&self) -> QueryStats {
        self.stats
    }

}


/// Deduplicates inference queries across the rows of a test partition.
///
/// The memoizer is bound to the *full* dataset: evidence values are encoded
/// through state indices derived from it, so they stay consistent with models
/// whose tables were estimated against the same reference. Partitions are
/// passed per call as row indices into that dataset.
pub struct Memoizer<'a> {

    /// The full dataset
    data: &'a Table,

    /// The evidence variables, in tuple-key order; the target is excluded
    evidence_vars: Vec<String>,

    /// The target variable name
    target: String,

    /// State index mapping per evidence variable, from the full dataset
    env: IndexMap<String, BidirMap<String, usize>>,

    /// The "no value given" sentinel; a variable holding it is omitted from
    /// the evidence assignment rather than encoded
    sentinel: String

}

impl<'a> Memoizer<'a> {

    /// Create a `Memoizer` over the full dataset.
    ///
    /// # Errors
    /// * `LaplaceError::MissingColumn` if a named column is absent
    /// * `LaplaceError::InvalidScope` if the target appears among the
    ///   evidence variables
    pub fn new(data: &'a Table, evidence_vars: &[&str], target: &str) -> Result<Self> {
        if evidence_vars.iter().any(|&v| v == target) {
            return Err(LaplaceError::InvalidScope);
        }

        data.column(target)?;

        let evidence_vars: Vec<String> = evidence_vars.iter().map(|v| String::from(*v)).collect();
        let env = environment_map(data, &evidence_vars)?;

        Ok(Memoizer {
            data,
            evidence_vars,
            target: String::from(target),
            env,
            sentinel: String::from(NO_VALUE)
        })
    }


    /// Replace the "no value given" sentinel
    pub fn with_sentinel(mut self, sentinel: &str) -> Self {
        self.sentinel = String::from(sentinel);
        self
    }


    /// Build a `LookupTable` for one model over one partition of rows,
    /// using exact variable elimination as the oracle.
    pub fn serve(&self, model: &Network, rows: &[usize]) -> Result<LookupTable> {
        self.serve_with(model, rows, |network, evidence| {
            VariableEliminationEngine::new(network, evidence)
        })
    }


    /// Build one `LookupTable` per (model, partition) pair.
    pub fn serve_all(&self, models: &[Network], partitions: &[Vec<usize>]) -> Result<Vec<LookupTable>> {
        if models.len() != partitions.len() {
            return Err(LaplaceError::General(
                format!("{} models but {} partitions", models.len(), partitions.len())
            ));
        }

        models.iter()
              .zip(partitions.iter())
              .map(|(m, p)| self.serve(m, p))
              .collect()
    }


    /// Build a `LookupTable` with a caller-supplied oracle factory. A fresh
    /// engine is constructed for every distinct evidence tuple, so no engine
    /// state survives from one query to the next.
    pub fn serve_with<E, F>(&self, model: &Network, rows: &[usize], oracle: F) -> Result<LookupTable>
    where
        E: ConditionalInferenceEngine,
        F: Fn(&Network, &Assignment) -> Result<E>
    {
        let served = self.data.select(rows)?;

        let target_var = model.node(&self.target)
                              .map(|n| n.variable().clone())
                              .ok_or_else(|| LaplaceError::MissingColumn(self.target.clone()))?;

        // enumerate the distinct evidence tuples that occur in the served
        // rows - exactly those, never the full cartesian product
        let mut distinct: IndexMap<Vec<String>, usize> = IndexMap::new();
        for row in 0..served.len() {
            let key = self.evidence_vars
                          .iter()
                          .map(|v| served.value(row, v).map(String::from))
                          .collect::<Result<Vec<String>>>()?;

            *distinct.entry(key).or_insert(0) += 1;
        }

        let mut entries: IndexMap<Vec<String>, nd::Array1<f64>> = IndexMap::new();
        let mut failed = 0;

        for key in distinct.keys() {
            let evidence = self.encode(key)?;

            let outcome = oracle(model, &evidence)
                .and_then(|mut engine| engine.posterior(&target_var));

            let posterior = match outcome {
                Ok(posterior) => posterior,
                Err(err) => {
                    warn!("query failed for evidence {:?}: {}", key, err);
                    failed += 1;
                    fallback_posterior(target_var.cardinality())
                }
            };

            entries.insert(key.clone(), posterior);
        }

        let stats = QueryStats {
            distinct_queries: entries.len(),
            redundant_avoided: served.len() - entries.len(),
            failed_queries: failed
        };

        Ok(LookupTable { evidence_vars: self.evidence_vars.clone(), entries, stats })
    }


    /// Encode an evidence tuple as an assignment of state indices, omitting
    /// sentinel-valued variables entirely.
    fn encode(&self, key: &[String]) -> Result<Assignment> {
        let mut evidence = Assignment::new();

        for (name, value) in self.evidence_vars.iter().zip(key.iter()) {
            if *value == self.sentinel {
                continue;
            }

            let index = self.env
                            .get(name)
                            .and_then(|map| map.get_by_first(value))
                            .ok_or_else(|| {
                                LaplaceError::UnknownState(name.clone(), value.clone())
                            })?;

            evidence.set_named(name, *index);
        }

        Ok(evidence)
    }

}


/// The constant fallback posterior: all mass on the positive state.
fn fallback_posterior(cardinality: usize) -> nd::Array1<f64> {
    let mut posterior = nd::Array1::zeros(cardinality);
    let index = if POSITIVE_STATE < cardinality { POSITIVE_STATE } else { cardinality - 1 };
    posterior[index] = 1.0;
    posterior
}


// Unit tests
#[cfg(test)]
mod tests {

    use super::*;
    use model::{build_model, build_model_with_reference};

    /// 100 rows: X="a" always implies Y="1", X="b" always implies Y="0"
    fn deterministic_data() -> Table {
        let mut rows = Vec::new();
        for _ in 0..60 { rows.push(vec!["a", "1"]); }
        for _ in 0..40 { rows.push(vec!["b", "0"]); }
        Table::from_rows(&["X", "Y"], &rows).unwrap()
    }

    fn all_rows(data: &Table) -> Vec<usize> {
        (0..data.len()).collect()
    }

    #[test]
    /// One query per distinct evidence tuple, never more
    fn deduplicates_queries() {
        let data = deterministic_data();
        let net = build_model(&data, &[("X", "Y")]).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let rows = all_rows(&data);
        let lookup = memoizer.serve(&net, &rows).unwrap();

        assert_eq!(2, lookup.len());
        assert_eq!(2, lookup.stats().distinct_queries);
        assert_eq!(98, lookup.stats().redundant_avoided);
        assert_eq!(0, lookup.stats().failed_queries);
    }

    #[test]
    /// Deterministic evidence yields a point-mass posterior via the lookup
    fn end_to_end_deterministic() {
        let data = deterministic_data();
        let net = build_model(&data, &[("X", "Y")]).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &all_rows(&data)).unwrap();

        let posterior = lookup.posterior(&[String::from("a")]).unwrap();
        let y = net.node("Y").unwrap().variable();
        assert!((posterior[y.index_of("1").unwrap()] - 1.0).abs() < 1e-9);

        let posterior = lookup.posterior(&[String::from("b")]).unwrap();
        assert!((posterior[y.index_of("0").unwrap()] - 1.0).abs() < 1e-9);
    }

    #[test]
    /// A sentinel-valued variable is marginalized, not encoded
    fn sentinel_omitted() {
        let mut rows = Vec::new();
        for _ in 0..60 { rows.push(vec!["a", "1"]); }
        for _ in 0..40 { rows.push(vec!["b", "0"]); }
        rows.push(vec!["N", "1"]);
        let data = Table::from_rows(&["X", "Y"], &rows).unwrap();

        let net = build_model(&data, &[("X", "Y")]).unwrap();
        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &all_rows(&data)).unwrap();

        assert_eq!(3, lookup.len());
        assert_eq!(0, lookup.stats().failed_queries);

        // with X unobserved the posterior is the marginal of Y
        let posterior = lookup.posterior(&[String::from("N")]).unwrap();
        let y = net.node("Y").unwrap().variable();
        let p1 = 61.0 / 101.0;
        assert!((posterior[y.index_of("1").unwrap()] - p1).abs() < 1e-9);
    }

    #[test]
    /// A given-state present only in the test partition: with a reference-
    /// built model the query succeeds through the degeneracy-corrected
    /// column, and the lookup entry exists either way
    fn unseen_state_with_reference_model() {
        let mut rows = Vec::new();
        for _ in 0..50 { rows.push(vec!["a", "1"]); }
        for _ in 0..49 { rows.push(vec!["b", "0"]); }
        rows.push(vec!["c", "1"]); // only in the test partition
        let data = Table::from_rows(&["X", "Y"], &rows).unwrap();

        let train: Vec<usize> = (0..99).collect();
        let test: Vec<usize> = vec![99];

        let train_table = data.select(&train).unwrap();
        let net = build_model_with_reference(&train_table, &[("X", "Y")], &data).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &test).unwrap();

        assert_eq!(1, lookup.len());
        assert_eq!(0, lookup.stats().failed_queries);

        // the degenerate column averages the two observed ones: [0.5, 0.5]
        let posterior = lookup.posterior(&[String::from("c")]).unwrap();
        assert!((posterior[0] - 0.5).abs() < 1e-9);
        assert!((posterior[1] - 0.5).abs() < 1e-9);
    }

    #[test]
    /// Without a reference the unseen state encodes out of range; the failure
    /// is counted, logged and answered with the fallback, and the entry is
    /// still present
    fn unseen_state_without_reference_falls_back() {
        let mut rows = Vec::new();
        for _ in 0..50 { rows.push(vec!["a", "1"]); }
        for _ in 0..49 { rows.push(vec!["b", "0"]); }
        rows.push(vec!["c", "1"]);
        let data = Table::from_rows(&["X", "Y"], &rows).unwrap();

        let train: Vec<usize> = (0..99).collect();
        let test: Vec<usize> = vec![99];

        let train_table = data.select(&train).unwrap();
        // trained without knowledge of "c": cardinality 2
        let net = build_model(&train_table, &[("X", "Y")]).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &test).unwrap();

        assert_eq!(1, lookup.stats().distinct_queries);
        assert_eq!(1, lookup.stats().failed_queries);

        let posterior = lookup.posterior(&[String::from("c")]).unwrap();
        assert_eq!(1.0, posterior[POSITIVE_STATE]);
    }

    #[test]
    /// An evidence variable that is not a network node fails every query for
    /// it without aborting the batch
    fn evidence_outside_model_degrades() {
        let mut rows = Vec::new();
        for _ in 0..3 { rows.push(vec!["a", "u", "1"]); }
        for _ in 0..3 { rows.push(vec!["b", "v", "0"]); }
        let data = Table::from_rows(&["X", "Z", "Y"], &rows).unwrap();

        // Z is a column but not a node
        let net = build_model(&data, &[("X", "Y")]).unwrap();
        let memoizer = Memoizer::new(&data, &["X", "Z"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &all_rows(&data)).unwrap();

        assert_eq!(2, lookup.len());
        assert_eq!(2, lookup.stats().failed_queries);

        // every entry still resolves
        for key in lookup.keys() {
            assert!(lookup.posterior(key).is_some());
        }
    }

    #[test]
    fn posterior_for_row_joins_back() {
        let data = deterministic_data();
        let net = build_model(&data, &[("X", "Y")]).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();
        let lookup = memoizer.serve(&net, &all_rows(&data)).unwrap();

        let y = net.node("Y").unwrap().variable();
        for row in 0..data.len() {
            let posterior = lookup.posterior_for_row(&data, row).unwrap().unwrap();
            let expected = data.value(row, "Y").unwrap();
            assert!((posterior[y.index_of(expected).unwrap()] - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn target_among_evidence_rejected() {
        let data = deterministic_data();
        match Memoizer::new(&data, &["X", "Y"], "Y") {
            Err(LaplaceError::InvalidScope) => (),
            _ => panic!("expected InvalidScope")
        };
    }

    #[test]
    fn serve_all_pairs_models_with_partitions() {
        let data = deterministic_data();
        let net = build_model(&data, &[("X", "Y")]).unwrap();

        let memoizer = Memoizer::new(&data, &["X"], "Y").unwrap();

        let partitions = vec![vec![0, 1, 2], vec![97, 98, 99]];
        let models = vec![net.clone(), net.clone()];

        let lookups = memoizer.serve_all(&models, &partitions).unwrap();
        assert_eq!(2, lookups.len());
        // first partition is all X="a", second all X="b"
        assert_eq!(1, lookups[0].len());
        assert_eq!(1, lookups[1].len());
        assert_eq!(2, lookups[0].stats().redundant_avoided);

        assert!(memoizer.serve_all(&models, &partitions[..1].to_vec()).is_err());
    }

}
