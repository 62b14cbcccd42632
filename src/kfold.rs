//! Seeded k-fold partitioning of row indices.
//!
//! Rows are shuffled once with a caller-supplied seed and dealt into `k`
//! contiguous groups; each group in turn serves as the test partition while
//! the remaining rows train. The same seed always yields the same folds, so
//! a cross-validation run is reproducible end to end.

use util::{LaplaceError, Result};

use rand::{Rng, SeedableRng, StdRng};

/// One train/test split. Both index lists are ascending and disjoint, and
/// together they cover every row exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct Fold {

    /// Row indices to estimate from
    pub train: Vec<usize>,

    /// Row indices to predict on
    pub test: Vec<usize>

}


/// Split `n` rows into `k` folds after a seeded shuffle.
///
/// Fold sizes differ by at most one: the first ```n % k``` folds receive one
/// extra row.
///
/// # Errors
/// * `LaplaceError::NotEnoughData` if ```k == 0``` or ```k > n```
pub fn split(n: usize, k: usize, seed: &[usize]) -> Result<Vec<Fold>> {
    if k == 0 || k > n {
        return Err(LaplaceError::NotEnoughData);
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng: StdRng = SeedableRng::from_seed(seed);
    rng.shuffle(&mut indices);

    let base = n / k;
    let extra = n % k;

    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for i in 0..k {
        let size = if i < extra { base + 1 } else { base };

        let mut test: Vec<usize> = indices[start..start + size].to_vec();
        let mut train: Vec<usize> = indices[..start]
            .iter()
            .chain(indices[start + size..].iter())
            .cloned()
            .collect();

        test.sort();
        train.sort();

        folds.push(Fold { train, test });
        start += size;
    }

    Ok(folds)
}
