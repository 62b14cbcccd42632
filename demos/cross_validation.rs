//! Provides an example of using laplace for a full cross-validated prediction
//! run: estimate a network per fold, memoize the inference queries for each
//! test partition, and score max-likelihood predictions.

extern crate laplace;

use laplace as l;

fn main() -> l::Result<()> {
    ////////////////////////////////////////////////////////////////////////////
    // Step 1:  Assemble a categorical dataset
    //
    // Note:    "N" marks a respondent who skipped the question; such values
    //          are treated as unobserved evidence, not as a state
    let data = survey_data();
    let edges = [("region", "purchased"), ("age_band", "purchased")];

    ////////////////////////////////////////////////////////////////////////////
    // Step 2:  Split the rows into seeded folds
    let folds = l::kfold::split(data.len(), 4, &[2026])?;

    ////////////////////////////////////////////////////////////////////////////
    // Step 3:  Estimate one network per fold and serve its test partition
    //
    // Note:    state spaces come from the full dataset, so a state missing
    //          from one training subset yields a corrected degenerate column
    //          instead of a failed query
    let memoizer = l::Memoizer::new(&data, &["region", "age_band"], "purchased")?;

    let mut models = Vec::new();
    let mut lookups = Vec::new();
    let mut partitions = Vec::new();

    for fold in folds.iter() {
        let training = data.select(&fold.train)?;
        let model = l::build_model_with_reference(&training, &edges, &data)?;

        lookups.push(memoizer.serve(&model, &fold.test)?);
        models.push(model);
        partitions.push(fold.test.clone());
    }

    ////////////////////////////////////////////////////////////////////////////
    // Step 4:  Score max-likelihood predictions per fold
    let reports = l::evaluate::evaluate(&models, &lookups, &data, &partitions, "purchased")?;

    println!("fold | rows | distinct | avoided | failed | accuracy");
    println!("---------------------------------------------------");
    for (i, (report, lookup)) in reports.iter().zip(lookups.iter()).enumerate() {
        let stats = lookup.stats();
        println!(
            "{:>4} | {:>4} | {:>8} | {:>7} | {:>6} | {:.4}",
            i,
            report.total,
            stats.distinct_queries,
            stats.redundant_avoided,
            stats.failed_queries,
            report.accuracy()
        );
    }

    Ok(())
}

/// 120 synthetic survey responses over three categorical columns
fn survey_data() -> l::Table {
    let mut rows = Vec::new();

    for _ in 0..40 { rows.push(vec!["east", "18-34", "yes"]); }
    for _ in 0..10 { rows.push(vec!["east", "18-34", "no"]); }
    for _ in 0..10 { rows.push(vec!["east", "35-54", "yes"]); }
    for _ in 0..15 { rows.push(vec!["east", "35-54", "no"]); }
    for _ in 0..10 { rows.push(vec!["west", "18-34", "yes"]); }
    for _ in 0..20 { rows.push(vec!["west", "35-54", "no"]); }
    for _ in 0..10 { rows.push(vec!["west", "55+", "no"]); }
    for _ in 0..5  { rows.push(vec!["N", "55+", "no"]); }

    l::Table::from_rows(&["region", "age_band", "purchased"], &rows).unwrap()
}
