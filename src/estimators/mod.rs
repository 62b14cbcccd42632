//! Estimation of conditional probability tables from categorical data.

mod cpd;
pub use self::cpd::{estimate_cpd, estimate_cpd_for, Cpt};
