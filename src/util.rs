//! Defines the `Error` type for the laplace library

use std::error::Error;
use std::fmt;
use std::result;

pub type Result<T> = result::Result<T, LaplaceError>;

/// Errors raised by the estimation, assembly and query layers.
///
/// Two families live here. Structural errors (`MissingColumn`, `UnknownState`,
/// `CorruptColumn`, `NotEnoughData`) abort the computation that raised them.
/// Recoverable errors (`EvidenceOutOfRange`, `InvalidScope`, `DivideByZero`)
/// are what the query memoizer intercepts to degrade to its fallback result.
#[derive(Clone, Debug, PartialEq)]
pub enum LaplaceError {

    /// A required assignment was missing values for part of a factor's scope
    IncompleteAssignment,

    /// A scope constraint was not satisfied (e.g. evidence on a variable the
    /// model does not contain, or a target listed among its own givens)
    InvalidScope,

    /// Exactly what it sounds like
    DivideByZero,

    /// There is not enough data to estimate anything at all
    NotEnoughData,

    /// A column referenced by an edge list or evidence set is absent from the
    /// supplied table
    MissingColumn(String),

    /// A cell value does not belong to the variable's state space.
    /// Fields are the variable name and the offending value.
    UnknownState(String, String),

    /// A CPT column whose probability mass is strictly between 0 and 1 after
    /// aggregation. This indicates an upstream grouping bug and is fatal; it
    /// must never be conflated with the correctable zero-mass case.
    CorruptColumn {
        column: usize,
        mass: f64
    },

    /// An evidence state index that exceeds the cardinality a variable has in
    /// the trained model
    EvidenceOutOfRange {
        variable: String,
        index: usize
    },

    /// A general error with the given description
    General(String)

}

impl Error for LaplaceError {

    fn description(&self) -> &str {
        match self {
            &LaplaceError::IncompleteAssignment => "Missing assignments to part of the required scope",
            &LaplaceError::InvalidScope => "Provided scope did not satisfy constraints",
            &LaplaceError::DivideByZero => "Encountered division by zero",
            &LaplaceError::NotEnoughData => "Not enough data has been provided",
            &LaplaceError::MissingColumn(_) => "A referenced column is missing from the table",
            &LaplaceError::UnknownState(_, _) => "A value is outside its variable's state space",
            &LaplaceError::CorruptColumn { .. } => "A CPT column has corrupt probability mass",
            &LaplaceError::EvidenceOutOfRange { .. } => "An evidence state index is out of range",
            &LaplaceError::General(ref err) => err
        }
    }

    fn cause(&self) -> Option<&Error> {
        None
    }

}

impl fmt::Display for LaplaceError {

    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            &LaplaceError::IncompleteAssignment => {
                write!(f, "missing assignments to part of the required scope")
            },
            &LaplaceError::InvalidScope => {
                write!(f, "provided scope did not satisfy constraints")
            },
            &LaplaceError::DivideByZero => {
                write!(f, "encountered division by zero")
            },
            &LaplaceError::NotEnoughData => {
                write!(f, "not enough data has been provided")
            },
            &LaplaceError::MissingColumn(ref name) => {
                write!(f, "column '{}' is missing from the table", name)
            },
            &LaplaceError::UnknownState(ref var, ref value) => {
                write!(f, "value '{}' is not a state of variable '{}'", value, var)
            },
            &LaplaceError::CorruptColumn { column, mass } => {
                write!(f, "CPT column {} has corrupt probability mass {}", column, mass)
            },
            &LaplaceError::EvidenceOutOfRange { ref variable, index } => {
                write!(f, "evidence index {} is out of range for variable '{}'", index, variable)
            },
            &LaplaceError::General(ref err) => write!(f, "{}", err)
        }
    }

}
