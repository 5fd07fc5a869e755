//! Error type for circuit construction.
//!
//! Every variant is fatal for the current pass: usage errors mean the circuit
//! description is ill-formed, and algebraic errors on known constants are
//! detectable before any proof is attempted.

use thiserror::Error;

use crate::circuit::Variable;

/// Errors raised while building a circuit or computing its witness.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CircuitError {
    /// Two variables owned by different circuits were combined
    #[error("Cannot combine variables from different circuits")]
    DifferentCircuits,

    /// A variable value was read while the circuit was not witnessing
    #[error("Reading variable {0} outside of prover-only code")]
    ReadOutsideProver(Variable),

    /// A variable was read before any value was stored in it
    #[error("Attempted to read variable {0} before a value was stored in it")]
    UnsetVariable(Variable),

    /// A variable that already holds a value was set again
    #[error("Attempted to set variable {0} which already has a value")]
    AlreadySet(Variable),

    /// Public inputs must be allocated before any proving code runs
    #[error("Cannot allocate new public variables in prover-only code")]
    PublicInProver,

    /// Prover-only code has no way to fill a value in later
    #[error("Cannot allocate new unfilled variables in prover-only code")]
    UnfilledInProver,

    /// `set_variable` was called on a constant
    #[error("Called set_variable with a constant argument")]
    NotAVariable,

    /// `set_variable` was called on a scaled or shifted variable
    #[error("Called set_variable with a non-variable argument")]
    NotBareVariable,

    /// Inversion or division by the zero element
    #[error("Division by zero")]
    DivisionByZero,

    /// The element is not a quadratic residue
    #[error("Field element {0} has no square root")]
    NoSquareRoot(String),

    /// Two known constants were asserted equal
    #[error("Constant field elements are not equal: {left} != {right}")]
    UnequalConstants { left: String, right: String },

    /// A known constant other than 0 or 1 was asserted boolean
    #[error("Non-boolean constant field element: {0}")]
    NonBooleanConstant(String),

    /// A string could not be parsed as a field element
    #[error("Invalid field element string: {0:?}")]
    InvalidFieldString(String),

    /// A structured value was rebuilt from the wrong number of field elements
    #[error("Expected {expected} field elements, got {actual}")]
    FieldElementCount { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, CircuitError>;
