//! Arithmetic Circuit Module
//!
//! The builder records every constraint as a generic PLONK gate:
//!
//!   q_L * l + q_R * r + q_O * o + q_M * l * r + q_C = 0
//!
//! where:
//! - l, r, o are variable indices (0 marks an unused wire)
//! - q_L, q_R, q_O, q_M, q_C are selector values

mod builder;
mod constraint;

pub use builder::{Circuit, CompiledCircuit, Constraint, Mode};
pub use constraint::{ConstraintKind, ConstraintSystem, GateKind, GenericGate, Variable, Witness};
