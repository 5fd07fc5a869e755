//! PLONK Circuit Builder
//!
//! An in-memory arithmetic circuit builder. Field values are either known
//! constants or affine functions of a single circuit variable; arithmetic that
//! stays affine is free, and everything else allocates a variable and lowers
//! the relating constraint to a generic PLONK gate
//! `q_L·l + q_R·r + q_O·o + q_M·l·r + q_C = 0`.
//!
//! # Modules
//! - `field`: Pallas base field and the `CircuitField` trait
//! - `error`: `CircuitError` and the crate `Result` alias
//! - `config`: per-pass circuit configuration
//! - `circuit`: circuit handle, variable allocation, gate lowering
//! - `field_var`: field expressions (`FieldVar`)
//! - `boolean`: boolean expressions (`Bool`)
//! - `value`: structured values allocated with `Circuit::witness`

pub mod field;
pub mod error;
pub mod config;
pub mod circuit;
pub mod field_var;
pub mod boolean;
pub mod value;

/// Re-export commonly used types
pub use field::{CircuitField, Fp};
pub use error::{CircuitError, Result};
pub use config::CircuitConfig;
pub use circuit::{Circuit, CompiledCircuit, ConstraintSystem, GenericGate, Mode, Variable, Witness};
pub use field_var::{FieldVar, LinearVar};
pub use boolean::Bool;
pub use value::CircuitValue;
