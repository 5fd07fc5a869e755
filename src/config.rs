//! Circuit Configuration
//!
//! Options fixed for the lifetime of one circuit-construction pass.

use serde::{Deserialize, Serialize};

/// Circuit build configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitConfig {
    /// Name attached to log events emitted while building
    pub name: String,

    /// Whether value closures run and a witness is recorded.
    ///
    /// `false` models the setup pass, where only the shape of the circuit is
    /// needed to derive keys.
    pub compute_witness: bool,
}

impl CircuitConfig {
    /// Configuration for a constraint-system-only pass
    pub fn setup(name: &str) -> Self {
        CircuitConfig {
            name: name.to_string(),
            compute_witness: false,
        }
    }

    /// Configuration for a pass that fills in the witness
    pub fn prover(name: &str) -> Self {
        CircuitConfig {
            name: name.to_string(),
            compute_witness: true,
        }
    }
}

impl Default for CircuitConfig {
    fn default() -> Self {
        CircuitConfig {
            name: "circuit".to_string(),
            compute_witness: true,
        }
    }
}
