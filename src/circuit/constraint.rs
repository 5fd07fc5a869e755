//! Constraint System Definition
//!
//! Defines the physical gate emitted by the builder, the variable indices its
//! wires refer to, and the witness those indices are looked up in.

use crate::field::CircuitField;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A circuit variable index
///
/// Private variables count up from 1, public variables count down from -1.
/// Index 0 is never allocated and marks an unused gate wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Variable(pub(crate) i64);

impl Variable {
    /// The unused-wire sentinel
    pub const NONE: Variable = Variable(0);

    /// The n-th private variable (1-based)
    pub fn private(n: usize) -> Self {
        Variable(n as i64)
    }

    /// The n-th public variable (1-based)
    pub fn public(n: usize) -> Self {
        Variable(-(n as i64))
    }

    pub fn index(&self) -> i64 {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0 == 0
    }

    pub fn is_public(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The logical constraint a gate was lowered from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConstraintKind {
    /// (x) * (y) = (z)
    Multiply,
    /// (x) + (y) = (z)
    Add,
    /// (x) = (y)
    Equal,
    /// (x) * (x) = (x)
    Boolean,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConstraintKind::Multiply => "multiply",
            ConstraintKind::Add => "add",
            ConstraintKind::Equal => "equal",
            ConstraintKind::Boolean => "boolean",
        };
        f.pad(name)
    }
}

/// Physical gate shape
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Generic,
}

/// A generic PLONK gate
///
/// Constraint: q_L * l + q_R * r + q_O * o + q_M * l * r + q_C = 0
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericGate<F: CircuitField> {
    /// Always `generic`
    pub kind: GateKind,
    /// Logical constraint this gate encodes
    pub origin: ConstraintKind,

    // Selector values
    pub ql: F,
    pub qr: F,
    pub qo: F,
    pub qm: F,
    pub qc: F,

    // Wire variables
    pub l: Variable,
    pub r: Variable,
    pub o: Variable,
}

impl<F: CircuitField> GenericGate<F> {
    /// Evaluate the gate polynomial on a witness.
    ///
    /// Returns None if a used wire has no value.
    pub fn evaluate(&self, witness: &Witness<F>) -> Option<F> {
        let l = witness.wire_value(self.l)?;
        let r = witness.wire_value(self.r)?;
        let o = witness.wire_value(self.o)?;
        Some(self.ql * l + self.qr * r + self.qo * o + self.qm * l * r + self.qc)
    }

    /// Check if the gate constraint is satisfied
    pub fn is_satisfied(&self, witness: &Witness<F>) -> bool {
        self.evaluate(witness).map_or(false, |residual| residual.is_zero())
    }

    /// Get the constraint as a string
    pub fn constraint_string(&self) -> String {
        let mut terms = Vec::new();

        if !self.qm.is_zero() {
            terms.push(format!("{}·x{}·x{}", format_coeff(&self.qm), self.l, self.r));
        }
        if !self.ql.is_zero() {
            terms.push(format!("{}·x{}", format_coeff(&self.ql), self.l));
        }
        if !self.qr.is_zero() {
            terms.push(format!("{}·x{}", format_coeff(&self.qr), self.r));
        }
        if !self.qo.is_zero() {
            terms.push(format!("{}·x{}", format_coeff(&self.qo), self.o));
        }
        if !self.qc.is_zero() {
            terms.push(format_coeff(&self.qc));
        }

        if terms.is_empty() {
            "0 = 0".to_string()
        } else {
            format!("{} = 0", terms.join(" + "))
        }
    }
}

/// Print small negatives as `-k` instead of `p - k`, and elide long values.
fn format_coeff<F: CircuitField>(q: &F) -> String {
    let positive = q.to_decimal();
    let negated = (-*q).to_decimal();
    let short = if negated.len() < positive.len() {
        format!("-{}", negated)
    } else {
        positive
    };
    if short.len() > 20 {
        format!("{}...{}", &short[..8], &short[short.len() - 6..])
    } else {
        short
    }
}

/// Concrete values for every allocated variable
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Witness<F: CircuitField> {
    /// `private[i]` is the value of variable `i + 1`
    pub private: Vec<Option<F>>,
    /// `public[i]` is the value of variable `-(i + 1)`
    pub public: Vec<Option<F>>,
}

impl<F: CircuitField> Witness<F> {
    /// Value stored for a variable, if any
    pub fn value(&self, variable: Variable) -> Option<F> {
        let index = variable.index();
        let slot = if index > 0 {
            self.private.get(index as usize - 1)
        } else if index < 0 {
            self.public.get(index.unsigned_abs() as usize - 1)
        } else {
            None
        };
        slot.copied().flatten()
    }

    /// Like `value`, but the unused wire reads as zero
    pub fn wire_value(&self, variable: Variable) -> Option<F> {
        if variable.is_none() {
            Some(F::zero())
        } else {
            self.value(variable)
        }
    }

    /// Public input values in allocation order
    pub fn public_inputs(&self) -> Option<Vec<F>> {
        self.public.iter().copied().collect()
    }

    /// True if every allocated variable holds a value
    pub fn is_complete(&self) -> bool {
        self.private.iter().chain(self.public.iter()).all(Option::is_some)
    }
}

/// The complete constraint system
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintSystem<F: CircuitField> {
    /// All gates, in emission order
    pub gates: Vec<GenericGate<F>>,
    /// Number of private variables
    pub num_private: usize,
    /// Number of public variables
    pub num_public: usize,
}

impl<F: CircuitField> ConstraintSystem<F> {
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Number of gates lowered from the given logical constraint
    pub fn count(&self, origin: ConstraintKind) -> usize {
        self.gates.iter().filter(|g| g.origin == origin).count()
    }

    /// Indices of gates the witness does not satisfy
    pub fn unsatisfied_gates(&self, witness: &Witness<F>) -> Vec<usize> {
        self.gates
            .iter()
            .enumerate()
            .filter(|(_, g)| !g.is_satisfied(witness))
            .map(|(i, _)| i)
            .collect()
    }

    /// Check if all gate constraints are satisfied
    pub fn is_satisfied(&self, witness: &Witness<F>) -> bool {
        self.gates.iter().all(|g| g.is_satisfied(witness))
    }
}
