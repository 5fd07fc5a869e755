//! Circuit Field Values
//!
//! A [`FieldVar`] is either a known constant or an affine function
//! `scale · var + constant` of exactly one circuit variable.
//!
//! Affine operations (negation, adding a constant, scaling by a constant)
//! only touch `scale` and `constant` and are free. Combining two
//! variable-backed values allocates a new variable and emits one constraint
//! relating it to its inputs:
//!
//! ```text
//! x * y    ->  multiply(x, y, res)
//! x + y    ->  add(x, y, res)
//! x / y    ->  multiply(res, y, x)
//! 1 / x    ->  multiply(x, res, 1)
//! sqrt(x)  ->  multiply(res, res, x)
//! ```

use std::fmt;

use rand::Rng;

use crate::boolean::Bool;
use crate::circuit::{Circuit, Constraint, Variable};
use crate::error::{CircuitError, Result};
use crate::field::CircuitField;

/// A field value in a circuit
#[derive(Clone, Debug)]
pub enum FieldVar<F: CircuitField> {
    /// A known value with no circuit dependency
    Constant(F),
    /// `scale · var + constant` over a single variable
    Linear(LinearVar<F>),
}

/// An affine expression over one circuit variable
///
/// Absent `scale` means 1 and absent `constant` means 0.
#[derive(Clone, Debug)]
pub struct LinearVar<F: CircuitField> {
    pub(crate) circuit: Circuit<F>,
    pub(crate) variable: Variable,
    pub(crate) scale: Option<F>,
    pub(crate) constant: Option<F>,
}

impl<F: CircuitField> LinearVar<F> {
    pub fn circuit(&self) -> &Circuit<F> {
        &self.circuit
    }

    pub fn variable(&self) -> Variable {
        self.variable
    }

    pub fn scale(&self) -> Option<F> {
        self.scale
    }

    pub fn constant(&self) -> Option<F> {
        self.constant
    }

    fn shifted(&self, c: F) -> Self {
        LinearVar {
            constant: Some(self.constant.map_or(c, |k| k + c)),
            ..self.clone()
        }
    }

    fn scaled(&self, c: F) -> Self {
        LinearVar {
            scale: Some(self.scale.map_or(c, |s| s * c)),
            constant: self.constant.map(|k| k * c),
            ..self.clone()
        }
    }
}

impl<F: CircuitField> FieldVar<F> {
    // ════════════════════════════════════════════════════════════════════
    //  Constructors
    // ════════════════════════════════════════════════════════════════════

    pub fn constant(value: F) -> Self {
        FieldVar::Constant(value)
    }

    pub fn zero() -> Self {
        FieldVar::Constant(F::zero())
    }

    pub fn one() -> Self {
        FieldVar::Constant(F::one())
    }

    pub fn from_u64(value: u64) -> Self {
        FieldVar::Constant(F::from_u64(value))
    }

    pub fn from_i64(value: i64) -> Self {
        FieldVar::Constant(F::from_i64(value))
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }

    /// Parse a decimal string into a constant
    pub fn from_decimal(s: &str) -> Result<Self> {
        F::from_decimal(s)
            .map(FieldVar::Constant)
            .ok_or_else(|| CircuitError::InvalidFieldString(s.to_string()))
    }

    /// A uniformly random constant
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        FieldVar::Constant(F::random(rng))
    }

    /// The bare variable `var` of a circuit
    pub fn from_variable(circuit: &Circuit<F>, variable: Variable) -> Self {
        FieldVar::Linear(LinearVar {
            circuit: circuit.clone(),
            variable,
            scale: None,
            constant: None,
        })
    }

    // ════════════════════════════════════════════════════════════════════
    //  Inspection
    // ════════════════════════════════════════════════════════════════════

    pub fn is_constant(&self) -> bool {
        matches!(self, FieldVar::Constant(_))
    }

    pub fn as_constant(&self) -> Option<F> {
        match self {
            FieldVar::Constant(c) => Some(*c),
            FieldVar::Linear(_) => None,
        }
    }

    pub fn as_linear(&self) -> Option<&LinearVar<F>> {
        match self {
            FieldVar::Constant(_) => None,
            FieldVar::Linear(linear) => Some(linear),
        }
    }

    /// The circuit this value depends on, if any
    pub fn circuit(&self) -> Option<&Circuit<F>> {
        self.as_linear().map(LinearVar::circuit)
    }

    /// The concrete value. Variable-backed values are readable only in
    /// prover-only code.
    pub fn value(&self) -> Result<F> {
        match self {
            FieldVar::Constant(c) => Ok(*c),
            FieldVar::Linear(linear) => {
                let v = linear.circuit.read_variable(linear.variable)?;
                let scaled = linear.scale.map_or(v, |s| v * s);
                Ok(linear.constant.map_or(scaled, |c| scaled + c))
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════
    //  Free affine operations
    // ════════════════════════════════════════════════════════════════════

    pub fn neg(&self) -> Self {
        match self {
            FieldVar::Constant(c) => FieldVar::Constant(-*c),
            FieldVar::Linear(linear) => FieldVar::Linear(LinearVar {
                scale: Some(linear.scale.map_or(-F::one(), |s| -s)),
                constant: linear.constant.map(|c| -c),
                ..linear.clone()
            }),
        }
    }

    /// `self + c` for a known `c`
    pub fn add_constant(&self, c: F) -> Self {
        match self {
            FieldVar::Constant(k) => FieldVar::Constant(*k + c),
            FieldVar::Linear(linear) => FieldVar::Linear(linear.shifted(c)),
        }
    }

    /// `self · c` for a known `c`
    pub fn scale(&self, c: F) -> Self {
        match self {
            FieldVar::Constant(k) => FieldVar::Constant(*k * c),
            FieldVar::Linear(linear) => FieldVar::Linear(linear.scaled(c)),
        }
    }

    // ════════════════════════════════════════════════════════════════════
    //  Arithmetic
    // ════════════════════════════════════════════════════════════════════

    pub fn add(&self, other: &FieldVar<F>) -> Result<Self> {
        match (self, other) {
            (FieldVar::Constant(a), FieldVar::Constant(b)) => Ok(FieldVar::Constant(*a + *b)),
            (FieldVar::Linear(linear), FieldVar::Constant(c))
            | (FieldVar::Constant(c), FieldVar::Linear(linear)) => {
                Ok(FieldVar::Linear(linear.shifted(*c)))
            }
            (FieldVar::Linear(x), FieldVar::Linear(y)) => {
                x.circuit.ensure_same(&y.circuit)?;
                let circuit = &x.circuit;
                let res = circuit.new_variable(|| Ok(self.value()? + other.value()?))?;
                circuit.add_constraint(Constraint::Add(self, other, &res))?;
                Ok(res)
            }
        }
    }

    pub fn sub(&self, other: &FieldVar<F>) -> Result<Self> {
        self.add(&other.neg())
    }

    pub fn mul(&self, other: &FieldVar<F>) -> Result<Self> {
        match (self, other) {
            (FieldVar::Constant(a), FieldVar::Constant(b)) => Ok(FieldVar::Constant(*a * *b)),
            (FieldVar::Linear(linear), FieldVar::Constant(c))
            | (FieldVar::Constant(c), FieldVar::Linear(linear)) => {
                Ok(FieldVar::Linear(linear.scaled(*c)))
            }
            (FieldVar::Linear(x), FieldVar::Linear(y)) => {
                x.circuit.ensure_same(&y.circuit)?;
                let circuit = &x.circuit;
                let res = circuit.new_variable(|| Ok(self.value()? * other.value()?))?;
                circuit.add_constraint(Constraint::Multiply(self, other, &res))?;
                Ok(res)
            }
        }
    }

    /// Division, enforced as `res · other = self`
    pub fn div(&self, other: &FieldVar<F>) -> Result<Self> {
        match (self, other) {
            (FieldVar::Linear(x), FieldVar::Linear(y)) => {
                x.circuit.ensure_same(&y.circuit)?;
                let circuit = &x.circuit;
                let res = circuit.new_variable(|| {
                    let denominator = other.value()?.inverse().ok_or(CircuitError::DivisionByZero)?;
                    Ok(self.value()? * denominator)
                })?;
                circuit.add_constraint(Constraint::Multiply(&res, other, self))?;
                Ok(res)
            }
            _ => self.mul(&other.inv()?),
        }
    }

    pub fn inv(&self) -> Result<Self> {
        match self {
            FieldVar::Constant(c) => c
                .inverse()
                .map(FieldVar::Constant)
                .ok_or(CircuitError::DivisionByZero),
            FieldVar::Linear(linear) => {
                let circuit = &linear.circuit;
                let res = circuit
                    .new_variable(|| self.value()?.inverse().ok_or(CircuitError::DivisionByZero))?;
                circuit.add_constraint(Constraint::Multiply(self, &res, &FieldVar::one()))?;
                Ok(res)
            }
        }
    }

    pub fn square(&self) -> Result<Self> {
        self.mul(self)
    }

    /// Square root, enforced as `res · res = self`.
    ///
    /// Fails with `NoSquareRoot` for a non-residue: immediately for
    /// constants, while computing the witness for variables.
    pub fn sqrt(&self) -> Result<Self> {
        match self {
            FieldVar::Constant(c) => c
                .sqrt()
                .map(FieldVar::Constant)
                .ok_or_else(|| CircuitError::NoSquareRoot(c.to_decimal())),
            FieldVar::Linear(linear) => {
                let circuit = &linear.circuit;
                let res = circuit.new_variable(|| {
                    let v = self.value()?;
                    v.sqrt().ok_or_else(|| CircuitError::NoSquareRoot(v.to_decimal()))
                })?;
                circuit.add_constraint(Constraint::Multiply(&res, &res, self))?;
                Ok(res)
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════
    //  Comparisons and assertions
    // ════════════════════════════════════════════════════════════════════

    /// Zero test: `x_inv · x = 1 - res` and `res · x = 0`
    pub fn is_zero(&self) -> Result<Bool<F>> {
        match self {
            FieldVar::Constant(c) => Ok(Bool::constant(c.is_zero())),
            FieldVar::Linear(linear) => {
                let circuit = &linear.circuit;
                let x_inv = circuit.new_variable(|| Ok(self.value()?.inverse().unwrap_or_else(F::zero)))?;
                let res = circuit.new_variable(|| {
                    Ok(if self.value()?.is_zero() { F::one() } else { F::zero() })
                })?;
                let one_minus_res = res.neg().add_constant(F::one());
                circuit.add_constraint(Constraint::Multiply(&x_inv, self, &one_minus_res))?;
                circuit.add_constraint(Constraint::Multiply(&res, self, &FieldVar::zero()))?;
                Ok(Bool::from_field_unchecked(res))
            }
        }
    }

    pub fn equals(&self, other: &FieldVar<F>) -> Result<Bool<F>> {
        self.sub(other)?.is_zero()
    }

    /// Constrain `self = other`; two differing constants fail immediately.
    pub fn assert_equal(&self, other: &FieldVar<F>) -> Result<()> {
        match (self, other) {
            (FieldVar::Constant(a), FieldVar::Constant(b)) => {
                if a == b {
                    Ok(())
                } else {
                    Err(CircuitError::UnequalConstants {
                        left: a.to_decimal(),
                        right: b.to_decimal(),
                    })
                }
            }
            (FieldVar::Linear(linear), _) | (_, FieldVar::Linear(linear)) => {
                linear.circuit.add_constraint(Constraint::Equal(self, other))
            }
        }
    }

    /// Constrain `self ∈ {0, 1}`; other constants fail immediately.
    pub fn assert_boolean(&self) -> Result<()> {
        match self {
            FieldVar::Constant(c) => {
                if c.is_zero() || *c == F::one() {
                    Ok(())
                } else {
                    Err(CircuitError::NonBooleanConstant(c.to_decimal()))
                }
            }
            FieldVar::Linear(linear) => linear.circuit.add_constraint(Constraint::Boolean(self)),
        }
    }

    pub fn to_bool(&self) -> Result<Bool<F>> {
        self.assert_boolean()?;
        Ok(Bool::from_field_unchecked(self.clone()))
    }
}

impl<F: CircuitField> From<F> for FieldVar<F> {
    fn from(value: F) -> Self {
        FieldVar::Constant(value)
    }
}

impl<F: CircuitField> fmt::Display for FieldVar<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldVar::Constant(c) => write!(f, "{}", c.to_decimal()),
            FieldVar::Linear(_) => f.write_str("[CircuitVariable]"),
        }
    }
}
