//! Circuit Builder
//!
//! Owns variable allocation, the witness tables and the gate list for one
//! circuit-construction pass.
//!
//! Every variable-backed [`FieldVar`] carries a clone of the [`Circuit`]
//! handle it was allocated from. Operations that need a new variable call
//! back into the handle, which allocates an index, runs the value closure in
//! witnessing mode (proving passes only) and lowers the relating constraint to
//! generic gates.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::constraint::{ConstraintKind, ConstraintSystem, GateKind, GenericGate, Variable, Witness};
use crate::config::CircuitConfig;
use crate::error::{CircuitError, Result};
use crate::field::CircuitField;
use crate::field_var::FieldVar;
use crate::value::CircuitValue;

/// Whether variable values may currently be read
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Building the shape of the circuit
    Building,
    /// Running prover-only code
    Witnessing,
}

/// A logical constraint over field expressions
#[derive(Clone, Copy, Debug)]
pub enum Constraint<'a, F: CircuitField> {
    /// x * y = z
    Multiply(&'a FieldVar<F>, &'a FieldVar<F>, &'a FieldVar<F>),
    /// x + y = z
    Add(&'a FieldVar<F>, &'a FieldVar<F>, &'a FieldVar<F>),
    /// x = y
    Equal(&'a FieldVar<F>, &'a FieldVar<F>),
    /// x * x = x
    Boolean(&'a FieldVar<F>),
}

/// Mutable state behind a [`Circuit`] handle
struct CircuitBuilder<F: CircuitField> {
    config: CircuitConfig,
    /// `variables[i]` holds variable `i + 1`
    variables: Vec<Option<F>>,
    /// `public_variables[i]` holds variable `-(i + 1)`
    public_variables: Vec<Option<F>>,
    gates: Vec<GenericGate<F>>,
    mode: Mode,
}

impl<F: CircuitField> CircuitBuilder<F> {
    fn allocate_private(&mut self) -> Variable {
        // Pre-increment: index 0 stays free for the unused-wire sentinel
        self.variables.push(None);
        Variable::private(self.variables.len())
    }

    fn allocate_public(&mut self) -> Variable {
        self.public_variables.push(None);
        Variable::public(self.public_variables.len())
    }

    fn slot(&mut self, variable: Variable) -> Option<&mut Option<F>> {
        let index = variable.index();
        if index > 0 {
            self.variables.get_mut(index as usize - 1)
        } else if index < 0 {
            self.public_variables.get_mut(index.unsigned_abs() as usize - 1)
        } else {
            None
        }
    }

    fn value(&self, variable: Variable) -> Option<F> {
        let index = variable.index();
        let slot = if index > 0 {
            self.variables.get(index as usize - 1)
        } else if index < 0 {
            self.public_variables.get(index.unsigned_abs() as usize - 1)
        } else {
            None
        };
        slot.copied().flatten()
    }

    fn store(&mut self, variable: Variable, value: F) -> Result<()> {
        match self.slot(variable) {
            Some(Some(_)) => Err(CircuitError::AlreadySet(variable)),
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(CircuitError::UnsetVariable(variable)),
        }
    }
}

/// Handle to a circuit under construction
///
/// Cloning the handle is cheap and every clone refers to the same circuit.
#[derive(Clone)]
pub struct Circuit<F: CircuitField> {
    inner: Rc<RefCell<CircuitBuilder<F>>>,
}

/// Restores the previous mode when dropped
struct WitnessGuard<'a, F: CircuitField> {
    circuit: &'a Circuit<F>,
    previous: Mode,
}

impl<'a, F: CircuitField> WitnessGuard<'a, F> {
    fn enter(circuit: &'a Circuit<F>) -> Self {
        let previous =
            std::mem::replace(&mut circuit.inner.borrow_mut().mode, Mode::Witnessing);
        WitnessGuard { circuit, previous }
    }
}

impl<F: CircuitField> Drop for WitnessGuard<'_, F> {
    fn drop(&mut self) {
        self.circuit.inner.borrow_mut().mode = self.previous;
    }
}

impl<F: CircuitField> Circuit<F> {
    /// Create a circuit with the default configuration
    pub fn new() -> Self {
        Self::with_config(CircuitConfig::default())
    }

    pub fn with_config(config: CircuitConfig) -> Self {
        debug!(
            circuit = %config.name,
            compute_witness = config.compute_witness,
            "starting circuit"
        );
        Circuit {
            inner: Rc::new(RefCell::new(CircuitBuilder {
                config,
                variables: Vec::new(),
                public_variables: Vec::new(),
                gates: Vec::new(),
                mode: Mode::Building,
            })),
        }
    }

    pub fn name(&self) -> String {
        self.inner.borrow().config.name.clone()
    }

    pub fn mode(&self) -> Mode {
        self.inner.borrow().mode
    }

    pub fn is_witnessing(&self) -> bool {
        self.mode() == Mode::Witnessing
    }

    /// Whether this pass fills in a witness
    pub fn computes_witness(&self) -> bool {
        self.inner.borrow().config.compute_witness
    }

    pub fn num_variables(&self) -> usize {
        self.inner.borrow().variables.len()
    }

    pub fn num_public_variables(&self) -> usize {
        self.inner.borrow().public_variables.len()
    }

    pub fn num_gates(&self) -> usize {
        self.inner.borrow().gates.len()
    }

    /// True if both handles refer to the same circuit
    pub fn same_circuit(&self, other: &Circuit<F>) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn ensure_same(&self, other: &Circuit<F>) -> Result<()> {
        if self.same_circuit(other) {
            Ok(())
        } else {
            Err(CircuitError::DifferentCircuits)
        }
    }

    /// Run `f` in witnessing mode, restoring the previous mode afterwards
    fn witnessing<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let _guard = WitnessGuard::enter(self);
        f()
    }

    /// Read the value stored in a variable. Prover-only.
    pub(crate) fn read_variable(&self, variable: Variable) -> Result<F> {
        let builder = self.inner.borrow();
        if builder.mode != Mode::Witnessing {
            return Err(CircuitError::ReadOutsideProver(variable));
        }
        builder.value(variable).ok_or(CircuitError::UnsetVariable(variable))
    }

    /// Allocate a private variable whose value is computed by `compute`.
    ///
    /// Inside prover-only code no variable is allocated: `compute` runs
    /// immediately and its result comes back as a constant.
    pub fn new_variable<V>(&self, compute: V) -> Result<FieldVar<F>>
    where
        V: FnOnce() -> Result<F>,
    {
        if self.is_witnessing() {
            return compute().map(FieldVar::Constant);
        }

        // The value comes first so a failing closure leaves no variable behind
        let value = if self.computes_witness() {
            Some(self.witnessing(compute)?)
        } else {
            None
        };
        let variable = self.inner.borrow_mut().allocate_private();
        trace!(circuit = %self.name(), %variable, "allocated variable");
        if let Some(value) = value {
            self.inner.borrow_mut().store(variable, value)?;
        }
        Ok(FieldVar::from_variable(self, variable))
    }

    /// Allocate a public input variable.
    pub fn new_public_variable<V>(&self, compute: V) -> Result<FieldVar<F>>
    where
        V: FnOnce() -> Result<F>,
    {
        if self.is_witnessing() {
            return Err(CircuitError::PublicInProver);
        }

        let value = if self.computes_witness() {
            Some(self.witnessing(compute)?)
        } else {
            None
        };
        let variable = self.inner.borrow_mut().allocate_public();
        trace!(circuit = %self.name(), %variable, "allocated public variable");
        if let Some(value) = value {
            self.inner.borrow_mut().store(variable, value)?;
        }
        Ok(FieldVar::from_variable(self, variable))
    }

    /// Allocate a private variable to be filled later with `set_variable`.
    pub fn new_unfilled_variable(&self) -> Result<FieldVar<F>> {
        if self.is_witnessing() {
            return Err(CircuitError::UnfilledInProver);
        }
        let variable = self.inner.borrow_mut().allocate_private();
        trace!(circuit = %self.name(), %variable, "allocated unfilled variable");
        Ok(FieldVar::from_variable(self, variable))
    }

    /// Fill a bare variable that was allocated without a value.
    pub fn set_variable<V>(&self, x: &FieldVar<F>, compute: V) -> Result<()>
    where
        V: FnOnce() -> Result<F>,
    {
        let linear = match x {
            FieldVar::Constant(_) => return Err(CircuitError::NotAVariable),
            FieldVar::Linear(linear) => linear,
        };
        if linear.scale.is_some() || linear.constant.is_some() {
            return Err(CircuitError::NotBareVariable);
        }
        self.ensure_same(&linear.circuit)?;

        let variable = linear.variable;
        if self.inner.borrow().value(variable).is_some() {
            return Err(CircuitError::AlreadySet(variable));
        }
        if !self.computes_witness() {
            return Ok(());
        }
        let value = self.witnessing(compute)?;
        self.inner.borrow_mut().store(variable, value)
    }

    /// Run prover-only code.
    ///
    /// Returns None without running `f` when this pass computes no witness.
    pub fn as_prover<T>(&self, f: impl FnOnce() -> Result<T>) -> Result<Option<T>> {
        if !self.computes_witness() {
            return Ok(None);
        }
        self.witnessing(f).map(Some)
    }

    /// Read the concrete value of an expression over this circuit
    pub fn read(&self, x: &FieldVar<F>) -> Result<Option<F>> {
        self.as_prover(|| x.value())
    }

    /// Allocate a structured value, one private variable per field element.
    ///
    /// `compute` runs only in proving passes and should build `T` from
    /// constants; a setup pass allocates unfilled variables instead.
    pub fn witness<T, V>(&self, compute: V) -> Result<T>
    where
        T: CircuitValue<F>,
        V: FnOnce() -> Result<T>,
    {
        if self.is_witnessing() {
            return compute();
        }

        let variables = if self.computes_witness() {
            let values = self.witnessing(|| {
                compute()?
                    .to_field_elements()
                    .iter()
                    .map(FieldVar::value)
                    .collect::<Result<Vec<F>>>()
            })?;
            values
                .into_iter()
                .map(|value| self.new_variable(|| Ok(value)))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..T::size_in_field_elements())
                .map(|_| self.new_unfilled_variable())
                .collect::<Result<Vec<_>>>()?
        };
        T::from_field_elements(variables)
    }

    /// Lower a logical constraint to a generic gate and record it.
    ///
    /// Prover-only code records nothing: constraints must come out identical
    /// whether or not value closures run.
    pub fn add_constraint(&self, constraint: Constraint<'_, F>) -> Result<()> {
        let gate = match constraint {
            // (qx·x + cx)·(qy·y + cy) = qz·z + cz
            Constraint::Multiply(x, y, z) => {
                let (x, y, z) = (self.term(x)?, self.term(y)?, self.term(z)?);
                generic(
                    ConstraintKind::Multiply,
                    [x.q * y.c, y.q * x.c, -z.q, x.q * y.q, x.c * y.c - z.c],
                    [x.variable, y.variable, z.variable],
                )
            }
            // (qx·x + cx) + (qy·y + cy) = qz·z + cz
            Constraint::Add(x, y, z) => {
                let (x, y, z) = (self.term(x)?, self.term(y)?, self.term(z)?);
                generic(
                    ConstraintKind::Add,
                    [x.q, y.q, -z.q, F::zero(), x.c + y.c - z.c],
                    [x.variable, y.variable, z.variable],
                )
            }
            // qx·x + cx = qy·y + cy
            Constraint::Equal(x, y) => {
                let (x, y) = (self.term(x)?, self.term(y)?);
                generic(
                    ConstraintKind::Equal,
                    [x.q, -y.q, F::zero(), F::zero(), x.c - y.c],
                    [x.variable, y.variable, Variable::NONE],
                )
            }
            // (qx·x + cx)² = qx·x + cx
            Constraint::Boolean(x) => {
                let x = self.term(x)?;
                let two = F::one() + F::one();
                generic(
                    ConstraintKind::Boolean,
                    [two * x.q * x.c - x.q, F::zero(), F::zero(), x.q * x.q, x.c * x.c - x.c],
                    [x.variable, x.variable, Variable::NONE],
                )
            }
        };

        let mut builder = self.inner.borrow_mut();
        if builder.mode == Mode::Witnessing {
            trace!(circuit = %builder.config.name, origin = %gate.origin, "skipped gate in prover code");
            return Ok(());
        }
        trace!(
            circuit = %builder.config.name,
            index = builder.gates.len(),
            origin = %gate.origin,
            "emitted generic gate"
        );
        builder.gates.push(gate);
        Ok(())
    }

    /// Split an operand into `q·var + c`, with `q = 0` for constants
    fn term(&self, x: &FieldVar<F>) -> Result<Term<F>> {
        match x {
            FieldVar::Constant(c) => Ok(Term { q: F::zero(), c: *c, variable: Variable::NONE }),
            FieldVar::Linear(linear) => {
                self.ensure_same(&linear.circuit)?;
                Ok(Term {
                    q: linear.scale.unwrap_or_else(F::one),
                    c: linear.constant.unwrap_or_else(F::zero),
                    variable: linear.variable,
                })
            }
        }
    }

    /// Extract the constraint system and, for proving passes, the witness.
    pub fn finish(&self) -> CompiledCircuit<F> {
        let builder = self.inner.borrow();
        let constraint_system = ConstraintSystem {
            gates: builder.gates.clone(),
            num_private: builder.variables.len(),
            num_public: builder.public_variables.len(),
        };
        let witness = builder.config.compute_witness.then(|| Witness {
            private: builder.variables.clone(),
            public: builder.public_variables.clone(),
        });
        debug!(
            circuit = %builder.config.name,
            gates = constraint_system.num_gates(),
            private = constraint_system.num_private,
            public = constraint_system.num_public,
            "finished circuit"
        );
        CompiledCircuit { constraint_system, witness }
    }
}

impl<F: CircuitField> Default for Circuit<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: CircuitField> fmt::Debug for Circuit<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let builder = self.inner.borrow();
        f.debug_struct("Circuit")
            .field("name", &builder.config.name)
            .field("variables", &builder.variables.len())
            .field("public_variables", &builder.public_variables.len())
            .field("gates", &builder.gates.len())
            .field("mode", &builder.mode)
            .finish()
    }
}

struct Term<F> {
    q: F,
    c: F,
    variable: Variable,
}

fn generic<F: CircuitField>(origin: ConstraintKind, q: [F; 5], wires: [Variable; 3]) -> GenericGate<F> {
    let [ql, qr, qo, qm, qc] = q;
    let [l, r, o] = wires;
    GenericGate { kind: GateKind::Generic, origin, ql, qr, qo, qm, qc, l, r, o }
}

/// Output of one construction pass, handed to a proving backend
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CompiledCircuit<F: CircuitField> {
    pub constraint_system: ConstraintSystem<F>,
    /// Present only for passes that computed a witness
    pub witness: Option<Witness<F>>,
}

impl<F: CircuitField> CompiledCircuit<F> {
    /// True if a witness was computed and satisfies every gate
    pub fn is_satisfied(&self) -> bool {
        self.witness
            .as_ref()
            .map_or(false, |w| self.constraint_system.is_satisfied(w))
    }

    /// Indices of failing gates; every gate fails without a witness
    pub fn unsatisfied_gates(&self) -> Vec<usize> {
        match &self.witness {
            Some(w) => self.constraint_system.unsatisfied_gates(w),
            None => (0..self.constraint_system.num_gates()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Fp;
    use std::cell::Cell;

    fn constant(v: u64) -> Result<Fp> {
        Ok(Fp::from_u64(v))
    }

    #[test]
    fn test_private_indices_start_at_one() {
        let circuit = Circuit::<Fp>::new();
        let a = circuit.new_variable(|| constant(1)).unwrap();
        let b = circuit.new_variable(|| constant(2)).unwrap();
        let c = circuit.new_variable(|| constant(3)).unwrap();

        let indices: Vec<i64> = [a, b, c]
            .iter()
            .map(|x| x.as_linear().unwrap().variable().index())
            .collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert_eq!(circuit.num_variables(), 3);
    }

    #[test]
    fn test_public_indices_are_negative() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_public_variable(|| constant(8)).unwrap();
        let y = circuit.new_variable(|| constant(2)).unwrap();
        let z = circuit.new_public_variable(|| constant(9)).unwrap();

        assert_eq!(x.as_linear().unwrap().variable(), Variable::public(1));
        assert_eq!(y.as_linear().unwrap().variable(), Variable::private(1));
        assert_eq!(z.as_linear().unwrap().variable(), Variable::public(2));
        assert_eq!(circuit.read(&z).unwrap(), Some(Fp::from_u64(9)));
    }

    #[test]
    fn test_read_outside_prover_fails() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_variable(|| constant(5)).unwrap();
        assert_eq!(x.value(), Err(CircuitError::ReadOutsideProver(Variable::private(1))));
        assert_eq!(circuit.read(&x).unwrap(), Some(Fp::from_u64(5)));
    }

    #[test]
    fn test_nested_allocation_evaluates_in_place() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit
            .new_variable(|| {
                let inner = circuit.new_variable(|| constant(7))?;
                assert!(inner.is_constant());
                inner.value()
            })
            .unwrap();

        assert_eq!(circuit.num_variables(), 1);
        assert_eq!(circuit.read(&x).unwrap(), Some(Fp::from_u64(7)));
    }

    #[test]
    fn test_public_in_prover_fails() {
        let circuit = Circuit::<Fp>::new();
        let result = circuit.new_variable(|| {
            circuit.new_public_variable(|| constant(1))?;
            constant(0)
        });
        assert_eq!(result.unwrap_err(), CircuitError::PublicInProver);
        assert_eq!(circuit.num_public_variables(), 0);
        assert_eq!(circuit.num_variables(), 0);
    }

    #[test]
    fn test_failing_closure_allocates_nothing() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_variable(|| constant(1)).unwrap();
        assert!(circuit.new_variable(|| Err(CircuitError::DivisionByZero)).is_err());
        assert!(circuit.new_public_variable(|| Err(CircuitError::DivisionByZero)).is_err());
        assert_eq!(circuit.num_variables(), 1);
        assert_eq!(circuit.num_public_variables(), 0);

        let y = circuit.new_variable(|| constant(2)).unwrap();
        assert_eq!(y.as_linear().unwrap().variable(), Variable::private(2));
        x.mul(&y).unwrap();
        assert!(circuit.finish().witness.unwrap().is_complete());
    }

    #[test]
    fn test_mode_restored_after_failing_closure() {
        let circuit = Circuit::<Fp>::new();
        let result = circuit.new_variable(|| Err(CircuitError::DivisionByZero));
        assert_eq!(result.unwrap_err(), CircuitError::DivisionByZero);
        assert_eq!(circuit.mode(), Mode::Building);

        let nested = circuit.as_prover(|| {
            circuit.as_prover(|| Ok(()))?;
            assert_eq!(circuit.mode(), Mode::Witnessing);
            Ok(())
        });
        assert!(nested.is_ok());
        assert_eq!(circuit.mode(), Mode::Building);
    }

    #[test]
    fn test_setup_pass_never_runs_closures() {
        let circuit = Circuit::<Fp>::with_config(CircuitConfig::setup("shape"));
        let calls = Cell::new(0);
        let x = circuit
            .new_variable(|| {
                calls.set(calls.get() + 1);
                constant(3)
            })
            .unwrap();
        let y = circuit
            .new_public_variable(|| {
                calls.set(calls.get() + 1);
                constant(9)
            })
            .unwrap();
        x.mul(&x).unwrap().assert_equal(&y).unwrap();

        assert_eq!(calls.get(), 0);
        assert_eq!(circuit.read(&x).unwrap(), None);

        let compiled = circuit.finish();
        assert!(compiled.witness.is_none());
        assert_eq!(compiled.constraint_system.num_gates(), 2);
        assert_eq!(compiled.unsatisfied_gates(), vec![0, 1]);
    }

    #[test]
    fn test_setup_and_prover_passes_agree() {
        fn build(config: CircuitConfig) -> ConstraintSystem<Fp> {
            let circuit = Circuit::with_config(config);
            let x = circuit.new_variable(|| constant(4)).unwrap();
            let y = circuit.new_public_variable(|| constant(2)).unwrap();
            let q = x.div(&y).unwrap();
            q.is_zero().unwrap();
            circuit.finish().constraint_system
        }
        assert_eq!(build(CircuitConfig::setup("a")), build(CircuitConfig::prover("a")));
    }

    #[test]
    fn test_set_variable() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_unfilled_variable().unwrap();
        assert_eq!(circuit.read(&x), Err(CircuitError::UnsetVariable(Variable::private(1))));

        circuit.set_variable(&x, || constant(11)).unwrap();
        assert_eq!(circuit.read(&x).unwrap(), Some(Fp::from_u64(11)));

        assert_eq!(
            circuit.set_variable(&x, || constant(12)),
            Err(CircuitError::AlreadySet(Variable::private(1)))
        );
        assert_eq!(
            circuit.set_variable(&FieldVar::from_u64(1), || constant(1)),
            Err(CircuitError::NotAVariable)
        );
        assert_eq!(
            circuit.set_variable(&x.scale(Fp::from_u64(2)), || constant(1)),
            Err(CircuitError::NotBareVariable)
        );

        let other = Circuit::<Fp>::new();
        let y = other.new_unfilled_variable().unwrap();
        assert_eq!(circuit.set_variable(&y, || constant(1)), Err(CircuitError::DifferentCircuits));
    }

    #[test]
    fn test_unfilled_in_prover_fails() {
        let circuit = Circuit::<Fp>::new();
        let result = circuit.as_prover(|| circuit.new_unfilled_variable());
        assert_eq!(result.unwrap_err(), CircuitError::UnfilledInProver);
    }

    #[test]
    fn test_constraints_in_prover_code_are_not_recorded() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_variable(|| constant(2)).unwrap();
        let y = circuit.new_variable(|| constant(3)).unwrap();

        let product = circuit.as_prover(|| x.mul(&y)?.value()).unwrap();
        assert_eq!(product, Some(Fp::from_u64(6)));
        assert_eq!(circuit.num_gates(), 0);
        assert_eq!(circuit.num_variables(), 2);
    }

    #[test]
    fn test_foreign_operand_rejected() {
        let a = Circuit::<Fp>::new();
        let b = Circuit::<Fp>::new();
        let x = a.new_variable(|| constant(1)).unwrap();
        let y = b.new_variable(|| constant(1)).unwrap();

        assert_eq!(a.add_constraint(Constraint::Equal(&x, &y)), Err(CircuitError::DifferentCircuits));
        assert_eq!(a.add_constraint(Constraint::Boolean(&y)), Err(CircuitError::DifferentCircuits));
        assert_eq!(a.num_gates(), 0);
    }

    #[test]
    fn test_compiled_circuit_serializes() {
        let circuit = Circuit::<Fp>::new();
        let x = circuit.new_variable(|| constant(1)).unwrap();
        x.assert_boolean().unwrap();

        let compiled = circuit.finish();
        let json = serde_json::to_string(&compiled).unwrap();
        let back: CompiledCircuit<Fp> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.constraint_system, compiled.constraint_system);
        assert!(back.is_satisfied());
    }
}
