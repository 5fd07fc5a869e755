//! Circuit Booleans
//!
//! A [`Bool`] is a [`FieldVar`] known to hold 0 or 1. Negation is affine and
//! free; conjunction is one multiplication; disjunction goes through
//! De Morgan so it reuses the multiplication gate.

use crate::error::{CircuitError, Result};
use crate::field::CircuitField;
use crate::field_var::FieldVar;

#[derive(Clone, Debug)]
pub struct Bool<F: CircuitField> {
    field: FieldVar<F>,
}

impl<F: CircuitField> Bool<F> {
    pub fn constant(value: bool) -> Self {
        Bool { field: FieldVar::from_bool(value) }
    }

    /// Reinterpret a field value as a boolean without constraining it.
    ///
    /// The caller must already know the value is 0 or 1, e.g. because a
    /// boolean constraint was emitted for it.
    pub fn from_field_unchecked(field: FieldVar<F>) -> Self {
        Bool { field }
    }

    pub fn to_field(&self) -> &FieldVar<F> {
        &self.field
    }

    pub fn into_field(self) -> FieldVar<F> {
        self.field
    }

    pub fn is_constant(&self) -> bool {
        self.field.is_constant()
    }

    /// Prover-only read of the concrete value. Fails if the underlying field
    /// element is neither 0 nor 1.
    pub fn value(&self) -> Result<bool> {
        let v = self.field.value()?;
        if v.is_zero() {
            Ok(false)
        } else if v == F::one() {
            Ok(true)
        } else {
            Err(CircuitError::NonBooleanConstant(v.to_decimal()))
        }
    }

    /// `1 - x`
    pub fn not(&self) -> Self {
        Bool { field: self.field.neg().add_constant(F::one()) }
    }

    /// `x · y`
    pub fn and(&self, other: &Bool<F>) -> Result<Self> {
        Ok(Bool { field: self.field.mul(&other.field)? })
    }

    /// `¬(¬x ∧ ¬y)`
    pub fn or(&self, other: &Bool<F>) -> Result<Self> {
        Ok(self.not().and(&other.not())?.not())
    }

    pub fn assert_equal(&self, other: &Bool<F>) -> Result<()> {
        self.field.assert_equal(&other.field)
    }

    pub fn equals(&self, other: &Bool<F>) -> Result<Bool<F>> {
        self.field.equals(&other.field)
    }

    pub fn is_true(&self) -> Result<Bool<F>> {
        self.equals(&Bool::constant(true))
    }

    pub fn is_false(&self) -> Result<Bool<F>> {
        self.equals(&Bool::constant(false))
    }

    /// Number of true values, as a field element
    pub fn count(bools: &[Bool<F>]) -> Result<FieldVar<F>> {
        bools
            .iter()
            .try_fold(FieldVar::zero(), |acc, b| acc.add(&b.field))
    }
}

impl<F: CircuitField> From<bool> for Bool<F> {
    fn from(value: bool) -> Self {
        Bool::constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::Circuit;
    use crate::field::Fp;

    fn witness_bool(circuit: &Circuit<Fp>, value: bool) -> Bool<Fp> {
        circuit
            .new_variable(|| Ok(Fp::from(value)))
            .unwrap()
            .to_bool()
            .unwrap()
    }

    fn read(circuit: &Circuit<Fp>, b: &Bool<Fp>) -> bool {
        circuit.as_prover(|| b.value()).unwrap().unwrap()
    }

    #[test]
    fn test_constant_logic() {
        let t = Bool::<Fp>::constant(true);
        let f = Bool::<Fp>::from(false);

        assert!(!t.not().value().unwrap());
        assert!(!t.and(&f).unwrap().value().unwrap());
        assert!(t.or(&f).unwrap().value().unwrap());
        assert!(t.and(&f).unwrap().is_constant());
        assert!(f.is_false().unwrap().value().unwrap());
    }

    #[test]
    fn test_truth_tables() {
        for a in [false, true] {
            for b in [false, true] {
                let circuit = Circuit::<Fp>::new();
                let x = witness_bool(&circuit, a);
                let y = witness_bool(&circuit, b);

                let not = x.not();
                let and = x.and(&y).unwrap();
                let or = x.or(&y).unwrap();

                assert_eq!(read(&circuit, &not), !a);
                assert_eq!(read(&circuit, &and), a && b);
                assert_eq!(read(&circuit, &or), a || b);
                assert!(circuit.finish().is_satisfied());
            }
        }
    }

    #[test]
    fn test_or_uses_one_multiplication() {
        let circuit = Circuit::<Fp>::new();
        let x = witness_bool(&circuit, true);
        let y = witness_bool(&circuit, false);
        let before = circuit.num_gates();

        x.or(&y).unwrap();
        assert_eq!(circuit.num_gates() - before, 1);
    }

    #[test]
    fn test_equals_and_is_true() {
        let circuit = Circuit::<Fp>::new();
        let x = witness_bool(&circuit, true);
        let y = witness_bool(&circuit, false);

        assert!(!read(&circuit, &x.equals(&y).unwrap()));
        assert!(read(&circuit, &x.is_true().unwrap()));
        assert!(read(&circuit, &y.is_false().unwrap()));

        x.assert_equal(&y.not()).unwrap();
        assert!(circuit.finish().is_satisfied());
    }

    #[test]
    fn test_value_rejects_non_boolean() {
        let circuit = Circuit::<Fp>::new();
        let two = circuit.new_variable(|| Ok(Fp::from_u64(2))).unwrap();
        let b = Bool::from_field_unchecked(two);

        assert_eq!(
            circuit.as_prover(|| b.value()),
            Err(CircuitError::NonBooleanConstant("2".to_string()))
        );
        assert_eq!(
            Bool::from_field_unchecked(FieldVar::<Fp>::from_u64(3)).value(),
            Err(CircuitError::NonBooleanConstant("3".to_string()))
        );
    }

    #[test]
    fn test_count() {
        let circuit = Circuit::<Fp>::new();
        let bools: Vec<Bool<Fp>> = [true, false, true, true]
            .into_iter()
            .map(|b| witness_bool(&circuit, b))
            .collect();

        let count = Bool::count(&bools).unwrap();
        assert_eq!(circuit.read(&count).unwrap(), Some(Fp::from_u64(3)));
        assert!(circuit.finish().is_satisfied());

        let constants = [Bool::<Fp>::constant(true), Bool::constant(true)];
        assert_eq!(Bool::count(&constants).unwrap().as_constant(), Some(Fp::from_u64(2)));
    }
}
