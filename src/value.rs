//! Structured Circuit Values
//!
//! Types that flatten to a fixed number of field elements, so they can be
//! allocated as a block of witness variables with [`Circuit::witness`].
//!
//! [`Circuit::witness`]: crate::circuit::Circuit::witness

use crate::boolean::Bool;
use crate::error::{CircuitError, Result};
use crate::field::CircuitField;
use crate::field_var::FieldVar;

pub trait CircuitValue<F: CircuitField>: Sized {
    /// Number of field elements, independent of the value
    fn size_in_field_elements() -> usize;

    fn to_field_elements(&self) -> Vec<FieldVar<F>>;

    /// Rebuild a value; fails if `fields` has the wrong length
    fn from_field_elements(fields: Vec<FieldVar<F>>) -> Result<Self>;
}

fn check_count(expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(CircuitError::FieldElementCount { expected, actual })
    }
}

impl<F: CircuitField> CircuitValue<F> for FieldVar<F> {
    fn size_in_field_elements() -> usize {
        1
    }

    fn to_field_elements(&self) -> Vec<FieldVar<F>> {
        vec![self.clone()]
    }

    fn from_field_elements(fields: Vec<FieldVar<F>>) -> Result<Self> {
        check_count(1, fields.len())?;
        Ok(fields.into_iter().next().unwrap_or_else(FieldVar::zero))
    }
}

/// Rebuilding a `Bool` constrains the element to be boolean
impl<F: CircuitField> CircuitValue<F> for Bool<F> {
    fn size_in_field_elements() -> usize {
        1
    }

    fn to_field_elements(&self) -> Vec<FieldVar<F>> {
        vec![self.to_field().clone()]
    }

    fn from_field_elements(fields: Vec<FieldVar<F>>) -> Result<Self> {
        <FieldVar<F> as CircuitValue<F>>::from_field_elements(fields)?.to_bool()
    }
}

impl<F: CircuitField, T: CircuitValue<F>, const N: usize> CircuitValue<F> for [T; N] {
    fn size_in_field_elements() -> usize {
        T::size_in_field_elements() * N
    }

    fn to_field_elements(&self) -> Vec<FieldVar<F>> {
        self.iter().flat_map(T::to_field_elements).collect()
    }

    fn from_field_elements(fields: Vec<FieldVar<F>>) -> Result<Self> {
        check_count(Self::size_in_field_elements(), fields.len())?;
        let size = T::size_in_field_elements();
        let mut fields = fields.into_iter();
        let items = (0..N)
            .map(|_| T::from_field_elements(fields.by_ref().take(size).collect()))
            .collect::<Result<Vec<T>>>()?;
        items
            .try_into()
            .map_err(|items: Vec<T>| CircuitError::FieldElementCount { expected: N, actual: items.len() })
    }
}

impl<F: CircuitField, A: CircuitValue<F>, B: CircuitValue<F>> CircuitValue<F> for (A, B) {
    fn size_in_field_elements() -> usize {
        A::size_in_field_elements() + B::size_in_field_elements()
    }

    fn to_field_elements(&self) -> Vec<FieldVar<F>> {
        let mut fields = self.0.to_field_elements();
        fields.extend(self.1.to_field_elements());
        fields
    }

    fn from_field_elements(mut fields: Vec<FieldVar<F>>) -> Result<Self> {
        check_count(Self::size_in_field_elements(), fields.len())?;
        let rest = fields.split_off(A::size_in_field_elements());
        Ok((A::from_field_elements(fields)?, B::from_field_elements(rest)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{Circuit, ConstraintKind, Variable};
    use crate::config::CircuitConfig;
    use crate::field::Fp;

    #[test]
    fn test_sizes() {
        assert_eq!(<FieldVar<Fp> as CircuitValue<Fp>>::size_in_field_elements(), 1);
        assert_eq!(<[Bool<Fp>; 4] as CircuitValue<Fp>>::size_in_field_elements(), 4);
        assert_eq!(<([FieldVar<Fp>; 3], Bool<Fp>) as CircuitValue<Fp>>::size_in_field_elements(), 4);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let fields = vec![FieldVar::<Fp>::one(); 2];
        assert_eq!(
            FieldVar::from_field_elements(fields.clone()).unwrap_err(),
            CircuitError::FieldElementCount { expected: 1, actual: 2 }
        );
        assert!(<[FieldVar<Fp>; 3]>::from_field_elements(fields).is_err());
    }

    #[test]
    fn test_witness_array() {
        let circuit = Circuit::<Fp>::new();
        let xs: [FieldVar<Fp>; 3] = circuit
            .witness(|| Ok([1u64, 2, 3].map(FieldVar::from_u64)))
            .unwrap();

        let variables: Vec<Variable> = xs.iter().map(|x| x.as_linear().unwrap().variable()).collect();
        assert_eq!(variables, vec![Variable::private(1), Variable::private(2), Variable::private(3)]);
        assert_eq!(circuit.read(&xs[2]).unwrap(), Some(Fp::from_u64(3)));
        assert_eq!(circuit.num_gates(), 0);
    }

    #[test]
    fn test_witness_pair_constrains_bool() {
        let circuit = Circuit::<Fp>::new();
        let (x, flag): (FieldVar<Fp>, Bool<Fp>) = circuit
            .witness(|| Ok((FieldVar::from_u64(42), Bool::constant(true))))
            .unwrap();

        assert_eq!(circuit.read(&x).unwrap(), Some(Fp::from_u64(42)));
        assert!(circuit.as_prover(|| flag.value()).unwrap().unwrap());

        let compiled = circuit.finish();
        assert_eq!(compiled.constraint_system.count(ConstraintKind::Boolean), 1);
        assert!(compiled.is_satisfied());
    }

    #[test]
    fn test_witness_in_setup_pass() {
        let circuit = Circuit::<Fp>::with_config(CircuitConfig::setup("shape"));
        let bits: [Bool<Fp>; 2] = circuit
            .witness(|| panic!("value closures do not run in a setup pass"))
            .unwrap();

        assert!(!bits[0].is_constant());
        assert_eq!(circuit.num_variables(), 2);
        assert_eq!(circuit.num_gates(), 2);
    }
}
