//! Pallas Base Field Operations
//!
//! This module provides the prime field Fp that circuit values live in: the
//! base field of the Pallas curve (equivalently the scalar field of Vesta).
//! The field has modulus p ≈ 2^254.
//!
//! The circuit layer never touches arkworks directly. It is written against
//! the [`CircuitField`] trait, which [`Fp`] implements.

use ark_ff::{BigInteger, Field, One, PrimeField, Zero};
use ark_pallas::Fq as ArkFp;
use ark_std::UniformRand;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::Hash;
use std::ops::{Add, Mul, Neg, Sub};
use std::str::FromStr;

/// Prime field interface consumed by the circuit builder.
///
/// Everything the builder needs from a field: constants, conversions to and
/// from canonical decimal strings, inversion and square roots that signal
/// failure instead of panicking, and uniform sampling.
pub trait CircuitField:
    Copy
    + fmt::Debug
    + fmt::Display
    + Eq
    + Hash
    + Serialize
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Neg<Output = Self>
    + 'static
{
    fn zero() -> Self;
    fn one() -> Self;
    fn from_u64(val: u64) -> Self;
    fn from_i64(val: i64) -> Self;

    /// Parse a base-10 string, optionally prefixed with `-`.
    fn from_decimal(s: &str) -> Option<Self>;

    /// Canonical base-10 representative in `[0, p)`.
    fn to_decimal(&self) -> String;

    fn is_zero(&self) -> bool;

    /// Returns None if the element is zero.
    fn inverse(&self) -> Option<Self>;

    /// Returns None if the element is not a quadratic residue.
    fn sqrt(&self) -> Option<Self>;

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self;
}

/// The base field of Pallas.
///
/// Field modulus p = 28948022309329048855892746252171976963363056481941560715954676764349967630337
/// Approximately 2^254 (255 bits)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fp(pub ArkFp);

impl Fp {
    /// Create a new field element from a u64
    pub fn from_u64(val: u64) -> Self {
        Fp(ArkFp::from(val))
    }

    /// Create a new field element from an i64, mapping negatives to p - |val|
    pub fn from_i64(val: i64) -> Self {
        if val >= 0 {
            Fp::from_u64(val as u64)
        } else {
            -Fp::from_u64(val.unsigned_abs())
        }
    }

    /// Create the zero element
    pub fn zero() -> Self {
        Fp(ArkFp::zero())
    }

    /// Create the one element
    pub fn one() -> Self {
        Fp(ArkFp::one())
    }

    /// Check if this is zero
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Compute the multiplicative inverse (1/x)
    /// Returns None if x is zero
    pub fn inverse(&self) -> Option<Self> {
        self.0.inverse().map(Fp)
    }

    /// Compute a square root, if one exists
    pub fn sqrt(&self) -> Option<Self> {
        self.0.sqrt().map(Fp)
    }

    /// Generate a random field element
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Fp(ArkFp::rand(rng))
    }

    /// Square the element (x^2)
    pub fn square(&self) -> Self {
        Fp(self.0.square())
    }

    /// Parse a decimal string, optionally prefixed with `-`. Values at or
    /// above p are reduced.
    pub fn from_decimal(s: &str) -> Option<Self> {
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value = Fp(ArkFp::from_str(digits).ok()?);
        Some(if negative { -value } else { value })
    }

    /// Canonical decimal representation
    pub fn to_decimal(&self) -> String {
        let digits = self.0.into_bigint().to_string();
        let trimmed = digits.trim_start_matches('0');
        if trimmed.is_empty() {
            "0".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Convert to bytes (little-endian)
    pub fn to_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&self.0.into_bigint().to_bytes_le());
        bytes
    }

    /// Convert to hex string (full 64 characters)
    pub fn to_hex(&self) -> String {
        let mut be_bytes = self.to_bytes();
        be_bytes.reverse();
        format!("0x{}", hex::encode(be_bytes))
    }

    /// Convert to short hex string (truncated for display)
    pub fn to_short_hex(&self) -> String {
        let full = self.to_hex();
        if full.len() > 18 {
            format!("{}...{}", &full[..10], &full[full.len() - 8..])
        } else {
            full
        }
    }
}

impl CircuitField for Fp {
    fn zero() -> Self {
        Fp::zero()
    }

    fn one() -> Self {
        Fp::one()
    }

    fn from_u64(val: u64) -> Self {
        Fp::from_u64(val)
    }

    fn from_i64(val: i64) -> Self {
        Fp::from_i64(val)
    }

    fn from_decimal(s: &str) -> Option<Self> {
        Fp::from_decimal(s)
    }

    fn to_decimal(&self) -> String {
        Fp::to_decimal(self)
    }

    fn is_zero(&self) -> bool {
        Fp::is_zero(self)
    }

    fn inverse(&self) -> Option<Self> {
        Fp::inverse(self)
    }

    fn sqrt(&self) -> Option<Self> {
        Fp::sqrt(self)
    }

    fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Fp::random(rng)
    }
}

// Implement arithmetic operations

impl Add for Fp {
    type Output = Fp;
    fn add(self, rhs: Fp) -> Fp {
        Fp(self.0 + rhs.0)
    }
}

impl Sub for Fp {
    type Output = Fp;
    fn sub(self, rhs: Fp) -> Fp {
        Fp(self.0 - rhs.0)
    }
}

impl Mul for Fp {
    type Output = Fp;
    fn mul(self, rhs: Fp) -> Fp {
        Fp(self.0 * rhs.0)
    }
}

impl Neg for Fp {
    type Output = Fp;
    fn neg(self) -> Fp {
        Fp(-self.0)
    }
}

impl From<bool> for Fp {
    fn from(val: bool) -> Self {
        if val {
            Fp::one()
        } else {
            Fp::zero()
        }
    }
}

impl fmt::Display for Fp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_decimal())
    }
}

// Coefficients and witness values travel as canonical decimal strings
impl Serialize for Fp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for Fp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        match Fp::from_decimal(&s) {
            Some(value) if value.to_decimal() == s => Ok(value),
            _ => Err(serde::de::Error::custom(format!(
                "Invalid field element string {:?}: expected a canonical decimal below the modulus",
                s
            ))),
        }
    }
}
