//! The quotient ring `R_q = Z_q[X]/(X^n+1)` (§3, §4.1): big-integer coefficient
//! vectors in centered form, with the polynomial modulus always fixed to
//! `X^n + 1` for the element's degree `n` — there is no separate `Phi` value
//! carried around, matching the "value carrier, no global ring" design note
//! (§9).

use crate::error::{Error, Result};
use itertools::izip;
use num_bigint_dig::BigInt;
use num_traits::Zero;
use std::ops::{Add, Mul, Neg, Sub};

/// An element of `R_q` for some modulus `q` and degree `n`.
///
/// Invariant (§3): `coeffs.len() == n` and every coefficient lies in
/// `[-q/2, q/2)`. Both `new` and every arithmetic operation re-establish it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingElement {
    coeffs: Vec<BigInt>,
    modulus: BigInt,
    degree: usize,
}

/// Fold a coefficient vector of arbitrary length down to `n` terms modulo
/// `X^n + 1`: since `X^n = -1`, the coefficient of `X^k` folds onto `X^(k mod n)`
/// with sign `(-1)^(k / n)`.
fn reduce_mod_phi(raw: &[BigInt], n: usize) -> Vec<BigInt> {
    let mut out = vec![BigInt::zero(); n];
    for (i, c) in raw.iter().enumerate() {
        let block = i / n;
        let slot = i % n;
        if block % 2 == 0 {
            out[slot] += c;
        } else {
            out[slot] -= c;
        }
    }
    out
}

impl RingElement {
    /// Build a ring element from raw (possibly over-length, possibly
    /// out-of-range) coefficients, running the full reduction pipeline of
    /// §4.1: fold mod `X^n+1`, then center mod `q`.
    pub fn new(raw_coeffs: &[BigInt], modulus: BigInt, degree: usize) -> Self {
        debug_assert!(degree > 0);
        let folded = reduce_mod_phi(raw_coeffs, degree);
        let coeffs = folded
            .into_iter()
            .map(|c| crate::bigint::mod_center(&c, &modulus))
            .collect();
        RingElement {
            coeffs,
            modulus,
            degree,
        }
    }

    /// The all-zero element of `R_q`.
    pub fn zero(modulus: BigInt, degree: usize) -> Self {
        RingElement {
            coeffs: vec![BigInt::zero(); degree],
            modulus,
            degree,
        }
    }

    /// Build directly from an already-length-`n`, already-centered
    /// coefficient vector (used by samplers that produce valid centered
    /// coefficients directly, avoiding redundant reduction).
    pub fn from_centered_coeffs(coeffs: Vec<BigInt>, modulus: BigInt, degree: usize) -> Self {
        debug_assert_eq!(coeffs.len(), degree);
        RingElement {
            coeffs,
            modulus,
            degree,
        }
    }

    pub fn coeffs(&self) -> &[BigInt] {
        &self.coeffs
    }

    pub fn modulus(&self) -> &BigInt {
        &self.modulus
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    fn check_compatible(&self, other: &RingElement) -> Result<()> {
        if self.modulus != other.modulus || self.degree != other.degree {
            return Err(Error::RingMismatch);
        }
        Ok(())
    }

    pub fn checked_add(&self, other: &RingElement) -> Result<RingElement> {
        self.check_compatible(other)?;
        let raw: Vec<BigInt> = izip!(&self.coeffs, &other.coeffs).map(|(a, b)| a + b).collect();
        Ok(RingElement::new(&raw, self.modulus.clone(), self.degree))
    }

    pub fn checked_sub(&self, other: &RingElement) -> Result<RingElement> {
        self.check_compatible(other)?;
        let raw: Vec<BigInt> = izip!(&self.coeffs, &other.coeffs).map(|(a, b)| a - b).collect();
        Ok(RingElement::new(&raw, self.modulus.clone(), self.degree))
    }

    /// Schoolbook polynomial multiplication followed by the reduction pipeline.
    pub fn checked_mul(&self, other: &RingElement) -> Result<RingElement> {
        self.check_compatible(other)?;
        let n = self.degree;
        let mut raw = vec![BigInt::zero(); 2 * n - 1];
        for (i, a) in self.coeffs.iter().enumerate() {
            if a.is_zero() {
                continue;
            }
            for (j, b) in other.coeffs.iter().enumerate() {
                raw[i + j] += a * b;
            }
        }
        Ok(RingElement::new(&raw, self.modulus.clone(), n))
    }

    pub fn scalar_mul(&self, scalar: &BigInt) -> RingElement {
        let raw: Vec<BigInt> = self.coeffs.iter().map(|c| c * scalar).collect();
        RingElement::new(&raw, self.modulus.clone(), self.degree)
    }

    /// Retarget this element's coefficient modulus, re-reducing the existing
    /// coefficients under the new modulus (§4.1: used to derive `sk|_q`).
    pub fn with_modulus(&self, new_modulus: BigInt) -> RingElement {
        let coeffs = self
            .coeffs
            .iter()
            .map(|c| crate::bigint::mod_center(c, &new_modulus))
            .collect();
        RingElement {
            coeffs,
            modulus: new_modulus,
            degree: self.degree,
        }
    }

    /// Maximum absolute coefficient value — used as the raw noise figure (§4.4).
    pub fn max_abs(&self) -> BigInt {
        self.coeffs
            .iter()
            .map(|c| if c.sign() == num_bigint_dig::Sign::Minus { -c.clone() } else { c.clone() })
            .max()
            .unwrap_or_else(BigInt::zero)
    }
}

impl Neg for RingElement {
    type Output = RingElement;
    fn neg(self) -> RingElement {
        let coeffs = self.coeffs.iter().map(|c| -c.clone()).collect();
        RingElement {
            coeffs,
            modulus: self.modulus,
            degree: self.degree,
        }
    }
}

impl Add for &RingElement {
    type Output = RingElement;
    fn add(self, rhs: &RingElement) -> RingElement {
        self.checked_add(rhs)
            .expect("RingElement addition: caller must ensure matching rings")
    }
}

impl Sub for &RingElement {
    type Output = RingElement;
    fn sub(self, rhs: &RingElement) -> RingElement {
        self.checked_sub(rhs)
            .expect("RingElement subtraction: caller must ensure matching rings")
    }
}

impl Mul for &RingElement {
    type Output = RingElement;
    fn mul(self, rhs: &RingElement) -> RingElement {
        self.checked_mul(rhs)
            .expect("RingElement multiplication: caller must ensure matching rings")
    }
}
