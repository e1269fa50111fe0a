//! The three RLWE distributions (§4.2): ternary (secret key), discrete
//! Gaussian (error terms), and uniform (the public mask `a`).

use crate::random::BgvRng;
use crate::ring::RingElement;
use num_bigint_dig::{BigInt, RandBigInt};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Standard deviation used by the discrete Gaussian error distribution (§4.2).
pub const GAUSSIAN_SIGMA: f64 = 3.8;

/// Ternary sampler: each coefficient independently in `{-1, 0, 1}` with
/// probabilities `(1/4, 1/2, 1/4)`.
pub fn sample_ternary(rng: &mut BgvRng, modulus: BigInt, degree: usize) -> RingElement {
    let coeffs: Vec<BigInt> = (0..degree)
        .map(|_| {
            let u: f64 = rng.rng_mut().gen();
            if u < 0.25 {
                BigInt::from(-1)
            } else if u < 0.75 {
                BigInt::from(0)
            } else {
                BigInt::from(1)
            }
        })
        .collect();
    RingElement::from_centered_coeffs(coeffs, modulus, degree)
}

/// Discrete Gaussian sampler: each coefficient is `round(N(0, sigma^2))`.
pub fn sample_gaussian(rng: &mut BgvRng, modulus: BigInt, degree: usize) -> RingElement {
    let normal = Normal::new(0.0, GAUSSIAN_SIGMA).expect("sigma > 0");
    let coeffs: Vec<BigInt> = (0..degree)
        .map(|_| {
            let x: f64 = normal.sample(rng.rng_mut());
            BigInt::from(x.round() as i64)
        })
        .collect();
    RingElement::new(&coeffs, modulus, degree)
}

/// Uniform sampler over `[0, q)`, reduced into centered form.
pub fn sample_uniform(rng: &mut BgvRng, modulus: BigInt, degree: usize) -> RingElement {
    let zero = BigInt::from(0);
    let coeffs: Vec<BigInt> = (0..degree)
        .map(|_| rng.rng_mut().gen_bigint_range(&zero, &modulus))
        .collect();
    RingElement::new(&coeffs, modulus, degree)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ternary_coeffs_are_in_range() {
        let mut rng = BgvRng::seeded(42);
        let e = sample_ternary(&mut rng, BigInt::from(97), 16);
        for c in e.coeffs() {
            assert!(*c == BigInt::from(-1) || *c == BigInt::from(0) || *c == BigInt::from(1));
        }
    }

    #[test]
    fn uniform_is_deterministic_under_same_seed() {
        let mut rng_a = BgvRng::seeded(7);
        let mut rng_b = BgvRng::seeded(7);
        let a = sample_uniform(&mut rng_a, BigInt::from(1000003), 8);
        let b = sample_uniform(&mut rng_b, BigInt::from(1000003), 8);
        assert_eq!(a.coeffs(), b.coeffs());
    }

    #[test]
    fn gaussian_produces_small_coefficients_typically() {
        let mut rng = BgvRng::seeded(1);
        let e = sample_gaussian(&mut rng, BigInt::from(1_000_000_007), 64);
        // 10 sigma bound, astronomically unlikely to be exceeded.
        let bound = BigInt::from((GAUSSIAN_SIGMA * 10.0) as i64);
        for c in e.coeffs() {
            assert!(*c <= bound && *c >= -bound);
        }
    }
}
