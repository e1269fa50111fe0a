//! Relinearization (§4.6): base-b digit decomposition and key-switching,
//! grounded on `original_source/core/relinearization.py` (`poly2base`,
//! `gen_relinearization_key`, `relinearize`).

use crate::bigint::{digit_count, int2base};
use crate::error::{Error, Result};
use crate::keys::SecretKey;
use crate::primitives::{Ciphertext, Ciphertext3};
use crate::random::BgvRng;
use crate::ring::RingElement;
use crate::sampling::{sample_gaussian, sample_uniform};
use itertools::izip;
use num_bigint_dig::BigInt;

/// Decompose `x` into `L = ceil(log_b(modulus))` ring elements such that
/// `sum_j base^j * decompose(x)[j] == x` (§4.6, §8 property 7).
pub fn decompose(x: &RingElement, base: u32) -> Vec<RingElement> {
    let m = x.modulus().clone();
    let l = digit_count(&m, base);
    let n = x.degree();

    // For each coefficient, take its representative in [0, m) and expand in
    // base `base`; assemble the L ring elements column-wise.
    let digit_rows: Vec<Vec<BigInt>> = x
        .coeffs()
        .iter()
        .map(|c| {
            let positive = if c.sign() == num_bigint_dig::Sign::Minus {
                c + &m
            } else {
                c.clone()
            };
            int2base(&positive, base, l)
        })
        .collect();

    (0..l)
        .map(|j| {
            let col: Vec<BigInt> = digit_rows.iter().map(|row| row[j].clone()).collect();
            RingElement::new(&col, m.clone(), n)
        })
        .collect()
}

/// A relinearization key set, bound to the modulus it was generated at (§3, §4.6).
#[derive(Clone, Debug)]
pub struct RelinKeySet {
    pub modulus: BigInt,
    pub base: u32,
    pub pairs: Vec<(RingElement, RingElement)>,
}

/// Generate a relinearization key set for `sk` at `sk.sk`'s current modulus.
pub fn generate(rng: &mut BgvRng, sk: &SecretKey, base: u32, t: u32) -> RelinKeySet {
    let modulus = sk.sk.modulus().clone();
    let n = sk.sk.degree();
    let l = digit_count(&modulus, base);
    let sk2 = sk
        .sk
        .checked_mul(&sk.sk)
        .expect("sk multiplied with itself always shares its own ring");
    let t_big = BigInt::from(t);

    let mut pairs = Vec::with_capacity(l);
    let mut power = BigInt::from(1);
    for _ in 0..l {
        let a = sample_uniform(rng, modulus.clone(), n);
        let e = sample_gaussian(rng, modulus.clone(), n);
        let b = &(&a * &sk.sk) + &e.scalar_mul(&t_big);
        let ek0 = &b + &sk2.scalar_mul(&power);
        let ek1 = -a;
        pairs.push((ek0, ek1));
        power *= BigInt::from(base);
    }

    RelinKeySet {
        modulus,
        base,
        pairs,
    }
}

/// Reduce a degree-2 ciphertext `(c0, c1, c2)` back to two terms using the
/// key set bound to `ct.c0`'s modulus (§4.6).
///
/// Returns `Error::RelinFailure` (instead of the distilled source's
/// silent-c2-drop fallback, §9) if the key set's modulus doesn't match.
pub fn apply(ct: &Ciphertext3, keys: &RelinKeySet) -> Result<Ciphertext> {
    if ct.c0.modulus() != &keys.modulus || ct.c0.degree() != ct.c2.degree() {
        return Err(Error::RelinFailure {
            reason: "relinearization key set modulus does not match ciphertext modulus"
                .to_string(),
        });
    }

    let c2_digits = decompose(&ct.c2, keys.base);
    if c2_digits.len() != keys.pairs.len() {
        return Err(Error::RelinFailure {
            reason: format!(
                "digit count mismatch: ciphertext decomposed into {}, keys have {}",
                c2_digits.len(),
                keys.pairs.len()
            ),
        });
    }

    let mut c0_hat = ct.c0.clone();
    let mut c1_hat = ct.c1.clone();
    for (digit, (ek0, ek1)) in izip!(&c2_digits, &keys.pairs) {
        c0_hat = c0_hat
            .checked_add(&digit.checked_mul(ek0).map_err(|_| Error::RelinFailure {
                reason: "digit/ek0 ring mismatch".to_string(),
            })?)
            .map_err(|_| Error::RelinFailure {
                reason: "accumulator/digit ring mismatch".to_string(),
            })?;
        c1_hat = c1_hat
            .checked_add(&digit.checked_mul(ek1).map_err(|_| Error::RelinFailure {
                reason: "digit/ek1 ring mismatch".to_string(),
            })?)
            .map_err(|_| Error::RelinFailure {
                reason: "accumulator/digit ring mismatch".to_string(),
            })?;
    }

    Ok(Ciphertext {
        c0: c0_hat,
        c1: c1_hat,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{PublicKey, SecretKey};
    use num_bigint_dig::BigInt as BI;

    #[test]
    fn decompose_is_left_inverse_of_composition() {
        let mut rng = BgvRng::seeded(5);
        let modulus = BI::from(100_000);
        let n = 8;
        let x = sample_uniform(&mut rng, modulus.clone(), n);
        let base = 7u32;
        let digits = decompose(&x, base);

        let mut recomposed = RingElement::zero(modulus.clone(), n);
        let mut power = BI::from(1);
        for d in &digits {
            recomposed = recomposed
                .checked_add(&d.scalar_mul(&power))
                .unwrap();
            power *= BI::from(base);
        }
        assert_eq!(recomposed.coeffs(), x.coeffs());
    }

    #[test]
    fn relinearize_recovers_quadratic_product() {
        let mut rng = BgvRng::seeded(21);
        let n = 8;
        let t = 7u32;
        let q = BI::from(1_000_000_007i64);
        let sk = SecretKey::generate(&mut rng, q.clone(), n);
        let pk = PublicKey::generate(&mut rng, &sk, t);
        let keys = generate(&mut rng, &sk, 5, t);

        let values_a = vec![1u32, 2, 3, 4, 5, 6, 0, 1];
        // The ring's multiplicative identity (constant polynomial 1): A * 1 == A.
        let values_b = vec![1u32, 0, 0, 0, 0, 0, 0, 0];
        let ca = crate::primitives::encrypt(&mut rng, &pk, t, &values_a, n).unwrap();
        let cb = crate::primitives::encrypt(&mut rng, &pk, t, &values_b, n).unwrap();

        let c0 = ca.c0.checked_mul(&cb.c0).unwrap();
        let c1 = &ca.c0.checked_mul(&cb.c1).unwrap() + &ca.c1.checked_mul(&cb.c0).unwrap();
        let c2 = ca.c1.checked_mul(&cb.c1).unwrap();
        let product3 = Ciphertext3 { c0, c1, c2 };

        let relinearized = apply(&product3, &keys).unwrap();
        let (plain, _noise) = crate::primitives::decrypt(&relinearized, &sk, t).unwrap();
        assert_eq!(plain, values_a);
    }
}
