//! Modulus switching `Q -> q` (§4.5), grounded on
//! `original_source/core/modulus_switch.py` (`scale2_advanced`, `scale2_func`).

use crate::bigint::mod_center;
use crate::ring::RingElement;
use log::warn;
use num_bigint_dig::BigInt;
use num_integer::Integer;
use num_traits::One;

/// Result of a single switch: the switched element and whether the fallback
/// (rounded-division) path was used instead of the preferred path.
pub struct SwitchOutcome {
    pub result: RingElement,
    pub used_fallback: bool,
}

/// Round `p / q` to the nearest integer (ties away from zero), for BigInt `p`, `q`.
fn round_div(p: &BigInt, q: &BigInt) -> BigInt {
    let two = BigInt::from(2);
    let (quot, rem) = p.div_mod_floor(q);
    // div_mod_floor gives rem in [0, q). Round based on 2*rem vs q.
    if &(&rem * &two) >= q {
        quot + BigInt::one()
    } else {
        quot
    }
}

/// Plain rounded-division fallback path (§4.5): `y_i = round(x_i / Delta) mod q`.
fn switch_fallback(x: &RingElement, target_q: BigInt, delta: &BigInt) -> RingElement {
    let raw: Vec<BigInt> = x.coeffs().iter().map(|c| round_div(c, delta)).collect();
    RingElement::new(&raw, target_q, x.degree())
}

/// Switch `x` from its current modulus `Q = q * delta` down to `target_q`,
/// preserving the plaintext residue modulo `t` (§4.5).
///
/// Tries the preferred adjustment-term path first; falls back to plain
/// rounded division exactly once if `gcd(delta, t) != 1` or the modular
/// inverse computation otherwise fails, logging a warning (§7, §10.2/§10.3).
pub fn switch(x: &RingElement, target_q: BigInt, delta: &BigInt, t: &BigInt) -> SwitchOutcome {
    let q_big = x.modulus().clone();

    let t_inv = if delta.gcd(t) == BigInt::one() {
        crate::bigint::mod_inverse(t, delta)
    } else {
        None
    };

    match t_inv {
        Some(t_inv) => {
            let adj_raw: Vec<BigInt> = x
                .coeffs()
                .iter()
                .map(|xi| {
                    let centered = mod_center(xi, &q_big);
                    let adj = (-&centered * &t_inv).mod_floor(delta);
                    adj * t
                })
                .collect();
            let adjustment = RingElement::new(&adj_raw, q_big.clone(), x.degree());
            let adjusted = x
                .checked_add(&adjustment)
                .expect("adjustment built at the same (q, n) as x");

            let raw: Vec<BigInt> = adjusted
                .coeffs()
                .iter()
                .map(|c| {
                    let numerator = c * &target_q;
                    numerator.div_floor(&q_big)
                })
                .collect();
            let result = RingElement::new(&raw, target_q, x.degree());
            SwitchOutcome {
                result,
                used_fallback: false,
            }
        }
        None => {
            warn!(
                "modulus switching preferred path unavailable (gcd(delta, t) != 1 or no inverse); \
                 falling back to rounded division"
            );
            SwitchOutcome {
                result: switch_fallback(x, target_q, delta),
                used_fallback: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{PublicKey, SecretKey};
    use crate::params::build_params;
    use crate::primitives::{decrypt, encrypt};
    use crate::random::BgvRng;

    #[test]
    fn switched_ciphertext_still_decrypts_correctly() {
        let mut rng = BgvRng::seeded(99);
        let n = 8;
        let t = 7u32;
        let params = build_params(80, t, n, 3).unwrap();
        let sk = SecretKey::generate(&mut rng, params.q_big.clone(), n);
        let pk = PublicKey::generate(&mut rng, &sk, t);
        let values = vec![1, 2, 3, 4, 5, 6, 0, 1];
        let ct = encrypt(&mut rng, &pk, t, &values, n).unwrap();

        let t_big = BigInt::from(t);
        let out0 = switch(&ct.c0, params.q_small.clone(), &params.delta, &t_big);
        let out1 = switch(&ct.c1, params.q_small.clone(), &params.delta, &t_big);

        let switched_sk = crate::keys::SecretKey {
            sk: sk.view_at(params.q_small.clone()),
        };
        let switched_ct = crate::primitives::Ciphertext {
            c0: out0.result,
            c1: out1.result,
        };
        let (plain, _noise) = decrypt(&switched_ct, &switched_sk, t).unwrap();
        assert_eq!(plain, values);
    }

    #[test]
    fn round_div_rounds_to_nearest() {
        assert_eq!(round_div(&BigInt::from(7), &BigInt::from(2)), BigInt::from(4));
        assert_eq!(round_div(&BigInt::from(9), &BigInt::from(4)), BigInt::from(2));
    }
}
