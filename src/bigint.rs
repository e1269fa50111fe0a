//! Arbitrary-precision integer helpers shared by every other module: centered
//! modular reduction, extended-Euclid based modular inverse, Miller–Rabin
//! primality, and base-b digit decomposition (§4.1 uses `mod_center`, §4.3 and
//! §4.5 use the inverse/primality routines, §4.6 uses digit decomposition).

use num_bigint_dig::{BigInt, BigUint};
use num_integer::Integer;
use num_traits::{One, Signed, Zero};

/// Reduce `x` into the centered residue system `[-m/2, m/2)` modulo `m`.
///
/// This is the half-open convention used throughout `original_source` (`core/utils.py`):
/// `(x + m/2) mod m - m/2`. Applying it to an already-centered value is a no-op.
pub fn mod_center(x: &BigInt, m: &BigInt) -> BigInt {
    debug_assert!(m.is_positive());
    let half = m / 2;
    let mut r = (x + &half).mod_floor(m);
    if r.is_negative() {
        r += m;
    }
    r - half
}

/// Extended Euclidean algorithm: returns `(gcd, x, y)` with `a*x + b*y = gcd`.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let egcd = a.extended_gcd(b);
    (egcd.gcd, egcd.x, egcd.y)
}

/// Modular inverse of `a` modulo `m`, or `None` when `gcd(a, m) != 1`.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Option<BigInt> {
    let (gcd, x, _y) = extended_gcd(a, m);
    if gcd != BigInt::one() && gcd != -BigInt::one() {
        return None;
    }
    let mut inv = x.mod_floor(m);
    if inv.is_negative() {
        inv += m;
    }
    Some(inv)
}

/// Miller–Rabin probable-primality test with `reps` independent rounds.
///
/// `n` must be non-negative; negative candidates are never prime by definition.
pub fn is_probably_prime(n: &BigInt, reps: usize) -> bool {
    if n.is_negative() {
        return false;
    }
    let n_abs: BigUint = n.to_biguint().expect("checked non-negative above");
    if n_abs < BigUint::from(2u32) {
        return false;
    }
    num_bigint_dig::prime::probably_prime(&n_abs, reps)
}

/// Decompose `x` (taken modulo `m`, represented in `[0, m)`) into its base-`b`
/// digit expansion, least-significant digit first, padded to `digit_count`
/// entries (`digit_count = ceil(log_b(m))`, computed by the caller — see
/// `relin::digit_count`).
pub fn int2base(x: &BigInt, base: u32, digit_count: usize) -> Vec<BigInt> {
    debug_assert!(base >= 2);
    let b = BigInt::from(base);
    let mut v = x.clone();
    if v.is_negative() {
        v = -v;
    }
    let mut digits = Vec::with_capacity(digit_count);
    for _ in 0..digit_count {
        if v.is_zero() {
            digits.push(BigInt::zero());
            continue;
        }
        let (q, r) = v.div_mod_floor(&b);
        digits.push(r);
        v = q;
    }
    digits
}

/// Number of base-`b` digits needed to represent any value in `[0, m)`,
/// i.e. `ceil(log_b(m))`.
pub fn digit_count(m: &BigInt, base: u32) -> usize {
    debug_assert!(base >= 2);
    let b = BigInt::from(base);
    let mut count = 0usize;
    let mut acc = BigInt::one();
    while acc < *m {
        acc *= &b;
        count += 1;
    }
    count.max(1)
}

/// Decimal digit length used by the noise policy (§4.8): the number of
/// base-10 digits of `|x|`, i.e. `original_source`'s `len(str(x))` —
/// equivalently `ceil(log10(x + 1))` for every `x >= 0` except the
/// degenerate `x = 0` case, which this returns as length `1`.
pub fn decimal_len(x: &BigInt) -> u64 {
    let x = if x.is_negative() { -x.clone() } else { x.clone() };
    x.to_string().len() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mod_center_basic() {
        let m = BigInt::from(7);
        assert_eq!(mod_center(&BigInt::from(8), &m), BigInt::from(1));
        assert_eq!(mod_center(&BigInt::from(-8), &m), BigInt::from(-1));
        assert_eq!(mod_center(&BigInt::from(3), &m), BigInt::from(3));
        assert_eq!(mod_center(&BigInt::from(-3), &m), BigInt::from(-3));
        assert_eq!(mod_center(&BigInt::from(-4), &m), BigInt::from(3));
    }

    #[test]
    fn mod_inverse_exists_iff_coprime() {
        assert_eq!(
            mod_inverse(&BigInt::from(3), &BigInt::from(11)),
            Some(BigInt::from(4))
        );
        assert_eq!(mod_inverse(&BigInt::from(2), &BigInt::from(4)), None);
    }

    #[test]
    fn primality_small_values() {
        assert!(is_probably_prime(&BigInt::from(7), 10));
        assert!(!is_probably_prime(&BigInt::from(8), 10));
        assert!(is_probably_prime(&BigInt::from(97), 10));
        assert!(!is_probably_prime(&BigInt::from(1), 10));
    }

    #[test]
    fn digit_decomposition_left_inverse() {
        let m = BigInt::from(1000);
        let base = 5u32;
        let l = digit_count(&m, base);
        for v in [0i64, 1, 17, 123, 999] {
            let x = BigInt::from(v);
            let digits = int2base(&x, base, l);
            let mut recomposed = BigInt::zero();
            let mut pow = BigInt::one();
            for d in &digits {
                recomposed += d * &pow;
                pow *= BigInt::from(base);
            }
            assert_eq!(recomposed, x);
        }
    }
}
