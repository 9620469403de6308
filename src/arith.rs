//! # Arith — Modular Arithmetic and Small-Prime Utilities
//!
//! Number-theoretic primitives used by every other module. Provides:
//!
//! 1. **GCD** (Euclid) for the Hull–Dobell coprimality precondition.
//! 2. **Primality** by 6k±1 trial division. Moduli handled here are at most a
//!    few billion and each analysis checks a handful of them, so the O(√n)
//!    cost is accepted in exchange for a deterministic, dependency-free answer.
//! 3. **Factorization** by trial division, both distinct primes (what the
//!    full-period criteria need) and prime/exponent pairs.
//! 4. **Modular multiplication and exponentiation** with u128 intermediates,
//!    so any u64 modulus is safe from overflow.
//! 5. **Downward prime search** (`find_nth_prime_below`), used to pick moduli
//!    and increments during parameter search.
//! 6. **Reference sieve** of Eratosthenes, the ground truth for tests.

use crate::error::{LcgError, Result};

/// Greatest common divisor. `gcd(0, 0) = 0`, `gcd(a, 0) = a`.
pub fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a
}

/// `a * b mod m` through a u128 intermediate. Requires `m >= 1`.
#[inline]
pub fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    (a as u128 * b as u128 % m as u128) as u64
}

/// Square-and-multiply without the modulus check. Requires `modulus >= 1`.
pub(crate) fn pow_mod_unchecked(mut base: u64, mut exp: u64, modulus: u64) -> u64 {
    if modulus == 1 {
        return 0;
    }
    let mut result: u64 = 1;
    base %= modulus;
    while exp > 0 {
        if exp & 1 == 1 {
            result = mul_mod(result, base, modulus);
        }
        exp >>= 1;
        base = mul_mod(base, base, modulus);
    }
    result
}

/// Modular exponentiation: `base^exp mod modulus`.
///
/// `modulus = 1` yields 0. A zero modulus is a domain error rather than a
/// division panic.
pub fn pow_mod(base: u64, exp: u64, modulus: u64) -> Result<u64> {
    if modulus == 0 {
        return Err(LcgError::Domain("pow_mod: modulus must be >= 1".into()));
    }
    Ok(pow_mod_unchecked(base, exp, modulus))
}

/// Deterministic primality by trial division over the 6k±1 wheel.
pub fn is_prime(n: u64) -> bool {
    if n <= 1 {
        return false;
    }
    if n <= 3 {
        return true;
    }
    if n.is_multiple_of(2) || n.is_multiple_of(3) {
        return false;
    }
    let mut i = 5u64;
    // i <= n / i keeps the bound check from overflowing near u64::MAX
    while i <= n / i {
        if n.is_multiple_of(i) || n.is_multiple_of(i + 2) {
            return false;
        }
        i += 6;
    }
    true
}

/// Trial-division factorization into ascending `(prime, exponent)` pairs.
/// `factorize(0)` and `factorize(1)` are empty.
pub fn factorize(mut n: u64) -> Vec<(u64, u32)> {
    let mut factors = Vec::new();
    if n < 2 {
        return factors;
    }
    let mut d = 2u64;
    while d <= n / d {
        if n.is_multiple_of(d) {
            let mut exp = 0u32;
            while n.is_multiple_of(d) {
                n /= d;
                exp += 1;
            }
            factors.push((d, exp));
        }
        d += if d == 2 { 1 } else { 2 };
    }
    if n > 1 {
        factors.push((n, 1));
    }
    factors
}

/// Distinct prime factors of `n`, ascending.
pub fn prime_factors(n: u64) -> Vec<u64> {
    factorize(n).into_iter().map(|(p, _)| p).collect()
}

/// The `k`-th prime strictly below `n`, scanning downward from `n - 1`.
///
/// Fails with `RangeExhausted` when fewer than `k` primes lie below `n`.
pub fn find_nth_prime_below(n: u64, k: u32) -> Result<u64> {
    if k == 0 {
        return Err(LcgError::Domain(
            "find_nth_prime_below: k must be >= 1".into(),
        ));
    }
    let mut remaining = k;
    let mut candidate = n;
    while candidate > 2 {
        candidate -= 1;
        if is_prime(candidate) {
            remaining -= 1;
            if remaining == 0 {
                return Ok(candidate);
            }
        }
    }
    Err(LcgError::RangeExhausted(format!(
        "fewer than {} primes below {}",
        k, n
    )))
}

/// All primes `<= limit`, by the sieve of Eratosthenes.
pub fn primes_up_to(limit: u64) -> Vec<u64> {
    if limit < 2 {
        return vec![];
    }
    let limit = limit as usize;
    let mut composite = vec![false; limit + 1];
    let mut i = 2usize;
    while i * i <= limit {
        if !composite[i] {
            let mut j = i * i;
            while j <= limit {
                composite[j] = true;
                j += i;
            }
        }
        i += 1;
    }
    (2..=limit)
        .filter(|&n| !composite[n])
        .map(|n| n as u64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Smallest-prime-factor table for `0..=limit`, built from
    /// [`primes_up_to`]: ascending primes claim their multiples first.
    fn smallest_prime_factors(limit: usize) -> Vec<u32> {
        let mut spf = vec![0u32; limit + 1];
        for p in primes_up_to(limit as u64) {
            let p = p as usize;
            for j in (p..=limit).step_by(p) {
                if spf[j] == 0 {
                    spf[j] = p as u32;
                }
            }
        }
        spf
    }

    // ── GCD ────────────────────────────────────────────────────────────

    #[test]
    fn gcd_zero_cases() {
        assert_eq!(gcd(0, 0), 0);
        assert_eq!(gcd(7, 0), 7);
        assert_eq!(gcd(0, 7), 7);
    }

    #[test]
    fn gcd_known_values() {
        assert_eq!(gcd(12, 18), 6);
        assert_eq!(gcd(17, 5), 1);
        assert_eq!(gcd(380204023, 1), 1);
        assert_eq!(gcd(1 << 40, 1 << 20), 1 << 20);
    }

    // ── Primality ──────────────────────────────────────────────────────

    #[test]
    fn is_prime_small_values() {
        assert!(!is_prime(0));
        assert!(!is_prime(1));
        assert!(is_prime(2));
        assert!(is_prime(3));
        assert!(!is_prime(4));
        assert!(is_prime(5));
        assert!(!is_prime(25));
        assert!(!is_prime(35));
        assert!(is_prime(37));
    }

    /// Exhaustive agreement with the sieve for every n <= 10^6. The 6k±1 wheel
    /// skips multiples of 2 and 3, so the interesting failures would be squares
    /// of wheel primes (25, 49, 121, ...) landing exactly on the loop bound.
    #[test]
    fn is_prime_matches_sieve_to_one_million() {
        let mut sieve = vec![false; 1_000_001];
        for p in primes_up_to(1_000_000) {
            sieve[p as usize] = true;
        }
        for n in 0..=1_000_000u64 {
            assert_eq!(is_prime(n), sieve[n as usize], "is_prime({}) disagrees with sieve", n);
        }
    }

    #[test]
    fn is_prime_production_modulus() {
        assert!(is_prime(380_204_023));
        assert!(!is_prime(380_204_032)); // 52^5
        assert!(is_prime(1_000_000_007));
        assert!(!is_prime(1_000_000_007u64 * 3));
    }

    // ── Factorization ──────────────────────────────────────────────────

    #[test]
    fn prime_factors_edge_cases() {
        assert_eq!(prime_factors(0), Vec::<u64>::new());
        assert_eq!(prime_factors(1), Vec::<u64>::new());
        assert_eq!(prime_factors(2), vec![2]);
        assert_eq!(prime_factors(360), vec![2, 3, 5]);
        assert_eq!(prime_factors(1024), vec![2]);
    }

    /// m - 1 for the production modulus; these are exactly the exponents the
    /// primitive-root test raises 69069 to.
    #[test]
    fn prime_factors_of_production_group_order() {
        assert_eq!(prime_factors(380_204_022), vec![2, 3, 11, 19, 43, 641]);
    }

    #[test]
    fn factorize_reconstitutes_n() {
        for n in 1..=50_000u64 {
            let product: u64 = factorize(n).iter().map(|&(p, e)| p.pow(e)).product();
            assert_eq!(product, n, "factorize({}) does not multiply back", n);
        }
        let big = 2u64.pow(5) * 3u64.pow(3) * 641 * 1_000_003;
        assert_eq!(
            factorize(big),
            vec![(2, 5), (3, 3), (641, 1), (1_000_003, 1)]
        );
    }

    /// Distinct factors must match the smallest-prime-factor chain for every
    /// n <= 10^6, and every reported factor must be prime.
    #[test]
    fn prime_factors_match_sieve_to_one_million() {
        let spf = smallest_prime_factors(1_000_000);
        for n in 2..=1_000_000usize {
            let mut expected = Vec::new();
            let mut rest = n;
            while rest > 1 {
                let p = spf[rest] as u64;
                if expected.last() != Some(&p) {
                    expected.push(p);
                }
                rest /= p as usize;
            }
            assert_eq!(prime_factors(n as u64), expected, "prime_factors({})", n);
        }
    }

    // ── Modular Exponentiation ─────────────────────────────────────────

    #[test]
    fn pow_mod_known_values() {
        assert_eq!(pow_mod(2, 10, 1000).unwrap(), 24);
        assert_eq!(pow_mod(3, 4, 100).unwrap(), 81);
        assert_eq!(pow_mod(5, 0, 7).unwrap(), 1);
        assert_eq!(pow_mod(12345, 678, 1).unwrap(), 0);
    }

    #[test]
    fn pow_mod_reduces_base_first() {
        assert_eq!(pow_mod(1007, 3, 1000).unwrap(), 343);
    }

    #[test]
    fn pow_mod_zero_modulus_is_domain_error() {
        assert!(matches!(pow_mod(2, 3, 0), Err(LcgError::Domain(_))));
    }

    /// Fermat's little theorem on a modulus near 2^63: the u128 intermediate
    /// must keep every product exact.
    #[test]
    fn pow_mod_large_prime_fermat() {
        let p = 999_999_999_999_999_877u64;
        assert_eq!(pow_mod(123_456_789, p - 1, p).unwrap(), 1);
    }

    #[test]
    fn mul_mod_near_u64_max() {
        let m = u64::MAX - 58; // largest prime below 2^64
        assert_eq!(mul_mod(m - 1, m - 1, m), 1);
    }

    // ── Downward Prime Search ──────────────────────────────────────────

    #[test]
    fn find_nth_prime_below_strictly_below() {
        assert_eq!(find_nth_prime_below(13, 1).unwrap(), 11);
        assert_eq!(find_nth_prime_below(14, 1).unwrap(), 13);
        assert_eq!(find_nth_prime_below(14, 2).unwrap(), 11);
        assert_eq!(find_nth_prime_below(1000, 1).unwrap(), 997);
        assert_eq!(find_nth_prime_below(3, 1).unwrap(), 2);
    }

    #[test]
    fn find_nth_prime_below_exhausts() {
        assert!(matches!(
            find_nth_prime_below(2, 1),
            Err(LcgError::RangeExhausted(_))
        ));
        assert!(matches!(
            find_nth_prime_below(0, 1),
            Err(LcgError::RangeExhausted(_))
        ));
        // Only 2, 3, 5, 7 lie below 10
        assert_eq!(find_nth_prime_below(10, 4).unwrap(), 2);
        assert!(matches!(
            find_nth_prime_below(10, 5),
            Err(LcgError::RangeExhausted(_))
        ));
    }

    #[test]
    fn find_nth_prime_below_rejects_k_zero() {
        assert!(matches!(
            find_nth_prime_below(100, 0),
            Err(LcgError::Domain(_))
        ));
    }

    // ── Reference Sieve ────────────────────────────────────────────────

    /// pi(x) checkpoints from OEIS A000720.
    #[test]
    fn primes_up_to_known_counts() {
        assert_eq!(primes_up_to(0), Vec::<u64>::new());
        assert_eq!(primes_up_to(2), vec![2]);
        assert_eq!(primes_up_to(30), vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(primes_up_to(1000).len(), 168);
        assert_eq!(primes_up_to(100_000).len(), 9592);
    }
}
