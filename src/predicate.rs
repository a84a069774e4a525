//! The fixed search predicate: a candidate qualifies if it is prime and its decimal digits read
//! the same in both directions.

/// Returns whether `n` is prime, using trial division by odd numbers up to `⌊√n⌋`.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    // `i <= n / i` is `i * i <= n` without the overflow.
    let mut i = 3;
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Returns whether the base-10 representation of `n` is a palindrome.
pub fn is_palindrome(n: u64) -> bool {
    let digits = n.to_string();
    let digits = digits.as_bytes();
    let (mut i, mut j) = (0, digits.len() - 1);
    while i < j {
        if digits[i] != digits[j] {
            return false;
        }
        i += 1;
        j -= 1;
    }
    true
}

/// The search predicate. Primality is checked first since it rejects more candidates.
#[inline]
pub fn qualifies(n: u64) -> bool {
    is_prime(n) && is_palindrome(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_primes() {
        let primes: Vec<u64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(
            primes,
            [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]
        );
    }

    #[test]
    fn squares_of_primes_are_composite() {
        // Exercises the inclusive `⌊√n⌋` bound.
        for p in [3u64, 5, 7, 11, 101, 65_521] {
            assert!(!is_prime(p * p), "{} is not prime", p * p);
        }
    }

    #[test]
    fn large_prime_does_not_overflow() {
        assert!(is_prime(4_294_967_291)); // largest prime below 2^32
        assert!(!is_prime(u64::MAX));
    }

    #[test]
    fn palindromes() {
        for n in [0, 7, 11, 101, 12321, 1_000_000_001] {
            assert!(is_palindrome(n), "{n}");
        }
        for n in [10, 12, 100, 1231, 123_456] {
            assert!(!is_palindrome(n), "{n}");
        }
    }

    #[test]
    fn predicate_is_pure() {
        for n in 0..2_000 {
            assert_eq!(is_prime(n), is_prime(n));
            assert_eq!(is_palindrome(n), is_palindrome(n));
            assert_eq!(qualifies(n), is_prime(n) && is_palindrome(n));
        }
    }

    #[test]
    fn first_qualifying_numbers() {
        let found: Vec<u64> = (0..1_000).filter(|&n| qualifies(n)).collect();
        assert_eq!(
            found,
            [2, 3, 5, 7, 11, 101, 131, 151, 181, 191, 313, 353, 373, 383, 727, 757, 787, 797, 919, 929]
        );
    }
}
