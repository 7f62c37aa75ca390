//! Number sequences that get turned into melodies.
//! Everything here is pure, the same input always gives the same output.

use clap::ValueEnum;

use crate::misc::Tagged;

/// Pi to 100 decimal places.
/// Used as a lookup table instead of computing digits on the fly.
const PI: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";

/// The kinds of sequence a melody can be built from.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SequenceKind {
    #[default]
    Fibonacci,
    Primes,
    Pi,
}

impl SequenceKind {
    /// Gets the first `n` terms of this sequence.
    pub fn generate(&self, n: usize) -> Vec<u64> {
        match self {
            Self::Fibonacci => fibonacci(n),
            Self::Primes => primes(n),
            Self::Pi => pi_digits(n),
        }
    }
}

impl Tagged for SequenceKind {
    fn tag(&self) -> &'static str {
        match self {
            Self::Fibonacci => "fibonacci",
            Self::Primes => "primes",
            Self::Pi => "pi",
        }
    }

    fn from_tag(tag: &str) -> Option<Self> {
        Some(match tag.to_ascii_lowercase().as_str() {
            "f" | "fib" | "fibonacci" => Self::Fibonacci,
            "p" | "prime" | "primes" => Self::Primes,
            "pi" => Self::Pi,
            _ => return None,
        })
    }
}

/// The first `n` Fibonacci numbers, starting at 0.
/// Terms past F(93) no longer fit in a u64 and will saturate at [`u64::MAX`].
pub fn fibonacci(n: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(n);
    let (mut a, mut b) = (0_u64, 1_u64);

    for _ in 0..n {
        out.push(a);
        (a, b) = (b, a.saturating_add(b));
    }

    out
}

/// Checks if a number is prime with trial division.
/// Only odd divisors up to the square root are tried.
pub fn is_prime(num: u64) -> bool {
    if num < 2 {
        return false;
    }

    if num % 2 == 0 {
        return num == 2;
    }

    let mut i = 3;
    while i <= num / i {
        if num % i == 0 {
            return false;
        }
        i += 2;
    }

    true
}

/// The first `n` primes in ascending order.
/// Will take a *very* long time for huge values of `n`.
pub fn primes(n: usize) -> Vec<u64> {
    let mut out = Vec::with_capacity(n);
    if n == 0 {
        return out;
    }

    out.push(2);
    let mut candidate = 3;
    while out.len() < n {
        if is_prime(candidate) {
            out.push(candidate);
        }
        candidate += 2;
    }

    out
}

/// The first `n` digits of pi, decimal point removed.
/// If more digits are asked for than the table holds, only the ones available are returned.
pub fn pi_digits(n: usize) -> Vec<u64> {
    PI.chars()
        .filter_map(|x| x.to_digit(10))
        .take(n)
        .map(u64::from)
        .collect()
}

#[cfg(test)]
mod test {
    use clap::ValueEnum;

    use super::{fibonacci, is_prime, pi_digits, primes, SequenceKind};
    use crate::misc::Tagged;

    #[test]
    fn test_fibonacci() {
        assert_eq!(fibonacci(8), [0, 1, 1, 2, 3, 5, 8, 13]);
        assert_eq!(fibonacci(0), Vec::<u64>::new());
        assert_eq!(fibonacci(1), [0]);
        assert_eq!(fibonacci(2), [0, 1]);
    }

    #[test]
    fn test_fibonacci_saturates() {
        let fib = fibonacci(120);
        assert_eq!(fib.len(), 120);
        assert_eq!(fib[93], 12200160415121876738);
        assert_eq!(*fib.last().unwrap(), u64::MAX);
    }

    #[test]
    fn test_primes() {
        assert_eq!(primes(5), [2, 3, 5, 7, 11]);
        assert_eq!(primes(0), Vec::<u64>::new());
        assert_eq!(primes(1), [2]);

        for n in 0..200 {
            let out = primes(n);
            assert_eq!(out.len(), n);
            assert!(out.iter().all(|&x| is_prime(x)));
            assert!(out.windows(2).all(|x| x[0] < x[1]));
        }
    }

    #[test]
    fn test_is_prime() {
        let known = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47];
        for i in 0..50 {
            assert_eq!(is_prime(i), known.contains(&i), "{i}");
        }
        assert!(!is_prime(7919 * 7907));
    }

    #[test]
    fn test_pi_digits() {
        assert_eq!(pi_digits(5), [3, 1, 4, 1, 5]);
        assert_eq!(pi_digits(0), Vec::<u64>::new());
        assert_eq!(pi_digits(1000).len(), 101);

        for n in 0..101 {
            assert!(pi_digits(n + 1).starts_with(&pi_digits(n)));
        }
    }

    #[test]
    fn test_sequence_tags() {
        for kind in SequenceKind::value_variants().iter().copied() {
            assert_eq!(SequenceKind::from_tag(kind.tag()), Some(kind));
        }
        assert_eq!(SequenceKind::from_tag("Fib"), Some(SequenceKind::Fibonacci));
        assert_eq!(SequenceKind::from_tag("squares"), None);
        assert_eq!(SequenceKind::Primes.generate(3), [2, 3, 5]);
    }
}
