//! Arbitrary-precision non-negative integers.
//!
//! Search spaces routinely exceed `2^64` configurations (six parameters with
//! six-digit ranges already do), so sizes and 1-D indices are carried as
//! `BigInt`.  The representation is little-endian base-10^9 limbs, which keeps
//! decimal formatting and parsing trivial.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Div, Mul, Rem, Sub};
use std::str::FromStr;

use crate::errors::{TunerError, TunerResult};

const BASE: u64 = 1_000_000_000;
const BASE_DIGITS: usize = 9;

/// Number of decimal digits used to discretize the unit draw in
/// [`BigInt::random_in_range`].
const RANDOM_PRECISION: u32 = 18;

/// Non-negative integer of unbounded size.
///
/// An empty limb vector encodes zero; otherwise the most significant limb is
/// non-zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BigInt {
    limbs: Vec<u32>,
}

impl BigInt {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn one() -> Self {
        Self::from(1u32)
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Number of decimal digits (1 for zero).
    pub fn digits(&self) -> usize {
        match self.limbs.last() {
            None => 1,
            Some(top) => (self.limbs.len() - 1) * BASE_DIGITS + decimal_digits(*top),
        }
    }

    /// `self` raised to the power `exp` by repeated squaring.
    pub fn pow(&self, exp: u32) -> Self {
        let mut result = Self::one();
        let mut base = self.clone();
        let mut e = exp;
        while e > 0 {
            if e & 1 == 1 {
                result = &result * &base;
            }
            base = &base * &base;
            e >>= 1;
        }
        result
    }

    /// Narrow to `u64`, failing when the value does not fit.
    pub fn to_u64(&self) -> TunerResult<u64> {
        let mut acc: u64 = 0;
        for limb in self.limbs.iter().rev() {
            acc = acc
                .checked_mul(BASE)
                .and_then(|v| v.checked_add(*limb as u64))
                .ok_or_else(|| overflow(self, "u64"))?;
        }
        Ok(acc)
    }

    /// Narrow to `usize`, failing when the value does not fit.
    pub fn to_usize(&self) -> TunerResult<usize> {
        usize::try_from(self.to_u64()?).map_err(|_| overflow(self, "usize"))
    }

    /// `self - other`, or `None` when the result would be negative.
    pub fn checked_sub(&self, other: &Self) -> Option<Self> {
        if self < other {
            return None;
        }
        let mut limbs = Vec::with_capacity(self.limbs.len());
        let mut borrow = 0i64;
        for i in 0..self.limbs.len() {
            let rhs = other.limbs.get(i).copied().unwrap_or(0) as i64;
            let mut diff = self.limbs[i] as i64 - rhs - borrow;
            if diff < 0 {
                diff += BASE as i64;
                borrow = 1;
            } else {
                borrow = 0;
            }
            limbs.push(diff as u32);
        }
        Some(Self { limbs }.normalized())
    }

    /// Uniform random value in `[min, max)`.
    ///
    /// Scales a single unit-interval draw instead of rejection sampling: the
    /// draw is discretized to [`RANDOM_PRECISION`] decimal digits and the
    /// width `max - min` is scaled by it.
    pub fn random_in_range<R: Rng + ?Sized>(rng: &mut R, min: &Self, max: &Self) -> Self {
        debug_assert!(min < max, "empty random range");
        let unit: f64 = rng.gen();
        let scaled = (unit * 10f64.powi(RANDOM_PRECISION as i32)) as u64;
        let width = max.checked_sub(min).unwrap_or_default();
        let offset = &(&width * &Self::from(scaled)) / &Self::from(10u64).pow(RANDOM_PRECISION);
        min + &offset
    }

    fn normalized(mut self) -> Self {
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        self
    }

    fn mul_small(&self, factor: u32) -> Self {
        let mut limbs = Vec::with_capacity(self.limbs.len() + 1);
        let mut carry: u64 = 0;
        for limb in &self.limbs {
            let cur = *limb as u64 * factor as u64 + carry;
            limbs.push((cur % BASE) as u32);
            carry = cur / BASE;
        }
        while carry > 0 {
            limbs.push((carry % BASE) as u32);
            carry /= BASE;
        }
        Self { limbs }.normalized()
    }

    /// Quotient and remainder in one pass; schoolbook long division with a
    /// binary search for each quotient limb.
    pub fn div_rem(&self, divisor: &Self) -> (Self, Self) {
        assert!(!divisor.is_zero(), "division by zero");
        if self < divisor {
            return (Self::zero(), self.clone());
        }
        let mut remainder = Self::zero();
        let mut quotient = vec![0u32; self.limbs.len()];
        for i in (0..self.limbs.len()).rev() {
            remainder.limbs.insert(0, self.limbs[i]);
            remainder = remainder.normalized();
            let (mut lo, mut hi) = (0u32, (BASE - 1) as u32);
            while lo < hi {
                let mid = (lo + hi + 1) / 2;
                if divisor.mul_small(mid) <= remainder {
                    lo = mid;
                } else {
                    hi = mid - 1;
                }
            }
            quotient[i] = lo;
            if lo > 0 {
                remainder = remainder
                    .checked_sub(&divisor.mul_small(lo))
                    .expect("long-division digit too large");
            }
        }
        (Self { limbs: quotient }.normalized(), remainder)
    }
}

fn decimal_digits(mut limb: u32) -> usize {
    let mut digits = 1;
    while limb >= 10 {
        limb /= 10;
        digits += 1;
    }
    digits
}

fn overflow(value: &BigInt, target: &str) -> TunerError {
    TunerError::BigIntOverflow(format!("{value} does not fit into {target}"))
}

impl Ord for BigInt {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.limbs.len() != other.limbs.len() {
            return self.limbs.len().cmp(&other.limbs.len());
        }
        for (a, b) in self.limbs.iter().rev().zip(other.limbs.iter().rev()) {
            if a != b {
                return a.cmp(b);
            }
        }
        Ordering::Equal
    }
}

impl PartialOrd for BigInt {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add for &BigInt {
    type Output = BigInt;

    fn add(self, rhs: &BigInt) -> BigInt {
        let (long, short) = if self.limbs.len() >= rhs.limbs.len() {
            (self, rhs)
        } else {
            (rhs, self)
        };
        let mut limbs = Vec::with_capacity(long.limbs.len() + 1);
        let mut carry: u64 = 0;
        for i in 0..long.limbs.len() {
            let cur =
                long.limbs[i] as u64 + short.limbs.get(i).copied().unwrap_or(0) as u64 + carry;
            limbs.push((cur % BASE) as u32);
            carry = cur / BASE;
        }
        if carry > 0 {
            limbs.push(carry as u32);
        }
        BigInt { limbs }
    }
}

impl Sub for &BigInt {
    type Output = BigInt;

    /// Saturating at zero; values are non-negative by construction.
    fn sub(self, rhs: &BigInt) -> BigInt {
        self.checked_sub(rhs).unwrap_or_default()
    }
}

impl Mul for &BigInt {
    type Output = BigInt;

    fn mul(self, rhs: &BigInt) -> BigInt {
        if self.is_zero() || rhs.is_zero() {
            return BigInt::zero();
        }
        let mut limbs = vec![0u32; self.limbs.len() + rhs.limbs.len()];
        for (i, a) in self.limbs.iter().enumerate() {
            let mut carry: u64 = 0;
            for (j, b) in rhs.limbs.iter().enumerate() {
                let cur = limbs[i + j] as u64 + *a as u64 * *b as u64 + carry;
                limbs[i + j] = (cur % BASE) as u32;
                carry = cur / BASE;
            }
            let mut k = i + rhs.limbs.len();
            while carry > 0 {
                let cur = limbs[k] as u64 + carry;
                limbs[k] = (cur % BASE) as u32;
                carry = cur / BASE;
                k += 1;
            }
        }
        BigInt { limbs }.normalized()
    }
}

impl Div for &BigInt {
    type Output = BigInt;

    fn div(self, rhs: &BigInt) -> BigInt {
        self.div_rem(rhs).0
    }
}

impl Rem for &BigInt {
    type Output = BigInt;

    fn rem(self, rhs: &BigInt) -> BigInt {
        self.div_rem(rhs).1
    }
}

macro_rules! forward_owned_binop {
    ($trait:ident, $method:ident) => {
        impl $trait for BigInt {
            type Output = BigInt;

            fn $method(self, rhs: BigInt) -> BigInt {
                $trait::$method(&self, &rhs)
            }
        }
    };
}

forward_owned_binop!(Add, add);
forward_owned_binop!(Sub, sub);
forward_owned_binop!(Mul, mul);
forward_owned_binop!(Div, div);
forward_owned_binop!(Rem, rem);

impl From<u32> for BigInt {
    fn from(v: u32) -> Self {
        Self::from(v as u64)
    }
}

impl From<u64> for BigInt {
    fn from(mut v: u64) -> Self {
        let mut limbs = Vec::new();
        while v > 0 {
            limbs.push((v % BASE) as u32);
            v /= BASE;
        }
        Self { limbs }
    }
}

impl From<usize> for BigInt {
    fn from(v: usize) -> Self {
        Self::from(v as u64)
    }
}

impl fmt::Display for BigInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limbs.split_last() {
            None => write!(f, "0"),
            Some((top, rest)) => {
                write!(f, "{top}")?;
                for limb in rest.iter().rev() {
                    write!(f, "{limb:09}")?;
                }
                Ok(())
            }
        }
    }
}

impl FromStr for BigInt {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(TunerError::Parse(format!("invalid big integer: {s:?}")));
        }
        let bytes = s.as_bytes();
        let mut limbs = Vec::with_capacity(bytes.len() / BASE_DIGITS + 1);
        let mut end = bytes.len();
        while end > 0 {
            let start = end.saturating_sub(BASE_DIGITS);
            let chunk = std::str::from_utf8(&bytes[start..end]).expect("ascii digits");
            limbs.push(chunk.parse::<u32>().expect("chunk of ascii digits"));
            end = start;
        }
        Ok(Self { limbs }.normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn big(s: &str) -> BigInt {
        s.parse().unwrap()
    }

    #[test]
    fn arithmetic_roundtrip() {
        let a = big("123456789012345678901234567890");
        let b = big("987654321098765432109876543210");
        let sum = &a + &b;
        assert_eq!(sum.to_string(), "1111111110111111111011111111100");
        assert_eq!(&sum - &b, a);
        let product = &a * &b;
        assert_eq!(&product / &a, b);
        assert_eq!(&product % &b, BigInt::zero());
    }

    #[test]
    fn division_with_remainder() {
        let (q, r) = big("1000000000000000000007").div_rem(&big("1000000007"));
        assert_eq!(&(&q * &big("1000000007")) + &r, big("1000000000000000000007"));
        assert!(r < big("1000000007"));
    }

    #[test]
    fn subtraction_saturates_at_zero() {
        assert_eq!(&BigInt::from(3u32) - &BigInt::from(5u32), BigInt::zero());
    }

    #[test]
    fn pow_and_digits() {
        let two_pow_100 = BigInt::from(2u32).pow(100);
        assert_eq!(two_pow_100.to_string(), "1267650600228229401496703205376");
        assert_eq!(two_pow_100.digits(), 31);
        assert_eq!(BigInt::zero().digits(), 1);
        assert_eq!(BigInt::from(999_999_999u32).digits(), 9);
        assert_eq!(BigInt::from(1_000_000_000u64).digits(), 10);
    }

    #[test]
    fn ordering() {
        assert!(big("999999999") < big("1000000000"));
        assert!(big("123456789123456789") > big("99999999999999999"));
        assert_eq!(big("00042"), BigInt::from(42u32));
    }

    #[test]
    fn narrowing() {
        assert_eq!(BigInt::from(u64::MAX).to_u64().unwrap(), u64::MAX);
        let too_big = &BigInt::from(u64::MAX) + &BigInt::one();
        assert!(matches!(
            too_big.to_u64(),
            Err(TunerError::BigIntOverflow(_))
        ));
    }

    #[test]
    fn display_pads_inner_limbs() {
        let n = &BigInt::from(1_000_000_000u64) * &BigInt::from(3u32);
        assert_eq!(n.to_string(), "3000000000");
    }

    #[test]
    fn random_in_range_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let min = big("1000000000000000000000");
        let max = big("1000000000000000001000");
        for _ in 0..200 {
            let sample = BigInt::random_in_range(&mut rng, &min, &max);
            assert!(sample >= min, "{sample} < {min}");
            assert!(sample < max, "{sample} >= {max}");
        }
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<BigInt>().is_err());
        assert!("12x3".parse::<BigInt>().is_err());
        assert!("-5".parse::<BigInt>().is_err());
    }
}
