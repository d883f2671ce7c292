//! Precision-preserving scalar arithmetic.
//!
//! Layout math works on user-entered decimal quantities (spacing, gauges,
//! scale lengths) where binary floating point drifts visibly after a few
//! additions. [`Scalar`] keeps values as exact decimals for as long as the
//! arithmetic allows and only falls back to floating point for
//! transcendental results or decimal overflow.
//!
//! The third state, [`Scalar::Empty`], represents "no value configured".
//! It is distinct from zero and poisons arithmetic loudly: any `+ - * /`
//! with an empty operand panics. The build orchestrator catches panics at
//! the stage boundary and reports them as a single error message, so an
//! empty value slipping into geometry can never produce a silently wrong
//! layout.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use thiserror::Error;

/// Error type for invalid numeric input values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScalarError {
    /// Value is NaN
    #[error("value is NaN")]
    NaN,
    /// Value is infinite
    #[error("value is infinite")]
    Infinite,
}

/// A scalar quantity in the layout's internal unit.
///
/// `Exact` carries a decimal and survives `+ - * /` without rounding;
/// `Approx` is the floating-point fallback used for transcendental results
/// (and for exact operations that overflow the decimal range); `Empty` is
/// the explicit "not configured" sentinel.
#[derive(Clone, Copy, Debug)]
pub enum Scalar {
    /// Exact decimal value.
    Exact(Decimal),
    /// Floating-point fallback.
    Approx(f64),
    /// No value. Arithmetic on it is a programming error and panics.
    Empty,
}

/// Populated payload of a scalar, used internally by the operators.
#[derive(Clone, Copy)]
enum Repr {
    Exact(Decimal),
    Approx(f64),
}

impl Repr {
    fn as_f64(self) -> f64 {
        match self {
            Repr::Exact(d) => dec_to_f64(d),
            Repr::Approx(f) => f,
        }
    }
}

fn dec_to_f64(d: Decimal) -> f64 {
    d.to_f64().unwrap_or(f64::NAN)
}

impl Scalar {
    pub const ZERO: Scalar = Scalar::Exact(Decimal::ZERO);
    pub const ONE: Scalar = Scalar::Exact(Decimal::ONE);
    pub const TWO: Scalar = Scalar::Exact(Decimal::TWO);
    pub const EMPTY: Scalar = Scalar::Empty;

    /// Exact decimal from an integer mantissa and a decimal scale:
    /// `Scalar::new(73, 1)` is exactly 7.3.
    #[inline]
    pub fn new(mantissa: i64, scale: u32) -> Scalar {
        Scalar::Exact(Decimal::new(mantissa, scale))
    }

    /// Floating-point scalar (no exactness guarantee).
    #[inline]
    pub const fn approx(value: f64) -> Scalar {
        Scalar::Approx(value)
    }

    /// Validated floating-point scalar; rejects NaN and infinities.
    pub fn try_new(value: f64) -> Result<Scalar, ScalarError> {
        if value.is_nan() {
            Err(ScalarError::NaN)
        } else if value.is_infinite() {
            Err(ScalarError::Infinite)
        } else {
            Ok(Scalar::Approx(value))
        }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        matches!(self, Scalar::Empty)
    }

    #[inline]
    pub fn is_exact(self) -> bool {
        matches!(self, Scalar::Exact(_))
    }

    pub fn is_zero(self) -> bool {
        match self {
            Scalar::Exact(d) => d.is_zero(),
            Scalar::Approx(f) => f == 0.0,
            Scalar::Empty => false,
        }
    }

    /// The value as `f64`. Panics on an empty scalar; callers that may see
    /// empty values must check [`Scalar::is_empty`] first.
    pub fn to_f64(self) -> f64 {
        self.repr("conversion").as_f64()
    }

    /// The value as `f64`, or `None` when empty.
    pub fn to_f64_opt(self) -> Option<f64> {
        match self {
            Scalar::Exact(d) => Some(dec_to_f64(d)),
            Scalar::Approx(f) => Some(f),
            Scalar::Empty => None,
        }
    }

    pub fn abs(self) -> Scalar {
        match self.repr("abs") {
            Repr::Exact(d) => Scalar::Exact(d.abs()),
            Repr::Approx(f) => Scalar::Approx(f.abs()),
        }
    }

    pub fn min(self, other: Scalar) -> Scalar {
        match self.partial_cmp(&other) {
            Some(Ordering::Greater) => other,
            _ => self,
        }
    }

    pub fn max(self, other: Scalar) -> Scalar {
        match self.partial_cmp(&other) {
            Some(Ordering::Less) => other,
            _ => self,
        }
    }

    pub fn clamp(self, lo: Scalar, hi: Scalar) -> Scalar {
        self.max(lo).min(hi)
    }

    /// Square root; always a floating-point result.
    pub fn sqrt(self) -> Scalar {
        Scalar::Approx(self.repr("sqrt").as_f64().sqrt())
    }

    /// Cosine of a value in radians; always a floating-point result.
    pub fn cos(self) -> Scalar {
        Scalar::Approx(self.repr("cos").as_f64().cos())
    }

    /// Sine of a value in radians; always a floating-point result.
    pub fn sin(self) -> Scalar {
        Scalar::Approx(self.repr("sin").as_f64().sin())
    }

    /// Arcsine in radians; always a floating-point result.
    pub fn asin(self) -> Scalar {
        Scalar::Approx(self.repr("asin").as_f64().asin())
    }

    /// Checked division returning `None` when the divisor is zero or empty.
    pub fn checked_div(self, rhs: Scalar) -> Option<Scalar> {
        if rhs.is_empty() || self.is_empty() || rhs.is_zero() {
            None
        } else {
            Some(self / rhs)
        }
    }

    fn repr(self, op: &'static str) -> Repr {
        match self {
            Scalar::Exact(d) => Repr::Exact(d),
            Scalar::Approx(f) => Repr::Approx(f),
            Scalar::Empty => panic!("scalar {op} on an empty operand"),
        }
    }

    fn combine(
        self,
        rhs: Scalar,
        op: &'static str,
        exact: impl Fn(Decimal, Decimal) -> Option<Decimal>,
        approx: impl Fn(f64, f64) -> f64,
    ) -> Scalar {
        match (self.repr(op), rhs.repr(op)) {
            (Repr::Exact(a), Repr::Exact(b)) => match exact(a, b) {
                Some(d) => Scalar::Exact(d),
                // Decimal overflow: continue in floating point
                None => Scalar::Approx(approx(dec_to_f64(a), dec_to_f64(b))),
            },
            (a, b) => Scalar::Approx(approx(a.as_f64(), b.as_f64())),
        }
    }
}

impl Add for Scalar {
    type Output = Scalar;
    fn add(self, rhs: Scalar) -> Scalar {
        self.combine(rhs, "addition", |a, b| a.checked_add(b), |a, b| a + b)
    }
}

impl Sub for Scalar {
    type Output = Scalar;
    fn sub(self, rhs: Scalar) -> Scalar {
        self.combine(rhs, "subtraction", |a, b| a.checked_sub(b), |a, b| a - b)
    }
}

impl Mul for Scalar {
    type Output = Scalar;
    fn mul(self, rhs: Scalar) -> Scalar {
        self.combine(rhs, "multiplication", |a, b| a.checked_mul(b), |a, b| a * b)
    }
}

impl Div for Scalar {
    type Output = Scalar;
    fn div(self, rhs: Scalar) -> Scalar {
        if rhs.is_zero() {
            panic!("scalar division by zero");
        }
        self.combine(rhs, "division", |a, b| a.checked_div(b), |a, b| a / b)
    }
}

impl AddAssign for Scalar {
    fn add_assign(&mut self, rhs: Scalar) {
        *self = *self + rhs;
    }
}

impl SubAssign for Scalar {
    fn sub_assign(&mut self, rhs: Scalar) {
        *self = *self - rhs;
    }
}

impl Neg for Scalar {
    type Output = Scalar;
    fn neg(self) -> Scalar {
        match self.repr("negation") {
            Repr::Exact(d) => Scalar::Exact(-d),
            Repr::Approx(f) => Scalar::Approx(-f),
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Scalar) -> bool {
        match (self, other) {
            (Scalar::Empty, Scalar::Empty) => true,
            (Scalar::Empty, _) | (_, Scalar::Empty) => false,
            (Scalar::Exact(a), Scalar::Exact(b)) => a == b,
            (a, b) => a.repr("comparison").as_f64() == b.repr("comparison").as_f64(),
        }
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Scalar) -> Option<Ordering> {
        match (self, other) {
            (Scalar::Empty, Scalar::Empty) => Some(Ordering::Equal),
            (Scalar::Empty, _) | (_, Scalar::Empty) => None,
            (Scalar::Exact(a), Scalar::Exact(b)) => Some(a.cmp(b)),
            (a, b) => a
                .repr("comparison")
                .as_f64()
                .partial_cmp(&b.repr("comparison").as_f64()),
        }
    }
}

impl From<Decimal> for Scalar {
    fn from(d: Decimal) -> Scalar {
        Scalar::Exact(d)
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Scalar {
        Scalar::Exact(Decimal::from(v))
    }
}

impl From<i32> for Scalar {
    fn from(v: i32) -> Scalar {
        Scalar::Exact(Decimal::from(v))
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Scalar {
        Scalar::Exact(Decimal::from(v))
    }
}

/// Lossy: the float is carried as-is, not decimalized.
impl From<f64> for Scalar {
    fn from(v: f64) -> Scalar {
        Scalar::Approx(v)
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Decimal display preserves the entered digits (7.30 stays 7.30)
            Scalar::Exact(d) => write!(f, "{}", d),
            Scalar::Approx(v) => write!(f, "{}", v),
            Scalar::Empty => write!(f, "(empty)"),
        }
    }
}
