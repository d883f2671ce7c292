//! 2D geometric primitives: vectors, line equations, bounds.
//!
//! [`Vec2`] is a point/vector over two [`Scalar`]s so positions derived
//! from configured decimal values stay exact until trigonometry enters.
//! [`LineEquation`] is the infinite-line form used for intersections,
//! perpendiculars and angle math; it keeps an explicit vertical
//! representation instead of an infinite slope.

use std::ops::{Add, Div, Mul, Neg, Sub};

use glam::{DVec2, dvec2};

use crate::scalar::Scalar;

/// Threshold under which a coordinate delta counts as zero: lines snap to
/// their vertical representation, and near-zero slopes snap to exactly
/// horizontal.
pub const GEOMETRY_EPSILON: f64 = 1e-9;

/// A 2D point or displacement built from two scalars.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vec2 {
    pub x: Scalar,
    pub y: Scalar,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 {
        x: Scalar::ZERO,
        y: Scalar::ZERO,
    };

    /// The explicit "no position" vector; both components empty.
    pub const EMPTY: Vec2 = Vec2 {
        x: Scalar::EMPTY,
        y: Scalar::EMPTY,
    };

    #[inline]
    pub const fn new(x: Scalar, y: Scalar) -> Vec2 {
        Vec2 { x, y }
    }

    /// Floating-point construction, mostly for computed geometry and tests.
    #[inline]
    pub const fn approx(x: f64, y: f64) -> Vec2 {
        Vec2 {
            x: Scalar::approx(x),
            y: Scalar::approx(y),
        }
    }

    pub fn is_empty(self) -> bool {
        self.x.is_empty() || self.y.is_empty()
    }

    pub fn dot(self, other: Vec2) -> Scalar {
        self.x * other.x + self.y * other.y
    }

    /// Euclidean length; always a floating-point scalar.
    pub fn length(self) -> Scalar {
        self.dot(self).sqrt()
    }

    /// Unit vector in the same direction, or `None` for a zero-length
    /// (degenerate) vector.
    pub fn normalize(self) -> Option<Vec2> {
        let len = self.length();
        if len.to_f64().abs() < GEOMETRY_EPSILON {
            None
        } else {
            Some(self / len)
        }
    }

    /// Linear interpolation: `t = 0` is `self`, `t = 1` is `other`.
    /// Values outside `[0, 1]` extrapolate.
    pub fn lerp(self, other: Vec2, t: Scalar) -> Vec2 {
        self + (other - self) * t
    }

    pub fn midpoint(self, other: Vec2) -> Vec2 {
        self.lerp(other, Scalar::new(5, 1))
    }

    pub fn min(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    pub fn max(self, other: Vec2) -> Vec2 {
        Vec2 {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }

    pub fn clamp(self, lo: Vec2, hi: Vec2) -> Vec2 {
        self.max(lo).min(hi)
    }

    /// Mirror across the vertical axis (negate X).
    pub fn flip_horizontal(self) -> Vec2 {
        Vec2 {
            x: -self.x,
            y: self.y,
        }
    }

    /// Bridge into float space for glam-based math. Panics on an empty
    /// component, like any other arithmetic on an empty scalar.
    pub fn to_dvec2(self) -> DVec2 {
        dvec2(self.x.to_f64(), self.y.to_f64())
    }

    pub fn from_dvec2(v: DVec2) -> Vec2 {
        Vec2::approx(v.x, v.y)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2 {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<Scalar> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: Scalar) -> Vec2 {
        Vec2 {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Div<Scalar> for Vec2 {
    type Output = Vec2;
    fn div(self, rhs: Scalar) -> Vec2 {
        Vec2 {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2 {
            x: -self.x,
            y: -self.y,
        }
    }
}

/// The equation of an infinite line.
///
/// Slope/intercept for everything that has a finite slope, with a separate
/// vertical representation so `x = c` lines need no infinities.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LineEquation {
    Sloped { slope: Scalar, intercept: Scalar },
    Vertical { x: Scalar },
}

impl LineEquation {
    /// Line from slope and Y-intercept; near-zero slopes snap to exactly
    /// zero so later horizontal checks are reliable.
    pub fn sloped(slope: Scalar, intercept: Scalar) -> LineEquation {
        let slope = if slope.to_f64().abs() < GEOMETRY_EPSILON {
            Scalar::ZERO
        } else {
            slope
        };
        LineEquation::Sloped { slope, intercept }
    }

    pub fn vertical(x: Scalar) -> LineEquation {
        LineEquation::Vertical { x }
    }

    /// Line through two points. Chooses the vertical representation when
    /// the X delta is within [`GEOMETRY_EPSILON`] of zero.
    pub fn through(a: Vec2, b: Vec2) -> LineEquation {
        let dx = b.x - a.x;
        if dx.to_f64().abs() < GEOMETRY_EPSILON {
            LineEquation::Vertical { x: a.x }
        } else {
            let slope = (b.y - a.y) / dx;
            let slope = if slope.to_f64().abs() < GEOMETRY_EPSILON {
                Scalar::ZERO
            } else {
                slope
            };
            LineEquation::Sloped {
                slope,
                intercept: a.y - slope * a.x,
            }
        }
    }

    pub fn is_vertical(&self) -> bool {
        matches!(self, LineEquation::Vertical { .. })
    }

    pub fn is_horizontal(&self) -> bool {
        matches!(self, LineEquation::Sloped { slope, .. } if slope.is_zero())
    }

    /// The point on the line at the given X, undefined for a vertical line.
    pub fn point_at_x(&self, x: Scalar) -> Option<Vec2> {
        match self {
            LineEquation::Sloped { slope, intercept } => {
                Some(Vec2::new(x, *slope * x + *intercept))
            }
            LineEquation::Vertical { .. } => None,
        }
    }

    /// The point on the line at the given Y, undefined for a horizontal
    /// line.
    pub fn point_at_y(&self, y: Scalar) -> Option<Vec2> {
        match self {
            LineEquation::Sloped { slope, intercept } => {
                if slope.is_zero() {
                    None
                } else {
                    Some(Vec2::new((y - *intercept) / *slope, y))
                }
            }
            LineEquation::Vertical { x } => Some(Vec2::new(*x, y)),
        }
    }

    /// The line perpendicular to this one passing through `p`.
    pub fn perpendicular_through(&self, p: Vec2) -> LineEquation {
        match self {
            LineEquation::Vertical { .. } => LineEquation::Sloped {
                slope: Scalar::ZERO,
                intercept: p.y,
            },
            LineEquation::Sloped { slope, .. } => {
                if slope.is_zero() {
                    LineEquation::Vertical { x: p.x }
                } else {
                    let perp = -(Scalar::ONE / *slope);
                    LineEquation::Sloped {
                        slope: perp,
                        intercept: p.y - perp * p.x,
                    }
                }
            }
        }
    }

    /// Intersection of two lines, `None` when they are parallel (including
    /// two vertical lines).
    pub fn intersect(&self, other: &LineEquation) -> Option<Vec2> {
        match (self, other) {
            (LineEquation::Vertical { .. }, LineEquation::Vertical { .. }) => None,
            (LineEquation::Vertical { x }, sloped @ LineEquation::Sloped { .. })
            | (sloped @ LineEquation::Sloped { .. }, LineEquation::Vertical { x }) => {
                sloped.point_at_x(*x)
            }
            (
                LineEquation::Sloped {
                    slope: m1,
                    intercept: b1,
                },
                LineEquation::Sloped {
                    slope: m2,
                    intercept: b2,
                },
            ) => {
                let dm = *m1 - *m2;
                if dm.to_f64().abs() < GEOMETRY_EPSILON {
                    None
                } else {
                    let x = (*b2 - *b1) / dm;
                    Some(Vec2::new(x, *m1 * x + *b1))
                }
            }
        }
    }

    /// Direction angle in degrees: `atan(slope)` for sloped lines, exactly
    /// 90 for vertical ones. Range `(-90, 90]`.
    pub fn direction_angle_deg(&self) -> f64 {
        match self {
            LineEquation::Sloped { slope, .. } => slope.to_f64().atan().to_degrees(),
            LineEquation::Vertical { .. } => 90.0,
        }
    }

    /// Signed angle from this line to `other` in degrees, normalized into
    /// `(-90, 90]`. Two vertical lines give exactly 0; a perpendicular
    /// pair (the zero-denominator case of the tangent formula) gives
    /// exactly 90.
    pub fn angle_to(&self, other: &LineEquation) -> f64 {
        let mut angle = other.direction_angle_deg() - self.direction_angle_deg();
        if angle > 90.0 {
            angle -= 180.0;
        } else if angle <= -90.0 {
            angle += 180.0;
        }
        angle
    }
}

/// Axis-aligned bounding box in float space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    /// An empty box; expands on the first point.
    pub fn new() -> Bounds {
        Bounds {
            min: DVec2::splat(f64::MAX),
            max: DVec2::splat(f64::MIN),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand(&mut self, p: DVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    pub fn expand_point(&mut self, p: Vec2) {
        if !p.is_empty() {
            self.expand(p.to_dvec2());
        }
    }

    pub fn union(&mut self, other: &Bounds) {
        if !other.is_empty() {
            self.expand(other.min);
            self.expand(other.max);
        }
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }
}

impl Default for Bounds {
    fn default() -> Bounds {
        Bounds::new()
    }
}
