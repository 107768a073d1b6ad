//! Fixed-point math utilities for deterministic simulation.
//!
//! All match simulation uses fixed-point arithmetic so that the same seed
//! and the same command stream always reproduce bit-identical state.
//! Floating-point operations can produce different results on different CPUs.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
/// Range: approximately -2,147,483,648 to 2,147,483,647
/// Precision: approximately 0.00000000023
pub type Fixed = I32F32;

/// π in [`Fixed`] precision.
pub const PI: Fixed = Fixed::from_bits(13_493_037_705);

/// π/2 in [`Fixed`] precision.
pub const FRAC_PI_2: Fixed = Fixed::from_bits(6_746_518_852);

/// 2π in [`Fixed`] precision.
pub const TAU: Fixed = Fixed::from_bits(26_986_075_409);

/// One thousand, for seconds/milliseconds conversion.
pub const MILLIS_PER_SECOND: Fixed = fixed_int(1000);

/// Whole number as [`Fixed`], usable in `const` tables.
#[must_use]
pub const fn fixed_int(n: i32) -> Fixed {
    Fixed::from_bits((n as i64) << 32)
}

/// Fixed-point 2D vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Vec2Fixed {
    /// X coordinate.
    #[serde(with = "fixed_serde")]
    pub x: Fixed,
    /// Y coordinate.
    #[serde(with = "fixed_serde")]
    pub y: Fixed,
}

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

impl Vec2Fixed {
    /// Create a new fixed-point vector.
    #[must_use]
    pub const fn new(x: Fixed, y: Fixed) -> Self {
        Self { x, y }
    }

    /// Create a vector from whole world coordinates.
    #[must_use]
    pub fn from_ints(x: i32, y: i32) -> Self {
        Self::new(Fixed::from_num(x), Fixed::from_num(y))
    }

    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
    };

    /// Calculate squared distance (avoids sqrt for comparisons).
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Self) -> Fixed {
        fixed_sqrt(self.distance_squared(other))
    }

    /// Dot product of two vectors. Saturates at the [`Fixed`] range.
    #[must_use]
    pub fn dot(self, other: Self) -> Fixed {
        self.x
            .saturating_mul(other.x)
            .saturating_add(self.y.saturating_mul(other.y))
    }

    /// Length of the vector.
    #[must_use]
    pub fn length(self) -> Fixed {
        fixed_sqrt(self.dot(self))
    }

    /// Multiply both components by a scalar.
    #[must_use]
    pub fn scale(self, factor: Fixed) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    /// Point on a circle of `radius` around `self` at `angle` radians.
    #[must_use]
    pub fn on_circle(self, radius: Fixed, angle: Fixed) -> Self {
        let (sin, cos) = sin_cos(angle);
        Self::new(self.x + cos * radius, self.y + sin * radius)
    }

    /// Arithmetic mean of a set of points. Returns `None` for an empty set.
    #[must_use]
    pub fn centroid<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut sum = Self::ZERO;
        let mut count = 0_i32;
        for point in points {
            sum = sum + point;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        let n = Fixed::from_num(count);
        Some(Self::new(sum.x / n, sum.y / n))
    }

    /// Convert to floating point for presentation (never fed back into the simulation).
    #[must_use]
    pub fn to_f32_pair(self) -> [f32; 2] {
        [self.x.to_num::<f32>(), self.y.to_num::<f32>()]
    }
}

/// Square root of a fixed-point number.
///
/// Works on the raw bits with an integer Newton iteration, so the result is
/// exact to the last fractional bit and identical on every platform.
/// Negative inputs return zero.
#[must_use]
pub fn fixed_sqrt(value: Fixed) -> Fixed {
    if value <= Fixed::ZERO {
        return Fixed::ZERO;
    }

    // sqrt(bits * 2^-32) = sqrt(bits * 2^32) * 2^-32
    let widened = (value.to_bits() as u128) << 32;
    let root = isqrt_u128(widened);
    Fixed::from_bits(root as i64)
}

fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }

    let bits = 128 - n.leading_zeros();
    let mut x: u128 = 1 << ((bits + 1) / 2);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Sine and cosine of `angle` (radians), computed in fixed point.
///
/// The angle is reduced into `[-π/2, π/2]` and evaluated with a
/// ninth-order Taylor polynomial, which is accurate to roughly 4e-6.
#[must_use]
pub fn sin_cos(angle: Fixed) -> (Fixed, Fixed) {
    (fixed_sin(angle), fixed_sin(angle + FRAC_PI_2))
}

fn fixed_sin(angle: Fixed) -> Fixed {
    let mut a = angle.rem_euclid(TAU);
    if a > PI {
        a -= TAU;
    }
    // a is now in (-π, π]
    if a > FRAC_PI_2 {
        a = PI - a;
    } else if a < -FRAC_PI_2 {
        a = -PI - a;
    }

    let x2 = a * a;
    // x - x^3/3! + x^5/5! - x^7/7! + x^9/9!, in Horner form
    let mut term = Fixed::ONE;
    for divisor in [72_i32, 42, 20, 6] {
        term = Fixed::ONE - x2 * term / Fixed::from_num(divisor);
    }
    a * term
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_add(rhs.x),
            y: self.y.saturating_add(rhs.y),
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x.saturating_sub(rhs.x),
            y: self.y.saturating_sub(rhs.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Fixed, b: Fixed) -> bool {
        (a - b).abs() < Fixed::from_num(1) / Fixed::from_num(10_000)
    }

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::new(Fixed::from_num(3), Fixed::from_num(0));
        let b = Vec2Fixed::new(Fixed::from_num(0), Fixed::from_num(4));
        let dist_sq = a.distance_squared(b);
        // 3² + 4² = 25
        assert_eq!(dist_sq, Fixed::from_num(25));
        assert_eq!(a.distance(b), Fixed::from_num(5));
    }

    #[test]
    fn test_far_apart_points_saturate() {
        let origin = Vec2Fixed::from_ints(0, 0);
        let far = Vec2Fixed::from_ints(100_000, 0);
        assert_eq!(origin.distance_squared(far), Fixed::MAX);
        assert_eq!((far - origin).dot(far - origin), Fixed::MAX);
        assert!((far - origin).length() > Fixed::from_num(46_000));

        let extreme = Vec2Fixed::new(Fixed::MIN, Fixed::MAX);
        assert_eq!(extreme - Vec2Fixed::new(Fixed::MAX, Fixed::MIN), extreme);
        assert_eq!(origin.distance_squared(extreme), Fixed::MAX);
    }

    #[test]
    fn test_sqrt_exact_squares() {
        for n in [0, 1, 4, 9, 576, 6400, 1_000_000] {
            let root = fixed_sqrt(Fixed::from_num(n));
            assert_eq!(root * root, Fixed::from_num(n), "sqrt({n})");
        }
        assert_eq!(fixed_sqrt(Fixed::from_num(-4)), Fixed::ZERO);
    }

    #[test]
    fn test_sqrt_fractional() {
        let root = fixed_sqrt(Fixed::from_num(2));
        assert!(close(root, Fixed::from_num(1.414_213_56)));
    }

    #[test]
    fn test_sin_cos_cardinal_angles() {
        let (s, c) = sin_cos(Fixed::ZERO);
        assert!(close(s, Fixed::ZERO));
        assert!(close(c, Fixed::ONE));

        let (s, c) = sin_cos(FRAC_PI_2);
        assert!(close(s, Fixed::ONE));
        assert!(close(c, Fixed::ZERO));

        let (s, c) = sin_cos(PI);
        assert!(close(s, Fixed::ZERO));
        assert!(close(c, -Fixed::ONE));

        let (s, c) = sin_cos(PI + FRAC_PI_2);
        assert!(close(s, -Fixed::ONE));
        assert!(close(c, Fixed::ZERO));
    }

    #[test]
    fn test_sin_cos_unit_circle() {
        for step in 0..16 {
            let angle = TAU * Fixed::from_num(step) / Fixed::from_num(16);
            let (s, c) = sin_cos(angle);
            assert!(close(s * s + c * c, Fixed::ONE), "angle step {step}");
        }
    }

    #[test]
    fn test_centroid() {
        let points = [
            Vec2Fixed::from_ints(0, 0),
            Vec2Fixed::from_ints(10, 0),
            Vec2Fixed::from_ints(10, 10),
            Vec2Fixed::from_ints(0, 10),
        ];
        assert_eq!(
            Vec2Fixed::centroid(points),
            Some(Vec2Fixed::from_ints(5, 5))
        );
        assert_eq!(Vec2Fixed::centroid(std::iter::empty()), None);
    }

    #[test]
    fn test_fixed_determinism() {
        // Same operations must produce identical results
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(fixed_sqrt(a), fixed_sqrt(b));
        assert_eq!(sin_cos(a), sin_cos(b));
    }
}
