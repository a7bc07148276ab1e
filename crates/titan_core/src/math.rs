//! Fixed-point math utilities for deterministic simulation.
//!
//! Unit positions use fixed-point arithmetic so that the same seed and the
//! same command stream produce bit-identical states on every platform.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

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

    /// Create a vector from whole-number coordinates.
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
    ///
    /// Saturates at [`Fixed::MAX`] once the points are more than about
    /// 46,000 units apart.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> Fixed {
        let dx = self.x.saturating_sub(other.x);
        let dy = self.y.saturating_sub(other.y);
        dx.saturating_mul(dx).saturating_add(dy.saturating_mul(dy))
    }

    /// Whether `other` lies strictly closer than `radius`.
    ///
    /// Points outside the bounding square are rejected before squaring.
    #[must_use]
    pub fn within(self, other: Self, radius: Fixed) -> bool {
        let dx = self.x.saturating_sub(other.x).saturating_abs();
        let dy = self.y.saturating_sub(other.y).saturating_abs();
        if dx >= radius || dy >= radius {
            return false;
        }
        dx * dx + dy * dy < radius * radius
    }
}

impl std::ops::Add for Vec2Fixed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl std::ops::Sub for Vec2Fixed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec2_distance_squared() {
        let a = Vec2Fixed::from_ints(3, 0);
        let b = Vec2Fixed::from_ints(0, 4);
        // 3² + 4² = 25
        assert_eq!(a.distance_squared(b), Fixed::from_num(25));
    }

    #[test]
    fn test_within_is_strict() {
        let a = Vec2Fixed::from_ints(100, 200);
        let radius = Fixed::from_num(50);

        assert!(!a.within(Vec2Fixed::from_ints(150, 200), radius));
        assert!(!a.within(Vec2Fixed::from_ints(130, 240), radius));
        assert!(a.within(Vec2Fixed::from_ints(149, 200), radius));
    }

    #[test]
    fn test_far_points_do_not_overflow() {
        let a = Vec2Fixed::from_ints(50, 200);
        let b = Vec2Fixed::from_ints(99_950, 200);
        let radius = Fixed::from_num(50);

        assert!(!a.within(b, radius));
        assert!(!b.within(a, radius));
        assert_eq!(a.distance_squared(b), Fixed::MAX);

        let corner = Vec2Fixed::from_ints(-1_000_000, 1_000_000);
        assert!(!corner.within(Vec2Fixed::from_ints(1_000_000, -1_000_000), radius));
    }

    #[test]
    fn test_within_near_radius_limit() {
        let radius = Fixed::from_num(crate::config::MAX_COLLISION_RADIUS);
        let a = Vec2Fixed::from_ints(0, 0);

        assert!(a.within(Vec2Fixed::from_ints(29_999, 0), radius));
        assert!(!a.within(Vec2Fixed::from_ints(25_000, 25_000), radius));
    }

    #[test]
    fn test_fixed_determinism() {
        let a = Fixed::from_num(1) / Fixed::from_num(3);
        let b = Fixed::from_num(1) / Fixed::from_num(3);
        assert_eq!(a, b);
        assert_eq!(a * Fixed::from_num(7), b * Fixed::from_num(7));
    }

    #[test]
    fn test_vec2_add_sub() {
        let a = Vec2Fixed::from_ints(2, 3);
        let b = Vec2Fixed::from_ints(4, -1);
        assert_eq!(a + b, Vec2Fixed::from_ints(6, 2));
        assert_eq!(a - b, Vec2Fixed::from_ints(-2, 4));
    }
}
