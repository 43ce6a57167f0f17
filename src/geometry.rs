//! Fundamental planar geometry types for bridge modelling.

use std::ops::{Add, Mul, Sub};

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Position in the plane of the truss measured in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Distance along the global X axis (along the span).
    pub x: f64,
    /// Distance along the global Y axis (up).
    pub y: f64,
}

impl Point {
    /// Create a [`Point`] with explicit coordinates.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the point into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Translate the point by a displacement.
    #[must_use]
    pub fn offset(self, by: Displacement) -> Point {
        Point::new(self.x + by.x, self.y + by.y)
    }
}

impl From<Vector2<f64>> for Point {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Point> for Vector2<f64> {
    fn from(value: Point) -> Self {
        value.to_vector()
    }
}

impl Sub for Point {
    type Output = Displacement;

    fn sub(self, rhs: Point) -> Displacement {
        Displacement::new(self.x - rhs.x, self.y - rhs.y)
    }
}

/// Translation vector describing a joint displacement or a planar direction, in metres.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Displacement {
    /// Component along the global X axis.
    pub x: f64,
    /// Component along the global Y axis.
    pub y: f64,
}

impl Displacement {
    /// Create a [`Displacement`] with explicit components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert the displacement into an algebraic vector.
    #[must_use]
    pub fn to_vector(self) -> Vector2<f64> {
        Vector2::new(self.x, self.y)
    }

    /// Length of the vector.
    #[must_use]
    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    /// Vector in the same direction with the given length.
    ///
    /// A zero vector stays zero.
    #[must_use]
    pub fn with_length(self, length: f64) -> Displacement {
        let norm = self.norm();
        if norm == 0.0 {
            return self;
        }
        self * (length / norm)
    }

    /// The vector rotated a quarter turn counter-clockwise.
    #[must_use]
    pub const fn perp(self) -> Displacement {
        Displacement::new(-self.y, self.x)
    }

    /// Z component of the cross product `self × other`.
    #[must_use]
    pub fn cross(self, other: Displacement) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Linear blend `(1 - t) * a + t * b`.
    ///
    /// Exact at both ends: `t == 0` yields `a` and `t == 1` yields `b`.
    #[must_use]
    pub fn lerp(a: Displacement, b: Displacement, t: f64) -> Displacement {
        let s = 1.0 - t;
        Displacement::new(s * a.x + t * b.x, s * a.y + t * b.y)
    }
}

impl From<Vector2<f64>> for Displacement {
    fn from(value: Vector2<f64>) -> Self {
        Self::new(value.x, value.y)
    }
}

impl From<Displacement> for Vector2<f64> {
    fn from(value: Displacement) -> Self {
        value.to_vector()
    }
}

impl Add for Displacement {
    type Output = Displacement;

    fn add(self, rhs: Displacement) -> Displacement {
        Displacement::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Displacement {
    type Output = Displacement;

    fn sub(self, rhs: Displacement) -> Displacement {
        Displacement::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Displacement {
    type Output = Displacement;

    fn mul(self, rhs: f64) -> Displacement {
        Displacement::new(self.x * rhs, self.y * rhs)
    }
}

/// Convenience helper for creating [`Point`] instances.
///
/// # Examples
/// ```
/// use trussim::point;
///
/// let origin = point(0.0, 0.0);
/// assert_eq!(origin.x, 0.0);
/// ```
#[must_use]
pub const fn point(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

/// Convenience helper for creating [`Displacement`] instances.
///
/// # Examples
/// ```
/// use trussim::displacement;
///
/// let delta = displacement(0.001, 0.0);
/// assert_eq!(delta.x, 0.001);
/// ```
#[must_use]
pub const fn displacement(x: f64, y: f64) -> Displacement {
    Displacement::new(x, y)
}

/// Intersection of the closed segments `p1–p2` and `p3–p4`.
///
/// Parallel (including collinear) segments never intersect.
#[must_use]
pub fn segment_intersection(p1: Point, p2: Point, p3: Point, p4: Point) -> Option<Point> {
    let d21 = p2 - p1;
    let d43 = p4 - p3;
    let denominator = d43.y * d21.x - d43.x * d21.y;
    if denominator == 0.0 {
        return None;
    }
    let d13 = p1 - p3;
    let ua = (d43.x * d13.y - d43.y * d13.x) / denominator;
    let ub = (d21.x * d13.y - d21.y * d13.x) / denominator;
    if (0.0..=1.0).contains(&ua) && (0.0..=1.0).contains(&ub) {
        Some(Point::new(p1.x + ua * d21.x, p1.y + ua * d21.y))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn point_to_vector_roundtrip() {
        let origin = Point::new(1.0, 2.0);
        let vector: Vector2<f64> = origin.into();
        assert_eq!(vector, Vector2::new(1.0, 2.0));
        assert_eq!(Point::from(vector), origin);
    }

    #[test]
    fn displacement_defaults_to_zero() {
        assert_eq!(Displacement::default(), Displacement::new(0.0, 0.0));
    }

    #[test]
    fn lerp_is_exact_at_the_ends() {
        let a = displacement(0.1, -0.3);
        let b = displacement(-7.0, 2.5);
        assert_eq!(Displacement::lerp(a, b, 0.0), a);
        assert_eq!(Displacement::lerp(a, b, 1.0), b);
        assert_relative_eq!(Displacement::lerp(a, b, 0.5).x, -3.45, epsilon = 1.0e-12);
    }

    #[test]
    fn with_length_rescales_and_keeps_zero() {
        let v = displacement(3.0, 4.0).with_length(10.0);
        assert_relative_eq!(v.x, 6.0);
        assert_relative_eq!(v.y, 8.0);
        assert_eq!(Displacement::default().with_length(2.0), Displacement::default());
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = segment_intersection(
            point(0.0, 0.0),
            point(2.0, 2.0),
            point(0.0, 2.0),
            point(2.0, 0.0),
        )
        .expect("segments cross");
        assert_relative_eq!(hit.x, 1.0);
        assert_relative_eq!(hit.y, 1.0);
    }

    #[test]
    fn parallel_and_disjoint_segments_do_not_intersect() {
        assert!(segment_intersection(
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(0.0, 1.0),
            point(1.0, 1.0)
        )
        .is_none());
        assert!(segment_intersection(
            point(0.0, 0.0),
            point(1.0, 1.0),
            point(3.0, 0.0),
            point(2.0, 1.0)
        )
        .is_none());
    }
}
