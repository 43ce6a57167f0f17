//! Planar convex hulls by Andrew's monotone chain.
//!
//! See <https://en.wikibooks.org/wiki/Algorithm_Implementation/Geometry/Convex_hull/Monotone_chain>.

use crate::geometry::Point;

/// Cross product of `o→a` and `o→b`; positive for a counter-clockwise turn.
fn turn(o: Point, a: Point, b: Point) -> f64 {
    (a - o).cross(b - o)
}

/// Convex hull of `points` in counter-clockwise order, starting from the lowest-left point.
///
/// Collinear boundary points are dropped. Inputs of two or fewer points are returned
/// sorted, as they are.
///
/// # Examples
/// ```
/// use trussim::hull::convex_hull;
/// use trussim::point;
///
/// let hull = convex_hull(&[
///     point(0.0, 0.0),
///     point(1.0, 1.0),
///     point(2.0, 0.0),
///     point(1.0, 0.2),
///     point(1.0, -1.0),
/// ]);
/// assert_eq!(hull.len(), 4);
/// ```
#[must_use]
pub fn convex_hull(points: &[Point]) -> Vec<Point> {
    let mut sorted = points.to_vec();
    sorted.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    if sorted.len() <= 2 {
        return sorted;
    }

    let mut hull: Vec<Point> = Vec::with_capacity(2 * sorted.len());
    for &p in &sorted {
        while hull.len() >= 2 && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    let lower_len = hull.len() + 1;
    for &p in sorted.iter().rev().skip(1) {
        while hull.len() >= lower_len && turn(hull[hull.len() - 2], hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(p);
    }
    // The last point repeats the first.
    hull.pop();
    hull
}

/// Signed area of a polygon by the shoelace formula; positive when counter-clockwise.
#[must_use]
pub fn polygon_area(polygon: &[Point]) -> f64 {
    let n = polygon.len();
    if n < 3 {
        return 0.0;
    }
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    0.5 * twice
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::geometry::point;

    #[test]
    fn square_with_interior_points() {
        let hull = convex_hull(&[
            point(1.0, 1.0),
            point(0.0, 0.0),
            point(0.5, 0.5),
            point(1.0, 0.0),
            point(0.0, 1.0),
            point(0.2, 0.7),
        ]);
        assert_eq!(
            hull,
            vec![point(0.0, 0.0), point(1.0, 0.0), point(1.0, 1.0), point(0.0, 1.0)]
        );
        assert_relative_eq!(polygon_area(&hull), 1.0);
    }

    #[test]
    fn collinear_and_duplicate_points_are_dropped() {
        let hull = convex_hull(&[
            point(0.0, 0.0),
            point(1.0, 0.0),
            point(2.0, 0.0),
            point(2.0, 0.0),
            point(1.0, 2.0),
        ]);
        assert_eq!(hull, vec![point(0.0, 0.0), point(2.0, 0.0), point(1.0, 2.0)]);
    }

    #[test]
    fn degenerate_inputs_do_not_panic() {
        assert!(convex_hull(&[]).is_empty());
        assert_eq!(convex_hull(&[point(3.0, 4.0)]), vec![point(3.0, 4.0)]);
        let pair = convex_hull(&[point(1.0, 0.0), point(0.0, 0.0)]);
        assert_eq!(pair, vec![point(0.0, 0.0), point(1.0, 0.0)]);
        assert_relative_eq!(polygon_area(&pair), 0.0);
        let line = convex_hull(&[point(0.0, 0.0), point(1.0, 1.0), point(2.0, 2.0)]);
        assert_eq!(line, vec![point(0.0, 0.0), point(2.0, 2.0)]);
    }
}
