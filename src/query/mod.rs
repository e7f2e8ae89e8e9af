pub mod gjk;
pub mod mpr;

use crate::math::{Point3, Vector3};

/// Support mapping: the point of `set` with maximum projection onto
/// `direction`. The set is treated as the implicit convex hull of its
/// points, so a linear scan is exact.
///
/// Returns the origin for an empty set.
#[must_use]
pub fn support(set: &[Point3], direction: &Vector3) -> Point3 {
    let mut best = Point3::origin();
    let mut best_proj = f64::NEG_INFINITY;
    for p in set {
        let proj = p.coords.dot(direction);
        if proj > best_proj {
            best_proj = proj;
            best = *p;
        }
    }
    best
}

/// One vertex of a simplex in Minkowski-difference space: the pair of
/// supporting points on each input set plus their difference.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SupportPoint {
    pub on_a: Point3,
    pub on_b: Point3,
    pub diff: Vector3,
}

/// Samples the Minkowski difference `A - B` along `direction`.
pub(crate) fn minkowski_support(a: &[Point3], b: &[Point3], direction: &Vector3) -> SupportPoint {
    let on_a = support(a, direction);
    let on_b = support(b, &-direction);
    SupportPoint {
        on_a,
        on_b,
        diff: on_a - on_b,
    }
}

/// Returns an arbitrary unit vector perpendicular to `v`.
pub(crate) fn any_perpendicular(v: &Vector3) -> Vector3 {
    let reference = if v.x.abs() < 0.9 {
        Vector3::x()
    } else {
        Vector3::y()
    };
    let perp = v.cross(&reference);
    let len = perp.norm();
    if len < f64::EPSILON {
        Vector3::z()
    } else {
        perp / len
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn support_finds_extreme_point() {
        let set = vec![p(0.0, 0.0, 0.0), p(2.0, 1.0, 0.0), p(-3.0, 0.5, 0.0)];
        let s = support(&set, &Vector3::x());
        assert_relative_eq!(s.x, 2.0);
        let s = support(&set, &-Vector3::x());
        assert_relative_eq!(s.x, -3.0);
    }

    #[test]
    fn minkowski_support_is_difference_of_supports() {
        let a = vec![p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        let b = vec![p(-1.0, 0.0, 0.0), p(0.5, 0.0, 0.0)];
        let s = minkowski_support(&a, &b, &Vector3::x());
        assert_relative_eq!(s.on_a.x, 2.0);
        assert_relative_eq!(s.on_b.x, -1.0);
        assert_relative_eq!(s.diff.x, 3.0);
    }

    #[test]
    fn any_perpendicular_is_perpendicular() {
        for v in [
            Vector3::x(),
            Vector3::new(0.0, 3.0, 0.0),
            Vector3::new(1.0, -2.0, 0.5),
        ] {
            let perp = any_perpendicular(&v);
            assert_relative_eq!(perp.dot(&v), 0.0, epsilon = 1e-12);
            assert_relative_eq!(perp.norm(), 1.0, epsilon = 1e-12);
        }
    }
}
