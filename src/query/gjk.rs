use tracing::warn;

use crate::math::{self, Point3, Vector3, TOLERANCE};

use super::{minkowski_support, SupportPoint};

/// Iteration cap for the simplex refinement loop.
const MAX_ITERATIONS: usize = 64;

/// Result of a closest-point query between two convex sets.
#[derive(Debug, Clone, Copy)]
pub struct ClosestPoints {
    /// Witness point on (the hull of) the first set.
    pub on_a: Point3,
    /// Witness point on (the hull of) the second set.
    pub on_b: Point3,
    /// True when the hulls overlap; the witnesses then coincide at a
    /// common point of both hulls.
    pub overlapping: bool,
}

/// Finds the closest pair of points between the convex hulls of two point
/// sets, or detects overlap (GJK).
///
/// Each set is consumed through its support mapping only. Accuracy is not
/// guaranteed for extreme coordinate magnitudes (around `1e10` and above):
/// the support-mapping formulation loses conditioning there, which is a
/// documented precondition of this query, not a crash risk.
#[must_use]
pub fn closest_points(a: &[Point3], b: &[Point3]) -> ClosestPoints {
    let mut dir = math::centroid(b) - math::centroid(a);
    if dir.norm_squared() < TOLERANCE * TOLERANCE {
        dir = Vector3::x();
    }
    let mut simplex: Vec<SupportPoint> = vec![minkowski_support(a, b, &dir)];

    for _ in 0..MAX_ITERATIONS {
        let (closest, lambdas, contained) = reduce_to_closest(&mut simplex);
        let dist_sq = closest.norm_squared();

        // Squared distance against the squared tolerance, so separations
        // between TOLERANCE and its square root still classify as gaps.
        if contained || dist_sq <= TOLERANCE * TOLERANCE {
            let (on_a, on_b) = combine_witnesses(&simplex, &lambdas);
            return ClosestPoints {
                on_a,
                on_b,
                overlapping: true,
            };
        }

        let w = minkowski_support(a, b, &-closest);

        // The new support does not get closer to the origin than the
        // current simplex feature: converged.
        let progress = dist_sq - closest.dot(&w.diff);
        let duplicate = simplex
            .iter()
            .any(|s| (s.diff - w.diff).norm_squared() < TOLERANCE * TOLERANCE);
        if duplicate || progress <= TOLERANCE * (1.0 + dist_sq) {
            let (on_a, on_b) = combine_witnesses(&simplex, &lambdas);
            return ClosestPoints {
                on_a,
                on_b,
                overlapping: false,
            };
        }

        simplex.push(w);
    }

    warn!("gjk simplex refinement hit the iteration cap, returning best effort");
    let (closest, lambdas, contained) = reduce_to_closest(&mut simplex);
    let (on_a, on_b) = combine_witnesses(&simplex, &lambdas);
    ClosestPoints {
        on_a,
        on_b,
        overlapping: contained || closest.norm_squared() <= TOLERANCE * TOLERANCE,
    }
}

/// Closest point on (the hull of) a point set to a query point, plus
/// whether the query point lies inside the hull.
///
/// Specializes [`closest_points`] with one set reduced to a single point.
#[must_use]
pub fn closest_to_point(set: &[Point3], point: Point3) -> (Point3, bool) {
    let result = closest_points(set, std::slice::from_ref(&point));
    (result.on_a, result.overlapping)
}

/// Combines the retained simplex vertices' original (A, B) pairs with the
/// barycentric weights of the closest feature.
fn combine_witnesses(simplex: &[SupportPoint], lambdas: &[f64]) -> (Point3, Point3) {
    let mut on_a = Vector3::zeros();
    let mut on_b = Vector3::zeros();
    for (s, &l) in simplex.iter().zip(lambdas.iter()) {
        on_a += s.on_a.coords * l;
        on_b += s.on_b.coords * l;
    }
    (Point3::from(on_a), Point3::from(on_b))
}

/// Computes the point of the simplex closest to the origin, shrinks the
/// simplex to the sub-feature supporting that point, and reports whether
/// the origin is contained (only possible for a full tetrahedron).
///
/// Returns the closest point, the barycentric weights matching the
/// retained simplex entries, and the containment flag.
fn reduce_to_closest(simplex: &mut Vec<SupportPoint>) -> (Vector3, Vec<f64>, bool) {
    match simplex.len() {
        1 => (simplex[0].diff, vec![1.0], false),
        2 => reduce_segment(simplex),
        3 => reduce_triangle(simplex),
        4 => reduce_tetrahedron(simplex),
        _ => (Vector3::zeros(), Vec::new(), false),
    }
}

fn reduce_segment(simplex: &mut Vec<SupportPoint>) -> (Vector3, Vec<f64>, bool) {
    let a = simplex[0].diff;
    let b = simplex[1].diff;
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq < TOLERANCE * TOLERANCE {
        simplex.truncate(1);
        return (a, vec![1.0], false);
    }
    let t = -a.dot(&ab) / len_sq;
    if t <= 0.0 {
        simplex.truncate(1);
        (a, vec![1.0], false)
    } else if t >= 1.0 {
        simplex.remove(0);
        (b, vec![1.0], false)
    } else {
        (a + ab * t, vec![1.0 - t, t], false)
    }
}

fn reduce_triangle(simplex: &mut Vec<SupportPoint>) -> (Vector3, Vec<f64>, bool) {
    let (closest, bary, mask) =
        closest_on_triangle(simplex[0].diff, simplex[1].diff, simplex[2].diff);
    retain_by_mask(simplex, &[0, 1, 2], mask);
    let lambdas = (0..3)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| bary[i])
        .collect();
    (closest, lambdas, false)
}

fn reduce_tetrahedron(simplex: &mut Vec<SupportPoint>) -> (Vector3, Vec<f64>, bool) {
    let p: [Vector3; 4] = [
        simplex[0].diff,
        simplex[1].diff,
        simplex[2].diff,
        simplex[3].diff,
    ];

    // Signed volume of the tetrahedron; if the origin's barycentric
    // coordinates are all non-negative the origin is enclosed.
    let total = (p[1] - p[0]).dot(&(p[2] - p[0]).cross(&(p[3] - p[0])));
    if total.abs() > TOLERANCE {
        let l0 = p[1].dot(&p[2].cross(&p[3])) / total;
        let l1 = -p[0].dot(&p[2].cross(&p[3])) / total;
        let l2 = p[0].dot(&p[1].cross(&p[3])) / total;
        let l3 = -p[0].dot(&p[1].cross(&p[2])) / total;
        let lambdas = [l0, l1, l2, l3];
        if lambdas.iter().all(|&l| l >= -1e-12) {
            let sum: f64 = lambdas.iter().sum();
            return (Vector3::zeros(), lambdas.iter().map(|l| l / sum).collect(), true);
        }
    }

    // Origin outside: closest point lies on one of the boundary faces.
    let combos: [[usize; 3]; 4] = [[1, 2, 3], [0, 2, 3], [0, 1, 3], [0, 1, 2]];
    let mut best: Option<(f64, Vector3, [f64; 3], u8, [usize; 3])> = None;
    for combo in combos {
        let (closest, bary, mask) =
            closest_on_triangle(p[combo[0]], p[combo[1]], p[combo[2]]);
        let dist_sq = closest.norm_squared();
        if best.as_ref().is_none_or(|b| dist_sq < b.0) {
            best = Some((dist_sq, closest, bary, mask, combo));
        }
    }

    // combos is non-empty, so best is always set.
    let Some((_, closest, bary, mask, combo)) = best else {
        return (Vector3::zeros(), Vec::new(), false);
    };
    retain_by_mask(simplex, &combo, mask);
    let lambdas = (0..3)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| bary[i])
        .collect();
    (closest, lambdas, false)
}

/// Shrinks the simplex to the entries of `combo` whose mask bit is set.
fn retain_by_mask(simplex: &mut Vec<SupportPoint>, combo: &[usize; 3], mask: u8) {
    let kept: Vec<SupportPoint> = (0..3)
        .filter(|i| mask & (1 << i) != 0)
        .map(|i| simplex[combo[i]])
        .collect();
    *simplex = kept;
}

/// Closest point to the origin on a triangle, with barycentric weights and
/// a bitmask of the vertices supporting the closest feature.
///
/// Voronoi-region walk over vertex, edge and face regions.
fn closest_on_triangle(a: Vector3, b: Vector3, c: Vector3) -> (Vector3, [f64; 3], u8) {
    let ab = b - a;
    let ac = c - a;
    let ap = -a;
    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return (a, [1.0, 0.0, 0.0], 0b001);
    }

    let bp = -b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return (b, [0.0, 1.0, 0.0], 0b010);
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let denom = d1 - d3;
        let v = if denom.abs() < f64::EPSILON { 0.0 } else { d1 / denom };
        return (a + ab * v, [1.0 - v, v, 0.0], 0b011);
    }

    let cp = -c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return (c, [0.0, 0.0, 1.0], 0b100);
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let denom = d2 - d6;
        let w = if denom.abs() < f64::EPSILON { 0.0 } else { d2 / denom };
        return (a + ac * w, [1.0 - w, 0.0, w], 0b101);
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let denom = (d4 - d3) + (d5 - d6);
        let w = if denom.abs() < f64::EPSILON { 0.0 } else { (d4 - d3) / denom };
        return (b + (c - b) * w, [0.0, 1.0 - w, w], 0b110);
    }

    let denom = va + vb + vc;
    let inv = if denom.abs() < f64::EPSILON { 0.0 } else { 1.0 / denom };
    let v = vb * inv;
    let w = vc * inv;
    (a + ab * v + ac * w, [1.0 - v - w, v, w], 0b111)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::polyhedron::Polyhedron;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_at(center: Point3, half: f64) -> Vec<Point3> {
        Polyhedron::cube(center, half).unwrap().vertices
    }

    #[test]
    fn separated_cubes_distance() {
        let a = cube_at(p(0.0, 0.0, 0.0), 0.5);
        let b = cube_at(p(2.0, 0.0, 0.0), 0.5);
        let result = closest_points(&a, &b);
        assert!(!result.overlapping);
        assert_relative_eq!((result.on_b - result.on_a).norm(), 1.0, epsilon = 1e-9);
        assert_relative_eq!(result.on_a.x, 0.5, epsilon = 1e-9);
        assert_relative_eq!(result.on_b.x, 1.5, epsilon = 1e-9);
    }

    #[test]
    fn overlapping_cubes_report_overlap() {
        let a = cube_at(p(0.0, 0.0, 0.0), 0.5);
        let b = cube_at(p(0.5, 0.5, 0.5), 0.5);
        let result = closest_points(&a, &b);
        assert!(result.overlapping);
        // Witnesses coincide at a common point of both hulls.
        assert_relative_eq!((result.on_a - result.on_b).norm(), 0.0, epsilon = 1e-8);
    }

    #[test]
    fn tiny_gap_is_a_separation_not_an_overlap() {
        // A 1e-6 gap is far above TOLERANCE and must be reported as such,
        // in sign agreement with the portal method.
        let gap = 1e-6;
        let a = cube_at(p(0.0, 0.0, 0.0), 0.5);
        let b = cube_at(p(1.0 + gap, 0.0, 0.0), 0.5);
        let result = closest_points(&a, &b);
        assert!(!result.overlapping);
        assert_relative_eq!((result.on_b - result.on_a).norm(), gap, epsilon = 1e-9);
        assert!(!crate::query::mpr::has_overlap(&a, &b));
    }

    #[test]
    fn diagonal_offset_cubes_distance() {
        let a = cube_at(p(0.0, 0.0, 0.0), 0.5);
        let b = cube_at(p(2.0, 2.0, 2.0), 0.5);
        let result = closest_points(&a, &b);
        assert!(!result.overlapping);
        // Corner-to-corner gap along the space diagonal.
        let expected = (3.0_f64).sqrt();
        assert_relative_eq!(
            (result.on_b - result.on_a).norm(),
            expected,
            epsilon = 1e-9
        );
    }

    #[test]
    fn tetrahedra_vertex_to_face() {
        let a = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
        ];
        let b = vec![
            p(3.0, 0.0, 0.0),
            p(4.0, 0.0, 0.0),
            p(3.0, 1.0, 0.0),
            p(3.0, 0.0, 1.0),
        ];
        let result = closest_points(&a, &b);
        assert!(!result.overlapping);
        assert_relative_eq!((result.on_b - result.on_a).norm(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn closest_to_point_outside() {
        let set = cube_at(p(0.0, 0.0, 0.0), 1.0);
        let (closest, inside) = closest_to_point(&set, p(3.0, 0.0, 0.0));
        assert!(!inside);
        assert_relative_eq!(closest.x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(closest.y, 0.0, epsilon = 1e-9);
        assert_relative_eq!(closest.z, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn closest_to_point_inside() {
        let set = cube_at(p(0.0, 0.0, 0.0), 1.0);
        let (_, inside) = closest_to_point(&set, p(0.2, -0.3, 0.1));
        assert!(inside);
    }

    #[test]
    fn triangle_closest_regions() {
        // Origin above the face interior.
        let (closest, bary, mask) = closest_on_triangle(
            Vector3::new(-1.0, -1.0, 1.0),
            Vector3::new(2.0, -1.0, 1.0),
            Vector3::new(-1.0, 2.0, 1.0),
        );
        assert_eq!(mask, 0b111);
        assert_relative_eq!(closest.z, 1.0);
        assert_relative_eq!(bary.iter().sum::<f64>(), 1.0, epsilon = 1e-12);

        // Origin closest to a single vertex.
        let (closest, _, mask) = closest_on_triangle(
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(2.0, 1.0, 0.0),
            Vector3::new(1.0, 2.0, 0.0),
        );
        assert_eq!(mask, 0b001);
        assert_relative_eq!(closest.x, 1.0);
        assert_relative_eq!(closest.y, 1.0);
    }
}
