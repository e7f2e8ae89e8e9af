use std::collections::{HashMap, HashSet};

use crate::error::{GeometryError, Result};
use crate::math::{Point3, Vector3, TOLERANCE};
use crate::polyhedron::{Face, Polyhedron};

/// Threshold for classifying a point as strictly outside a face plane.
const OUTSIDE_TOL: f64 = 1e-9;

/// A face of the hull under construction, with its pending outside set.
struct HullFace {
    verts: [usize; 3],
    normal: Vector3,
    offset: f64,
    outside: Vec<usize>,
    alive: bool,
}

impl HullFace {
    fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }
}

/// Computes the convex hull of a point set via quickhull.
///
/// The result is a closed polyhedron whose faces are all triangles with
/// outward normals; no coplanar face merging is performed. Duplicate
/// input points are tolerated.
///
/// # Errors
///
/// Returns [`GeometryError::InsufficientPoints`] for fewer than 4 points,
/// [`GeometryError::DegenerateLine`] when all points are collinear and
/// [`GeometryError::DegeneratePlane`] when all points are coplanar.
pub fn convex_hull(points: &[Point3]) -> Result<Polyhedron> {
    if points.len() < 4 {
        return Err(GeometryError::InsufficientPoints { got: points.len() }.into());
    }

    let seed = initial_simplex(points)?;
    let interior = Point3::from(
        (points[seed[0]].coords
            + points[seed[1]].coords
            + points[seed[2]].coords
            + points[seed[3]].coords)
            / 4.0,
    );

    let mut faces: Vec<HullFace> = Vec::new();
    for [a, b, c] in [
        [seed[0], seed[1], seed[2]],
        [seed[0], seed[1], seed[3]],
        [seed[0], seed[2], seed[3]],
        [seed[1], seed[2], seed[3]],
    ] {
        faces.push(make_face(points, a, b, c, &interior)?);
    }

    // Partition input points into the initial outside sets. Each point
    // lives in at most one set; points inside every face are dropped.
    for (idx, p) in points.iter().enumerate() {
        for face in &mut faces {
            if face.distance(p) > OUTSIDE_TOL {
                face.outside.push(idx);
                break;
            }
        }
    }

    // Worklist of faces whose outside set still needs resolving. Explicit
    // stack instead of recursion so depth stays bounded by the number of
    // pending faces.
    let mut stack: Vec<usize> = (0..faces.len())
        .filter(|&i| !faces[i].outside.is_empty())
        .collect();

    while let Some(fi) = stack.pop() {
        if !faces[fi].alive || faces[fi].outside.is_empty() {
            continue;
        }

        // Farthest outside point becomes the next hull vertex.
        let apex = {
            let face = &faces[fi];
            let mut best = face.outside[0];
            let mut best_dist = face.distance(&points[best]);
            for &idx in &face.outside[1..] {
                let d = face.distance(&points[idx]);
                if d > best_dist {
                    best = idx;
                    best_dist = d;
                }
            }
            best
        };
        let apex_point = points[apex];

        // All faces the apex can see. The visible region of a convex hull
        // is connected, so a global scan is equivalent to a flood fill.
        let visible: Vec<usize> = (0..faces.len())
            .filter(|&i| faces[i].alive && faces[i].distance(&apex_point) > OUTSIDE_TOL)
            .collect();

        let mut visible_edges: HashSet<(usize, usize)> = HashSet::new();
        for &vi in &visible {
            let [a, b, c] = faces[vi].verts;
            visible_edges.insert((a, b));
            visible_edges.insert((b, c));
            visible_edges.insert((c, a));
        }

        // Horizon: directed edges of visible faces whose reverse belongs
        // to a face the apex cannot see.
        let horizon: Vec<(usize, usize)> = visible_edges
            .iter()
            .filter(|&&(a, b)| !visible_edges.contains(&(b, a)))
            .copied()
            .collect();

        let mut orphans: Vec<usize> = Vec::new();
        for &vi in &visible {
            faces[vi].alive = false;
            orphans.append(&mut faces[vi].outside);
        }

        for (a, b) in horizon {
            let mut face = make_face(points, a, b, apex, &interior)?;
            for &idx in &orphans {
                if idx != apex && face.distance(&points[idx]) > OUTSIDE_TOL {
                    face.outside.push(idx);
                }
            }
            orphans.retain(|&idx| {
                idx == apex || face.distance(&points[idx]) <= OUTSIDE_TOL
            });
            let new_index = faces.len();
            if !face.outside.is_empty() {
                stack.push(new_index);
            }
            faces.push(face);
        }
    }

    Ok(compact(points, &faces))
}

/// Picks the four affinely independent seed points of the quickhull
/// tetrahedron: an extremal pair along the widest axis, the point farthest
/// from their line, and the point farthest from the resulting plane.
fn initial_simplex(points: &[Point3]) -> Result<[usize; 4]> {
    // Extremal pair along the axis with the largest spread.
    let mut i0 = 0;
    let mut i1 = 0;
    let mut best_spread = -1.0;
    for axis in 0..3 {
        let mut lo = 0;
        let mut hi = 0;
        for (idx, p) in points.iter().enumerate() {
            if p[axis] < points[lo][axis] {
                lo = idx;
            }
            if p[axis] > points[hi][axis] {
                hi = idx;
            }
        }
        let spread = points[hi][axis] - points[lo][axis];
        if spread > best_spread {
            best_spread = spread;
            i0 = lo;
            i1 = hi;
        }
    }
    if best_spread < TOLERANCE {
        // Every point coincides with every other.
        return Err(GeometryError::DegenerateLine.into());
    }

    // Farthest point from the base line.
    let base = points[i0];
    let dir = (points[i1] - base).normalize();
    let mut i2 = 0;
    let mut best_line_dist = -1.0;
    for (idx, p) in points.iter().enumerate() {
        let rel = p - base;
        let dist = (rel - dir * rel.dot(&dir)).norm();
        if dist > best_line_dist {
            best_line_dist = dist;
            i2 = idx;
        }
    }
    if best_line_dist < TOLERANCE {
        return Err(GeometryError::DegenerateLine.into());
    }

    // Farthest point from the base triangle's plane, on either side.
    let normal = (points[i1] - base).cross(&(points[i2] - base)).normalize();
    let mut i3 = 0;
    let mut best_plane_dist = -1.0;
    for (idx, p) in points.iter().enumerate() {
        let dist = (p - base).dot(&normal).abs();
        if dist > best_plane_dist {
            best_plane_dist = dist;
            i3 = idx;
        }
    }
    if best_plane_dist < TOLERANCE {
        return Err(GeometryError::DegeneratePlane.into());
    }

    Ok([i0, i1, i2, i3])
}

/// Creates a hull face over three vertex indices, flipping its winding if
/// needed so the normal points away from the interior reference point.
fn make_face(
    points: &[Point3],
    a: usize,
    b: usize,
    c: usize,
    interior: &Point3,
) -> Result<HullFace> {
    let pa = points[a];
    let n = (points[b] - pa).cross(&(points[c] - pa));
    let len = n.norm();
    if len < TOLERANCE {
        return Err(GeometryError::Degenerate(
            "hull face vertices are collinear".into(),
        )
        .into());
    }
    let mut normal = n / len;
    let mut verts = [a, b, c];
    if normal.dot(&(interior - pa)) > 0.0 {
        verts = [a, c, b];
        normal = -normal;
    }
    let offset = normal.dot(&pa.coords);
    Ok(HullFace {
        verts,
        normal,
        offset,
        outside: Vec::new(),
        alive: true,
    })
}

/// Flattens the live faces into a polyhedron, remapping vertex indices to
/// a dense array of the vertices actually used.
fn compact(points: &[Point3], faces: &[HullFace]) -> Polyhedron {
    let mut remap: HashMap<usize, usize> = HashMap::new();
    let mut vertices: Vec<Point3> = Vec::new();
    let mut out_faces: Vec<Face> = Vec::new();

    for face in faces.iter().filter(|f| f.alive) {
        let mut mapped = [0usize; 3];
        for (slot, &old) in mapped.iter_mut().zip(face.verts.iter()) {
            *slot = *remap.entry(old).or_insert_with(|| {
                vertices.push(points[old]);
                vertices.len() - 1
            });
        }
        out_faces.push(Face {
            vertices: mapped,
            normal: face.normal,
        });
    }

    Polyhedron {
        vertices,
        faces: out_faces,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Convex3Error;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    fn cube_corners(half: f64) -> Vec<Point3> {
        let mut corners = Vec::new();
        for &x in &[-half, half] {
            for &y in &[-half, half] {
                for &z in &[-half, half] {
                    corners.push(p(x, y, z));
                }
            }
        }
        corners
    }

    /// Every input point must lie on the non-positive side of every face.
    fn assert_convex(hull: &Polyhedron, input: &[Point3]) {
        for (i, face) in hull.faces.iter().enumerate() {
            let origin = hull.vertices[face.vertices[0]];
            for q in input {
                let d = (q - origin).dot(&face.normal);
                assert!(d <= 1e-8, "point {q:?} is outside face {i} by {d}");
            }
        }
    }

    #[test]
    fn tetrahedron_hull() {
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, 0.0, 1.0),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.vertices.len(), 4);
        assert_eq!(hull.faces.len(), 4);
        assert_convex(&hull, &points);
        assert_relative_eq!(hull.volume(), 1.0 / 6.0, epsilon = 1e-12);
    }

    #[test]
    fn cube_cloud_hull() {
        let mut points = cube_corners(1.0);
        // Interior points must not appear in the hull.
        points.push(p(0.0, 0.0, 0.0));
        points.push(p(0.3, -0.2, 0.7));
        points.push(p(-0.9, 0.9, 0.1));

        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.vertices.len(), 8);
        assert_eq!(hull.faces.len(), 12);
        assert_convex(&hull, &points);
        assert_relative_eq!(hull.volume(), 8.0, epsilon = 1e-9);
    }

    #[test]
    fn hull_contains_every_input_point() {
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(2.0, 0.1, -0.3),
            p(0.5, 1.7, 0.2),
            p(-0.4, 0.3, 1.9),
            p(1.1, 1.2, 1.3),
            p(0.9, -0.8, 0.4),
            p(0.5, 0.5, 0.5),
        ];
        let hull = convex_hull(&points).unwrap();
        for q in &points {
            assert!(hull.contains(q), "{q:?} not contained in hull");
        }
    }

    #[test]
    fn duplicate_points_are_tolerated() {
        let mut points = cube_corners(0.5);
        points.extend(cube_corners(0.5));
        points.push(p(0.5, 0.5, 0.5));

        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.vertices.len(), 8);
        assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn octahedron_hull() {
        let points = vec![
            p(1.0, 0.0, 0.0),
            p(-1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(0.0, -1.0, 0.0),
            p(0.0, 0.0, 1.0),
            p(0.0, 0.0, -1.0),
        ];
        let hull = convex_hull(&points).unwrap();
        assert_eq!(hull.vertices.len(), 6);
        assert_eq!(hull.faces.len(), 8);
        assert_convex(&hull, &points);
        assert_relative_eq!(hull.volume(), 4.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn too_few_points_is_an_error() {
        let points = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(0.0, 1.0, 0.0)];
        let err = convex_hull(&points).unwrap_err();
        assert!(matches!(
            err,
            Convex3Error::Geometry(GeometryError::InsufficientPoints { got: 3 })
        ));
    }

    #[test]
    fn collinear_points_is_an_error() {
        let points: Vec<Point3> = (0..8).map(|i| p(f64::from(i), 0.0, 0.0)).collect();
        let err = convex_hull(&points).unwrap_err();
        assert!(matches!(
            err,
            Convex3Error::Geometry(GeometryError::DegenerateLine)
        ));
    }

    #[test]
    fn coplanar_points_is_an_error() {
        let points = vec![
            p(0.0, 0.0, 0.0),
            p(1.0, 0.0, 0.0),
            p(0.0, 1.0, 0.0),
            p(1.0, 1.0, 0.0),
            p(0.5, 0.5, 0.0),
            p(0.2, 0.8, 0.0),
        ];
        let err = convex_hull(&points).unwrap_err();
        assert!(matches!(
            err,
            Convex3Error::Geometry(GeometryError::DegeneratePlane)
        ));
    }

    #[test]
    fn coincident_points_is_an_error() {
        let points = vec![p(1.0, 2.0, 3.0); 6];
        assert!(convex_hull(&points).is_err());
    }
}
