use crate::error::Result;
use crate::math::{self, Aabb, Plane, Point3, Vector3, TOLERANCE};

/// A triangular face of a polyhedron.
///
/// Holds indices into the owning polyhedron's vertex array and a cached
/// outward unit normal. The normal is recomputed whenever the face's
/// vertices change; it always points away from the solid's interior.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// Indices of the three vertices, in counter-clockwise order as seen
    /// from outside the solid.
    pub vertices: [usize; 3],
    /// Cached outward unit normal.
    pub normal: Vector3,
}

/// A convex polyhedron: owned vertices plus outward-oriented triangular faces.
///
/// Well-formed instances are closed 2-manifolds (every edge shared by
/// exactly two faces); the hull builder guarantees this for non-degenerate
/// input of rank 3.
#[derive(Debug, Clone, Default)]
pub struct Polyhedron {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Triangular faces referencing `vertices` by index.
    pub faces: Vec<Face>,
}

impl Polyhedron {
    /// Builds a polyhedron from vertices and index triples, computing each
    /// face's normal from its winding order.
    ///
    /// # Errors
    ///
    /// Returns an error if any face's vertices are collinear.
    pub fn new(vertices: Vec<Point3>, face_indices: &[[usize; 3]]) -> Result<Self> {
        let mut faces = Vec::with_capacity(face_indices.len());
        for &[i, j, k] in face_indices {
            let normal = math::triangle_normal(&vertices[i], &vertices[j], &vertices[k])?;
            faces.push(Face {
                vertices: [i, j, k],
                normal,
            });
        }
        Ok(Self { vertices, faces })
    }

    /// Builds an axis-aligned cube with the given center and half-extent.
    ///
    /// # Errors
    ///
    /// Returns an error if `half_extent` is zero (every face degenerates).
    pub fn cube(center: Point3, half_extent: f64) -> Result<Self> {
        let h = half_extent;
        let c = center;
        let vertices = vec![
            Point3::new(c.x - h, c.y - h, c.z - h),
            Point3::new(c.x + h, c.y - h, c.z - h),
            Point3::new(c.x + h, c.y + h, c.z - h),
            Point3::new(c.x - h, c.y + h, c.z - h),
            Point3::new(c.x - h, c.y - h, c.z + h),
            Point3::new(c.x + h, c.y - h, c.z + h),
            Point3::new(c.x + h, c.y + h, c.z + h),
            Point3::new(c.x - h, c.y + h, c.z + h),
        ];
        let faces = [
            [0, 2, 1],
            [0, 3, 2],
            [4, 5, 6],
            [4, 6, 7],
            [0, 1, 5],
            [0, 5, 4],
            [2, 3, 7],
            [2, 7, 6],
            [0, 4, 7],
            [0, 7, 3],
            [1, 2, 6],
            [1, 6, 5],
        ];
        Self::new(vertices, &faces)
    }

    /// Returns the plane of face `index`, oriented so its half-space
    /// contains the solid (normal flipped inward).
    ///
    /// # Errors
    ///
    /// Returns an error if the face normal is degenerate.
    pub fn face_half_space(&self, index: usize) -> Result<Plane> {
        let face = &self.faces[index];
        let origin = self.vertices[face.vertices[0]];
        Plane::from_normal(origin, -face.normal)
    }

    /// Returns the plane of face `index` with the outward normal.
    ///
    /// # Errors
    ///
    /// Returns an error if the face normal is degenerate.
    pub fn face_plane(&self, index: usize) -> Result<Plane> {
        let face = &self.faces[index];
        let origin = self.vertices[face.vertices[0]];
        Plane::from_normal(origin, face.normal)
    }

    /// Returns the centroid of the vertex set.
    #[must_use]
    pub fn centroid(&self) -> Point3 {
        math::centroid(&self.vertices)
    }

    /// Computes the volume via the signed tetrahedron method.
    ///
    /// For each face, sums `(1/6) * v0 . (v1 x v2)`; the outward normal
    /// orientation makes every contribution positive for a well-formed
    /// solid, and the absolute value guards against a globally flipped
    /// winding.
    #[must_use]
    pub fn volume(&self) -> f64 {
        let mut signed = 0.0;
        for face in &self.faces {
            let v0 = self.vertices[face.vertices[0]].coords;
            let v1 = self.vertices[face.vertices[1]].coords;
            let v2 = self.vertices[face.vertices[2]].coords;
            signed += v0.dot(&v1.cross(&v2));
        }
        signed.abs() / 6.0
    }

    /// Returns true if the point is inside or on the polyhedron: on the
    /// non-positive side of every face plane, within tolerance.
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        self.faces.iter().all(|face| {
            let origin = self.vertices[face.vertices[0]];
            (point - origin).dot(&face.normal) <= TOLERANCE
        })
    }

    /// Support mapping: the vertex with maximum projection onto `direction`.
    ///
    /// Returns the origin for an empty polyhedron.
    #[must_use]
    pub fn support(&self, direction: &Vector3) -> Point3 {
        crate::query::support(&self.vertices, direction)
    }

    /// Computes the axis-aligned bounding box of the vertex set.
    #[must_use]
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_points(&self.vertices)
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
    fn cube_volume() {
        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 0.5).unwrap();
        assert_relative_eq!(cube.volume(), 1.0, epsilon = 1e-12);

        let big = Polyhedron::cube(p(3.0, -1.0, 2.0), 1.5).unwrap();
        assert_relative_eq!(big.volume(), 27.0, epsilon = 1e-9);
    }

    #[test]
    fn cube_is_closed_manifold() {
        use std::collections::HashMap;

        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 1.0).unwrap();
        let mut edge_count: HashMap<(usize, usize), usize> = HashMap::new();
        for face in &cube.faces {
            for i in 0..3 {
                let a = face.vertices[i];
                let b = face.vertices[(i + 1) % 3];
                let key = (a.min(b), a.max(b));
                *edge_count.entry(key).or_insert(0) += 1;
            }
        }
        assert_eq!(edge_count.len(), 18);
        assert!(edge_count.values().all(|&c| c == 2));
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = Polyhedron::cube(p(1.0, 1.0, 1.0), 0.5).unwrap();
        let centroid = cube.centroid();
        for face in &cube.faces {
            let to_face = cube.vertices[face.vertices[0]] - centroid;
            assert!(face.normal.dot(&to_face) > 0.0);
        }
    }

    #[test]
    fn contains_interior_and_rejects_exterior() {
        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 1.0).unwrap();
        assert!(cube.contains(&p(0.0, 0.0, 0.0)));
        assert!(cube.contains(&p(0.9, -0.9, 0.9)));
        assert!(cube.contains(&p(1.0, 1.0, 1.0))); // corner, on boundary
        assert!(!cube.contains(&p(1.1, 0.0, 0.0)));
    }

    #[test]
    fn support_picks_extreme_vertex() {
        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 1.0).unwrap();
        let s = cube.support(&Vector3::new(1.0, 1.0, 1.0));
        assert_relative_eq!(s.x, 1.0);
        assert_relative_eq!(s.y, 1.0);
        assert_relative_eq!(s.z, 1.0);
    }

    #[test]
    fn face_half_space_contains_solid() {
        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 1.0).unwrap();
        for i in 0..cube.faces.len() {
            let half_space = cube.face_half_space(i).unwrap();
            for v in &cube.vertices {
                assert!(half_space.contains(v));
            }
        }
    }

    #[test]
    fn degenerate_face_is_rejected() {
        let vertices = vec![p(0.0, 0.0, 0.0), p(1.0, 0.0, 0.0), p(2.0, 0.0, 0.0)];
        let result = Polyhedron::new(vertices, &[[0, 1, 2]]);
        assert!(result.is_err());
    }
}
