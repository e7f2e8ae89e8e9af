use std::collections::HashMap;

use crate::error::Result;
use crate::math::{Plane, Point3, Vector3};
use crate::polyhedron::Polyhedron;

use super::{BRepGraph, BrepFaceId, BrepVertexId};

/// Band around the cutting plane inside which a vertex counts as lying on it.
const ON_PLANE_TOL: f64 = 1e-9;

impl BRepGraph {
    /// Truncates the solid to the half-space of `plane` (non-negative
    /// signed distance is kept).
    ///
    /// Crossing edges are split at the plane, fully outside faces are
    /// removed, straddling faces are re-triangulated from their retained
    /// and crossing vertices, and a closing face fan seals the exposed
    /// cross-section.
    pub fn truncate_plane(&mut self, plane: &Plane) {
        self.clip_plane(plane, true, true);
    }

    /// Truncates the solid by every face plane of a convex cutter.
    ///
    /// Each half-space test is independent, so the order of the planes
    /// does not change the final convex result.
    ///
    /// # Errors
    ///
    /// Returns an error if the cutter has a degenerate face.
    pub fn truncate_polyhedron(&mut self, cutter: &Polyhedron) -> Result<()> {
        for i in 0..cutter.faces.len() {
            let half_space = cutter.face_half_space(i)?;
            self.truncate_plane(&half_space);
        }
        Ok(())
    }

    /// Clips the graph against a half-space. With `cap` unset the exposed
    /// cross-section is left open; the intersection engine relies on the
    /// other solid's clipped boundary to close it during merge.
    ///
    /// `keep_coplanar` controls faces lying exactly on the cutting plane:
    /// the intersection engine drops them on one side of its double clip
    /// so a boundary shared by both solids is contributed only once.
    pub(crate) fn clip_plane(&mut self, plane: &Plane, cap: bool, keep_coplanar: bool) {
        let dist: HashMap<BrepVertexId, f64> = self
            .vertices()
            .iter()
            .map(|(id, v)| (id, plane.signed_distance(&v.point)))
            .collect();
        let face_ids: Vec<BrepFaceId> = self.faces().keys().collect();

        let mut cut = false;
        let mut kept_coplanar = false;
        for fid in face_ids {
            let face = *match self.faces().get(fid) {
                Some(face) => face,
                None => continue,
            };
            let d = [
                dist[&face.vertices[0]],
                dist[&face.vertices[1]],
                dist[&face.vertices[2]],
            ];

            if d.iter().all(|&x| x.abs() <= ON_PLANE_TOL) {
                if keep_coplanar {
                    kept_coplanar = true;
                } else {
                    self.remove_face(fid);
                    cut = true;
                }
                continue;
            }
            if d.iter().all(|&x| x >= -ON_PLANE_TOL) {
                continue; // entirely inside the half-space
            }
            if d.iter().all(|&x| x <= ON_PLANE_TOL) {
                self.remove_face(fid);
                cut = true;
                continue;
            }

            // Straddling face: walk its boundary, keeping inside vertices
            // and inserting deduplicated crossing vertices.
            cut = true;
            let mut polygon: Vec<BrepVertexId> = Vec::new();
            for i in 0..3 {
                let va = face.vertices[i];
                let vb = face.vertices[(i + 1) % 3];
                let da = d[i];
                let db = d[(i + 1) % 3];
                if da >= -ON_PLANE_TOL {
                    polygon.push(va);
                }
                if (da > ON_PLANE_TOL && db < -ON_PLANE_TOL)
                    || (da < -ON_PLANE_TOL && db > ON_PLANE_TOL)
                {
                    let pa = self.vertex_point(va);
                    let pb = self.vertex_point(vb);
                    let t = da / (da - db);
                    let crossing = pa + (pb - pa) * t;
                    polygon.push(self.find_or_add_vertex(crossing));
                }
            }
            polygon.dedup();
            while polygon.len() > 1 && polygon.first() == polygon.last() {
                polygon.pop();
            }

            self.remove_face(fid);
            if polygon.len() >= 3 {
                for k in 1..polygon.len() - 1 {
                    self.add_face([polygon[0], polygon[k], polygon[k + 1]], face.normal);
                }
            }
        }

        // A surviving face lying in the cutting plane is itself the
        // cross-section (the plane supports the convex solid), so fanning
        // a cap over the same rim would duplicate it.
        if cap && cut && !kept_coplanar {
            self.close_section(plane);
        }
        self.sweep_unused();
    }

    fn vertex_point(&self, id: BrepVertexId) -> Point3 {
        self.vertices()[id].point
    }

    /// Seals the cross-section exposed by a cut: collects every vertex on
    /// the plane, orders them angularly around their centroid in the plane
    /// frame, and emits a triangle fan facing out of the kept half-space.
    fn close_section(&mut self, plane: &Plane) {
        let mut rim: Vec<(BrepVertexId, Point3)> = self
            .vertices()
            .iter()
            .filter(|(_, v)| plane.signed_distance(&v.point).abs() <= ON_PLANE_TOL)
            .map(|(id, v)| (id, v.point))
            .collect();
        if rim.len() < 3 {
            return;
        }

        let center = crate::math::centroid(
            &rim.iter().map(|(_, p)| *p).collect::<Vec<_>>(),
        );
        let u = plane.u_dir();
        let v = plane.v_dir();
        rim.sort_by(|(_, pa), (_, pb)| {
            let ra = pa - center;
            let rb = pb - center;
            let angle_a = ra.dot(v).atan2(ra.dot(u));
            let angle_b = rb.dot(v).atan2(rb.dot(u));
            angle_a
                .partial_cmp(&angle_b)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        // Ascending angle winds counter-clockwise around +normal; the cap
        // faces out of the kept half-space, along -normal.
        rim.reverse();

        let normal: Vector3 = -plane.normal();
        for k in 1..rim.len() - 1 {
            self.add_face([rim[0].0, rim[k].0, rim[k + 1].0], normal);
        }
    }
}
