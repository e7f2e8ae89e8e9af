//! Intersection of convex polyhedra.
//!
//! Two independent routes produce the same solid: [`intersect_brep`] clips
//! each boundary graph against the other's face half-spaces and merges the
//! two open shells, while [`intersect_dual`] maps supporting planes into
//! dual space, takes a hull there, and maps back. Neither is the default;
//! callers pick per workload, and the pair cross-checks itself in tests.

pub mod dual;

pub use dual::intersect_dual;

use crate::brep::BRepGraph;
use crate::error::Result;
use crate::polyhedron::Polyhedron;

/// Margin added to the joint bounding box before face filtering, so faces
/// touching the overlap region are never dropped by rounding.
const FILTER_MARGIN: f64 = 1e-9;

/// Volume below which an intersection is reported as empty.
const VOLUME_TOL: f64 = 1e-12;

/// Intersection of two convex polyhedra via boundary-graph truncation.
///
/// Each solid's boundary is clipped, uncapped, by every face half-space of
/// the other; the two resulting shells are exactly `bdA ∩ B` and
/// `bdB ∩ A`, whose union is the complete boundary of `A ∩ B`. Merging
/// them closes the solid without ever synthesizing a cap face. Faces
/// coplanar with the other solid's boundary are kept on the first shell
/// and dropped from the second, so a shared boundary is contributed once.
///
/// Returns `Ok(None)` when the solids do not overlap or the overlap has no
/// volume (touching faces, edges or vertices).
///
/// # Errors
///
/// Returns an error if either input has a degenerate face.
pub fn intersect_brep(a: &Polyhedron, b: &Polyhedron) -> Result<Option<Polyhedron>> {
    let (Some(box_a), Some(box_b)) = (a.aabb(), b.aabb()) else {
        return Ok(None);
    };
    let Some(joint) = box_a.intersection(&box_b) else {
        return Ok(None);
    };
    let joint = joint.inflated(FILTER_MARGIN);

    let mut shell_a = BRepGraph::from_polyhedron_filtered(a, Some(&joint));
    let mut shell_b = BRepGraph::from_polyhedron_filtered(b, Some(&joint));

    for index in 0..b.faces.len() {
        let half_space = b.face_half_space(index)?;
        shell_a.clip_plane(&half_space, false, true);
    }
    for index in 0..a.faces.len() {
        let half_space = a.face_half_space(index)?;
        shell_b.clip_plane(&half_space, false, false);
    }

    shell_a.merge(shell_b);
    let result = shell_a.to_polyhedron()?;
    if result.faces.len() < 4 || result.volume() <= VOLUME_TOL {
        return Ok(None);
    }
    Ok(Some(result))
}
