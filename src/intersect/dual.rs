//! Dual-space intersection of convex polyhedra.
//!
//! With a point strictly interior to both solids at the dual origin, every
//! supporting plane with outward normal `n` at distance `d` maps to the
//! dual point `n / d`. The convex hull of the mapped planes of both solids
//! is the dual of their intersection, so mapping that hull's face planes
//! back through the same transform recovers the intersection's vertices.

use crate::error::{QueryError, Result};
use crate::hull::convex_hull;
use crate::math::{Point3, Vector3};
use crate::polyhedron::Polyhedron;
use crate::query::{gjk, mpr};

/// Attempts to settle a seed strictly inside both solids within this many
/// inward nudges before trying the next seed.
const MAX_NUDGES: usize = 32;

/// Clearance the interior point keeps from every face plane. Plane offsets
/// in the dual transform are at least this large, which bounds the mapped
/// coordinates.
const INTERIOR_MARGIN: f64 = 1e-6;

/// Smallest offset magnitude fed to the dual division.
const MIN_OFFSET: f64 = 1e-9;

/// Intersection of two convex polyhedra via the dual-space construction.
///
/// Returns `Ok(None)` when the solids do not overlap, or when the overlap
/// has no usable volume — a touching face, edge or vertex, or a sliver
/// thinner than the interior clearance — matching what the boundary-graph
/// route reports for the same inputs.
///
/// # Errors
///
/// Returns an error if either input has a degenerate face, or if the
/// overlap demonstrably has volume yet no strictly interior base point
/// can be settled.
pub fn intersect_dual(a: &Polyhedron, b: &Polyhedron) -> Result<Option<Polyhedron>> {
    if a.vertices.is_empty() || b.vertices.is_empty() {
        return Ok(None);
    }
    let Some(base) = interior_point(a, b)? else {
        return Ok(None);
    };

    let mut duals = Vec::with_capacity(a.faces.len() + b.faces.len());
    for poly in [a, b] {
        for index in 0..poly.faces.len() {
            let plane = poly.face_plane(index)?;
            // Distance from the base to the plane along its outward normal;
            // positive because the base is strictly interior.
            let offset = clamp_offset(-plane.signed_distance(&base));
            duals.push(Point3::from(*plane.normal() / offset));
        }
    }

    // A degenerate dual cloud means the supporting planes do not bound a
    // solid region; treat it as an empty intersection.
    let Ok(dual_hull) = convex_hull(&duals) else {
        return Ok(None);
    };

    let mut vertices = Vec::with_capacity(dual_hull.faces.len());
    for index in 0..dual_hull.faces.len() {
        let plane = dual_hull.face_plane(index)?;
        let offset = clamp_offset(-plane.signed_distance(&Point3::origin()));
        vertices.push(base + *plane.normal() / offset);
    }

    // The inverse transform yields one candidate per dual face; duplicates
    // and interior points fall out of the final hull.
    match convex_hull(&vertices) {
        Ok(hull) => Ok(Some(hull)),
        Err(_) => Ok(None),
    }
}

/// Finds a point strictly inside both solids, or `None` when they do not
/// overlap.
///
/// Seeds come from the centroid midpoint and from the overlap witnesses of
/// the penetration and distance queries; each seed is nudged inward off
/// the worst-violated face plane until it clears every face by the
/// interior margin.
fn interior_point(a: &Polyhedron, b: &Polyhedron) -> Result<Option<Point3>> {
    let mut seeds: Vec<Point3> = Vec::new();
    let mid = Point3::from((a.centroid().coords + b.centroid().coords) / 2.0);
    let mut overlapping = a.contains(&mid) && b.contains(&mid);
    let mut depth = 0.0;
    seeds.push(mid);

    if let Some(pen) = mpr::penetration(&a.vertices, &b.vertices) {
        overlapping = true;
        depth = pen.depth;
        seeds.push(pen.contact);
    }
    let closest = gjk::closest_points(&a.vertices, &b.vertices);
    if closest.overlapping {
        overlapping = true;
        seeds.push(Point3::from(
            (closest.on_a.coords + closest.on_b.coords) / 2.0,
        ));
    }

    if !overlapping {
        return Ok(None);
    }
    for seed in seeds {
        if let Some(point) = settle_interior(seed, a, b) {
            return Ok(Some(point));
        }
    }

    // Unsettleable overlaps thinner than the clearance have no usable
    // volume; report them as empty, like the boundary-graph route does.
    if depth <= 2.0 * INTERIOR_MARGIN {
        return Ok(None);
    }
    Err(QueryError::InteriorPointNotFound {
        iterations: MAX_NUDGES,
    }
    .into())
}

/// Nudges a point inward until it clears every face plane of both solids
/// by the interior margin, or gives up after the nudge budget.
fn settle_interior(mut point: Point3, a: &Polyhedron, b: &Polyhedron) -> Option<Point3> {
    for _ in 0..MAX_NUDGES {
        let mut worst = f64::NEG_INFINITY;
        let mut worst_normal = Vector3::zeros();
        for poly in [a, b] {
            for face in &poly.faces {
                let origin = poly.vertices[face.vertices[0]];
                let distance = (point - origin).dot(&face.normal);
                if distance > worst {
                    worst = distance;
                    worst_normal = face.normal;
                }
            }
        }
        if worst <= -INTERIOR_MARGIN {
            return Some(point);
        }
        point -= worst_normal * (worst + INTERIOR_MARGIN);
    }
    None
}

/// Sign-preserving clamp away from zero, so the dual division never blows
/// up on a plane passing arbitrarily close to the base point.
fn clamp_offset(offset: f64) -> f64 {
    if offset.abs() < MIN_OFFSET {
        MIN_OFFSET.copysign(offset)
    } else {
        offset
    }
}
