use tracing::warn;

use crate::math::{self, Point3, Vector3, TOLERANCE};

use super::{any_perpendicular, minkowski_support, SupportPoint};

/// Iteration cap for the portal discovery phase.
const MAX_DISCOVERY: usize = 32;

/// Iteration cap for the portal refinement phase.
const MAX_REFINEMENT: usize = 64;

/// Portal-to-support-plane gap below which refinement has converged.
const PORTAL_TOL: f64 = 1e-9;

/// Result of a penetration query between two overlapping convex sets.
#[derive(Debug, Clone, Copy)]
pub struct Penetration {
    /// Penetration depth along `direction`.
    pub depth: f64,
    /// Approximate contact point, midway between the two witness points.
    pub contact: Point3,
    /// Unit direction of minimal translation in `A - B` space: moving the
    /// first set by `-direction * depth` brings the bodies to touching.
    pub direction: Vector3,
}

/// The converged state of a portal refinement run.
struct Portal {
    v1: SupportPoint,
    v2: SupportPoint,
    v3: SupportPoint,
    normal: Vector3,
    hit: bool,
}

/// Boolean overlap test between the convex hulls of two point sets
/// (Minkowski Portal Refinement).
///
/// Cheaper than a full GJK distance query; retained as a cross-check and
/// fast path, not a replacement.
#[must_use]
pub fn has_overlap(a: &[Point3], b: &[Point3]) -> bool {
    refine_portal(a, b).is_some_and(|portal| portal.hit)
}

/// Penetration depth, contact point and direction for two overlapping
/// convex hulls, or `None` when they do not overlap.
#[must_use]
pub fn penetration(a: &[Point3], b: &[Point3]) -> Option<Penetration> {
    let portal = refine_portal(a, b)?;
    if !portal.hit {
        return None;
    }

    let n = portal.normal;
    let depth = n.dot(&portal.v1.diff);

    // Project the origin onto the portal plane and express it in the
    // portal triangle's barycentric frame to recover witness points.
    let projected = n * depth;
    let (u, v, w) = barycentric(
        projected,
        portal.v1.diff,
        portal.v2.diff,
        portal.v3.diff,
    );
    let pos_a = portal.v1.on_a.coords * u + portal.v2.on_a.coords * v + portal.v3.on_a.coords * w;
    let pos_b = portal.v1.on_b.coords * u + portal.v2.on_b.coords * v + portal.v3.on_b.coords * w;
    let contact = Point3::from((pos_a + pos_b) / 2.0);

    Some(Penetration {
        depth,
        contact,
        direction: n,
    })
}

/// Runs portal discovery and refinement. Returns `None` when the origin is
/// provably outside the Minkowski difference; otherwise the converged
/// portal with its containment verdict.
fn refine_portal(a: &[Point3], b: &[Point3]) -> Option<Portal> {
    let center_a = math::centroid(a);
    let center_b = math::centroid(b);
    let mut v0 = SupportPoint {
        on_a: center_a,
        on_b: center_b,
        diff: center_a - center_b,
    };
    // The interior ray needs a nonzero origin; nudge coincident centers.
    if v0.diff.norm_squared() < TOLERANCE {
        v0.diff = Vector3::new(1e-5, 0.0, 0.0);
    }

    // Portal discovery: find a triangle on the difference boundary that the
    // ray from v0 toward the origin passes through.
    let ray = -v0.diff;
    let mut v1 = minkowski_support(a, b, &ray);
    if v1.diff.dot(&ray) < 0.0 {
        return Some(separated(v1));
    }

    let mut dir = v1.diff.cross(&v0.diff);
    if dir.norm_squared() < TOLERANCE {
        // Origin on the v0-v1 line; the support already reached past it.
        dir = any_perpendicular(&v0.diff);
    }
    let mut v2 = minkowski_support(a, b, &dir);
    if v2.diff.dot(&dir) < 0.0 {
        return Some(separated(v2));
    }

    let mut v3;
    let mut found = false;
    let mut guard = 0;
    loop {
        let mut normal = (v1.diff - v0.diff).cross(&(v2.diff - v0.diff));
        if normal.dot(&v0.diff) > 0.0 {
            std::mem::swap(&mut v1, &mut v2);
            normal = -normal;
        }
        if normal.norm_squared() < TOLERANCE {
            // Degenerate candidate; bail out through refinement with an
            // arbitrary valid direction.
            normal = any_perpendicular(&v0.diff);
        }

        v3 = minkowski_support(a, b, &normal);
        if v3.diff.dot(&normal) < 0.0 {
            return Some(separated(v3));
        }

        // Keep the origin ray inside the candidate portal's side planes.
        if v1.diff.cross(&v3.diff).dot(&v0.diff) < 0.0 {
            v2 = v3;
        } else if v3.diff.cross(&v2.diff).dot(&v0.diff) < 0.0 {
            v1 = v3;
        } else {
            found = true;
        }

        guard += 1;
        if found || guard >= MAX_DISCOVERY {
            break;
        }
    }
    if !found {
        warn!("mpr portal discovery hit the iteration cap, returning best effort");
    }

    // Portal refinement: push the portal outward along its normal until the
    // support plane and the portal plane coincide.
    let mut hit = false;
    let mut normal;
    let mut iterations = 0;
    loop {
        normal = (v2.diff - v1.diff).cross(&(v3.diff - v1.diff));
        let len = normal.norm();
        if len < TOLERANCE {
            normal = -v0.diff.normalize();
        } else {
            normal /= len;
            if normal.dot(&(v1.diff - v0.diff)) < 0.0 {
                normal = -normal;
            }
        }

        if normal.dot(&v1.diff) >= 0.0 {
            hit = true;
        }

        let v4 = minkowski_support(a, b, &normal);
        if !hit && v4.diff.dot(&normal) < 0.0 {
            return Some(Portal {
                v1,
                v2,
                v3,
                normal,
                hit: false,
            });
        }

        let gap = (v4.diff - v1.diff).dot(&normal);
        iterations += 1;
        if gap <= PORTAL_TOL {
            break;
        }
        if iterations >= MAX_REFINEMENT {
            warn!("mpr portal refinement hit the iteration cap, returning best effort");
            break;
        }

        // Replace the portal vertex whose wedge no longer contains the ray.
        let fence = v4.diff.cross(&v0.diff);
        if v1.diff.dot(&fence) > 0.0 {
            if v2.diff.dot(&fence) > 0.0 {
                v1 = v4;
            } else {
                v3 = v4;
            }
        } else if v3.diff.dot(&fence) > 0.0 {
            v2 = v4;
        } else {
            v1 = v4;
        }
    }

    Some(Portal {
        v1,
        v2,
        v3,
        normal,
        hit,
    })
}

/// A portal stand-in for early separation exits.
fn separated(witness: SupportPoint) -> Portal {
    Portal {
        v1: witness,
        v2: witness,
        v3: witness,
        normal: Vector3::x(),
        hit: false,
    }
}

/// Barycentric coordinates of `p` in the triangle `(a, b, c)`, clamped to
/// the triangle and renormalized.
fn barycentric(p: Vector3, a: Vector3, b: Vector3, c: Vector3) -> (f64, f64, f64) {
    let e1 = b - a;
    let e2 = c - a;
    let q = p - a;
    let d00 = e1.dot(&e1);
    let d01 = e1.dot(&e2);
    let d11 = e2.dot(&e2);
    let d20 = q.dot(&e1);
    let d21 = q.dot(&e2);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f64::EPSILON {
        return (1.0, 0.0, 0.0);
    }
    let v = ((d11 * d20 - d01 * d21) / denom).clamp(0.0, 1.0);
    let w = ((d00 * d21 - d01 * d20) / denom).clamp(0.0, 1.0);
    let u = (1.0 - v - w).clamp(0.0, 1.0);
    let sum = u + v + w;
    (u / sum, v / sum, w / sum)
}
