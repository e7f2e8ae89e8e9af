pub mod aabb;
pub mod plane;

pub use aabb::Aabb;
pub use plane::Plane;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// 3D vector type.
pub type Vector3 = nalgebra::Vector3<f64>;

/// Global geometric tolerance for floating-point comparisons.
pub const TOLERANCE: f64 = 1e-10;

/// Tolerance for matching coincident vertices across independently
/// computed crossing points (coarser than [`TOLERANCE`] because the
/// same geometric point may be derived from different edge/plane pairs).
pub const DEDUP_TOLERANCE: f64 = 1e-8;

/// Returns the centroid of a point set, or the origin for an empty slice.
#[must_use]
pub fn centroid(points: &[Point3]) -> Point3 {
    if points.is_empty() {
        return Point3::origin();
    }
    let sum = points
        .iter()
        .fold(Vector3::zeros(), |acc, p| acc + p.coords);
    #[allow(clippy::cast_precision_loss)]
    Point3::from(sum / points.len() as f64)
}

/// Computes the outward normal of a triangle from its winding order.
///
/// # Errors
///
/// Returns an error if the three points are collinear.
pub fn triangle_normal(a: &Point3, b: &Point3, c: &Point3) -> crate::Result<Vector3> {
    let n = (b - a).cross(&(c - a));
    let len = n.norm();
    if len < TOLERANCE {
        return Err(crate::error::GeometryError::Degenerate(
            "triangle vertices are collinear".into(),
        )
        .into());
    }
    Ok(n / len)
}
