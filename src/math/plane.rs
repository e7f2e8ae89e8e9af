use crate::error::{GeometryError, Result};

use super::{Point3, Vector3, TOLERANCE};

/// An oriented plane in 3D space, defining a half-space.
///
/// Points with non-negative signed distance along the normal are
/// considered inside the half-space. The `u_dir`/`v_dir` pair spans
/// the plane and is used when planar point sets need a 2D frame
/// (cross-section capping, angular sorting).
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Point3,
    u_dir: Vector3,
    v_dir: Vector3,
    normal: Vector3,
}

impl Plane {
    /// Creates a plane from an origin and a normal vector.
    ///
    /// The normal is normalized; the U and V directions are computed
    /// automatically.
    ///
    /// # Errors
    ///
    /// Returns an error if the normal vector is zero-length.
    pub fn from_normal(origin: Point3, normal: Vector3) -> Result<Self> {
        let len = normal.norm();
        if len < TOLERANCE {
            return Err(GeometryError::ZeroVector.into());
        }
        let normal = normal / len;

        // Choose a reference vector not parallel to the normal
        let reference = if normal.x.abs() < 0.9 {
            Vector3::new(1.0, 0.0, 0.0)
        } else {
            Vector3::new(0.0, 1.0, 0.0)
        };

        let u_dir = normal.cross(&reference).normalize();
        let v_dir = normal.cross(&u_dir);

        Ok(Self {
            origin,
            u_dir,
            v_dir,
            normal,
        })
    }

    /// Returns the origin point of the plane.
    #[must_use]
    pub fn origin(&self) -> &Point3 {
        &self.origin
    }

    /// Returns the U direction vector.
    #[must_use]
    pub fn u_dir(&self) -> &Vector3 {
        &self.u_dir
    }

    /// Returns the V direction vector.
    #[must_use]
    pub fn v_dir(&self) -> &Vector3 {
        &self.v_dir
    }

    /// Returns the unit normal vector of the plane.
    #[must_use]
    pub fn normal(&self) -> &Vector3 {
        &self.normal
    }

    /// Signed distance from the plane to a point, positive along the normal.
    #[must_use]
    pub fn signed_distance(&self, point: &Point3) -> f64 {
        (point - self.origin).dot(&self.normal)
    }

    /// Returns true if the point lies inside the half-space (non-negative
    /// signed distance, within tolerance).
    #[must_use]
    pub fn contains(&self, point: &Point3) -> bool {
        self.signed_distance(point) >= -TOLERANCE
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
    fn signed_distance_along_normal() {
        let plane = Plane::from_normal(p(0.0, 0.0, 1.0), Vector3::z()).unwrap();
        assert_relative_eq!(plane.signed_distance(&p(5.0, -3.0, 4.0)), 3.0);
        assert_relative_eq!(plane.signed_distance(&p(0.0, 0.0, 0.0)), -1.0);
    }

    #[test]
    fn contains_half_space() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::x()).unwrap();
        assert!(plane.contains(&p(2.0, 1.0, 1.0)));
        assert!(plane.contains(&p(0.0, 9.0, -9.0)));
        assert!(!plane.contains(&p(-0.1, 0.0, 0.0)));
    }

    #[test]
    fn from_normal_normalizes() {
        let plane = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::new(0.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(plane.normal().norm(), 1.0);
        assert_relative_eq!(plane.signed_distance(&p(0.0, 2.0, 0.0)), 2.0);
    }

    #[test]
    fn from_normal_rejects_zero_vector() {
        let result = Plane::from_normal(p(0.0, 0.0, 0.0), Vector3::zeros());
        assert!(result.is_err());
    }

    #[test]
    fn frame_is_orthonormal() {
        let plane = Plane::from_normal(p(1.0, 2.0, 3.0), Vector3::new(1.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(plane.u_dir().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.v_dir().norm(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().dot(plane.v_dir()), 0.0, epsilon = 1e-12);
        assert_relative_eq!(plane.u_dir().dot(plane.normal()), 0.0, epsilon = 1e-12);
    }
}
