pub mod brep;
pub mod error;
pub mod hull;
pub mod intersect;
pub mod math;
pub mod polyhedron;
pub mod query;

pub use brep::BRepGraph;
pub use error::{Convex3Error, Result};
pub use hull::convex_hull;
pub use intersect::{intersect_brep, intersect_dual};
pub use polyhedron::{Face, Polyhedron};
pub use query::gjk::{closest_points, closest_to_point, ClosestPoints};
pub use query::mpr::{has_overlap, penetration, Penetration};
