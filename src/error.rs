use thiserror::Error;

/// Top-level error type for the convex geometry kernel.
#[derive(Debug, Error)]
pub enum Convex3Error {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("convex hull needs at least 4 points, got {got}")]
    InsufficientPoints { got: usize },

    #[error("all input points are collinear")]
    DegenerateLine,

    #[error("all input points are coplanar")]
    DegeneratePlane,

    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors related to the boundary-representation graph.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),
}

/// Errors related to iterative distance and intersection queries.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("no point strictly interior to both polyhedra found in {iterations} iterations")]
    InteriorPointNotFound { iterations: usize },
}

/// Convenience type alias for results using [`Convex3Error`].
pub type Result<T> = std::result::Result<T, Convex3Error>;
