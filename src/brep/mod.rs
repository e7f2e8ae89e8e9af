pub mod merge;
pub mod truncate;

use std::collections::HashMap;

use slotmap::SlotMap;

use crate::error::{Result, TopologyError};
use crate::math::{Aabb, Point3, Vector3, DEDUP_TOLERANCE};
use crate::polyhedron::{Face, Polyhedron};

slotmap::new_key_type! {
    /// Unique identifier for a vertex in a B-Rep graph.
    pub struct BrepVertexId;

    /// Unique identifier for an edge in a B-Rep graph.
    pub struct BrepEdgeId;

    /// Unique identifier for a face in a B-Rep graph.
    pub struct BrepFaceId;
}

/// Data associated with a B-Rep vertex.
#[derive(Debug, Clone, Copy)]
pub struct BrepVertex {
    /// The 3D position of the vertex.
    pub point: Point3,
}

/// An undirected edge between two deduplicated vertices.
#[derive(Debug, Clone, Copy)]
pub struct BrepEdge {
    /// First endpoint (the smaller key of the pair).
    pub a: BrepVertexId,
    /// Second endpoint.
    pub b: BrepVertexId,
}

/// A triangular face referencing three vertices and three undirected edges.
#[derive(Debug, Clone, Copy)]
pub struct BrepFace {
    /// The three vertices, in counter-clockwise order seen from outside.
    pub vertices: [BrepVertexId; 3],
    /// The three boundary edges.
    pub edges: [BrepEdgeId; 3],
    /// Outward unit normal.
    pub normal: Vector3,
}

/// Grid resolution used to bucket vertices for coordinate deduplication.
const INV_GRID: f64 = 1e6;

/// Quantizes a point to integer grid coordinates for hashing.
#[allow(clippy::cast_possible_truncation)]
fn quantize(p: &Point3) -> (i64, i64, i64) {
    (
        (p.x * INV_GRID).round() as i64,
        (p.y * INV_GRID).round() as i64,
        (p.z * INV_GRID).round() as i64,
    )
}

/// A boundary-representation graph of a convex solid.
///
/// Owns three deduplicated arenas — vertices keyed by coordinate equality
/// within tolerance, edges keyed by their unordered endpoint pair, and
/// triangular faces. Entities reference each other via typed generational
/// IDs, so truncation and merge are index remapping rather than pointer
/// surgery.
#[derive(Debug, Default)]
pub struct BRepGraph {
    vertices: SlotMap<BrepVertexId, BrepVertex>,
    edges: SlotMap<BrepEdgeId, BrepEdge>,
    faces: SlotMap<BrepFaceId, BrepFace>,
    grid: HashMap<(i64, i64, i64), Vec<BrepVertexId>>,
    edge_index: HashMap<(BrepVertexId, BrepVertexId), BrepEdgeId>,
}

impl BRepGraph {
    /// Creates a new, empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from a polyhedron, deduplicating vertices and edges.
    #[must_use]
    pub fn from_polyhedron(poly: &Polyhedron) -> Self {
        Self::from_polyhedron_filtered(poly, None)
    }

    /// Builds a graph from a polyhedron, skipping faces whose bounding box
    /// does not touch `filter`.
    ///
    /// The filter is a performance fast path for the intersection engine;
    /// skipped faces are exactly those that a subsequent truncation by the
    /// other solid would remove entirely.
    #[must_use]
    pub fn from_polyhedron_filtered(poly: &Polyhedron, filter: Option<&Aabb>) -> Self {
        let mut graph = Self::new();
        for face in &poly.faces {
            let points = [
                poly.vertices[face.vertices[0]],
                poly.vertices[face.vertices[1]],
                poly.vertices[face.vertices[2]],
            ];
            if let Some(bounds) = filter {
                let face_box = Aabb::from_points(&points);
                if !face_box.is_some_and(|fb| fb.intersects(bounds)) {
                    continue;
                }
            }
            let v0 = graph.find_or_add_vertex(points[0]);
            let v1 = graph.find_or_add_vertex(points[1]);
            let v2 = graph.find_or_add_vertex(points[2]);
            graph.add_face([v0, v1, v2], face.normal);
        }
        graph
    }

    /// Flattens the graph back into a polyhedron, discarding edge
    /// adjacency (edges are a construction aid, not part of the output).
    ///
    /// # Errors
    ///
    /// Returns an error if a face references a vertex that is not in the
    /// graph (an internal invariant violation).
    pub fn to_polyhedron(&self) -> Result<Polyhedron> {
        let mut index: HashMap<BrepVertexId, usize> = HashMap::with_capacity(self.vertices.len());
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for (id, vertex) in &self.vertices {
            index.insert(id, vertices.len());
            vertices.push(vertex.point);
        }

        let mut faces = Vec::with_capacity(self.faces.len());
        for face in self.faces.values() {
            let mut mapped = [0usize; 3];
            for (slot, vid) in mapped.iter_mut().zip(face.vertices.iter()) {
                *slot = *index
                    .get(vid)
                    .ok_or_else(|| TopologyError::EntityNotFound("face vertex".into()))?;
            }
            faces.push(Face {
                vertices: mapped,
                normal: face.normal,
            });
        }

        Ok(Polyhedron { vertices, faces })
    }

    /// Finds a vertex matching `point` within the dedup tolerance, or
    /// inserts a new one.
    pub fn find_or_add_vertex(&mut self, point: Point3) -> BrepVertexId {
        let key = quantize(&point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let neighbor = (key.0 + dx, key.1 + dy, key.2 + dz);
                    if let Some(bucket) = self.grid.get(&neighbor) {
                        for &id in bucket {
                            if (self.vertices[id].point - point).norm() <= DEDUP_TOLERANCE {
                                return id;
                            }
                        }
                    }
                }
            }
        }
        let id = self.vertices.insert(BrepVertex { point });
        self.grid.entry(key).or_default().push(id);
        id
    }

    /// Finds the undirected edge between two vertices, or inserts it.
    pub fn find_or_add_edge(&mut self, a: BrepVertexId, b: BrepVertexId) -> BrepEdgeId {
        let key = if a <= b { (a, b) } else { (b, a) };
        if let Some(&id) = self.edge_index.get(&key) {
            return id;
        }
        let id = self.edges.insert(BrepEdge { a: key.0, b: key.1 });
        self.edge_index.insert(key, id);
        id
    }

    /// Inserts a face over three existing vertices, creating or reusing
    /// its boundary edges.
    pub fn add_face(&mut self, vertices: [BrepVertexId; 3], normal: Vector3) -> BrepFaceId {
        let edges = [
            self.find_or_add_edge(vertices[0], vertices[1]),
            self.find_or_add_edge(vertices[1], vertices[2]),
            self.find_or_add_edge(vertices[2], vertices[0]),
        ];
        self.faces.insert(BrepFace {
            vertices,
            edges,
            normal,
        })
    }

    /// Removes a face. Unreferenced edges and vertices are reclaimed by
    /// [`Self::sweep_unused`].
    pub fn remove_face(&mut self, id: BrepFaceId) {
        self.faces.remove(id);
    }

    /// Removes every edge and vertex no longer referenced by any face.
    pub fn sweep_unused(&mut self) {
        let mut used_vertices: std::collections::HashSet<BrepVertexId> =
            std::collections::HashSet::new();
        let mut used_edges: std::collections::HashSet<BrepEdgeId> =
            std::collections::HashSet::new();
        for face in self.faces.values() {
            used_vertices.extend(face.vertices);
            used_edges.extend(face.edges);
        }

        let dead_edges: Vec<BrepEdgeId> = self
            .edges
            .keys()
            .filter(|id| !used_edges.contains(id))
            .collect();
        for id in dead_edges {
            let edge = self.edges.remove(id);
            if let Some(edge) = edge {
                let key = (edge.a, edge.b);
                self.edge_index.remove(&key);
            }
        }

        let dead_vertices: Vec<BrepVertexId> = self
            .vertices
            .keys()
            .filter(|id| !used_vertices.contains(id))
            .collect();
        for id in dead_vertices {
            if let Some(vertex) = self.vertices.remove(id) {
                let key = quantize(&vertex.point);
                if let Some(bucket) = self.grid.get_mut(&key) {
                    bucket.retain(|&v| v != id);
                    if bucket.is_empty() {
                        self.grid.remove(&key);
                    }
                }
            }
        }
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn vertex(&self, id: BrepVertexId) -> Result<&BrepVertex> {
        Ok(self
            .vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?)
    }

    /// Returns a reference to the edge data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn edge(&self, id: BrepEdgeId) -> Result<&BrepEdge> {
        Ok(self
            .edges
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("edge".into()))?)
    }

    /// Returns a reference to the face data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the graph.
    pub fn face(&self, id: BrepFaceId) -> Result<&BrepFace> {
        Ok(self
            .faces
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("face".into()))?)
    }

    /// Number of vertices in the graph.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of faces in the graph.
    #[must_use]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// True when the graph holds no entities at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.edges.is_empty() && self.faces.is_empty()
    }

    /// Iterates over the vertex positions.
    pub fn points(&self) -> impl Iterator<Item = &Point3> {
        self.vertices.values().map(|v| &v.point)
    }

    pub(crate) fn vertices(&self) -> &SlotMap<BrepVertexId, BrepVertex> {
        &self.vertices
    }

    pub(crate) fn edges(&self) -> &SlotMap<BrepEdgeId, BrepEdge> {
        &self.edges
    }

    pub(crate) fn faces(&self) -> &SlotMap<BrepFaceId, BrepFace> {
        &self.faces
    }
}
