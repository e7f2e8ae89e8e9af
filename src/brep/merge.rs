use std::collections::HashMap;

use super::{BRepGraph, BrepVertexId};

impl BRepGraph {
    /// Absorbs `source` into this graph.
    ///
    /// Source vertices are matched against existing ones through the same
    /// tolerance-based lookup used everywhere else, so geometry shared by
    /// both graphs collapses to a single entity. Edges are re-homed onto
    /// the remapped endpoints and deduplicated by their unordered pair;
    /// faces are appended with their vertex triples rewritten.
    pub fn merge(&mut self, source: BRepGraph) {
        let mut remap: HashMap<BrepVertexId, BrepVertexId> =
            HashMap::with_capacity(source.vertex_count());
        for (id, vertex) in source.vertices() {
            remap.insert(id, self.find_or_add_vertex(vertex.point));
        }

        // Faces recreate their own boundary edges, but edges without a
        // surviving face still carry over.
        for edge in source.edges().values() {
            self.find_or_add_edge(remap[&edge.a], remap[&edge.b]);
        }

        for face in source.faces().values() {
            self.add_face(
                [
                    remap[&face.vertices[0]],
                    remap[&face.vertices[1]],
                    remap[&face.vertices[2]],
                ],
                face.normal,
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::polyhedron::Polyhedron;

    fn p(x: f64, y: f64, z: f64) -> Point3 {
        Point3::new(x, y, z)
    }

    #[test]
    fn merging_disjoint_graphs_sums_entities() {
        let a = Polyhedron::cube(p(0.0, 0.0, 0.0), 0.5).unwrap();
        let b = Polyhedron::cube(p(10.0, 0.0, 0.0), 0.5).unwrap();
        let mut graph = BRepGraph::from_polyhedron(&a);
        graph.merge(BRepGraph::from_polyhedron(&b));

        assert_eq!(graph.vertex_count(), 16);
        assert_eq!(graph.edge_count(), 36);
        assert_eq!(graph.face_count(), 24);
    }

    #[test]
    fn merging_coincident_geometry_deduplicates_vertices_and_edges() {
        // Unit cubes sharing the square face at x = 0.5: four corners and
        // five edges (four sides plus the shared diagonal) coincide.
        let a = Polyhedron::cube(p(0.0, 0.0, 0.0), 0.5).unwrap();
        let b = Polyhedron::cube(p(1.0, 0.0, 0.0), 0.5).unwrap();
        let mut graph = BRepGraph::from_polyhedron(&a);
        graph.merge(BRepGraph::from_polyhedron(&b));

        assert_eq!(graph.vertex_count(), 12);
        assert_eq!(graph.edge_count(), 31);
        // Faces are never deduplicated by merge.
        assert_eq!(graph.face_count(), 24);
    }

    #[test]
    fn merge_into_empty_graph_copies_source() {
        let cube = Polyhedron::cube(p(0.0, 0.0, 0.0), 0.5).unwrap();
        let mut graph = BRepGraph::new();
        graph.merge(BRepGraph::from_polyhedron(&cube));

        assert_eq!(graph.vertex_count(), 8);
        assert_eq!(graph.edge_count(), 18);
        assert_eq!(graph.face_count(), 12);
        let back = graph.to_polyhedron().unwrap();
        assert!((back.volume() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn merged_vertices_within_tolerance_collapse() {
        let mut graph = BRepGraph::new();
        graph.find_or_add_vertex(p(1.0, 0.0, 0.0));

        let mut other = BRepGraph::new();
        other.find_or_add_vertex(p(1.0 + 1e-10, 0.0, 0.0));
        other.find_or_add_vertex(p(2.0, 0.0, 0.0));

        graph.merge(other);
        assert_eq!(graph.vertex_count(), 2);
    }
}
