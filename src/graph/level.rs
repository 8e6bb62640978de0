//! Caller-facing level graph
//!
//! Nodes are rooms, edges say two rooms must be joined (directly or through
//! a connector module). The graph is read-only for a generation call.

use serde::{Deserialize, Serialize};

use crate::core::types::{EdgeId, IntVec2, NodeId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelNode {
    pub id: NodeId,
    /// Catalog room type; `None` uses the catalog's default room templates
    #[serde(default)]
    pub room_type: Option<String>,
    /// Fixed root position; pinned rooms are never moved by the search
    #[serde(default)]
    pub pinned: Option<IntVec2>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Catalog connection type; `None` uses the default connectors
    #[serde(default)]
    pub connection_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelGraph {
    #[serde(default)]
    pub nodes: Vec<LevelNode>,
    #[serde(default)]
    pub edges: Vec<LevelEdge>,
    /// Planar faces as node cycles, when the caller has an embedding
    #[serde(default)]
    pub faces: Option<Vec<Vec<NodeId>>>,
}

impl LevelGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, id: NodeId, room_type: Option<&str>) -> &mut Self {
        self.nodes.push(LevelNode {
            id,
            room_type: room_type.map(str::to_string),
            pinned: None,
        });
        self
    }

    pub fn add_pinned_node(&mut self, id: NodeId, room_type: Option<&str>, at: IntVec2) -> &mut Self {
        self.nodes.push(LevelNode {
            id,
            room_type: room_type.map(str::to_string),
            pinned: Some(at),
        });
        self
    }

    /// Add an edge; its `EdgeId` is its index
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, connection_type: Option<&str>) -> EdgeId {
        self.edges.push(LevelEdge {
            from,
            to,
            connection_type: connection_type.map(str::to_string),
        });
        EdgeId(self.edges.len() as u32 - 1)
    }

    pub fn with_faces(&mut self, faces: Vec<Vec<NodeId>>) -> &mut Self {
        self.faces = Some(faces);
        self
    }

    pub fn node(&self, id: NodeId) -> Option<&LevelNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Edges touching `node`, with their ids, in edge order
    pub fn edges_for(&self, node: NodeId) -> impl Iterator<Item = (EdgeId, &LevelEdge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter(move |(_, e)| e.from == node || e.to == node)
            .map(|(i, e)| (EdgeId(i as u32), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edges_for_lists_both_directions() {
        let mut graph = LevelGraph::new();
        graph.add_node(NodeId(0), None).add_node(NodeId(1), Some("hall")).add_node(NodeId(2), None);
        graph.add_edge(NodeId(0), NodeId(1), None);
        let e = graph.add_edge(NodeId(2), NodeId(1), Some("door"));

        let ids: Vec<EdgeId> = graph.edges_for(NodeId(1)).map(|(id, _)| id).collect();
        assert_eq!(ids, vec![EdgeId(0), e]);
        assert_eq!(graph.edges_for(NodeId(0)).count(), 1);
        assert_eq!(graph.node(NodeId(1)).unwrap().room_type.as_deref(), Some("hall"));
    }

    #[test]
    fn test_graph_from_toml() {
        let graph: LevelGraph = toml::from_str(
            r#"
            faces = [[0, 1, 2]]
            [[nodes]]
            id = 0
            pinned = [3, -2]
            [[nodes]]
            id = 1
            room_type = "hall"
            [[edges]]
            from = 0
            to = 1
            "#,
        )
        .unwrap();
        assert_eq!(graph.nodes[0].pinned, Some(IntVec2::new(3, -2)));
        assert_eq!(graph.edges[0].connection_type, None);
        assert_eq!(graph.faces.as_ref().unwrap()[0].len(), 3);
    }
}
