//! Internal placement graph
//!
//! Every level room becomes a layout node. A level edge whose connection
//! type resolves to connector templates becomes a connector node with two
//! layout edges (room - connector - room); otherwise the two rooms are
//! joined directly. Node indices are dense (`0..node_count`), rooms first.

use std::collections::VecDeque;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::error::{LayoutError, Result};
use crate::core::types::{EdgeId, IntVec2, NodeId, TemplateId};
use crate::graph::level::LevelGraph;
use crate::shapes::TemplateCatalog;

/// Which caller-visible thing a layout node stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutNodeKey {
    Room(NodeId),
    Connector(EdgeId),
}

#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub key: LayoutNodeKey,
    /// Human-readable name used in errors and diagnostics
    pub label: String,
    pub templates: Vec<TemplateId>,
    pub pinned: Option<IntVec2>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEdge {
    pub a: usize,
    pub b: usize,
    /// Level edge this layout edge was expanded from
    pub source: EdgeId,
}

#[derive(Debug, Clone)]
pub struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    edges: Vec<LayoutEdge>,
    /// Per node: `(neighbor, edge index)` in edge order
    adjacency: Vec<Vec<(usize, usize)>>,
    index: AHashMap<LayoutNodeKey, usize>,
    faces: Option<Vec<Vec<usize>>>,
}

impl LayoutGraph {
    /// Resolve room and connection types and expand connectors
    pub fn build(level: &LevelGraph, catalog: &TemplateCatalog) -> Result<Self> {
        if level.nodes.is_empty() {
            return Err(LayoutError::InvalidGraph("graph has no nodes".to_string()));
        }

        let mut graph = Self {
            nodes: Vec::with_capacity(level.nodes.len() + level.edges.len()),
            edges: Vec::new(),
            adjacency: Vec::new(),
            index: AHashMap::new(),
            faces: None,
        };

        for node in &level.nodes {
            let key = LayoutNodeKey::Room(node.id);
            if graph.index.contains_key(&key) {
                return Err(LayoutError::DuplicateNode(node.id));
            }
            let label = format!("room {}", node.id);
            let templates = match catalog.room_templates(node.room_type.as_deref()) {
                None => {
                    let name = node.room_type.clone().unwrap_or_default();
                    return Err(LayoutError::UnknownRoomType(name));
                }
                Some([]) => {
                    return Err(match &node.room_type {
                        Some(room_type) => LayoutError::EmptyRoomType {
                            room_type: room_type.clone(),
                            node: node.id,
                        },
                        None => LayoutError::NoUsableTemplates { node: label },
                    });
                }
                Some(templates) => templates.to_vec(),
            };
            graph.push_node(key, label, templates, node.pinned);
        }

        let mut connectors: AHashMap<(usize, usize), usize> = AHashMap::new();
        for (i, edge) in level.edges.iter().enumerate() {
            let id = EdgeId(i as u32);
            let from = graph.room_index(id, edge.from)?;
            let to = graph.room_index(id, edge.to)?;
            if from == to {
                return Err(LayoutError::InvalidGraph(format!(
                    "edge {} joins room {} to itself",
                    id, edge.from
                )));
            }
            let pair = (from.min(to), from.max(to));
            if connectors.contains_key(&pair) {
                return Err(LayoutError::InvalidGraph(format!(
                    "edge {} duplicates an earlier edge between rooms {} and {}",
                    id, edge.from, edge.to
                )));
            }

            let templates = match catalog.connector_templates(edge.connection_type.as_deref()) {
                None => {
                    let name = edge.connection_type.clone().unwrap_or_default();
                    return Err(LayoutError::UnknownConnectionType(name));
                }
                Some([]) => {
                    if let Some(connection_type) = &edge.connection_type {
                        return Err(LayoutError::EmptyConnectionType {
                            connection_type: connection_type.clone(),
                            edge: id,
                        });
                    }
                    Vec::new()
                }
                Some(templates) => templates.to_vec(),
            };

            if templates.is_empty() {
                graph.push_edge(from, to, id);
                connectors.insert(pair, usize::MAX);
            } else {
                let connector =
                    graph.push_node(LayoutNodeKey::Connector(id), format!("connector {}", id), templates, None);
                graph.push_edge(from, connector, id);
                graph.push_edge(connector, to, id);
                connectors.insert(pair, connector);
            }
        }

        if let Some(faces) = &level.faces {
            let mut translated = Vec::with_capacity(faces.len());
            for face in faces {
                translated.push(graph.translate_face(face, &connectors)?);
            }
            graph.faces = Some(translated);
        }

        Ok(graph)
    }

    fn push_node(
        &mut self,
        key: LayoutNodeKey,
        label: String,
        templates: Vec<TemplateId>,
        pinned: Option<IntVec2>,
    ) -> usize {
        let index = self.nodes.len();
        self.nodes.push(LayoutNode {
            key,
            label,
            templates,
            pinned,
        });
        self.adjacency.push(Vec::new());
        self.index.insert(key, index);
        index
    }

    fn push_edge(&mut self, a: usize, b: usize, source: EdgeId) {
        let e = self.edges.len();
        self.edges.push(LayoutEdge { a, b, source });
        self.adjacency[a].push((b, e));
        self.adjacency[b].push((a, e));
    }

    fn room_index(&self, edge: EdgeId, node: NodeId) -> Result<usize> {
        self.index
            .get(&LayoutNodeKey::Room(node))
            .copied()
            .ok_or(LayoutError::UnknownNode { edge, node })
    }

    /// Level face (room cycle) to layout face, inserting connector nodes
    fn translate_face(
        &self,
        face: &[NodeId],
        connectors: &AHashMap<(usize, usize), usize>,
    ) -> Result<Vec<usize>> {
        let mut rooms = Vec::with_capacity(face.len());
        for &id in face {
            let index = self
                .index
                .get(&LayoutNodeKey::Room(id))
                .copied()
                .ok_or_else(|| LayoutError::InvalidGraph(format!("face references unknown room {}", id)))?;
            rooms.push(index);
        }
        if rooms.len() < 3 {
            return Err(LayoutError::InvalidGraph(format!(
                "face {:?} has fewer than three rooms",
                face.iter().map(|n| n.0).collect::<Vec<_>>()
            )));
        }

        let mut out = Vec::with_capacity(rooms.len() * 2);
        for (i, &room) in rooms.iter().enumerate() {
            let next = rooms[(i + 1) % rooms.len()];
            let Some(&connector) = connectors.get(&(room.min(next), room.max(next))) else {
                return Err(LayoutError::InvalidGraph(format!(
                    "face walks from {} to {} but they share no edge",
                    self.nodes[room].label, self.nodes[next].label
                )));
            };
            out.push(room);
            if connector != usize::MAX {
                out.push(connector);
            }
        }
        Ok(out)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> &LayoutNode {
        &self.nodes[index]
    }

    pub fn edges(&self) -> &[LayoutEdge] {
        &self.edges
    }

    pub fn index_of(&self, key: LayoutNodeKey) -> Option<usize> {
        self.index.get(&key).copied()
    }

    pub fn label(&self, index: usize) -> &str {
        &self.nodes[index].label
    }

    /// `(neighbor, edge index)` pairs
    pub fn neighbors(&self, index: usize) -> &[(usize, usize)] {
        &self.adjacency[index]
    }

    pub fn degree(&self, index: usize) -> usize {
        self.adjacency[index].len()
    }

    pub fn edge_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency[a].iter().find(|(n, _)| *n == b).map(|&(_, e)| e)
    }

    pub fn is_adjacent(&self, a: usize, b: usize) -> bool {
        self.edge_between(a, b).is_some()
    }

    /// Planar faces supplied by the caller, in layout indices
    pub fn faces(&self) -> Option<&[Vec<usize>]> {
        self.faces.as_deref()
    }

    /// Every node must be reachable from node 0
    pub fn check_connected(&self) -> Result<()> {
        let mut seen = vec![false; self.nodes.len()];
        let mut queue = VecDeque::from([0]);
        seen[0] = true;
        while let Some(node) = queue.pop_front() {
            for &(next, _) in &self.adjacency[node] {
                if !seen[next] {
                    seen[next] = true;
                    queue.push_back(next);
                }
            }
        }
        match seen.iter().position(|s| !s) {
            Some(missing) => Err(LayoutError::DisconnectedGraph(self.nodes[missing].label.clone())),
            None => Ok(()),
        }
    }
}
