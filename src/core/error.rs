use thiserror::Error;

use crate::core::types::{EdgeId, NodeId, TemplateId};

#[derive(Error, Debug)]
pub enum LayoutError {
    #[error("Room type '{0}' is not defined in the template catalog")]
    UnknownRoomType(String),

    #[error("Room type '{room_type}' has no module templates (used by node {node})")]
    EmptyRoomType { room_type: String, node: NodeId },

    #[error("Connection type '{connection_type}' has no connector templates (used by edge {edge})")]
    EmptyConnectionType { connection_type: String, edge: EdgeId },

    #[error("No shape could be resolved for template {0}")]
    MissingShape(TemplateId),

    #[error("Invalid shape for template {template}: {reason}")]
    InvalidShape { template: TemplateId, reason: String },

    #[error("Connection type '{0}' is not defined in the template catalog")]
    UnknownConnectionType(String),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Node {node} has no resolvable module templates")]
    NoUsableTemplates { node: String },

    #[error("Edge {edge} references unknown node {node}")]
    UnknownNode { edge: EdgeId, node: NodeId },

    #[error("Node {0} is declared more than once")]
    DuplicateNode(NodeId),

    #[error("Graph is not connected: node {0} cannot be reached")]
    DisconnectedGraph(String),

    #[error("Edge {from} -> {to} is unsatisfiable: every template pair has an empty configuration space")]
    UnsatisfiableEdge { from: String, to: String },

    #[error("Invalid chain list: {0}")]
    InvalidChains(String),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Layout search exhausted: {detail}")]
    SearchExhausted { detail: String },

    #[error("Scenario error: {0}")]
    Scenario(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LayoutError>;
