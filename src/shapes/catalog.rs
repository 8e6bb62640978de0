//! Room-type and connection-type catalog
//!
//! Maps the names used by a level graph onto module templates. Ordered maps
//! keep iteration deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::types::TemplateId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TemplateCatalog {
    /// Room type name -> candidate room templates
    pub room_types: BTreeMap<String, Vec<TemplateId>>,
    /// Connection type name -> candidate connector templates
    pub connection_types: BTreeMap<String, Vec<TemplateId>>,
    /// Templates for nodes without a room type
    pub default_room_templates: Vec<TemplateId>,
    /// Connectors for edges without a connection type; empty means such
    /// edges join their rooms directly
    pub default_connector_templates: Vec<TemplateId>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_room_type(mut self, name: impl Into<String>, templates: Vec<TemplateId>) -> Self {
        self.room_types.insert(name.into(), templates);
        self
    }

    pub fn with_connection_type(
        mut self,
        name: impl Into<String>,
        templates: Vec<TemplateId>,
    ) -> Self {
        self.connection_types.insert(name.into(), templates);
        self
    }

    pub fn with_default_rooms(mut self, templates: Vec<TemplateId>) -> Self {
        self.default_room_templates = templates;
        self
    }

    pub fn with_default_connectors(mut self, templates: Vec<TemplateId>) -> Self {
        self.default_connector_templates = templates;
        self
    }

    /// `None` when the room type is not declared at all
    pub fn room_templates(&self, room_type: Option<&str>) -> Option<&[TemplateId]> {
        match room_type {
            Some(name) => self.room_types.get(name).map(Vec::as_slice),
            None => Some(&self.default_room_templates),
        }
    }

    /// `None` when the connection type is not declared at all
    pub fn connector_templates(&self, connection_type: Option<&str>) -> Option<&[TemplateId]> {
        match connection_type {
            Some(name) => self.connection_types.get(name).map(Vec::as_slice),
            None => Some(&self.default_connector_templates),
        }
    }
}
