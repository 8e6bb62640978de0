//! Shape lookup by template

use std::sync::Arc;

use ahash::AHashMap;

use crate::core::types::TemplateId;
use crate::shapes::shape::ModuleShape;

/// Anything that can resolve a template into its footprint
///
/// A `None` answer means the template cannot be used; the generator treats
/// it as an input error.
pub trait ShapeSource {
    fn shape(&self, template: TemplateId) -> Option<Arc<ModuleShape>>;
}

/// In-memory shape store
#[derive(Debug, Default)]
pub struct ShapeLibrary {
    shapes: AHashMap<TemplateId, Arc<ModuleShape>>,
    by_name: AHashMap<String, TemplateId>,
    /// Insertion order, for deterministic iteration
    order: Vec<TemplateId>,
}

impl ShapeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a shape, replacing any previous shape for the same template
    pub fn insert(&mut self, shape: ModuleShape) -> Arc<ModuleShape> {
        let template = shape.template();
        let shape = Arc::new(shape);
        if self.shapes.insert(template, shape.clone()).is_none() {
            self.order.push(template);
        }
        self.by_name.insert(shape.name().to_string(), template);
        shape
    }

    pub fn get(&self, template: TemplateId) -> Option<&Arc<ModuleShape>> {
        self.shapes.get(&template)
    }

    pub fn id_by_name(&self, name: &str) -> Option<TemplateId> {
        self.by_name.get(name).copied()
    }

    /// Templates in insertion order
    pub fn templates(&self) -> &[TemplateId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl ShapeSource for ShapeLibrary {
    fn shape(&self, template: TemplateId) -> Option<Arc<ModuleShape>> {
        self.shapes.get(&template).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Side;

    #[test]
    fn test_insert_and_lookup() {
        let mut library = ShapeLibrary::new();
        library.insert(ModuleShape::rectangle_room(TemplateId(7), "hall", 5, 5, &Side::ALL).unwrap());
        library.insert(ModuleShape::corridor(TemplateId(3), "corridor", 3, true, 1).unwrap());

        assert_eq!(library.len(), 2);
        assert_eq!(library.templates(), &[TemplateId(7), TemplateId(3)]);
        assert_eq!(library.id_by_name("hall"), Some(TemplateId(7)));
        assert!(library.shape(TemplateId(3)).unwrap().is_connector());
        assert!(library.shape(TemplateId(99)).is_none());
    }

    #[test]
    fn test_reinsert_keeps_order() {
        let mut library = ShapeLibrary::new();
        library.insert(ModuleShape::rectangle_room(TemplateId(1), "a", 5, 5, &[]).unwrap());
        library.insert(ModuleShape::rectangle_room(TemplateId(1), "a2", 7, 7, &[]).unwrap());
        assert_eq!(library.len(), 1);
        assert_eq!(library.get(TemplateId(1)).unwrap().bounds().width(), 7);
    }
}
