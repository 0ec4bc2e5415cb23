//! Shape templates used by the creation tools.

use crate::diagram::ModelObject;
use crate::shapes::{Polyline, Rectangle, Shape};
use kurbo::Point;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A prototype shape, optionally with a domain object, stamped out by the creation tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub shape: Shape,
    #[serde(default)]
    pub model: Option<ModelObject>,
}

impl Template {
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self {
            name: name.into(),
            shape,
            model: None,
        }
    }

    pub fn with_model(mut self, model: ModelObject) -> Self {
        self.model = Some(model);
        self
    }

    /// Plain connector template.
    pub fn connector() -> Self {
        Self::new("Connector", Shape::Polyline(Polyline::new(Point::ZERO, Point::new(100.0, 0.0))))
    }

    /// Plain box template of 100 by 60.
    pub fn rectangle() -> Self {
        Self::new("Box", Shape::Rectangle(Rectangle::new(Point::ZERO, 100.0, 60.0)))
    }

    pub fn is_linear(&self) -> bool {
        self.shape.is_linear()
    }

    /// Fresh copy of the shape and model with new ids.
    pub fn instantiate(&self) -> (Shape, Option<ModelObject>) {
        let mut shape = self.shape.clone();
        shape.regenerate_ids();
        let model = self.model.as_ref().map(|model| ModelObject {
            id: Uuid::new_v4(),
            ..model.clone()
        });
        (shape, model)
    }
}
