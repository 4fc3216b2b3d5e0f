use foundation::math::{Vec2, Vec3};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Point,
    Line,
    Plane,
    Box,
    Rect,
}

/// Geometry in the entity's local frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Shape {
    /// Pickable sphere; effective radius is `radius * Transform::scale`.
    Point { radius: f64 },
    /// Segment between two parent-relative endpoints.
    Line { from: Vec3, to: Vec3 },
    /// Square outline lying in the local XZ plane.
    Plane { size: f64 },
    /// Cube outline centered on the local origin.
    Box { size: f64 },
    /// Axis-aligned rectangle in the local XZ plane.
    Rect { min: Vec2, max: Vec2 },
}

impl Shape {
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Point { .. } => ShapeKind::Point,
            Shape::Line { .. } => ShapeKind::Line,
            Shape::Plane { .. } => ShapeKind::Plane,
            Shape::Box { .. } => ShapeKind::Box,
            Shape::Rect { .. } => ShapeKind::Rect,
        }
    }
}
