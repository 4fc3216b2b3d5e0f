/// Marks an entity as living in the DOM-overlay scene rather than the 3D
/// scene. Overlay entities are never picked.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Label { text: String },
    /// Rasterized snapshot of the map widget, `size` world units square.
    MapRaster { size: f64 },
}

impl Overlay {
    pub fn label(text: impl Into<String>) -> Self {
        Overlay::Label { text: text.into() }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Overlay::MapRaster { .. })
    }
}
