use std::collections::HashMap;

use foundation::math::Vec2;
use foundation::math::precision::finite_extent;

use crate::record::RecordId;

/// Externally computed 2D node positions, normalized into the cube footprint.
///
/// Raw positions are kept untouched; `normalized` maps each axis of the raw
/// extent onto `[-W/2, +W/2]`. A collapsed axis maps to 0.
#[derive(Debug, Clone, Default)]
pub struct LayoutPositions {
    raw: HashMap<RecordId, Vec2>,
    min: Vec2,
    max: Vec2,
    half_width: f64,
}

impl LayoutPositions {
    pub fn new(raw: HashMap<RecordId, Vec2>, cube_width: f64) -> Self {
        let raw: HashMap<RecordId, Vec2> = raw
            .into_iter()
            .filter(|(_, p)| p.x.is_finite() && p.y.is_finite())
            .collect();
        let (min_x, max_x) = finite_extent(raw.values().map(|p| p.x)).unwrap_or((0.0, 0.0));
        let (min_y, max_y) = finite_extent(raw.values().map(|p| p.y)).unwrap_or((0.0, 0.0));
        Self {
            raw,
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
            half_width: cube_width / 2.0,
        }
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn raw(&self, id: RecordId) -> Option<Vec2> {
        self.raw.get(&id).copied()
    }

    /// Cube-local `(x, z)` for `id`, `None` when the layout has no position for it.
    pub fn normalized(&self, id: RecordId) -> Option<Vec2> {
        let p = self.raw(id)?;
        Some(Vec2::new(
            self.axis(p.x, self.min.x, self.max.x),
            self.axis(p.y, self.min.y, self.max.y),
        ))
    }

    fn axis(&self, v: f64, lo: f64, hi: f64) -> f64 {
        if hi <= lo {
            return 0.0;
        }
        ((v - lo) / (hi - lo) * 2.0 - 1.0) * self.half_width
    }
}
