use std::collections::{BTreeMap, HashMap};

use data::{RecordId, RecordSet};
use foundation::color::Color;
use foundation::math::Vec3;
use scene::World;
use scene::components::{Material, Shape, Transform};
use scene::entity::EntityId;

/// Primary selection color. No palette or encoding produces it.
pub const HIGHLIGHT_COLOR: Color = Color::from_hex(0xff0000);

/// Scale multiplier applied to the primary selection.
pub const HIGHLIGHT_SCALE: f64 = 2.0;

/// Default point radius in world units.
pub const DEFAULT_NODE_SIZE: u8 = 3;

/// Presentation of one record inside a cube.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointEntry {
    pub entity: EntityId,
    /// Index of the owning slice.
    pub slice: usize,
    pub base_color: Color,
    /// Size-encoding multiplier (1 unless the view encodes something in size).
    pub base_scale: f64,
}

/// The record -> point mapping of one cube.
///
/// Ordering contract:
/// - `iter` yields entries in ascending `RecordId` order.
#[derive(Debug, Clone)]
pub struct PointLayer {
    entries: BTreeMap<RecordId, PointEntry>,
    by_entity: HashMap<EntityId, RecordId>,
    radius: f64,
    highlighted: Option<RecordId>,
}

impl Default for PointLayer {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_SIZE as f64)
    }
}

impl PointLayer {
    pub fn new(radius: f64) -> Self {
        Self {
            entries: BTreeMap::new(),
            by_entity: HashMap::new(),
            radius,
            highlighted: None,
        }
    }

    /// Forgets every point. The entities themselves are owned by their slices.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_entity.clear();
        self.highlighted = None;
    }

    /// Spawns a point for `id` under `slice_entity` at the slice-local `position`.
    #[allow(clippy::too_many_arguments)]
    pub fn spawn(
        &mut self,
        world: &mut World,
        slice_entity: EntityId,
        id: RecordId,
        slice: usize,
        position: Vec3,
        color: Color,
        base_scale: f64,
    ) -> EntityId {
        let entity = world.spawn_child(slice_entity);
        world.set_transform(entity, Transform::translate(position).with_scale(base_scale));
        world.set_shape(
            entity,
            Shape::Point {
                radius: self.radius,
            },
        );
        world.set_material(entity, Material::solid(color));
        self.entries.insert(
            id,
            PointEntry {
                entity,
                slice,
                base_color: color,
                base_scale,
            },
        );
        self.by_entity.insert(entity, id);
        entity
    }

    pub fn get(&self, id: RecordId) -> Option<&PointEntry> {
        self.entries.get(&id)
    }

    pub fn entity_of(&self, id: RecordId) -> Option<EntityId> {
        self.entries.get(&id).map(|e| e.entity)
    }

    pub fn record_at(&self, entity: EntityId) -> Option<RecordId> {
        self.by_entity.get(&entity).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RecordId, &PointEntry)> {
        self.entries.iter().map(|(id, e)| (*id, e))
    }

    pub fn ids(&self) -> impl Iterator<Item = RecordId> + '_ {
        self.entries.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn highlighted(&self) -> Option<RecordId> {
        self.highlighted
    }

    /// The point's own visibility flag.
    pub fn is_visible(&self, world: &World, id: RecordId) -> bool {
        self.entity_of(id).is_some_and(|e| world.is_visible(e))
    }

    pub fn visible_count(&self, world: &World) -> usize {
        self.entries
            .values()
            .filter(|e| world.is_visible(e.entity))
            .count()
    }

    pub fn set_radius(&mut self, world: &mut World, radius: f64) {
        self.radius = radius;
        for e in self.entries.values() {
            world.set_shape(e.entity, Shape::Point { radius });
        }
    }

    /// Shows exactly the points whose record is in `surviving`.
    pub fn apply_visibility(&self, world: &mut World, surviving: &RecordSet) -> usize {
        let mut shown = 0;
        for (id, e) in &self.entries {
            let visible = surviving.contains(*id);
            world.set_visible(e.entity, visible);
            shown += usize::from(visible);
        }
        shown
    }

    pub fn set_base_color(&mut self, id: RecordId, color: Color) {
        if let Some(e) = self.entries.get_mut(&id) {
            e.base_color = color;
        }
    }

    pub fn set_base_scale(&mut self, id: RecordId, scale: f64) {
        if let Some(e) = self.entries.get_mut(&id) {
            e.base_scale = scale;
        }
    }

    /// Moves a point within its slice.
    pub fn set_local_position(&self, world: &mut World, id: RecordId, position: Vec3) {
        if let Some(e) = self.entries.get(&id) {
            world.set_position(e.entity, position);
        }
    }

    /// Restores every point to its base color and scale.
    pub fn reset_highlight(&mut self, world: &mut World) {
        for e in self.entries.values() {
            world.set_color(e.entity, e.base_color);
            world.set_scale(e.entity, e.base_scale);
        }
        self.highlighted = None;
    }

    /// Resets every point, then marks `id` as the primary selection.
    ///
    /// Returns the selected entry if this layer has a point for `id`.
    pub fn highlight(&mut self, world: &mut World, id: Option<RecordId>) -> Option<PointEntry> {
        self.reset_highlight(world);
        let entry = *self.entries.get(&id?)?;
        world.set_color(entry.entity, HIGHLIGHT_COLOR);
        world.set_scale(entry.entity, entry.base_scale * HIGHLIGHT_SCALE);
        self.highlighted = id;
        Some(entry)
    }

    /// Tints a non-primary point (neighbors of the selection).
    pub fn tint(&self, world: &mut World, id: RecordId, color: Color) {
        if Some(id) == self.highlighted {
            return;
        }
        if let Some(e) = self.entries.get(&id) {
            world.set_color(e.entity, color);
        }
    }

    /// Number of points currently painted in the primary selection color.
    pub fn highlight_count(&self, world: &World) -> usize {
        self.entries
            .values()
            .filter(|e| world.color(e.entity) == Some(HIGHLIGHT_COLOR))
            .count()
    }
}
