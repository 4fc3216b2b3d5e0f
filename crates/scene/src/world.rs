use crate::components::{Material, Overlay, Shape, Transform, Visibility};
use crate::entity::EntityId;
use foundation::color::Color;
use foundation::handles::Handle;
use foundation::math::Vec3;

/// Struct-of-arrays scene store with a parent/child hierarchy.
///
/// Slots are recycled after `despawn`; each reuse bumps the slot generation so
/// stale `EntityId`s read as dead instead of aliasing the new occupant.
///
/// Ordering contract:
/// - `children` preserves insertion order.
/// - `descendants` is a pre-order walk following `children` order.
#[derive(Debug, Default)]
pub struct World {
    generations: Vec<u32>,
    alive: Vec<bool>,
    free: Vec<u32>,
    parents: Vec<Option<EntityId>>,
    children: Vec<Vec<EntityId>>,
    transforms: Vec<Transform>,
    visibility: Vec<Visibility>,
    materials: Vec<Option<Material>>,
    shapes: Vec<Option<Shape>>,
    overlays: Vec<Option<Overlay>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self) -> EntityId {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                let index = self.generations.len() as u32;
                self.generations.push(0);
                self.alive.push(false);
                self.parents.push(None);
                self.children.push(Vec::new());
                self.transforms.push(Transform::identity());
                self.visibility.push(Visibility::visible());
                self.materials.push(None);
                self.shapes.push(None);
                self.overlays.push(None);
                index
            }
        };

        let idx = index as usize;
        self.alive[idx] = true;
        EntityId(Handle::new(index, self.generations[idx]))
    }

    pub fn spawn_child(&mut self, parent: EntityId) -> EntityId {
        let child = self.spawn();
        self.set_parent(child, parent);
        child
    }

    /// Removes `entity` and its whole subtree.
    pub fn despawn(&mut self, entity: EntityId) {
        if !self.is_alive(entity) {
            return;
        }
        if let Some(parent) = self.parents[entity.index() as usize]
            && self.is_alive(parent)
        {
            self.children[parent.index() as usize].retain(|c| *c != entity);
        }

        let mut stack = vec![entity];
        while let Some(e) = stack.pop() {
            let idx = e.index() as usize;
            stack.extend(std::mem::take(&mut self.children[idx]));
            self.alive[idx] = false;
            self.generations[idx] = self.generations[idx].wrapping_add(1);
            self.parents[idx] = None;
            self.transforms[idx] = Transform::identity();
            self.visibility[idx] = Visibility::visible();
            self.materials[idx] = None;
            self.shapes[idx] = None;
            self.overlays[idx] = None;
            self.free.push(e.index());
        }
    }

    /// Removes every child subtree of `entity`, keeping `entity` itself.
    pub fn despawn_children(&mut self, entity: EntityId) {
        for child in self.children(entity).to_vec() {
            self.despawn(child);
        }
    }

    pub fn is_alive(&self, entity: EntityId) -> bool {
        let idx = entity.index() as usize;
        self.alive.get(idx).copied().unwrap_or(false)
            && self.generations[idx] == entity.generation()
    }

    pub fn entity_count(&self) -> usize {
        self.alive.iter().filter(|a| **a).count()
    }

    /// Re-parents `child` under `parent`, detaching it from any previous parent.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) {
        if !self.is_alive(child) || !self.is_alive(parent) || child == parent {
            return;
        }
        self.detach(child);
        self.parents[child.index() as usize] = Some(parent);
        self.children[parent.index() as usize].push(child);
    }

    /// Detaches `entity` from its parent, making it a root.
    pub fn detach(&mut self, entity: EntityId) {
        if !self.is_alive(entity) {
            return;
        }
        if let Some(old) = self.parents[entity.index() as usize].take()
            && self.is_alive(old)
        {
            self.children[old.index() as usize].retain(|c| *c != entity);
        }
    }

    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        if !self.is_alive(entity) {
            return None;
        }
        self.parents[entity.index() as usize]
    }

    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        if !self.is_alive(entity) {
            return &[];
        }
        &self.children[entity.index() as usize]
    }

    /// Pre-order walk of the subtree rooted at `root` (including `root`).
    pub fn descendants(&self, root: EntityId) -> Vec<EntityId> {
        let mut out = Vec::new();
        if !self.is_alive(root) {
            return out;
        }
        let mut stack = vec![root];
        while let Some(e) = stack.pop() {
            out.push(e);
            for child in self.children[e.index() as usize].iter().rev() {
                stack.push(*child);
            }
        }
        out
    }

    pub fn set_transform(&mut self, entity: EntityId, transform: Transform) {
        if self.is_alive(entity) {
            self.transforms[entity.index() as usize] = transform;
        }
    }

    pub fn transform(&self, entity: EntityId) -> Option<Transform> {
        self.is_alive(entity)
            .then(|| self.transforms[entity.index() as usize])
    }

    pub fn set_position(&mut self, entity: EntityId, position: Vec3) {
        if self.is_alive(entity) {
            self.transforms[entity.index() as usize].position = position;
        }
    }

    pub fn position(&self, entity: EntityId) -> Option<Vec3> {
        self.transform(entity).map(|t| t.position)
    }

    pub fn set_scale(&mut self, entity: EntityId, scale: f64) {
        if self.is_alive(entity) {
            self.transforms[entity.index() as usize].scale = scale;
        }
    }

    /// Position in world space: the sum of this entity's and all ancestors' positions.
    pub fn world_position(&self, entity: EntityId) -> Option<Vec3> {
        let mut acc = self.position(entity)?;
        let mut cursor = self.parent(entity);
        while let Some(p) = cursor {
            acc = acc + self.transforms[p.index() as usize].position;
            cursor = self.parent(p);
        }
        Some(acc)
    }

    pub fn set_visible(&mut self, entity: EntityId, visible: bool) {
        if self.is_alive(entity) {
            self.visibility[entity.index() as usize] = Visibility::from_bool(visible);
        }
    }

    /// The entity's own visibility flag, ignoring ancestors.
    pub fn is_visible(&self, entity: EntityId) -> bool {
        self.is_alive(entity) && self.visibility[entity.index() as usize].visible
    }

    /// Visible only if the entity and every ancestor are visible.
    pub fn is_visible_in_hierarchy(&self, entity: EntityId) -> bool {
        let mut cursor = Some(entity);
        while let Some(e) = cursor {
            if !self.is_visible(e) {
                return false;
            }
            cursor = self.parent(e);
        }
        true
    }

    pub fn set_material(&mut self, entity: EntityId, material: Material) {
        if self.is_alive(entity) {
            self.materials[entity.index() as usize] = Some(material);
        }
    }

    pub fn material(&self, entity: EntityId) -> Option<Material> {
        if !self.is_alive(entity) {
            return None;
        }
        self.materials[entity.index() as usize]
    }

    /// Recolors an entity, keeping its opacity (solid if it had no material).
    pub fn set_color(&mut self, entity: EntityId, color: Color) {
        if !self.is_alive(entity) {
            return;
        }
        let slot = &mut self.materials[entity.index() as usize];
        *slot = Some(match *slot {
            Some(m) => Material { color, ..m },
            None => Material::solid(color),
        });
    }

    pub fn color(&self, entity: EntityId) -> Option<Color> {
        self.material(entity).map(|m| m.color)
    }

    pub fn set_shape(&mut self, entity: EntityId, shape: Shape) {
        if self.is_alive(entity) {
            self.shapes[entity.index() as usize] = Some(shape);
        }
    }

    pub fn shape(&self, entity: EntityId) -> Option<Shape> {
        if !self.is_alive(entity) {
            return None;
        }
        self.shapes[entity.index() as usize]
    }

    pub fn set_overlay(&mut self, entity: EntityId, overlay: Overlay) {
        if self.is_alive(entity) {
            self.overlays[entity.index() as usize] = Some(overlay);
        }
    }

    pub fn overlay(&self, entity: EntityId) -> Option<&Overlay> {
        if !self.is_alive(entity) {
            return None;
        }
        self.overlays[entity.index() as usize].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::World;
    use crate::components::{Shape, Transform};
    use foundation::color::Color;
    use foundation::math::Vec3;

    #[test]
    fn world_position_accumulates_ancestors() {
        let mut world = World::new();
        let root = world.spawn();
        world.set_transform(root, Transform::translate(Vec3::new(100.0, 0.0, 0.0)));
        let slice = world.spawn_child(root);
        world.set_position(slice, Vec3::new(0.0, -50.0, 0.0));
        let point = world.spawn_child(slice);
        world.set_position(point, Vec3::new(1.0, 2.0, 3.0));

        assert_eq!(
            world.world_position(point),
            Some(Vec3::new(101.0, -48.0, 3.0))
        );
    }

    #[test]
    fn hidden_ancestor_hides_subtree() {
        let mut world = World::new();
        let root = world.spawn();
        let child = world.spawn_child(root);
        assert!(world.is_visible_in_hierarchy(child));

        world.set_visible(root, false);
        assert!(world.is_visible(child));
        assert!(!world.is_visible_in_hierarchy(child));
    }

    #[test]
    fn despawn_removes_subtree_and_invalidates_ids() {
        let mut world = World::new();
        let root = world.spawn();
        let a = world.spawn_child(root);
        let b = world.spawn_child(a);
        world.set_shape(b, Shape::Point { radius: 1.0 });

        world.despawn(a);
        assert!(world.is_alive(root));
        assert!(!world.is_alive(a));
        assert!(!world.is_alive(b));
        assert!(world.children(root).is_empty());
        assert!(world.shape(b).is_none());

        // Recycled slot gets a new generation.
        let c = world.spawn();
        assert!(c.index() == a.index() || c.index() == b.index());
        assert!(world.is_alive(c));
        assert!(!world.is_alive(a) || !world.is_alive(b));
        assert_eq!(world.entity_count(), 2);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut world = World::new();
        let root = world.spawn();
        let a = world.spawn_child(root);
        let a1 = world.spawn_child(a);
        let b = world.spawn_child(root);
        assert_eq!(world.descendants(root), vec![root, a, a1, b]);
    }

    #[test]
    fn set_color_keeps_opacity() {
        let mut world = World::new();
        let e = world.spawn();
        world.set_material(
            e,
            crate::components::Material::translucent(Color::BLACK, 0.5),
        );
        world.set_color(e, Color::WHITE);
        let m = world.material(e).expect("material");
        assert_eq!(m.color, Color::WHITE);
        assert_eq!(m.opacity, 0.5);
    }

    #[test]
    fn reparenting_moves_child() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let c = world.spawn_child(a);
        world.set_parent(c, b);
        assert!(world.children(a).is_empty());
        assert_eq!(world.children(b), &[c]);
        world.detach(c);
        assert_eq!(world.parent(c), None);
    }
}
