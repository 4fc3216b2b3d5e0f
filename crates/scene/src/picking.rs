use foundation::bounds::Aabb3;
use foundation::math::Vec3;
use foundation::math::precision::stable_total_cmp_f64;

use crate::World;
use crate::components::Shape;
use crate::entity::EntityId;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    pub fn at(&self, t: f64) -> Vec3 {
        self.origin + self.dir.scale(t)
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub entity: EntityId,
    pub distance: f64,
    pub point: Vec3,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickOptions {
    pub max_distance: f64,
}

impl Default for PickOptions {
    fn default() -> Self {
        Self {
            max_distance: 1.0e30,
        }
    }
}

/// Ray picking over the point entities of one subtree.
///
/// Ordering contract:
/// - The closest hit along the (normalized) ray wins.
/// - Hits at the same distance resolve to the lower `EntityId::index()`.
///
/// Notes:
/// - Only `Shape::Point` entities visible in the hierarchy are candidates.
/// - Each point is tested through the box enclosing its scaled sphere.
/// - Overlay entities are never candidates.
pub fn pick_points(
    world: &World,
    root: EntityId,
    ray: Ray,
    opts: PickOptions,
) -> Option<PickHit> {
    let dir = ray.dir.normalized()?;
    let mut best: Option<(f64, EntityId)> = None;

    for entity in world.descendants(root) {
        let Some(Shape::Point { radius }) = world.shape(entity) else {
            continue;
        };
        if world.overlay(entity).is_some() || !world.is_visible_in_hierarchy(entity) {
            continue;
        }
        let (Some(center), Some(transform)) =
            (world.world_position(entity), world.transform(entity))
        else {
            continue;
        };

        let bounds = Aabb3::around(center, radius * transform.scale);
        let Some(t) = bounds.ray_entry(ray.origin, dir, 0.0, opts.max_distance) else {
            continue;
        };

        best = match best {
            None => Some((t, entity)),
            Some((bt, be)) => {
                let ord =
                    stable_total_cmp_f64(t, bt).then_with(|| entity.index().cmp(&be.index()));
                if ord.is_lt() {
                    Some((t, entity))
                } else {
                    Some((bt, be))
                }
            }
        };
    }

    let (t, entity) = best?;
    Some(PickHit {
        entity,
        distance: t,
        point: Ray::new(ray.origin, dir).at(t),
    })
}
