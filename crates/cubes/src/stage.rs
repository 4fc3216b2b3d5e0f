use foundation::color::Color;
use foundation::math::Vec3;
use scene::World;
use scene::camera::{Camera, PointerEvent, Viewport};
use scene::components::{Material, Shape, Transform};
use scene::entity::EntityId;
use scene::picking::{PickOptions, pick_points};

/// Opacity of the cube's bounding frame.
const FRAME_OPACITY: f32 = 0.3;

/// The scene a cube draws into: one 3D subtree rooted at `root` and one
/// overlay subtree rooted at `overlay_root` (labels, map rasters).
///
/// Overlay entities carry world-space positions; whoever owns them copies the
/// tracked 3D position over on every frame.
#[derive(Debug)]
pub struct Stage {
    world: World,
    root: EntityId,
    overlay_root: EntityId,
    bounding_frame: Option<EntityId>,
    camera: Camera,
    background: Color,
    width: f64,
}

impl Stage {
    pub fn new(width: f64) -> Self {
        let mut world = World::new();
        let root = world.spawn();
        let overlay_root = world.spawn();
        Self {
            world,
            root,
            overlay_root,
            bounding_frame: None,
            camera: default_camera(Vec3::ZERO, width),
            background: Color::WHITE,
            width,
        }
    }

    /// Drops every entity and rebuilds the empty containers plus the bounding frame.
    ///
    /// Keeps position, camera, background and the visibility toggle.
    pub fn reset(&mut self) {
        let position = self.cube_position();
        let visible = self.is_visible();
        self.world.despawn(self.root);
        self.world.despawn(self.overlay_root);
        self.root = self.world.spawn();
        self.overlay_root = self.world.spawn();
        self.world.set_position(self.root, position);
        self.world.set_visible(self.root, visible);
        self.world.set_visible(self.overlay_root, visible);

        let frame = self.world.spawn_child(self.root);
        self.world.set_shape(frame, Shape::Box { size: self.width });
        self.world
            .set_material(frame, Material::translucent(Color::BLACK, FRAME_OPACITY));
        self.bounding_frame = Some(frame);
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn root(&self) -> EntityId {
        self.root
    }

    pub fn overlay_root(&self) -> EntityId {
        self.overlay_root
    }

    pub fn bounding_frame(&self) -> Option<EntityId> {
        self.bounding_frame
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// World-space origin of the cube's root container.
    pub fn cube_position(&self) -> Vec3 {
        self.world.world_position(self.root).unwrap_or(Vec3::ZERO)
    }

    pub fn place_at(&mut self, position: Vec3) {
        self.world
            .set_transform(self.root, Transform::translate(position));
    }

    /// World-space position of a cube-local point.
    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.cube_position() + local
    }

    pub fn is_visible(&self) -> bool {
        self.world.is_visible(self.root)
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.world.set_visible(self.root, visible);
        self.world.set_visible(self.overlay_root, visible);
    }

    pub fn background(&self) -> Color {
        self.background
    }

    pub fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    /// Point entity under the pointer, searching this cube's subtree only.
    pub fn pick(&self, pointer: PointerEvent, viewport: &Viewport) -> Option<EntityId> {
        let ray = self.camera.ray_for_pointer(pointer, viewport)?;
        pick_points(&self.world, self.root, ray, PickOptions::default()).map(|hit| hit.entity)
    }
}

/// Front view of a cube centered at `center`, far enough back to frame it.
pub fn default_camera(center: Vec3, width: f64) -> Camera {
    Camera::look_at(center + Vec3::new(0.0, 0.0, width * 2.0), center)
}
