//! Time slices of one cube and their layout transitions.
//!
//! Key properties:
//! - One slice entity per time bucket, a child of the cube root; each owns a
//!   frame plane (kept across `clear_content`) and any per-slice data.
//! - Slice labels live in the overlay subtree and are re-homed onto their
//!   slice on every `advance`.
//! - Transitions animate each slice with a `0.3 s * index` delay and a 1 s
//!   cubic ease. A new transition cancels tasks still in flight on the same
//!   slice before scheduling its own.

use chrono::NaiveDateTime;
use data::{DataStore, SliceBucket};
use foundation::color::Color;
use foundation::math::Vec3;
use foundation::time::Time;
use runtime::{Animator, Easing, Tween, TweenKey};
use scene::World;
use scene::components::{Material, Overlay, Shape};
use scene::entity::EntityId;
use tracing::{debug, info};

use crate::stage::Stage;
use crate::view::{Layout, TimeMode};

/// Per-slice start delay of a transition, multiplied by the slice index.
pub const SLICE_STAGGER_S: f64 = 0.3;

/// Duration of one slice's interpolation.
pub const SLICE_TWEEN_S: f64 = 1.0;

/// Gap between juxtaposed slices as a fraction of the cube width.
pub const JUXTAPOSE_GAP: f64 = 0.1;

const SLICE_FRAME_COLOR: Color = Color::from_hex(0xcccccc);
const SLICE_FRAME_OPACITY: f32 = 0.2;

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub index: usize,
    pub bucket: SliceBucket,
    pub entity: EntityId,
    pub frame: EntityId,
    pub label: EntityId,
    /// Cube-local height in the stacked layout.
    pub stacked_y: f64,
}

#[derive(Debug, Default)]
pub struct SliceStack {
    width: f64,
    slices: Vec<Slice>,
    layout: Layout,
    animator: Animator,
}

impl SliceStack {
    pub fn new(width: f64) -> Self {
        Self {
            width,
            ..Self::default()
        }
    }

    /// Replaces every slice with one per bucket of `store`, placed for the current layout.
    pub fn rebuild(&mut self, stage: &mut Stage, store: &DataStore) {
        self.despawn_all(stage);
        let root = stage.root();
        let overlay_root = stage.overlay_root();
        let buckets = store.buckets();

        for bucket in buckets.iter() {
            let stacked_y = stacked_height(store, bucket);
            let world = stage.world_mut();
            let entity = world.spawn_child(root);

            let frame = world.spawn_child(entity);
            world.set_shape(frame, Shape::Plane { size: self.width });
            world.set_material(
                frame,
                Material::translucent(SLICE_FRAME_COLOR, SLICE_FRAME_OPACITY),
            );

            let label = world.spawn_child(overlay_root);
            let text = buckets.label(bucket.index).unwrap_or_default();
            world.set_overlay(label, Overlay::label(text));

            self.slices.push(Slice {
                index: bucket.index,
                bucket: *bucket,
                entity,
                frame,
                label,
                stacked_y,
            });
        }

        for slice in &self.slices {
            let at = self
                .target(slice.index, self.layout)
                .unwrap_or(Vec3::new(0.0, slice.stacked_y, 0.0));
            stage.world_mut().set_position(slice.entity, at);
        }
        self.sync_labels(stage);
        debug!(slices = self.slices.len(), layout = ?self.layout, "slices rebuilt");
    }

    fn despawn_all(&mut self, stage: &mut Stage) {
        self.animator.clear();
        let world = stage.world_mut();
        for slice in self.slices.drain(..) {
            world.despawn(slice.entity);
            world.despawn(slice.label);
        }
    }

    /// Drops per-slice data, keeping each slice's frame.
    pub fn clear_content(&self, world: &mut World) {
        for slice in &self.slices {
            for child in world.children(slice.entity).to_vec() {
                if child != slice.frame {
                    world.despawn(child);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slice> {
        self.slices.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slice> {
        self.slices.iter()
    }

    pub fn entity(&self, index: usize) -> Option<EntityId> {
        self.slices.get(index).map(|s| s.entity)
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    /// Cube-local resting position of slice `index` under `layout`.
    ///
    /// `None` for `Layout::Animated` or an unknown slice.
    pub fn target(&self, index: usize, layout: Layout) -> Option<Vec3> {
        let slice = self.slices.get(index)?;
        let floor = -self.width / 2.0;
        match layout {
            Layout::Stacked => Some(Vec3::new(0.0, slice.stacked_y, 0.0)),
            Layout::Superimposed => Some(Vec3::new(0.0, floor, 0.0)),
            Layout::Juxtaposed => {
                let step = self.width + self.width * JUXTAPOSE_GAP;
                Some(Vec3::new(index as f64 * step, floor, 0.0))
            }
            Layout::Animated => None,
        }
    }

    /// Schedules every slice towards its `layout` target. Returns the number of tasks started.
    pub fn transition(&mut self, world: &World, layout: Layout, now: Time) -> usize {
        if layout == Layout::Animated {
            return 0;
        }
        self.layout = layout;
        let mut started = 0;
        for slice in &self.slices {
            let (Some(from), Some(to)) =
                (world.position(slice.entity), self.target(slice.index, layout))
            else {
                continue;
            };
            let tween = Tween::new(from, to)
                .delayed(SLICE_STAGGER_S * slice.index as f64)
                .lasting(SLICE_TWEEN_S)
                .eased(Easing::CubicInOut);
            self.animator.start(TweenKey::position(slice.entity.key()), tween, now);
            started += 1;
        }
        info!(?layout, slices = started, "slice transition started");
        started
    }

    /// Applies this tick's samples and re-homes the labels. Returns `true` once settled.
    pub fn advance(&mut self, stage: &mut Stage, now: Time) -> bool {
        for sample in self.animator.advance(now) {
            if let Some(slice) = self
                .slices
                .iter()
                .find(|s| s.entity.key() == sample.key.target)
            {
                stage.world_mut().set_position(slice.entity, sample.value);
            }
        }
        self.sync_labels(stage);
        self.is_settled()
    }

    pub fn is_settled(&self) -> bool {
        self.animator.is_idle()
    }

    /// Slice-relative height of a point dated `date` in slice `index`.
    ///
    /// Aggregated points sit on the slice plane; absolute points keep their
    /// time-scale height while the slice is stacked.
    pub fn point_height(
        &self,
        store: &DataStore,
        date: NaiveDateTime,
        index: usize,
        mode: TimeMode,
    ) -> f64 {
        match mode {
            TimeMode::Aggregated => 0.0,
            TimeMode::Absolute => {
                let base = self.slices.get(index).map_or(0.0, |s| s.stacked_y);
                store.time_scale().y(date) - base
            }
        }
    }

    /// Slice position inside the cube.
    pub fn local_position(&self, world: &World, index: usize) -> Option<Vec3> {
        world.position(self.slices.get(index)?.entity)
    }

    pub fn world_position(&self, stage: &Stage, index: usize) -> Option<Vec3> {
        stage.world().world_position(self.slices.get(index)?.entity)
    }

    fn sync_labels(&self, stage: &mut Stage) {
        let offset = Vec3::new(self.width / 2.0, 0.0, self.width / 2.0);
        for slice in &self.slices {
            if let Some(at) = stage.world().world_position(slice.entity) {
                stage.world_mut().set_position(slice.label, at + offset);
            }
        }
    }
}

/// Stacked height of a bucket: the time-scale height of its start, clamped into the domain.
fn stacked_height(store: &DataStore, bucket: &SliceBucket) -> f64 {
    let start = match store.time_domain() {
        Some(domain) => bucket.start.max(domain.min),
        None => bucket.start,
    };
    store.time_scale().y(start)
}

#[cfg(test)]
mod tests {
    use super::{JUXTAPOSE_GAP, SliceStack};
    use crate::stage::Stage;
    use crate::view::Layout;
    use chrono::NaiveDate;
    use data::{DataStore, Record, RecordId};
    use foundation::math::Vec3;
    use foundation::time::Time;
    use scene::components::Overlay;

    fn store() -> DataStore {
        let mut store = DataStore::new(100.0);
        let records = (0..3)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(1940 + i, 1, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .expect("valid date");
                Record::new(RecordId(i as u32), date)
            })
            .collect();
        store.set_records(records);
        store
    }

    fn stack() -> (Stage, SliceStack) {
        let mut stage = Stage::new(100.0);
        stage.reset();
        let mut slices = SliceStack::new(100.0);
        slices.rebuild(&mut stage, &store());
        (stage, slices)
    }

    fn positions(stage: &Stage, slices: &SliceStack) -> Vec<Vec3> {
        (0..slices.len())
            .filter_map(|i| slices.local_position(stage.world(), i))
            .collect()
    }

    #[test]
    fn slices_start_stacked_with_labels() {
        let (stage, slices) = stack();
        assert_eq!(slices.len(), 3);
        assert_eq!(
            positions(&stage, &slices),
            vec![
                Vec3::new(0.0, -50.0, 0.0),
                Vec3::new(0.0, slices.get(1).map_or(0.0, |s| s.stacked_y), 0.0),
                Vec3::new(0.0, 50.0, 0.0),
            ]
        );
        let label = slices.get(2).map(|s| s.label).expect("label");
        assert_eq!(stage.world().overlay(label), Some(&Overlay::label("1942")));
        assert_eq!(stage.world().position(label), Some(Vec3::new(50.0, 50.0, 50.0)));
    }

    #[test]
    fn juxtaposed_targets_sit_side_by_side_on_the_floor() {
        let (_, slices) = stack();
        assert_eq!(
            slices.target(2, Layout::Juxtaposed),
            Some(Vec3::new(2.0 * (100.0 + 100.0 * JUXTAPOSE_GAP), -50.0, 0.0))
        );
        assert_eq!(slices.target(0, Layout::Animated), None);
    }

    #[test]
    fn transitions_are_staggered_per_slice() {
        let (mut stage, mut slices) = stack();
        slices.transition(stage.world(), Layout::Superimposed, Time::ZERO);

        slices.advance(&mut stage, Time(0.5));
        let mid = positions(&stage, &slices);
        assert!(mid[2].y > 49.999, "last slice has not started yet");

        assert!(slices.advance(&mut stage, Time(5.0)));
        assert!(positions(&stage, &slices).iter().all(|p| p.y == -50.0));
    }

    #[test]
    fn replaced_transition_returns_to_stack() {
        let (mut stage, mut slices) = stack();
        let stacked = positions(&stage, &slices);

        slices.transition(stage.world(), Layout::Stacked, Time::ZERO);
        slices.transition(stage.world(), Layout::Superimposed, Time::ZERO);
        slices.transition(stage.world(), Layout::Stacked, Time::ZERO);
        assert!(slices.advance(&mut stage, Time(10.0)));
        assert_eq!(positions(&stage, &slices), stacked);
    }

    #[test]
    fn animated_layout_is_a_no_op() {
        let (stage, mut slices) = stack();
        assert_eq!(slices.transition(stage.world(), Layout::Animated, Time::ZERO), 0);
        assert_eq!(slices.layout(), Layout::Stacked);
        assert!(slices.is_settled());
    }

    #[test]
    fn clear_content_keeps_frames() {
        let (mut stage, slices) = stack();
        let slice = slices.entity(0).expect("slice");
        let data = stage.world_mut().spawn_child(slice);
        slices.clear_content(stage.world_mut());
        assert!(!stage.world().is_alive(data));
        let frame = slices.get(0).map(|s| s.frame).expect("frame");
        assert_eq!(stage.world().children(slice), &[frame]);
    }
}
