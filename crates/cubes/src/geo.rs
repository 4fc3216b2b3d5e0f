use std::collections::BTreeMap;

use data::{DataStore, NodeColorEncoding, RecordId};
use foundation::math::{MapProjection, Vec2, Vec3};
use foundation::time::Time;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runtime::Frame;
use scene::components::{Material, Overlay, Shape};
use scene::entity::EntityId;
use tracing::{debug, info};

use crate::filter::RecordFilter;
use crate::points::{HIGHLIGHT_COLOR, PointLayer};
use crate::slices::SliceStack;
use crate::stage::Stage;
use crate::view::{CubeKind, CubeState, CubeView, Layout, Lifecycle, TimeMode};

/// Largest jitter radius the style panel offers.
pub const MAX_JITTER: f64 = 30.0;

/// Vertical guide + floor marker drawn under the highlighted point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Guide {
    pub line: EntityId,
    pub marker: EntityId,
}

/// Geographic cube: longitude/latitude on the ground plane, time upwards.
///
/// Projected ("original") ground positions are kept in a side table keyed by
/// record id; jitter is always re-derived from that table.
pub struct GeoCube {
    stage: Stage,
    slices: SliceStack,
    points: PointLayer,
    state: CubeState,
    projection: Box<dyn MapProjection>,
    originals: BTreeMap<RecordId, Vec2>,
    displayed: BTreeMap<RecordId, Vec2>,
    jitter_radius: f64,
    rng: StdRng,
    encoding: NodeColorEncoding,
    guide: Option<Guide>,
    floor_map: Option<EntityId>,
    map_clones: Vec<EntityId>,
}

impl GeoCube {
    pub fn new(width: f64, projection: impl MapProjection + 'static, seed: u64) -> Self {
        Self {
            stage: Stage::new(width),
            slices: SliceStack::new(width),
            points: PointLayer::default(),
            state: CubeState::default(),
            projection: Box::new(projection),
            originals: BTreeMap::new(),
            displayed: BTreeMap::new(),
            jitter_radius: 0.0,
            rng: StdRng::seed_from_u64(seed),
            encoding: NodeColorEncoding::default(),
            guide: None,
            floor_map: None,
            map_clones: Vec::new(),
        }
    }

    pub fn jitter_radius(&self) -> f64 {
        self.jitter_radius
    }

    /// Projected ground position, before jitter.
    pub fn original_position(&self, id: RecordId) -> Option<Vec2> {
        self.originals.get(&id).copied()
    }

    /// Ground position currently shown (original + jitter).
    pub fn displayed_position(&self, id: RecordId) -> Option<Vec2> {
        self.displayed.get(&id).copied()
    }

    pub fn guide(&self) -> Option<Guide> {
        self.guide
    }

    pub fn floor_map(&self) -> Option<EntityId> {
        self.floor_map
    }

    /// Per-slice map rasters, alive only around the juxtaposed layout.
    pub fn map_clones(&self) -> &[EntityId] {
        &self.map_clones
    }

    fn ground(&self, longitude: f64, latitude: f64) -> Option<Vec2> {
        let half = self.stage.width() / 2.0;
        let px = self.projection.project(longitude, latitude);
        let ground = Vec2::new(px.x - half, px.y - half);
        (ground.x.is_finite() && ground.y.is_finite()).then_some(ground)
    }

    /// Re-derives every shown position as `original + U(-r, r)` on X and Z.
    pub fn jitter_points(&mut self) {
        let r = self.jitter_radius;
        let world = self.stage.world_mut();
        for (id, original) in &self.originals {
            let offset = if r > 0.0 {
                Vec2::new(self.rng.random_range(-r..=r), self.rng.random_range(-r..=r))
            } else {
                Vec2::ZERO
            };
            let shown = *original + offset;
            self.displayed.insert(*id, shown);
            if let Some(entry) = self.points.get(*id) {
                let y = world.position(entry.entity).map_or(0.0, |p| p.y);
                world.set_position(entry.entity, Vec3::from_ground(shown, y));
            }
        }
    }

    fn despawn_guide(&mut self) {
        if let Some(guide) = self.guide.take() {
            let world = self.stage.world_mut();
            world.despawn(guide.line);
            world.despawn(guide.marker);
        }
    }

    /// Guide endpoints in root-local coordinates: the point and its foot on the floor.
    fn guide_ends(&self, point: EntityId) -> Option<(Vec3, Vec3)> {
        let world = self.stage.world();
        let at = world.world_position(point)?;
        let base = world.world_position(self.stage.root())?;
        let local = at - base;
        Some((local, local.with_y(-self.stage.width() / 2.0)))
    }

    fn draw_guide(&mut self, point: EntityId) {
        let Some((from, foot)) = self.guide_ends(point) else {
            return;
        };
        let root = self.stage.root();
        let marker_size = self.points.radius() * 2.0;
        let world = self.stage.world_mut();

        let line = world.spawn_child(root);
        world.set_shape(line, Shape::Line { from, to: foot });
        world.set_material(line, Material::solid(HIGHLIGHT_COLOR));

        let marker = world.spawn_child(root);
        world.set_position(marker, foot);
        world.set_shape(marker, Shape::Plane { size: marker_size });
        world.set_material(marker, Material::solid(HIGHLIGHT_COLOR));
        self.guide = Some(Guide { line, marker });
    }

    /// Re-homes the guide under the highlighted point after it moved.
    fn refresh_guide(&mut self) {
        let Some(guide) = self.guide else {
            return;
        };
        let Some(point) = self
            .points
            .highlighted()
            .and_then(|id| self.points.entity_of(id))
        else {
            return;
        };
        let Some((from, foot)) = self.guide_ends(point) else {
            return;
        };
        let world = self.stage.world_mut();
        world.set_shape(guide.line, Shape::Line { from, to: foot });
        world.set_position(guide.marker, foot);
    }

    fn spawn_map_clones(&mut self) {
        self.despawn_map_clones();
        let overlay_root = self.stage.overlay_root();
        let size = self.stage.width();
        for i in 0..self.slices.len() {
            let at = self.slices.world_position(&self.stage, i);
            let world = self.stage.world_mut();
            let clone = world.spawn_child(overlay_root);
            world.set_overlay(clone, Overlay::MapRaster { size });
            if let Some(at) = at {
                world.set_position(clone, at);
            }
            self.map_clones.push(clone);
        }
        if let Some(floor) = self.floor_map {
            self.stage.world_mut().set_visible(floor, false);
        }
    }

    fn despawn_map_clones(&mut self) {
        let world = self.stage.world_mut();
        for clone in self.map_clones.drain(..) {
            world.despawn(clone);
        }
    }

    fn sync_maps(&mut self) {
        for (i, clone) in self.map_clones.iter().enumerate() {
            if let Some(at) = self.slices.world_position(&self.stage, i) {
                self.stage.world_mut().set_position(*clone, at);
            }
        }
        if let Some(floor) = self.floor_map {
            let at = self.stage.to_world(Vec3::new(0.0, -self.stage.width() / 2.0, 0.0));
            self.stage.world_mut().set_position(floor, at);
        }
    }

    fn reposition(&mut self, store: &DataStore) {
        let world = self.stage.world_mut();
        for (id, entry) in self.points.iter() {
            let (Some(record), Some(ground)) = (store.record(id), self.displayed.get(&id)) else {
                continue;
            };
            let y = self
                .slices
                .point_height(store, record.date_time, entry.slice, self.state.time_mode);
            world.set_position(entry.entity, Vec3::from_ground(*ground, y));
        }
    }

    fn transition(&mut self, layout: Layout, now: Time) {
        if !self.stage.is_visible() {
            return;
        }
        self.slices.transition(self.stage.world(), layout, now);
        self.state.layout = layout;
        if layout == Layout::Juxtaposed {
            self.spawn_map_clones();
        }
        self.refresh_guide();
    }
}

impl CubeView for GeoCube {
    fn kind(&self) -> CubeKind {
        CubeKind::Geo
    }

    fn state(&self) -> CubeState {
        self.state
    }

    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn points(&self) -> &PointLayer {
        &self.points
    }

    fn slices(&self) -> &SliceStack {
        &self.slices
    }

    fn create_objects(&mut self, store: &DataStore) {
        self.stage.reset();
        self.points.clear();
        self.originals.clear();
        self.displayed.clear();
        self.guide = None;
        self.map_clones.clear();
        self.slices.rebuild(&mut self.stage, store);

        let overlay_root = self.stage.overlay_root();
        let size = self.stage.width();
        let world = self.stage.world_mut();
        let floor = world.spawn_child(overlay_root);
        world.set_overlay(floor, Overlay::MapRaster { size });
        self.floor_map = Some(floor);
        if self.state.layout == Layout::Juxtaposed {
            self.spawn_map_clones();
        }
        self.sync_maps();
        self.state.lifecycle = Lifecycle::Created;
    }

    fn assemble_data(&mut self, store: &DataStore) {
        self.despawn_guide();
        self.slices.clear_content(self.stage.world_mut());
        self.points.clear();
        self.originals.clear();
        self.displayed.clear();

        let mut skipped = 0usize;
        for record in store.records() {
            let (Some(slice), Some(ground)) =
                (store.bucket_of(record), self.ground(record.longitude, record.latitude))
            else {
                skipped += 1;
                continue;
            };
            let Some(slice_entity) = self.slices.entity(slice) else {
                skipped += 1;
                continue;
            };
            let y = self
                .slices
                .point_height(store, record.date_time, slice, self.state.time_mode);
            let color = store.node_color(record, self.encoding);
            self.originals.insert(record.id, ground);
            self.points.spawn(
                self.stage.world_mut(),
                slice_entity,
                record.id,
                slice,
                Vec3::from_ground(ground, y),
                color,
                1.0,
            );
        }
        self.jitter_points();
        self.state.lifecycle = Lifecycle::Assembled;
        info!(view = "geo", points = self.points.len(), skipped, "assembled");
    }

    fn render(&mut self, frame: Frame) {
        let settled = self.slices.advance(&mut self.stage, frame.time);
        self.sync_maps();
        self.refresh_guide();
        if settled && self.state.layout != Layout::Juxtaposed && !self.map_clones.is_empty() {
            self.despawn_map_clones();
            if let Some(floor) = self.floor_map {
                self.stage.world_mut().set_visible(floor, true);
            }
            debug!(view = "geo", "map clones detached");
        }
    }

    fn update_time(&mut self, store: &DataStore, mode: TimeMode) {
        self.state.time_mode = mode;
        self.reposition(store);
        let current = self.points.highlighted();
        self.highlight_object(store, current);
    }

    fn update_num_slices(&mut self, store: &DataStore) {
        self.slices.rebuild(&mut self.stage, store);
        if self.state.layout == Layout::Juxtaposed {
            self.spawn_map_clones();
        }
        self.assemble_data(store);
    }

    fn update_node_color(&mut self, store: &DataStore, encoding: NodeColorEncoding) {
        self.encoding = encoding;
        let ids: Vec<RecordId> = self.points.ids().collect();
        for id in ids {
            if let Some(record) = store.record(id) {
                self.points.set_base_color(id, store.node_color(record, encoding));
            }
        }
        let current = self.points.highlighted();
        self.highlight_object(store, current);
    }

    fn update_node_size(&mut self, store: &DataStore, size: u8) {
        self.points.set_radius(self.stage.world_mut(), size as f64);
        let current = self.points.highlighted();
        self.highlight_object(store, current);
    }

    fn update_jitter(&mut self, radius: f64) {
        self.jitter_radius = radius.clamp(0.0, MAX_JITTER);
        self.jitter_points();
        self.refresh_guide();
        debug!(view = "geo", radius = self.jitter_radius, "jitter applied");
    }

    fn filter_data(&mut self, store: &DataStore, filter: &RecordFilter) -> usize {
        let surviving = filter.surviving(store);
        let shown = self.points.apply_visibility(self.stage.world_mut(), &surviving);
        debug!(view = "geo", visible = shown, total = self.points.len(), "filtered");
        shown
    }

    fn highlight_object(&mut self, _store: &DataStore, id: Option<RecordId>) {
        self.despawn_guide();
        if let Some(entry) = self.points.highlight(self.stage.world_mut(), id) {
            self.draw_guide(entry.entity);
        }
    }

    fn transition_stc(&mut self, now: Time) {
        self.transition(Layout::Stacked, now);
    }

    fn transition_jp(&mut self, now: Time) {
        self.transition(Layout::Juxtaposed, now);
    }

    fn transition_si(&mut self, now: Time) {
        self.transition(Layout::Superimposed, now);
    }
}
