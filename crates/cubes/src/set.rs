use std::collections::BTreeMap;

use data::{DataStore, NodeColorEncoding, RecordId};
use foundation::math::{Vec2, Vec3};
use foundation::time::Time;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use runtime::Frame;
use scene::components::{Material, Shape};
use scene::entity::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::filter::RecordFilter;
use crate::points::PointLayer;
use crate::slices::SliceStack;
use crate::stage::Stage;
use crate::view::{CubeKind, CubeState, CubeView, Layout, Lifecycle, TimeMode};

const HULL_OPACITY: f32 = 0.15;

/// Fraction of a grid cell left empty on each side.
const CELL_MARGIN: f64 = 0.1;

/// Ground placement of the set cube.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetLayout {
    /// Uniform random over the whole floor.
    #[default]
    Scatter,
    /// One grid cell per `category_1`, random inside the cell.
    CategoryGrid,
}

/// Set cube: records grouped by category, no relations between them.
///
/// Ground positions come from a generator seeded once per layout pass, so the
/// same dataset, seed and layout always place points identically.
#[derive(Debug)]
pub struct SetCube {
    stage: Stage,
    slices: SliceStack,
    points: PointLayer,
    state: CubeState,
    layout: SetLayout,
    hull: bool,
    hulls: Vec<EntityId>,
    positions: BTreeMap<RecordId, Vec2>,
    seed: u64,
    encoding: NodeColorEncoding,
}

impl SetCube {
    pub fn new(width: f64, seed: u64) -> Self {
        Self {
            stage: Stage::new(width),
            slices: SliceStack::new(width),
            points: PointLayer::default(),
            state: CubeState::default(),
            layout: SetLayout::default(),
            hull: false,
            hulls: Vec::new(),
            positions: BTreeMap::new(),
            seed,
            encoding: NodeColorEncoding::default(),
        }
    }

    pub fn set_layout(&self) -> SetLayout {
        self.layout
    }

    pub fn hull_enabled(&self) -> bool {
        self.hull
    }

    /// Hull rectangles currently drawn, one per (slice, category) with visible points.
    pub fn hulls(&self) -> &[EntityId] {
        &self.hulls
    }

    pub fn ground_position(&self, id: RecordId) -> Option<Vec2> {
        self.positions.get(&id).copied()
    }

    fn compute_positions(&self, store: &DataStore) -> BTreeMap<RecordId, Vec2> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let half = self.stage.width() / 2.0;
        let mut out = BTreeMap::new();
        match self.layout {
            SetLayout::Scatter => {
                for record in store.records() {
                    let x = rng.random_range(-half..=half);
                    let z = rng.random_range(-half..=half);
                    out.insert(record.id, Vec2::new(x, z));
                }
            }
            SetLayout::CategoryGrid => {
                let categories = store.categories();
                let side = (categories.len() as f64).sqrt().ceil().max(1.0) as usize;
                let cell = self.stage.width() / side as f64;
                let margin = cell * CELL_MARGIN;
                for record in store.records() {
                    let c = categories
                        .iter()
                        .position(|name| name == record.category_1())
                        .unwrap_or(0);
                    let min = Vec2::new(
                        -half + (c % side) as f64 * cell,
                        -half + (c / side) as f64 * cell,
                    );
                    let x = rng.random_range(min.x + margin..=min.x + cell - margin);
                    let z = rng.random_range(min.y + margin..=min.y + cell - margin);
                    out.insert(record.id, Vec2::new(x, z));
                }
            }
        }
        out
    }

    fn reposition(&mut self, store: &DataStore) {
        let world = self.stage.world_mut();
        for (id, entry) in self.points.iter() {
            let (Some(record), Some(ground)) = (store.record(id), self.positions.get(&id)) else {
                continue;
            };
            let y = self
                .slices
                .point_height(store, record.date_time, entry.slice, self.state.time_mode);
            world.set_position(entry.entity, Vec3::from_ground(*ground, y));
        }
    }

    /// Redraws one rectangle around the visible points of each (slice, category).
    fn rebuild_hulls(&mut self, store: &DataStore) {
        let world = self.stage.world_mut();
        for hull in self.hulls.drain(..) {
            world.despawn(hull);
        }
        if !self.hull {
            return;
        }

        let mut groups: BTreeMap<(usize, &str), (Vec2, Vec2)> = BTreeMap::new();
        for (id, entry) in self.points.iter() {
            if !world.is_visible(entry.entity) {
                continue;
            }
            let (Some(record), Some(p)) = (store.record(id), self.positions.get(&id)) else {
                continue;
            };
            groups
                .entry((entry.slice, record.category_1()))
                .and_modify(|(min, max)| {
                    *min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
                    *max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
                })
                .or_insert((*p, *p));
        }

        for ((slice, category), (min, max)) in groups {
            let Some(slice_entity) = self.slices.entity(slice) else {
                continue;
            };
            let hull = world.spawn_child(slice_entity);
            world.set_shape(hull, Shape::Rect { min, max });
            world.set_material(
                hull,
                Material::translucent(store.color_for(category), HULL_OPACITY),
            );
            self.hulls.push(hull);
        }
        debug!(view = "set", hulls = self.hulls.len(), "hulls rebuilt");
    }

    fn transition(&mut self, layout: Layout, now: Time) {
        if !self.stage.is_visible() {
            return;
        }
        self.slices.transition(self.stage.world(), layout, now);
        self.state.layout = layout;
    }
}

impl CubeView for SetCube {
    fn kind(&self) -> CubeKind {
        CubeKind::Set
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
        self.hulls.clear();
        self.positions.clear();
        self.slices.rebuild(&mut self.stage, store);
        self.state.lifecycle = Lifecycle::Created;
    }

    fn assemble_data(&mut self, store: &DataStore) {
        self.slices.clear_content(self.stage.world_mut());
        self.hulls.clear();
        self.points.clear();
        self.positions = self.compute_positions(store);

        for record in store.records() {
            let (Some(slice), Some(ground)) =
                (store.bucket_of(record), self.positions.get(&record.id).copied())
            else {
                continue;
            };
            let Some(slice_entity) = self.slices.entity(slice) else {
                continue;
            };
            let y = self
                .slices
                .point_height(store, record.date_time, slice, self.state.time_mode);
            let color = store.node_color(record, self.encoding);
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
        self.rebuild_hulls(store);
        self.state.lifecycle = Lifecycle::Assembled;
        info!(view = "set", points = self.points.len(), layout = ?self.layout, "assembled");
    }

    fn render(&mut self, frame: Frame) {
        self.slices.advance(&mut self.stage, frame.time);
    }

    fn update_time(&mut self, store: &DataStore, mode: TimeMode) {
        self.state.time_mode = mode;
        self.reposition(store);
    }

    fn update_num_slices(&mut self, store: &DataStore) {
        self.slices.rebuild(&mut self.stage, store);
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

    fn update_node_size(&mut self, _store: &DataStore, size: u8) {
        self.points.set_radius(self.stage.world_mut(), size as f64);
    }

    fn update_set_layout(&mut self, store: &DataStore, layout: SetLayout) {
        self.layout = layout;
        self.positions = self.compute_positions(store);
        self.reposition(store);
        self.rebuild_hulls(store);
    }

    fn update_hull(&mut self, store: &DataStore, enabled: bool) {
        self.hull = enabled;
        self.rebuild_hulls(store);
    }

    fn filter_data(&mut self, store: &DataStore, filter: &RecordFilter) -> usize {
        let surviving = filter.surviving(store);
        let shown = self.points.apply_visibility(self.stage.world_mut(), &surviving);
        self.rebuild_hulls(store);
        debug!(view = "set", visible = shown, total = self.points.len(), "filtered");
        shown
    }

    fn highlight_object(&mut self, _store: &DataStore, id: Option<RecordId>) {
        self.points.highlight(self.stage.world_mut(), id);
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
