//! Network cube: nodes at externally laid-out ground positions, directed
//! edges drawn in four mutually exclusive link groups.
//!
//! Key properties:
//! - Nodes exist only for records with a layout position; edges whose target
//!   has no node are skipped at construction, never default-positioned.
//! - Edges are explicit `(source, target)` pairs; every endpoint is recomputed
//!   from the unscaled normalized position, so rescaling never compounds.
//! - After a filter, an edge is visible iff both endpoint nodes are, in every
//!   link group including each slice's juxtaposed set.

use std::collections::BTreeMap;

use data::{DataStore, NodeColorEncoding, Record, RecordId};
use foundation::color::Color;
use foundation::math::precision::finite_extent;
use foundation::math::{Vec2, Vec3};
use foundation::time::Time;
use runtime::Frame;
use scene::World;
use scene::components::{Material, Shape};
use scene::entity::EntityId;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::filter::RecordFilter;
use crate::points::PointLayer;
use crate::slices::SliceStack;
use crate::stage::Stage;
use crate::view::{CubeKind, CubeState, CubeView, Layout, Lifecycle, TimeMode};

/// Targets per record that become edges.
pub const DEFAULT_LINKS_PER_NODE: usize = 3;

/// Output range of the degree -> node scale mapping.
pub const SIZE_RANGE: (f64, f64) = (1.0, 6.0);

/// Tint of nodes with an edge into the selection.
pub const INCOMING_COLOR: Color = Color::from_hex(0xff9900);
/// Tint of the selection's targets.
pub const OUTGOING_COLOR: Color = Color::from_hex(0x00b050);

const LINK_COLOR: Color = Color::from_hex(0x888888);
const LINK_OPACITY: f32 = 0.6;

/// What drives node scale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeEncoding {
    OverallDegree,
    #[default]
    InDegree,
    OutDegree,
    Constant,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LinkKind {
    /// Between slice heights, ignoring time within the slice.
    Aggregated,
    /// Between exact time-scale heights.
    Absolute,
    /// On the floor plane.
    Superimposed,
    /// Inside one slice, only between nodes of that slice.
    Juxtaposed,
}

/// A directed edge between two records.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    pub source: RecordId,
    pub target: RecordId,
}

/// The edges of one link group, each drawn as a line under `container`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkSet {
    pub kind: LinkKind,
    pub container: EntityId,
    /// Owning slice, for juxtaposed sets.
    pub slice: Option<usize>,
    edges: Vec<(Edge, EntityId)>,
}

impl LinkSet {
    fn new(kind: LinkKind, container: EntityId, slice: Option<usize>) -> Self {
        Self {
            kind,
            container,
            slice,
            edges: Vec::new(),
        }
    }

    pub fn edges(&self) -> &[(Edge, EntityId)] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn visible_count(&self, world: &World) -> usize {
        self.edges
            .iter()
            .filter(|(_, e)| world.is_visible(*e))
            .count()
    }
}

#[derive(Debug)]
pub struct NetCube {
    stage: Stage,
    slices: SliceStack,
    points: PointLayer,
    state: CubeState,
    links_per_node: usize,
    charge_factor: f64,
    size_encoding: SizeEncoding,
    encoding: NodeColorEncoding,
    normalized: BTreeMap<RecordId, Vec2>,
    groups: Vec<LinkSet>,
    juxtaposed: Vec<LinkSet>,
    skipped_edges: usize,
}

impl NetCube {
    pub fn new(width: f64, links_per_node: usize) -> Self {
        Self {
            stage: Stage::new(width),
            slices: SliceStack::new(width),
            points: PointLayer::default(),
            state: CubeState::default(),
            links_per_node,
            charge_factor: 1.0,
            size_encoding: SizeEncoding::default(),
            encoding: NodeColorEncoding::default(),
            normalized: BTreeMap::new(),
            groups: Vec::new(),
            juxtaposed: Vec::new(),
            skipped_edges: 0,
        }
    }

    pub fn links_per_node(&self) -> usize {
        self.links_per_node
    }

    pub fn charge_factor(&self) -> f64 {
        self.charge_factor
    }

    pub fn size_encoding(&self) -> SizeEncoding {
        self.size_encoding
    }

    /// Unscaled cube-local ground position of a node.
    pub fn normalized_position(&self, id: RecordId) -> Option<Vec2> {
        self.normalized.get(&id).copied()
    }

    /// Edges dropped at construction because the target had no node.
    pub fn skipped_edges(&self) -> usize {
        self.skipped_edges
    }

    pub fn link_set(&self, kind: LinkKind) -> Option<&LinkSet> {
        self.groups.iter().find(|g| g.kind == kind)
    }

    /// Per-slice juxtaposed sets, in slice order.
    pub fn juxtaposed_sets(&self) -> &[LinkSet] {
        &self.juxtaposed
    }

    pub fn link_sets(&self) -> impl Iterator<Item = &LinkSet> {
        self.groups.iter().chain(self.juxtaposed.iter())
    }

    /// The single cross-slice group shown outside the juxtaposed layout.
    pub fn active_link_kind(&self) -> LinkKind {
        match (self.state.layout, self.state.time_mode) {
            (Layout::Superimposed, _) => LinkKind::Superimposed,
            (_, TimeMode::Aggregated) => LinkKind::Aggregated,
            (_, TimeMode::Absolute) => LinkKind::Absolute,
        }
    }

    pub fn is_group_visible(&self, kind: LinkKind) -> bool {
        let world = self.stage.world();
        match kind {
            LinkKind::Juxtaposed => self
                .juxtaposed
                .iter()
                .any(|set| world.is_visible(set.container)),
            _ => self
                .link_set(kind)
                .is_some_and(|set| world.is_visible(set.container)),
        }
    }

    fn apply_group_visibility(&mut self) {
        let active = self.active_link_kind();
        let juxtaposed = self.state.layout == Layout::Juxtaposed;
        let world = self.stage.world_mut();
        for set in &self.groups {
            world.set_visible(set.container, set.kind == active && !juxtaposed);
        }
        for set in &self.juxtaposed {
            world.set_visible(set.container, juxtaposed);
        }
    }

    /// Linear map of the observed in-degree extent onto `SIZE_RANGE`.
    fn size_factor(&self, record: &Record, extent: Option<(f64, f64)>) -> f64 {
        let value = match self.size_encoding {
            SizeEncoding::OverallDegree => record.network.degree_overall,
            SizeEncoding::InDegree => record.network.degree_in,
            SizeEncoding::OutDegree => record.network.degree_out,
            SizeEncoding::Constant => return SIZE_RANGE.0,
        } as f64;
        match extent {
            Some((lo, hi)) if hi > lo => {
                SIZE_RANGE.0 + (value - lo) / (hi - lo) * (SIZE_RANGE.1 - SIZE_RANGE.0)
            }
            _ => SIZE_RANGE.0,
        }
    }

    fn in_degree_extent(store: &DataStore) -> Option<(f64, f64)> {
        finite_extent(store.records().iter().map(|r| r.network.degree_in as f64))
    }

    fn node_position(&self, store: &DataStore, id: RecordId) -> Option<Vec3> {
        let ground = self.normalized.get(&id)?.scale(self.charge_factor);
        let entry = self.points.get(id)?;
        let record = store.record(id)?;
        let y = self
            .slices
            .point_height(store, record.date_time, entry.slice, self.state.time_mode);
        Some(Vec3::from_ground(ground, y))
    }

    /// Endpoint of `id` in the coordinate frame of a `kind` link set.
    fn endpoint(&self, store: &DataStore, kind: LinkKind, id: RecordId) -> Option<Vec3> {
        let ground = self.normalized.get(&id)?.scale(self.charge_factor);
        let entry = self.points.get(id)?;
        let record = store.record(id)?;
        let y = match kind {
            LinkKind::Aggregated => self.slices.get(entry.slice)?.stacked_y,
            LinkKind::Absolute => store.time_scale().y(record.date_time),
            LinkKind::Superimposed => -self.stage.width() / 2.0,
            LinkKind::Juxtaposed => self.slices.point_height(
                store,
                record.date_time,
                entry.slice,
                self.state.time_mode,
            ),
        };
        Some(Vec3::from_ground(ground, y))
    }

    fn create_nodes(&mut self, store: &DataStore) {
        let extent = Self::in_degree_extent(store);
        for record in store.records() {
            let (Some(slice), Some(ground)) =
                (store.bucket_of(record), store.normalized_position(record.id))
            else {
                continue;
            };
            let Some(slice_entity) = self.slices.entity(slice) else {
                continue;
            };
            self.normalized.insert(record.id, ground);
            let y = self
                .slices
                .point_height(store, record.date_time, slice, self.state.time_mode);
            let color = store.node_color(record, self.encoding);
            let scale = self.size_factor(record, extent);
            self.points.spawn(
                self.stage.world_mut(),
                slice_entity,
                record.id,
                slice,
                Vec3::from_ground(ground.scale(self.charge_factor), y),
                color,
                scale,
            );
        }
    }

    fn spawn_line(world: &mut World, container: EntityId, from: Vec3, to: Vec3) -> EntityId {
        let line = world.spawn_child(container);
        world.set_shape(line, Shape::Line { from, to });
        world.set_material(line, Material::translucent(LINK_COLOR, LINK_OPACITY));
        line
    }

    fn create_links(&mut self, store: &DataStore) {
        let mut skipped = 0usize;
        for record in store.records() {
            let Some(source) = self.points.get(record.id).copied() else {
                continue;
            };
            for &target in record.target_nodes.iter().take(self.links_per_node) {
                let Some(target_entry) = self.points.get(target).copied() else {
                    skipped += 1;
                    continue;
                };
                let edge = Edge {
                    source: record.id,
                    target,
                };

                for g in 0..self.groups.len() {
                    let kind = self.groups[g].kind;
                    let (Some(from), Some(to)) = (
                        self.endpoint(store, kind, edge.source),
                        self.endpoint(store, kind, edge.target),
                    ) else {
                        continue;
                    };
                    let container = self.groups[g].container;
                    let line = Self::spawn_line(self.stage.world_mut(), container, from, to);
                    self.groups[g].edges.push((edge, line));
                }

                if source.slice == target_entry.slice
                    && let (Some(from), Some(to)) = (
                        self.endpoint(store, LinkKind::Juxtaposed, edge.source),
                        self.endpoint(store, LinkKind::Juxtaposed, edge.target),
                    )
                    && let Some(set) = self.juxtaposed.get_mut(source.slice)
                {
                    let line = Self::spawn_line(self.stage.world_mut(), set.container, from, to);
                    set.edges.push((edge, line));
                }
            }
        }
        self.skipped_edges = skipped;
        if skipped > 0 {
            debug!(view = "net", skipped, "dangling edges skipped");
        }
    }

    /// Recomputes every node position and edge endpoint from the unscaled layout.
    fn refresh_geometry(&mut self, store: &DataStore) {
        let ids: Vec<RecordId> = self.points.ids().collect();
        for id in ids {
            if let Some(at) = self.node_position(store, id) {
                self.points.set_local_position(self.stage.world_mut(), id, at);
            }
        }

        let mut reshaped = Vec::new();
        for set in self.groups.iter().chain(self.juxtaposed.iter()) {
            for (edge, line) in &set.edges {
                if let (Some(from), Some(to)) = (
                    self.endpoint(store, set.kind, edge.source),
                    self.endpoint(store, set.kind, edge.target),
                ) {
                    reshaped.push((*line, Shape::Line { from, to }));
                }
            }
        }
        let world = self.stage.world_mut();
        for (line, shape) in reshaped {
            world.set_shape(line, shape);
        }
    }

    fn transition(&mut self, layout: Layout, now: Time) {
        if !self.stage.is_visible() {
            return;
        }
        self.slices.transition(self.stage.world(), layout, now);
        self.state.layout = layout;
        self.apply_group_visibility();
    }
}

impl CubeView for NetCube {
    fn kind(&self) -> CubeKind {
        CubeKind::Net
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

    fn prepare(&mut self, store: &mut DataStore) {
        store.annotate_network(self.links_per_node);
    }

    fn create_objects(&mut self, store: &DataStore) {
        self.stage.reset();
        self.points.clear();
        self.normalized.clear();
        self.juxtaposed.clear();
        self.slices.rebuild(&mut self.stage, store);

        let root = self.stage.root();
        let world = self.stage.world_mut();
        self.groups = [LinkKind::Aggregated, LinkKind::Absolute, LinkKind::Superimposed]
            .into_iter()
            .map(|kind| LinkSet::new(kind, world.spawn_child(root), None))
            .collect();
        self.apply_group_visibility();
        self.state.lifecycle = Lifecycle::Created;
    }

    fn assemble_data(&mut self, store: &DataStore) {
        self.slices.clear_content(self.stage.world_mut());
        self.points.clear();
        self.normalized.clear();
        self.juxtaposed.clear();
        let world = self.stage.world_mut();
        for set in &mut self.groups {
            world.despawn_children(set.container);
            set.edges.clear();
        }

        for slice in self.slices.iter() {
            let container = world.spawn_child(slice.entity);
            self.juxtaposed
                .push(LinkSet::new(LinkKind::Juxtaposed, container, Some(slice.index)));
        }

        self.create_nodes(store);
        self.create_links(store);
        self.apply_group_visibility();
        self.state.lifecycle = Lifecycle::Assembled;
        info!(
            view = "net",
            nodes = self.points.len(),
            edges = self.groups.first().map_or(0, LinkSet::len),
            juxtaposed = self.juxtaposed.iter().map(LinkSet::len).sum::<usize>(),
            "assembled"
        );
    }

    fn render(&mut self, frame: Frame) {
        self.slices.advance(&mut self.stage, frame.time);
    }

    fn update_time(&mut self, store: &DataStore, mode: TimeMode) {
        self.state.time_mode = mode;
        self.refresh_geometry(store);
        self.apply_group_visibility();
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

    fn change_size_encoding(&mut self, store: &DataStore, encoding: SizeEncoding) {
        self.size_encoding = encoding;
        let extent = Self::in_degree_extent(store);
        let ids: Vec<RecordId> = self.points.ids().collect();
        for id in ids {
            if let Some(record) = store.record(id) {
                let scale = self.size_factor(record, extent);
                self.points.set_base_scale(id, scale);
            }
        }
        let current = self.points.highlighted();
        self.highlight_object(store, current);
        debug!(view = "net", ?encoding, "size encoding changed");
    }

    fn change_charge_factor(&mut self, store: &DataStore, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!(view = "net", factor, "ignored charge factor");
            return;
        }
        self.charge_factor = factor;
        self.refresh_geometry(store);
        debug!(view = "net", factor, "charge factor applied");
    }

    fn filter_data(&mut self, store: &DataStore, filter: &RecordFilter) -> usize {
        let surviving = filter.surviving(store);
        let world = self.stage.world_mut();
        let shown = self.points.apply_visibility(world, &surviving);
        let mut edges_shown = 0usize;
        for set in self.groups.iter().chain(self.juxtaposed.iter()) {
            for (edge, line) in &set.edges {
                let visible = surviving.contains(edge.source) && surviving.contains(edge.target);
                world.set_visible(*line, visible);
                edges_shown += usize::from(visible);
            }
        }
        debug!(view = "net", visible = shown, edges = edges_shown, "filtered");
        shown
    }

    /// Highlights `id`, tints every record linking into it with `INCOMING_COLOR`,
    /// and tints each of its first `links_per_node` targets (the ones that get
    /// edges) with `OUTGOING_COLOR`.
    fn highlight_object(&mut self, store: &DataStore, id: Option<RecordId>) {
        let world = self.stage.world_mut();
        if self.points.highlight(world, id).is_none() {
            return;
        }
        let Some(record) = id.and_then(|id| store.record(id)) else {
            return;
        };
        for source in &record.network.incoming_nodes {
            self.points.tint(world, *source, INCOMING_COLOR);
        }
        for target in record.target_nodes.iter().take(self.links_per_node) {
            self.points.tint(world, *target, OUTGOING_COLOR);
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

#[cfg(test)]
mod tests {
    use super::{INCOMING_COLOR, LinkKind, NetCube, OUTGOING_COLOR, SIZE_RANGE, SizeEncoding};
    use crate::filter::RecordFilter;
    use crate::points::HIGHLIGHT_COLOR;
    use crate::view::{CubeView, Layout, TimeMode};
    use chrono::{NaiveDate, NaiveDateTime};
    use data::{DataStore, Record, RecordId};
    use foundation::math::Vec2;
    use foundation::time::Time;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    /// 1 -> 2, 1 -> 3, 2 -> 3, 3 -> 9 (absent), 4 -> 1 (4 has no layout), 2 -> 5 (5 has no layout).
    fn store() -> DataStore {
        let mut store = DataStore::new(100.0);
        store.set_records(vec![
            Record::new(RecordId(1), ymd(1940, 2, 1))
                .with_category(1, "a")
                .with_targets([RecordId(2), RecordId(3)]),
            Record::new(RecordId(2), ymd(1940, 8, 1))
                .with_category(1, "b")
                .with_targets([RecordId(3), RecordId(5)]),
            Record::new(RecordId(3), ymd(1941, 5, 1))
                .with_category(1, "a")
                .with_targets([RecordId(9)]),
            Record::new(RecordId(4), ymd(1941, 6, 1)).with_targets([RecordId(1)]),
            Record::new(RecordId(5), ymd(1941, 7, 1)),
        ]);
        store.set_layout_positions(HashMap::from([
            (RecordId(1), Vec2::new(0.0, 0.0)),
            (RecordId(2), Vec2::new(10.0, 0.0)),
            (RecordId(3), Vec2::new(10.0, 10.0)),
        ]));
        store
    }

    fn cube(store: &mut DataStore) -> NetCube {
        let mut cube = NetCube::new(100.0, 3);
        cube.prepare(store);
        cube.create_objects(store);
        cube.assemble_data(store);
        cube
    }

    #[test]
    fn nodes_and_edges_skip_missing_layout() {
        let mut store = store();
        let cube = cube(&mut store);
        assert_eq!(cube.points().len(), 3);
        let aggregated = cube.link_set(LinkKind::Aggregated).expect("group");
        assert_eq!(aggregated.len(), 3);
        assert_eq!(cube.link_set(LinkKind::Absolute).map(|s| s.len()), Some(3));
        assert_eq!(cube.link_set(LinkKind::Superimposed).map(|s| s.len()), Some(3));
        assert_eq!(cube.skipped_edges(), 2);
    }

    #[test]
    fn juxtaposed_edges_stay_inside_one_slice() {
        let mut store = store();
        let cube = cube(&mut store);
        let sets = cube.juxtaposed_sets();
        assert_eq!(sets.len(), 2);
        let edges: Vec<(u32, u32)> = sets[0]
            .edges()
            .iter()
            .map(|(e, _)| (e.source.0, e.target.0))
            .collect();
        assert_eq!(edges, vec![(1, 2)]);
        assert!(sets[1].is_empty());
        let parent = cube.stage().world().parent(sets[0].container);
        assert_eq!(parent, cube.slices().entity(0));
    }

    #[test]
    fn filtered_edges_need_both_endpoints() {
        let mut store = store();
        let mut cube = cube(&mut store);
        let shown = cube.filter_data(&store, &RecordFilter::new("a", None, None));
        assert_eq!(shown, 2);

        let world = cube.stage().world();
        for set in cube.link_sets() {
            for (edge, line) in set.edges() {
                let expected = cube.points().is_visible(world, edge.source)
                    && cube.points().is_visible(world, edge.target);
                assert_eq!(world.is_visible(*line), expected, "{:?} {edge:?}", set.kind);
            }
        }
        let aggregated = cube.link_set(LinkKind::Aggregated).expect("group");
        assert_eq!(aggregated.visible_count(world), 1);
    }

    #[test]
    fn one_cross_slice_group_is_active() {
        let mut store = store();
        let mut cube = cube(&mut store);
        assert!(cube.is_group_visible(LinkKind::Aggregated));
        assert!(!cube.is_group_visible(LinkKind::Absolute));
        assert!(!cube.is_group_visible(LinkKind::Juxtaposed));

        cube.update_time(&store, TimeMode::Absolute);
        assert_eq!(cube.active_link_kind(), LinkKind::Absolute);
        assert!(cube.is_group_visible(LinkKind::Absolute));
        assert!(!cube.is_group_visible(LinkKind::Aggregated));

        cube.transition_si(Time::ZERO);
        assert!(cube.is_group_visible(LinkKind::Superimposed));
        assert!(!cube.is_group_visible(LinkKind::Absolute));

        cube.transition_jp(Time::ZERO);
        assert!(cube.is_group_visible(LinkKind::Juxtaposed));
        assert!(!cube.is_group_visible(LinkKind::Superimposed));
        assert_eq!(cube.state().layout, Layout::Juxtaposed);
    }

    #[test]
    fn charge_factor_never_compounds() {
        let mut store = store();
        let mut cube = cube(&mut store);
        cube.change_charge_factor(&store, 2.0);
        cube.change_charge_factor(&store, 2.0);

        let normalized = cube.normalized_position(RecordId(2)).expect("normalized");
        let node = cube.points().entity_of(RecordId(2)).expect("node");
        let at = cube.stage().world().position(node).expect("position");
        assert_eq!(at.ground(), normalized.scale(2.0));

        let aggregated = cube.link_set(LinkKind::Aggregated).expect("group");
        let (edge, line) = aggregated.edges()[0];
        assert_eq!(edge.source, RecordId(1));
        match cube.stage().world().shape(line) {
            Some(scene::components::Shape::Line { from, .. }) => {
                let n = cube.normalized_position(RecordId(1)).expect("normalized");
                assert_eq!(from.ground(), n.scale(2.0));
            }
            other => panic!("unexpected shape {other:?}"),
        }

        cube.change_charge_factor(&store, f64::NAN);
        assert_eq!(cube.charge_factor(), 2.0);
    }

    #[test]
    fn absolute_edges_use_time_scale_height() {
        let mut store = store();
        let cube = cube(&mut store);
        let absolute = cube.link_set(LinkKind::Absolute).expect("group");
        let (_, line) = absolute.edges()[0];
        let expected = store.time_scale().y(ymd(1940, 2, 1));
        match cube.stage().world().shape(line) {
            Some(scene::components::Shape::Line { from, .. }) => assert_eq!(from.y, expected),
            other => panic!("unexpected shape {other:?}"),
        }
        let superimposed = cube.link_set(LinkKind::Superimposed).expect("group");
        let (_, line) = superimposed.edges()[0];
        match cube.stage().world().shape(line) {
            Some(scene::components::Shape::Line { to, .. }) => assert_eq!(to.y, -50.0),
            other => panic!("unexpected shape {other:?}"),
        }
    }

    #[test]
    fn highlight_tints_neighbors() {
        let mut store = store();
        let mut cube = cube(&mut store);
        cube.highlight_object(&store, Some(RecordId(2)));

        let world = cube.stage().world();
        let color = |id: u32| {
            cube.points()
                .entity_of(RecordId(id))
                .and_then(|e| world.color(e))
        };
        assert_eq!(color(2), Some(HIGHLIGHT_COLOR));
        assert_eq!(color(1), Some(INCOMING_COLOR));
        assert_eq!(color(3), Some(OUTGOING_COLOR));
        assert_eq!(cube.points().highlight_count(world), 1);

        cube.highlight_object(&store, Some(RecordId(3)));
        let world = cube.stage().world();
        let e2 = cube.points().entity_of(RecordId(2)).expect("node");
        assert_ne!(world.color(e2), Some(HIGHLIGHT_COLOR));
        assert_eq!(cube.points().highlight_count(world), 1);
    }

    #[test]
    fn outgoing_tint_covers_only_drawn_links() {
        let mut capped_store = store();
        let mut capped = NetCube::new(100.0, 1);
        capped.prepare(&mut capped_store);
        capped.create_objects(&capped_store);
        capped.assemble_data(&capped_store);
        capped.highlight_object(&capped_store, Some(RecordId(1)));
        let world = capped.stage().world();
        let e3 = capped.points().entity_of(RecordId(3)).expect("node");
        let e2 = capped.points().entity_of(RecordId(2)).expect("node");
        assert_eq!(world.color(e2), Some(OUTGOING_COLOR));
        assert_ne!(world.color(e3), Some(OUTGOING_COLOR));

        let mut store = store();
        let mut cube = cube(&mut store);
        cube.highlight_object(&store, Some(RecordId(1)));
        let world = cube.stage().world();
        for id in [2, 3] {
            let e = cube.points().entity_of(RecordId(id)).expect("node");
            assert_eq!(world.color(e), Some(OUTGOING_COLOR), "target {id}");
        }
    }

    #[test]
    fn size_encoding_spans_the_in_degree_extent() {
        let mut store = store();
        let mut cube = cube(&mut store);
        // In-degrees: 1 -> 1, 2 -> 1, 3 -> 2, 4 -> 0, 5 -> 1.
        let scale = |cube: &NetCube, id: u32| cube.points().get(RecordId(id)).map(|e| e.base_scale);
        assert_eq!(scale(&cube, 3), Some(SIZE_RANGE.1));
        assert_eq!(scale(&cube, 1), Some(3.5));

        cube.change_size_encoding(&store, SizeEncoding::Constant);
        assert_eq!(scale(&cube, 3), Some(SIZE_RANGE.0));
    }

    #[test]
    fn annotation_happens_once() {
        let mut store = store();
        let mut cube = cube(&mut store);
        assert!(store.is_network_annotated());
        cube.prepare(&mut store);
        let r = store.record(RecordId(3)).expect("record");
        assert_eq!(r.network.degree_in, 2);
        assert_eq!(r.network.degree_overall, r.network.degree_in + r.network.degree_out);
        assert_eq!(cube.points().get(RecordId(1)).map(|e| e.slice), Some(0));
    }
}
