//! Fan-out of commands to the three cubes.
//!
//! Key properties:
//! - Every command reaches Geo, Set and Net in that order, against the same
//!   `DataStore`.
//! - The controller owns the current filter and selection. Structural
//!   changes (load, slice count) drop both inside the cubes, so they are
//!   re-applied afterwards.
//! - Clicks are resolved per view in Geo, Set, Net order; the first hit wins
//!   and is highlighted everywhere. A miss in every view clears the selection.

use std::collections::HashMap;

use cubes::{
    CubeKind, CubeView, GeoCube, Layout, NetCube, RecordFilter, SetCube, TimeMode,
    default_camera,
};
use data::{DataStore, Record, RecordId, Slicing};
use foundation::math::{Vec2, Vec3, WebMercator};
use foundation::time::Time;
use runtime::{EventBus, Frame};
use scene::camera::{PointerEvent, Viewport};
use tracing::{debug, info, warn};

use crate::command::{Command, StyleCommand};
use crate::config::{ConfigError, JITTER_RANGE, NODE_SIZE_RANGE, SLICE_RANGE, SyncConfig};

const VIEW_ORDER: [CubeKind; 3] = [CubeKind::Geo, CubeKind::Set, CubeKind::Net];

pub struct SyncController {
    config: SyncConfig,
    store: DataStore,
    geo: GeoCube,
    set: SetCube,
    net: NetCube,
    viewports: HashMap<CubeKind, Viewport>,
    frame: Frame,
    filter: RecordFilter,
    highlighted: Option<RecordId>,
    time_mode: TimeMode,
    trace: EventBus<Command>,
}

impl SyncController {
    pub fn new(config: SyncConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let width = config.cube_width;
        let projection = WebMercator::new(
            config.map.center_lon,
            config.map.center_lat,
            config.map.zoom,
            width,
        );
        let mut controller = Self {
            store: DataStore::new(width),
            geo: GeoCube::new(width, projection, config.seed),
            set: SetCube::new(width, config.seed),
            net: NetCube::new(width, config.links_per_node),
            viewports: HashMap::new(),
            frame: Frame::first(),
            filter: RecordFilter::all(),
            highlighted: None,
            time_mode: TimeMode::default(),
            trace: EventBus::new(),
            config,
        };
        let square = Viewport::new(0.0, 0.0, 800.0, 800.0);
        for kind in VIEW_ORDER {
            controller.viewports.insert(kind, square);
        }
        controller.each_view(|view, store| {
            view.create_objects(store);
            let camera = default_camera(view.cube_position(), store.cube_width());
            view.set_camera(camera);
        });
        Ok(controller)
    }

    fn each_view(&mut self, mut f: impl FnMut(&mut dyn CubeView, &DataStore)) {
        let Self {
            geo,
            set,
            net,
            store,
            ..
        } = self;
        let views: [&mut dyn CubeView; 3] = [geo, set, net];
        for view in views {
            f(view, store);
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &DataStore {
        &self.store
    }

    pub fn geo(&self) -> &GeoCube {
        &self.geo
    }

    pub fn set(&self) -> &SetCube {
        &self.set
    }

    pub fn net(&self) -> &NetCube {
        &self.net
    }

    pub fn view(&self, kind: CubeKind) -> &dyn CubeView {
        match kind {
            CubeKind::Geo => &self.geo,
            CubeKind::Set => &self.set,
            CubeKind::Net => &self.net,
        }
    }

    pub fn view_mut(&mut self, kind: CubeKind) -> &mut dyn CubeView {
        match kind {
            CubeKind::Geo => &mut self.geo,
            CubeKind::Set => &mut self.set,
            CubeKind::Net => &mut self.net,
        }
    }

    /// Views in broadcast order.
    pub fn views(&self) -> [&dyn CubeView; 3] {
        [&self.geo, &self.set, &self.net]
    }

    pub fn viewport(&self, kind: CubeKind) -> Option<Viewport> {
        self.viewports.get(&kind).copied()
    }

    pub fn set_viewport(&mut self, kind: CubeKind, viewport: Viewport) {
        self.viewports.insert(kind, viewport);
    }

    pub fn frame(&self) -> Frame {
        self.frame
    }

    pub fn now(&self) -> Time {
        self.frame.time
    }

    pub fn filter_state(&self) -> &RecordFilter {
        &self.filter
    }

    pub fn highlighted(&self) -> Option<RecordId> {
        self.highlighted
    }

    pub fn time_mode(&self) -> TimeMode {
        self.time_mode
    }

    pub fn trace(&self) -> &EventBus<Command> {
        &self.trace
    }

    /// Replaces the dataset and rebuilds every cube from it.
    ///
    /// The filter resets to "everything"; the selection is dropped.
    pub fn load(&mut self, records: Vec<Record>, layout: HashMap<RecordId, Vec2>) {
        self.store.set_records(records);
        self.store.set_layout_positions(layout);
        if let Some(n) = self.config.num_slices {
            self.store.set_num_slices(n);
        }

        let Self {
            geo, set, net, store, ..
        } = self;
        let views: [&mut dyn CubeView; 3] = [geo, set, net];
        for view in views {
            view.prepare(store);
        }

        let config = self.config.clone();
        let background = match config.background() {
            Ok(color) => Some(color),
            Err(e) => {
                warn!(error = %e, "ignoring background color");
                None
            }
        };
        let time_mode = self.time_mode;
        self.each_view(|view, store| {
            view.create_objects(store);
            view.update_node_size(store, config.node_size);
            view.update_node_color(store, config.node_color);
            view.change_size_encoding(store, config.size_encoding);
            view.change_charge_factor(store, config.charge_factor);
            view.update_set_layout(store, config.set_layout);
            view.update_hull(store, config.hull);
            view.assemble_data(store);
            view.update_jitter(f64::from(config.jitter));
            if time_mode != TimeMode::default() {
                view.update_time(store, time_mode);
            }
            if let Some(color) = background {
                view.update_background_color(color);
            }
        });

        self.filter = RecordFilter::all();
        self.highlighted = None;
        self.reapply_selection();
        info!(
            records = self.store.len(),
            slices = self.store.buckets().len(),
            "dataset loaded into cubes"
        );
        let records = self.store.len();
        self.trace.emit(self.frame, Command::Load { records });
    }

    /// Applies every present key of `cmd` to all three views.
    pub fn apply_style(&mut self, cmd: StyleCommand) {
        if let Some(n) = cmd.num_slices {
            let n = n.clamp(SLICE_RANGE.0, SLICE_RANGE.1);
            self.config.num_slices = Some(n);
            self.store.set_num_slices(n);
            self.each_view(|view, store| view.update_num_slices(store));
            self.reapply_selection();
            debug!(slices = self.store.buckets().len(), "slice count changed");
        }
        if let Some(size) = cmd.node_size {
            let size = size.clamp(NODE_SIZE_RANGE.0, NODE_SIZE_RANGE.1);
            self.config.node_size = size;
            self.each_view(|view, store| view.update_node_size(store, size));
        }
        if let Some(raw) = &cmd.background_color {
            match foundation::color::Color::parse(raw) {
                Ok(color) => {
                    self.config.background_color = color.to_hex_string();
                    self.each_view(|view, _| view.update_background_color(color));
                }
                Err(e) => warn!(error = %e, "ignoring background color"),
            }
        }
        if let Some(encoding) = cmd.node_color {
            self.config.node_color = encoding;
            self.each_view(|view, store| view.update_node_color(store, encoding));
        }
        if let Some(radius) = cmd.jitter {
            let radius = radius.clamp(JITTER_RANGE.0, JITTER_RANGE.1);
            self.config.jitter = radius;
            self.each_view(|view, _| view.update_jitter(f64::from(radius)));
        }
        if let Some(layout) = cmd.s_layout {
            self.config.set_layout = layout;
            self.each_view(|view, store| view.update_set_layout(store, layout));
        }
        if let Some(enabled) = cmd.hull {
            self.config.hull = enabled;
            self.each_view(|view, store| view.update_hull(store, enabled));
        }
        if let Some(encoding) = cmd.size_encoding {
            self.config.size_encoding = encoding;
            self.each_view(|view, store| view.change_size_encoding(store, encoding));
        }
        if let Some(factor) = cmd.charge_factor {
            if factor.is_finite() && factor > 0.0 {
                self.config.charge_factor = factor;
                self.each_view(|view, store| view.change_charge_factor(store, factor));
            } else {
                warn!(factor, "ignoring charge factor");
            }
        }
        // Size and color changes reset point materials.
        let highlighted = self.highlighted;
        self.each_view(|view, store| view.highlight_object(store, highlighted));
        self.trace.emit(self.frame, Command::Style(cmd));
    }

    /// Back to one slice per calendar year.
    pub fn reset_slicing(&mut self) {
        self.config.num_slices = None;
        self.store.set_slicing(Slicing::CalendarYear);
        self.each_view(|view, store| view.update_num_slices(store));
        self.reapply_selection();
    }

    /// Broadcasts `filter`; returns the visible point count per view in broadcast order.
    pub fn filter(&mut self, filter: RecordFilter) -> [usize; 3] {
        let mut visible = [0; 3];
        let mut i = 0;
        self.each_view(|view, store| {
            visible[i] = view.filter_data(store, &filter);
            i += 1;
        });
        info!(
            category = %filter.category,
            geo = visible[0],
            set = visible[1],
            net = visible[2],
            "filter applied"
        );
        self.filter = filter.clone();
        self.trace.emit(self.frame, Command::Filter(filter));
        visible
    }

    /// Selects `id` in every view, or clears the selection.
    pub fn highlight(&mut self, id: Option<RecordId>) {
        self.highlighted = id.filter(|id| self.store.contains(*id));
        let highlighted = self.highlighted;
        self.each_view(|view, store| view.highlight_object(store, highlighted));
        self.trace.emit(self.frame, Command::Highlight(highlighted));
    }

    /// Resolves a pointer event to a record, trying each view in turn.
    ///
    /// A hit is highlighted in all views; a miss everywhere clears the selection.
    pub fn click(&mut self, pointer: PointerEvent) -> Option<&Record> {
        let mut hit = None;
        for kind in VIEW_ORDER {
            let Some(viewport) = self.viewports.get(&kind).copied() else {
                continue;
            };
            let Self {
                geo, set, net, store, ..
            } = self;
            let view: &mut dyn CubeView = match kind {
                CubeKind::Geo => geo,
                CubeKind::Set => set,
                CubeKind::Net => net,
            };
            if let Some(record) = view.on_click(store, pointer, &viewport) {
                hit = Some((kind, record.id));
                break;
            }
        }
        match hit {
            Some((kind, id)) => {
                info!(view = kind.name(), %id, "record picked");
                self.highlight(Some(id));
                self.store.record(id)
            }
            None => {
                debug!("click missed every view");
                self.highlight(None);
                None
            }
        }
    }

    pub fn set_time_mode(&mut self, mode: TimeMode) {
        self.time_mode = mode;
        self.each_view(|view, store| view.update_time(store, mode));
        self.trace.emit(self.frame, Command::Time(mode));
    }

    /// Starts `layout` on every visible view at the current frame time.
    pub fn transition(&mut self, layout: Layout) {
        let now = self.now();
        self.each_view(|view, _| match layout {
            Layout::Stacked => view.transition_stc(now),
            Layout::Juxtaposed => view.transition_jp(now),
            Layout::Superimposed => view.transition_si(now),
            Layout::Animated => view.transition_ani(now),
        });
        info!(?layout, at = now.0, "transition broadcast");
        self.trace.emit(self.frame, Command::Transition(layout));
    }

    pub fn transition_stc(&mut self) {
        self.transition(Layout::Stacked);
    }

    pub fn transition_jp(&mut self) {
        self.transition(Layout::Juxtaposed);
    }

    pub fn transition_si(&mut self) {
        self.transition(Layout::Superimposed);
    }

    pub fn transition_ani(&mut self) {
        self.transition(Layout::Animated);
    }

    pub fn set_view_visible(&mut self, kind: CubeKind, visible: bool) {
        self.view_mut(kind).set_visible(visible);
        self.trace
            .emit(self.frame, Command::Visibility { view: kind, visible });
    }

    /// Advances the clock by `dt_s` and renders every view.
    pub fn tick(&mut self, dt_s: f64) -> Frame {
        self.frame = self.frame.advance(dt_s);
        let frame = self.frame;
        self.each_view(|view, _| view.render(frame));
        frame
    }

    /// Ticks at a fixed rate until `seconds` have elapsed. Returns the frame count.
    pub fn run_for(&mut self, seconds: f64, dt_s: f64) -> u64 {
        if dt_s.is_nan() || dt_s <= 0.0 {
            return 0;
        }
        let frames = (seconds / dt_s).ceil().max(0.0) as u64;
        for _ in 0..frames {
            self.tick(dt_s);
        }
        frames
    }

    /// World-space origin of each cube, in broadcast order.
    pub fn cube_positions(&self) -> [Vec3; 3] {
        self.views().map(|view| view.cube_position())
    }

    fn reapply_selection(&mut self) {
        let filter = self.filter.clone();
        let highlighted = self.highlighted;
        self.each_view(|view, store| {
            view.filter_data(store, &filter);
            view.highlight_object(store, highlighted);
        });
    }
}
