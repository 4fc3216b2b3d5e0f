use data::{DataStore, NodeColorEncoding, Record, RecordId};
use foundation::color::Color;
use foundation::math::Vec3;
use foundation::time::Time;
use runtime::Frame;
use scene::camera::{Camera, PointerEvent, Viewport};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::RecordFilter;
use crate::net::SizeEncoding;
use crate::points::PointLayer;
use crate::set::SetLayout;
use crate::slices::SliceStack;
use crate::stage::Stage;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CubeKind {
    Geo,
    Set,
    Net,
}

impl CubeKind {
    pub fn name(self) -> &'static str {
        match self {
            CubeKind::Geo => "geo",
            CubeKind::Set => "set",
            CubeKind::Net => "net",
        }
    }
}

/// How points sit inside their slice.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Flattened onto the slice plane (slice-relative `y = 0`).
    #[default]
    Aggregated,
    /// At the exact time-scale height.
    Absolute,
}

/// Arrangement of the slices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// Space-time cube.
    #[default]
    Stacked,
    /// Small multiples, side by side.
    Juxtaposed,
    /// Every slice flattened onto the floor.
    Superimposed,
    /// Reserved; transitions into it do nothing.
    Animated,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Lifecycle {
    #[default]
    Uninitialized,
    /// Containers and static geometry exist, no data yet.
    Created,
    Assembled,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct CubeState {
    pub lifecycle: Lifecycle,
    pub time_mode: TimeMode,
    pub layout: Layout,
}

/// Capabilities every cube view provides.
///
/// Views own presentation objects only; records are read from the
/// `DataStore` passed into each call. Structural calls (`create_objects`,
/// `assemble_data`, `update_num_slices`) drop filter and highlight state, so
/// the caller re-applies them afterwards.
pub trait CubeView {
    fn kind(&self) -> CubeKind;

    fn state(&self) -> CubeState;

    fn stage(&self) -> &Stage;

    fn stage_mut(&mut self) -> &mut Stage;

    fn points(&self) -> &PointLayer;

    fn slices(&self) -> &SliceStack;

    /// One-time work against shared records before any view reads them.
    fn prepare(&mut self, _store: &mut DataStore) {}

    /// Builds empty containers and static geometry, discarding everything else.
    fn create_objects(&mut self, store: &DataStore);

    /// Populates the slices from `store`; clears prior per-slice content first.
    fn assemble_data(&mut self, store: &DataStore);

    /// Advances in-flight animations and re-homes overlays for this tick.
    fn render(&mut self, frame: Frame);

    fn update_time(&mut self, store: &DataStore, mode: TimeMode);

    /// Rebuilds slices after the store's slicing changed.
    fn update_num_slices(&mut self, store: &DataStore);

    fn update_node_color(&mut self, store: &DataStore, encoding: NodeColorEncoding);

    fn update_node_size(&mut self, store: &DataStore, size: u8);

    fn update_jitter(&mut self, _radius: f64) {}

    fn update_set_layout(&mut self, _store: &DataStore, _layout: SetLayout) {}

    fn update_hull(&mut self, _store: &DataStore, _enabled: bool) {}

    fn change_size_encoding(&mut self, _store: &DataStore, _encoding: SizeEncoding) {}

    fn change_charge_factor(&mut self, _store: &DataStore, _factor: f64) {}

    /// Applies `filter`; returns the number of visible points.
    fn filter_data(&mut self, store: &DataStore, filter: &RecordFilter) -> usize;

    /// Resets every point, then highlights `id` (and related objects) if this view has it.
    fn highlight_object(&mut self, store: &DataStore, id: Option<RecordId>);

    fn transition_stc(&mut self, now: Time);

    fn transition_jp(&mut self, now: Time);

    fn transition_si(&mut self, now: Time);

    /// Reserved layout; never does anything.
    fn transition_ani(&mut self, _now: Time) {}

    fn update_background_color(&mut self, color: Color) {
        self.stage_mut().set_background(color);
    }

    fn background_color(&self) -> Color {
        self.stage().background()
    }

    fn cube_position(&self) -> Vec3 {
        self.stage().cube_position()
    }

    fn is_visible(&self) -> bool {
        self.stage().is_visible()
    }

    fn set_visible(&mut self, visible: bool) {
        self.stage_mut().set_visible(visible);
    }

    fn camera(&self) -> Camera {
        self.stage().camera()
    }

    fn set_camera(&mut self, camera: Camera) {
        self.stage_mut().set_camera(camera);
    }

    fn highlighted(&self) -> Option<RecordId> {
        self.points().highlighted()
    }

    /// Record under the pointer in this view, if any. A miss clears the highlight.
    fn on_click<'s>(
        &mut self,
        store: &'s DataStore,
        pointer: PointerEvent,
        viewport: &Viewport,
    ) -> Option<&'s Record> {
        let hit = self
            .stage()
            .pick(pointer, viewport)
            .and_then(|entity| self.points().record_at(entity));
        match hit {
            Some(id) => {
                debug!(view = self.kind().name(), %id, "pick hit");
                store.record(id)
            }
            None => {
                debug!(view = self.kind().name(), "pick missed");
                self.highlight_object(store, None);
                None
            }
        }
    }
}
