use cubes::{CubeView, Layout, LinkKind, TimeMode};
use serde::Serialize;

use crate::controller::SyncController;

/// Snapshot of a controller's visible state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub domain: Option<[String; 2]>,
    pub slices: Vec<SliceSummary>,
    pub views: Vec<ViewSummary>,
    pub links: Vec<LinkSummary>,
    pub skipped_edges: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SliceSummary {
    pub index: usize,
    pub label: String,
    pub start: String,
    pub end: String,
    pub records: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewSummary {
    pub view: &'static str,
    pub visible: bool,
    pub points: usize,
    pub visible_points: usize,
    pub highlighted: Option<u32>,
    pub layout: Layout,
    pub time_mode: TimeMode,
    /// Cube-local slice positions, in slice order.
    pub slice_positions: Vec<[f64; 3]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkSummary {
    pub group: String,
    pub edges: usize,
    pub visible_edges: usize,
    pub shown: bool,
}

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

impl Summary {
    pub fn of(controller: &SyncController) -> Self {
        let store = controller.store();
        let buckets = store.buckets();
        let mut counts = vec![0usize; buckets.len()];
        for record in store.records() {
            if let Some(i) = store.bucket_of(record)
                && let Some(count) = counts.get_mut(i)
            {
                *count += 1;
            }
        }
        let slices = buckets
            .iter()
            .map(|b| SliceSummary {
                index: b.index,
                label: buckets.label(b.index).unwrap_or_default(),
                start: b.start.format(DATE_FORMAT).to_string(),
                end: b.end.format(DATE_FORMAT).to_string(),
                records: counts.get(b.index).copied().unwrap_or(0),
            })
            .collect();

        let views = controller.views().into_iter().map(view_summary).collect();

        let net = controller.net();
        let world = net.stage().world();
        let links = net
            .link_sets()
            .map(|set| LinkSummary {
                group: match (set.kind, set.slice) {
                    (LinkKind::Juxtaposed, Some(i)) => format!("juxtaposed[{i}]"),
                    (kind, _) => format!("{kind:?}").to_lowercase(),
                },
                edges: set.len(),
                visible_edges: set.visible_count(world),
                shown: world.is_visible(set.container),
            })
            .collect();

        Self {
            records: store.len(),
            domain: store.time_domain().map(|d| {
                [
                    d.min.format(DATE_FORMAT).to_string(),
                    d.max.format(DATE_FORMAT).to_string(),
                ]
            }),
            slices,
            views,
            links,
            skipped_edges: net.skipped_edges(),
        }
    }
}

fn view_summary(view: &dyn CubeView) -> ViewSummary {
    let world = view.stage().world();
    let slices = view.slices();
    let slice_positions = (0..slices.len())
        .filter_map(|i| slices.local_position(world, i))
        .map(|p| [p.x, p.y, p.z])
        .collect();
    let state = view.state();
    ViewSummary {
        view: view.kind().name(),
        visible: view.is_visible(),
        points: view.points().len(),
        visible_points: view.points().visible_count(world),
        highlighted: view.highlighted().map(|id| id.0),
        layout: state.layout,
        time_mode: state.time_mode,
        slice_positions,
    }
}

#[cfg(test)]
mod tests {
    use super::Summary;
    use crate::config::SyncConfig;
    use crate::controller::SyncController;
    use chrono::NaiveDate;
    use data::{Record, RecordId};
    use std::collections::HashMap;

    #[test]
    fn empty_controller_summarizes_to_empty_state() {
        let controller = SyncController::new(SyncConfig::default()).expect("config");
        let summary = Summary::of(&controller);
        assert_eq!(summary.records, 0);
        assert_eq!(summary.domain, None);
        assert!(summary.slices.is_empty());
        assert_eq!(summary.views.len(), 3);
        assert!(summary.views.iter().all(|v| v.points == 0));
    }

    #[test]
    fn counts_records_per_slice() {
        let mut controller = SyncController::new(SyncConfig::default()).expect("config");
        let records = [1940, 1940, 1942]
            .iter()
            .enumerate()
            .map(|(i, year)| {
                let date = NaiveDate::from_ymd_opt(*year, 3, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .expect("valid date");
                Record::new(RecordId(i as u32), date).with_location(10.0, 50.0)
            })
            .collect();
        controller.load(records, HashMap::new());
        let summary = Summary::of(&controller);
        let counts: Vec<usize> = summary.slices.iter().map(|s| s.records).collect();
        assert_eq!(counts, vec![2, 0, 1]);
        assert_eq!(summary.views[0].slice_positions.len(), 3);
        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["views"][0]["layout"], "stacked");
    }
}
