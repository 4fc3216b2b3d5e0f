use std::collections::HashMap;

use chrono::NaiveDateTime;
use foundation::color::Color;
use foundation::math::Vec2;
use tracing::{debug, info, warn};

use crate::layout::LayoutPositions;
use crate::network::add_network_degree_to_nodes;
use crate::palette::{MONOCHROME, NodeColorEncoding, Palette, temporal_color};
use crate::record::{Record, RecordId};
use crate::time::{SliceBuckets, Slicing, TimeDomain, TimeScale};

/// Default cube edge length in world units.
pub const DEFAULT_CUBE_WIDTH: f64 = 500.0;

/// Owner of the canonical record set and everything derived from it.
///
/// Views read through `&DataStore`; the only write after `set_records` is the
/// one-shot network annotation (`annotate_network`).
#[derive(Debug, Clone)]
pub struct DataStore {
    records: Vec<Record>,
    index: HashMap<RecordId, usize>,
    cube_width: f64,
    slicing: Slicing,
    domain: Option<TimeDomain>,
    scale: TimeScale,
    buckets: SliceBuckets,
    palette: Palette,
    layout: LayoutPositions,
    network_annotated: bool,
}

impl Default for DataStore {
    fn default() -> Self {
        Self::new(DEFAULT_CUBE_WIDTH)
    }
}

impl DataStore {
    pub fn new(cube_width: f64) -> Self {
        Self {
            records: Vec::new(),
            index: HashMap::new(),
            cube_width,
            slicing: Slicing::default(),
            domain: None,
            scale: TimeScale::new(None, cube_width),
            buckets: SliceBuckets::default(),
            palette: Palette::default(),
            layout: LayoutPositions::new(HashMap::new(), cube_width),
            network_annotated: false,
        }
    }

    /// Replaces the record set and recomputes the domain, scale, slices and palette.
    ///
    /// Later duplicates of an id are dropped. An empty input leaves a valid
    /// empty state. Network annotations are reset.
    pub fn set_records(&mut self, records: Vec<Record>) {
        let mut index = HashMap::with_capacity(records.len());
        let mut kept = Vec::with_capacity(records.len());
        let mut duplicates = 0usize;
        for record in records {
            if index.contains_key(&record.id) {
                duplicates += 1;
                continue;
            }
            index.insert(record.id, kept.len());
            kept.push(record);
        }
        if duplicates > 0 {
            warn!(duplicates, "dropped records with duplicate ids");
        }

        self.records = kept;
        self.index = index;
        self.network_annotated = false;
        self.domain = TimeDomain::from_dates(self.records.iter().map(|r| r.date_time));
        self.palette = Palette::from_categories(self.records.iter().map(|r| r.category_1()));
        self.rebuild_time();

        match self.domain {
            Some(d) => info!(
                records = self.records.len(),
                min = %d.min,
                max = %d.max,
                slices = self.buckets.len(),
                "dataset loaded"
            ),
            None => warn!("dataset is empty; cubes will assemble no points"),
        }
    }

    fn rebuild_time(&mut self) {
        self.scale = TimeScale::new(self.domain, self.cube_width);
        self.buckets = SliceBuckets::build(self.domain, self.slicing);
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.index.get(&id).map(|&i| &self.records[i])
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.index.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn cube_width(&self) -> f64 {
        self.cube_width
    }

    pub fn time_domain(&self) -> Option<TimeDomain> {
        self.domain
    }

    pub fn time_scale(&self) -> TimeScale {
        self.scale
    }

    pub fn slicing(&self) -> Slicing {
        self.slicing
    }

    pub fn buckets(&self) -> &SliceBuckets {
        &self.buckets
    }

    pub fn set_slicing(&mut self, slicing: Slicing) {
        self.slicing = slicing;
        self.rebuild_time();
        debug!(?slicing, slices = self.buckets.len(), "rebuilt time slices");
    }

    /// Switches to `n` equal-duration slices (`n` clamped to 1..=10).
    pub fn set_num_slices(&mut self, n: u8) {
        self.set_slicing(Slicing::uniform(n));
    }

    /// Slice index of a record's date, if it falls inside the current buckets.
    pub fn bucket_of(&self, record: &Record) -> Option<usize> {
        self.buckets.bucket_of(record.date_time)
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn color_for(&self, category: &str) -> Color {
        self.palette.color_for(category)
    }

    pub fn node_color(&self, record: &Record, encoding: NodeColorEncoding) -> Color {
        match encoding {
            NodeColorEncoding::Categorical => self.color_for(record.category_1()),
            NodeColorEncoding::Temporal => {
                let k = self.domain.map_or(0.5, |d| d.fraction(record.date_time));
                temporal_color(k)
            }
            NodeColorEncoding::Monochrome => MONOCHROME,
        }
    }

    /// Distinct `category_1` values in ascending order.
    pub fn categories(&self) -> Vec<String> {
        self.palette.categories().map(str::to_string).collect()
    }

    pub fn set_layout_positions(&mut self, raw: HashMap<RecordId, Vec2>) {
        self.layout = LayoutPositions::new(raw, self.cube_width);
        debug!(positions = self.layout.len(), "layout positions replaced");
    }

    pub fn layout(&self) -> &LayoutPositions {
        &self.layout
    }

    /// Cube-local `(x, z)` from the external layout; `None` if it has no entry for `id`.
    pub fn normalized_position(&self, id: RecordId) -> Option<Vec2> {
        self.layout.normalized(id)
    }

    /// Runs the degree/`target_by` pass once per loaded dataset.
    ///
    /// Returns `true` if the pass ran, `false` if the current records were
    /// already annotated.
    pub fn annotate_network(&mut self, links_per_node: usize) -> bool {
        if self.network_annotated {
            return false;
        }
        let scan = add_network_degree_to_nodes(&mut self.records, links_per_node);
        self.network_annotated = true;
        info!(
            records = scan.nodes,
            edges = scan.edges,
            links_per_node,
            "network degrees annotated"
        );
        true
    }

    pub fn is_network_annotated(&self) -> bool {
        self.network_annotated
    }

    /// `[start, end]` with missing bounds defaulted to the domain extrema and
    /// reversed bounds swapped. `None` only when there is no domain and a
    /// bound is missing.
    pub fn resolve_interval(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = start.or(self.domain.map(|d| d.min))?;
        let end = end.or(self.domain.map(|d| d.max))?;
        Some(if start <= end { (start, end) } else { (end, start) })
    }
}

#[cfg(test)]
mod tests {
    use super::DataStore;
    use crate::palette::{MONOCHROME, NodeColorEncoding};
    use crate::record::{Record, RecordId};
    use crate::time::Slicing;
    use chrono::{NaiveDate, NaiveDateTime};
    use foundation::math::Vec2;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn sample() -> Vec<Record> {
        vec![
            Record::new(RecordId(1), ymd(1935, 3, 1)).with_category(1, "letters"),
            Record::new(RecordId(2), ymd(1940, 6, 1)).with_category(1, "diary"),
            Record::new(RecordId(3), ymd(1945, 9, 1))
                .with_category(1, "letters")
                .with_targets([RecordId(1)]),
        ]
    }

    #[test]
    fn set_records_derives_domain_scale_and_palette() {
        let mut store = DataStore::new(500.0);
        store.set_records(sample());
        let d = store.time_domain().expect("domain");
        assert_eq!(d.min, ymd(1935, 3, 1));
        assert_eq!(d.max, ymd(1945, 9, 1));
        assert_eq!(store.time_scale().y(d.min), -250.0);
        assert_eq!(store.buckets().len(), 11);
        assert_eq!(store.categories(), vec!["diary".to_string(), "letters".to_string()]);
        assert_eq!(store.color_for("letters"), store.color_for("letters"));
        assert_ne!(store.color_for("letters"), store.color_for("diary"));
    }

    #[test]
    fn empty_dataset_is_valid_and_empty() {
        let mut store = DataStore::new(500.0);
        store.set_records(Vec::new());
        assert!(store.is_empty());
        assert!(store.time_domain().is_none());
        assert!(store.buckets().is_empty());
        assert_eq!(store.time_scale().y(ymd(2000, 1, 1)), 0.0);
        assert!(store.resolve_interval(None, None).is_none());
    }

    #[test]
    fn duplicate_ids_keep_first() {
        let mut store = DataStore::new(500.0);
        let mut records = sample();
        records.push(Record::new(RecordId(1), ymd(2000, 1, 1)));
        store.set_records(records);
        assert_eq!(store.len(), 3);
        assert_eq!(store.record(RecordId(1)).map(|r| r.date_time), Some(ymd(1935, 3, 1)));
    }

    #[test]
    fn num_slices_rebuilds_buckets() {
        let mut store = DataStore::new(500.0);
        store.set_records(sample());
        store.set_num_slices(4);
        assert_eq!(store.slicing(), Slicing::Uniform(4));
        assert_eq!(store.buckets().len(), 4);
        let last = store.record(RecordId(3)).expect("record");
        assert_eq!(store.bucket_of(last), Some(3));
    }

    #[test]
    fn network_annotation_runs_once_per_load() {
        let mut store = DataStore::new(500.0);
        store.set_records(sample());
        assert!(store.annotate_network(3));
        assert!(!store.annotate_network(3));
        assert_eq!(store.record(RecordId(1)).map(|r| r.network.degree_in), Some(1));

        store.set_records(sample());
        assert!(!store.is_network_annotated());
        assert!(store.annotate_network(3));
    }

    #[test]
    fn interval_defaults_and_swaps() {
        let mut store = DataStore::new(500.0);
        store.set_records(sample());
        assert_eq!(
            store.resolve_interval(None, Some(ymd(1940, 1, 1))),
            Some((ymd(1935, 3, 1), ymd(1940, 1, 1)))
        );
        assert_eq!(
            store.resolve_interval(Some(ymd(1944, 1, 1)), Some(ymd(1936, 1, 1))),
            Some((ymd(1936, 1, 1), ymd(1944, 1, 1)))
        );
    }

    #[test]
    fn node_colors_follow_encoding() {
        let mut store = DataStore::new(500.0);
        store.set_records(sample());
        let r = store.record(RecordId(2)).expect("record").clone();
        assert_eq!(store.node_color(&r, NodeColorEncoding::Monochrome), MONOCHROME);
        assert_eq!(
            store.node_color(&r, NodeColorEncoding::Categorical),
            store.color_for("diary")
        );
    }

    #[test]
    fn layout_positions_are_normalized() {
        let mut store = DataStore::new(100.0);
        store.set_layout_positions(HashMap::from([
            (RecordId(1), Vec2::new(0.0, 0.0)),
            (RecordId(2), Vec2::new(10.0, 10.0)),
        ]));
        assert_eq!(store.normalized_position(RecordId(2)), Some(Vec2::new(50.0, 50.0)));
        assert_eq!(store.normalized_position(RecordId(3)), None);
    }
}
