use chrono::NaiveDateTime;
use data::{DataStore, Record, RecordSet};
use serde::{Deserialize, Serialize};

/// Category + date-interval filter broadcast to every cube.
///
/// An empty `category` matches every record. Missing bounds default to the
/// dataset's time domain; reversed bounds are swapped.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecordFilter {
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub start: Option<NaiveDateTime>,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
}

impl RecordFilter {
    /// The filter that shows everything.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(
        category: impl Into<String>,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Self {
        Self {
            category: category.into(),
            start,
            end,
        }
    }

    /// Fixes the bounds against `store`'s time domain.
    ///
    /// Without a domain (empty dataset) and a missing bound nothing can pass.
    pub fn resolve(&self, store: &DataStore) -> Option<ResolvedFilter> {
        let (start, end) = store.resolve_interval(self.start, self.end)?;
        Some(ResolvedFilter {
            category: self.category.clone(),
            start,
            end,
        })
    }

    /// Ids of every record in `store` passing this filter.
    pub fn surviving(&self, store: &DataStore) -> RecordSet {
        match self.resolve(store) {
            Some(resolved) => resolved.surviving(store),
            None => RecordSet::new(),
        }
    }
}

/// A `RecordFilter` with concrete, ordered bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFilter {
    pub category: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl ResolvedFilter {
    pub fn within_interval(&self, record: &Record) -> bool {
        record.date_time >= self.start && record.date_time <= self.end
    }

    pub fn matches_category(&self, record: &Record) -> bool {
        self.category.is_empty() || record.category_1() == self.category
    }

    pub fn passes(&self, record: &Record) -> bool {
        self.within_interval(record) && self.matches_category(record)
    }

    /// Interval set intersected with category set.
    pub fn surviving(&self, store: &DataStore) -> RecordSet {
        let by_date: RecordSet = store
            .records()
            .iter()
            .filter(|r| self.within_interval(r))
            .map(|r| r.id)
            .collect();
        let by_category: RecordSet = store
            .records()
            .iter()
            .filter(|r| self.matches_category(r))
            .map(|r| r.id)
            .collect();
        by_date.intersect(&by_category)
    }
}

#[cfg(test)]
mod tests {
    use super::RecordFilter;
    use chrono::{NaiveDate, NaiveDateTime};
    use data::{DataStore, Record, RecordId};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn store() -> DataStore {
        let mut store = DataStore::new(500.0);
        store.set_records(vec![
            Record::new(RecordId(1), ymd(1935, 1, 1)).with_category(1, "a"),
            Record::new(RecordId(2), ymd(1940, 1, 1)).with_category(1, "b"),
            Record::new(RecordId(3), ymd(1945, 1, 1)).with_category(1, "a"),
        ]);
        store
    }

    fn ids(set: &data::RecordSet) -> Vec<u32> {
        set.iter().map(|id| id.0).collect()
    }

    #[test]
    fn empty_filter_keeps_everything() {
        assert_eq!(ids(&RecordFilter::all().surviving(&store())), vec![1, 2, 3]);
    }

    #[test]
    fn interval_bounds_are_inclusive() {
        let f = RecordFilter::new("", Some(ymd(1935, 1, 1)), Some(ymd(1940, 1, 1)));
        assert_eq!(ids(&f.surviving(&store())), vec![1, 2]);
    }

    #[test]
    fn category_and_interval_intersect() {
        let f = RecordFilter::new("a", Some(ymd(1936, 1, 1)), None);
        assert_eq!(ids(&f.surviving(&store())), vec![3]);
    }

    #[test]
    fn reversed_bounds_are_swapped() {
        let f = RecordFilter::new("", Some(ymd(1941, 1, 1)), Some(ymd(1939, 1, 1)));
        assert_eq!(ids(&f.surviving(&store())), vec![2]);
    }

    #[test]
    fn reads_filter_from_json_with_missing_fields() {
        let f: RecordFilter =
            serde_json::from_str(r#"{ "category": "a", "start": "1936-01-01T00:00:00" }"#)
                .expect("filter json");
        assert_eq!(f, RecordFilter::new("a", Some(ymd(1936, 1, 1)), None));
        assert_eq!(ids(&f.surviving(&store())), vec![3]);

        let all: RecordFilter = serde_json::from_str("{}").expect("empty json");
        assert_eq!(all, RecordFilter::all());
    }

    #[test]
    fn empty_store_resolves_nothing() {
        let empty = DataStore::new(500.0);
        assert!(RecordFilter::all().resolve(&empty).is_none());
        assert!(RecordFilter::all().surviving(&empty).is_empty());
    }
}
