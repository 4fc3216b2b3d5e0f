use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder for records whose canonical category is blank.
pub const NO_CATEGORY: &str = "No Category";

/// Number of category columns carried per record.
pub const CATEGORY_COUNT: usize = 5;

#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RecordId(pub u32);

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Graph annotations derived once per dataset load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NetworkStats {
    pub degree_in: u32,
    pub degree_out: u32,
    pub degree_overall: u32,
    /// Records with an edge into this one.
    pub incoming_nodes: BTreeSet<RecordId>,
    /// Records whose first `links_per_node` targets include this one.
    pub target_by: Vec<RecordId>,
}

/// One data row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: RecordId,
    pub date_time: NaiveDateTime,
    categories: [String; CATEGORY_COUNT],
    pub longitude: f64,
    pub latitude: f64,
    /// Directed edges, in source order.
    pub target_nodes: Vec<RecordId>,
    pub labels: Vec<String>,
    pub network: NetworkStats,
}

impl Record {
    pub fn new(id: RecordId, date_time: NaiveDateTime) -> Self {
        let mut categories: [String; CATEGORY_COUNT] = Default::default();
        categories[0] = NO_CATEGORY.to_string();
        Self {
            id,
            date_time,
            categories,
            longitude: 0.0,
            latitude: 0.0,
            target_nodes: Vec::new(),
            labels: Vec::new(),
            network: NetworkStats::default(),
        }
    }

    /// Sets `category_{n}` (1-based). Out-of-range columns are ignored.
    pub fn with_category(mut self, n: usize, value: impl Into<String>) -> Self {
        self.set_category(n, value);
        self
    }

    pub fn with_location(mut self, longitude: f64, latitude: f64) -> Self {
        self.longitude = longitude;
        self.latitude = latitude;
        self
    }

    pub fn with_targets(mut self, targets: impl IntoIterator<Item = RecordId>) -> Self {
        self.target_nodes = targets.into_iter().collect();
        self
    }

    pub fn with_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels = labels.into_iter().collect();
        self
    }

    pub fn set_category(&mut self, n: usize, value: impl Into<String>) {
        if n == 0 || n > CATEGORY_COUNT {
            return;
        }
        let value = value.into();
        let trimmed = value.trim();
        self.categories[n - 1] = if n == 1 && trimmed.is_empty() {
            NO_CATEGORY.to_string()
        } else {
            trimmed.to_string()
        };
    }

    /// The canonical grouping category; never empty.
    pub fn category_1(&self) -> &str {
        &self.categories[0]
    }

    /// `category_{n}` (1-based).
    pub fn category(&self, n: usize) -> Option<&str> {
        if n == 0 {
            return None;
        }
        self.categories.get(n - 1).map(String::as_str)
    }
}
