use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Smallest and largest slice counts a user may request.
pub const MIN_SLICES: u8 = 1;
pub const MAX_SLICES: u8 = 10;

fn millis(date: NaiveDateTime) -> i64 {
    date.and_utc().timestamp_millis()
}

fn from_millis(ms: i64) -> Option<NaiveDateTime> {
    chrono::DateTime::from_timestamp_millis(ms).map(|d| d.naive_utc())
}

fn year_start(year: i32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(year, 1, 1).and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Extrema of every record's `date_time`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimeDomain {
    pub min: NaiveDateTime,
    pub max: NaiveDateTime,
}

impl TimeDomain {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDateTime>) -> Option<Self> {
        let mut out: Option<TimeDomain> = None;
        for d in dates {
            out = Some(match out {
                None => TimeDomain { min: d, max: d },
                Some(dom) => TimeDomain {
                    min: dom.min.min(d),
                    max: dom.max.max(d),
                },
            });
        }
        out
    }

    pub fn span_millis(&self) -> i64 {
        millis(self.max) - millis(self.min)
    }

    pub fn contains(&self, date: NaiveDateTime) -> bool {
        date >= self.min && date <= self.max
    }

    /// Position of `date` within the domain as a fraction (0 at `min`, 1 at `max`).
    ///
    /// A zero-length domain maps everything to 0.5.
    pub fn fraction(&self, date: NaiveDateTime) -> f64 {
        let span = self.span_millis();
        if span == 0 {
            return 0.5;
        }
        (millis(date) - millis(self.min)) as f64 / span as f64
    }
}

/// Monotonic date -> vertical coordinate mapping onto `[-W/2, +W/2]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TimeScale {
    domain: Option<TimeDomain>,
    bottom: f64,
    top: f64,
}

impl TimeScale {
    pub fn new(domain: Option<TimeDomain>, cube_width: f64) -> Self {
        Self {
            domain,
            bottom: -cube_width / 2.0,
            top: cube_width / 2.0,
        }
    }

    pub fn domain(&self) -> Option<TimeDomain> {
        self.domain
    }

    pub fn range(&self) -> (f64, f64) {
        (self.bottom, self.top)
    }

    /// Height of `date`. Without a domain every date maps to the range midpoint.
    pub fn y(&self, date: NaiveDateTime) -> f64 {
        let k = self.domain.map_or(0.5, |d| d.fraction(date));
        self.bottom + (self.top - self.bottom) * k
    }

    pub fn invert(&self, y: f64) -> Option<NaiveDateTime> {
        let d = self.domain?;
        let height = self.top - self.bottom;
        if height == 0.0 {
            return Some(d.min);
        }
        let k = (y - self.bottom) / height;
        let ms = millis(d.min) as f64 + d.span_millis() as f64 * k;
        from_millis(ms.round() as i64)
    }
}

/// How the time domain is cut into slices.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Slicing {
    /// One slice per calendar year spanned by the domain.
    #[default]
    CalendarYear,
    /// `n` equal-duration slices.
    Uniform(u8),
}

impl Slicing {
    /// Uniform slicing with `n` clamped to the allowed range.
    pub fn uniform(n: u8) -> Self {
        Slicing::Uniform(n.clamp(MIN_SLICES, MAX_SLICES))
    }
}

/// One time bucket.
///
/// Buckets are half-open `[start, end)`, except a `closed` bucket which also
/// holds `end` (the last uniform bucket, so the domain maximum has a home).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SliceBucket {
    pub index: usize,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub closed: bool,
}

impl SliceBucket {
    pub fn contains(&self, date: NaiveDateTime) -> bool {
        date >= self.start && (date < self.end || (self.closed && date == self.end))
    }
}

/// Partition of the time domain into ordered buckets.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SliceBuckets {
    slicing: Slicing,
    buckets: Vec<SliceBucket>,
    degenerate: bool,
}

impl SliceBuckets {
    pub fn build(domain: Option<TimeDomain>, slicing: Slicing) -> Self {
        let Some(domain) = domain else {
            return Self {
                slicing,
                buckets: Vec::new(),
                degenerate: false,
            };
        };

        let buckets = match slicing {
            Slicing::CalendarYear => year_buckets(domain),
            Slicing::Uniform(n) => uniform_buckets(domain, n.clamp(MIN_SLICES, MAX_SLICES)),
        };

        Self {
            slicing,
            buckets,
            degenerate: domain.span_millis() == 0,
        }
    }

    pub fn slicing(&self) -> Slicing {
        self.slicing
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SliceBucket> {
        self.buckets.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SliceBucket> {
        self.buckets.iter()
    }

    /// Bucket holding `date`, `None` if it falls outside every bucket.
    pub fn bucket_of(&self, date: NaiveDateTime) -> Option<usize> {
        if self.degenerate {
            return self.buckets.first().filter(|b| date == b.start).map(|b| b.index);
        }
        let idx = self.buckets.partition_point(|b| b.start <= date);
        let candidate = self.buckets.get(idx.checked_sub(1)?)?;
        candidate.contains(date).then_some(candidate.index)
    }

    /// Display label for a bucket (`%Y` for calendar years, `%Y-%m-%d` otherwise).
    pub fn label(&self, index: usize) -> Option<String> {
        let b = self.get(index)?;
        Some(match self.slicing {
            Slicing::CalendarYear => b.start.format("%Y").to_string(),
            Slicing::Uniform(_) => b.start.format("%Y-%m-%d").to_string(),
        })
    }
}

fn year_buckets(domain: TimeDomain) -> Vec<SliceBucket> {
    let mut out = Vec::new();
    for (index, year) in (domain.min.year()..=domain.max.year()).enumerate() {
        let (Some(start), Some(end)) = (year_start(year), year_start(year + 1)) else {
            continue;
        };
        out.push(SliceBucket {
            index,
            start,
            end,
            closed: false,
        });
    }
    out
}

fn uniform_buckets(domain: TimeDomain, n: u8) -> Vec<SliceBucket> {
    let n = n as i64;
    let min = millis(domain.min);
    let span = domain.span_millis();
    let boundary = |i: i64| {
        if i == n {
            Some(domain.max)
        } else {
            from_millis(min + span * i / n)
        }
    };

    let mut out = Vec::with_capacity(n as usize);
    for i in 0..n {
        let (Some(start), Some(end)) = (boundary(i), boundary(i + 1)) else {
            continue;
        };
        out.push(SliceBucket {
            index: i as usize,
            start,
            end,
            closed: i == n - 1,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{SliceBuckets, Slicing, TimeDomain, TimeScale};
    use chrono::{NaiveDate, NaiveDateTime};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date")
    }

    fn domain_1935_1945() -> TimeDomain {
        TimeDomain {
            min: ymd(1935, 1, 1),
            max: ymd(1945, 12, 31),
        }
    }

    #[test]
    fn domain_tracks_extrema() {
        let d = TimeDomain::from_dates([ymd(1940, 5, 1), ymd(1935, 1, 1), ymd(1945, 12, 31)])
            .expect("non-empty");
        assert_eq!(d, domain_1935_1945());
        assert!(TimeDomain::from_dates(Vec::new()).is_none());
    }

    #[test]
    fn scale_maps_domain_onto_cube_height() {
        let s = TimeScale::new(Some(domain_1935_1945()), 500.0);
        assert_eq!(s.y(ymd(1935, 1, 1)), -250.0);
        assert_eq!(s.y(ymd(1945, 12, 31)), 250.0);
        assert!(s.y(ymd(1940, 1, 1)) > s.y(ymd(1939, 1, 1)));
        assert_eq!(s.invert(-250.0), Some(ymd(1935, 1, 1)));
    }

    #[test]
    fn scale_without_domain_is_flat() {
        let s = TimeScale::new(None, 500.0);
        assert_eq!(s.y(ymd(2000, 1, 1)), 0.0);
        assert!(s.invert(0.0).is_none());
    }

    #[test]
    fn uniform_buckets_partition_domain_without_gaps() {
        let buckets = SliceBuckets::build(Some(domain_1935_1945()), Slicing::Uniform(5));
        assert_eq!(buckets.len(), 5);
        assert_eq!(buckets.get(0).map(|b| b.start), Some(ymd(1935, 1, 1)));
        assert_eq!(buckets.get(4).map(|b| b.end), Some(ymd(1945, 12, 31)));
        for pair in buckets.iter().collect::<Vec<_>>().windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }

    #[test]
    fn boundary_dates_belong_to_exactly_one_bucket() {
        let buckets = SliceBuckets::build(Some(domain_1935_1945()), Slicing::Uniform(5));
        for b in buckets.iter() {
            let owners: Vec<usize> = buckets
                .iter()
                .filter(|o| o.contains(b.start))
                .map(|o| o.index)
                .collect();
            assert_eq!(owners, vec![b.index]);
            assert_eq!(buckets.bucket_of(b.start), Some(b.index));
        }
        assert_eq!(buckets.bucket_of(ymd(1945, 12, 31)), Some(4));
        assert_eq!(buckets.bucket_of(ymd(1934, 12, 31)), None);
        assert_eq!(buckets.bucket_of(ymd(1946, 1, 1)), None);
    }

    #[test]
    fn calendar_year_buckets_follow_years() {
        let buckets = SliceBuckets::build(Some(domain_1935_1945()), Slicing::CalendarYear);
        assert_eq!(buckets.len(), 11);
        assert_eq!(buckets.bucket_of(ymd(1935, 6, 1)), Some(0));
        assert_eq!(buckets.bucket_of(ymd(1936, 1, 1)), Some(1));
        assert_eq!(buckets.bucket_of(ymd(1945, 12, 31)), Some(10));
        assert_eq!(buckets.label(1).as_deref(), Some("1936"));
    }

    #[test]
    fn clamps_requested_slice_count() {
        assert_eq!(Slicing::uniform(0), Slicing::Uniform(1));
        assert_eq!(Slicing::uniform(42), Slicing::Uniform(10));
    }

    #[test]
    fn degenerate_domain_puts_everything_in_first_bucket() {
        let d = TimeDomain {
            min: ymd(1940, 1, 1),
            max: ymd(1940, 1, 1),
        };
        let buckets = SliceBuckets::build(Some(d), Slicing::Uniform(3));
        assert_eq!(buckets.len(), 3);
        assert_eq!(buckets.bucket_of(ymd(1940, 1, 1)), Some(0));
        assert_eq!(TimeScale::new(Some(d), 100.0).y(ymd(1940, 1, 1)), 0.0);
    }
}
