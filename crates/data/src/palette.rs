use std::collections::BTreeMap;

use foundation::color::Color;
use serde::{Deserialize, Serialize};

/// Ten-color categorical scheme.
pub const CATEGORY_SCHEME: [Color; 10] = [
    Color::from_hex(0x1f77b4),
    Color::from_hex(0xff7f0e),
    Color::from_hex(0x2ca02c),
    Color::from_hex(0xd62728),
    Color::from_hex(0x9467bd),
    Color::from_hex(0x8c564b),
    Color::from_hex(0xe377c2),
    Color::from_hex(0x7f7f7f),
    Color::from_hex(0xbcbd22),
    Color::from_hex(0x17becf),
];

/// Color for categories the palette has never seen.
pub const UNKNOWN_CATEGORY_COLOR: Color = Color::from_hex(0x999999);

/// Endpoints of the temporal ramp (oldest, newest).
pub const TEMPORAL_START: Color = Color::from_hex(0xfee08b);
pub const TEMPORAL_END: Color = Color::from_hex(0x3288bd);

pub const MONOCHROME: Color = Color::from_hex(0x4682b4);

/// How node colors are derived.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeColorEncoding {
    #[default]
    Categorical,
    Temporal,
    Monochrome,
}

/// Category -> color assignment, fixed for the lifetime of a dataset.
///
/// Categories are assigned scheme slots in ascending lexical order, so the
/// mapping depends only on the set of categories, not on record order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Palette {
    colors: BTreeMap<String, Color>,
}

impl Palette {
    pub fn from_categories<'a>(categories: impl IntoIterator<Item = &'a str>) -> Self {
        let mut names: Vec<&str> = categories.into_iter().collect();
        names.sort_unstable();
        names.dedup();

        let colors = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), CATEGORY_SCHEME[i % CATEGORY_SCHEME.len()]))
            .collect();
        Self { colors }
    }

    pub fn color_for(&self, category: &str) -> Color {
        self.colors
            .get(category)
            .copied()
            .unwrap_or(UNKNOWN_CATEGORY_COLOR)
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.colors.keys().map(String::as_str)
    }
}

/// Color on the temporal ramp for a domain fraction in `[0, 1]`.
pub fn temporal_color(fraction: f64) -> Color {
    TEMPORAL_START.mix(TEMPORAL_END, fraction)
}

#[cfg(test)]
mod tests {
    use super::{
        CATEGORY_SCHEME, Palette, TEMPORAL_END, TEMPORAL_START, UNKNOWN_CATEGORY_COLOR,
        temporal_color,
    };
    use pretty_assertions::assert_eq;

    #[test]
    fn assignment_ignores_input_order_and_duplicates() {
        let a = Palette::from_categories(["war", "letters", "war", "diary"]);
        let b = Palette::from_categories(["diary", "war", "letters"]);
        assert_eq!(a, b);
        assert_eq!(a.len(), 3);
        assert_eq!(a.color_for("diary"), CATEGORY_SCHEME[0]);
        assert_eq!(a.color_for("war"), CATEGORY_SCHEME[2]);
    }

    #[test]
    fn unknown_category_gets_fallback() {
        let p = Palette::from_categories(["a"]);
        assert_eq!(p.color_for("zzz"), UNKNOWN_CATEGORY_COLOR);
        assert!(Palette::default().is_empty());
    }

    #[test]
    fn scheme_wraps_after_ten_categories() {
        let names: Vec<String> = (0..12).map(|i| format!("c{i:02}")).collect();
        let p = Palette::from_categories(names.iter().map(String::as_str));
        assert_eq!(p.color_for("c10"), CATEGORY_SCHEME[0]);
    }

    #[test]
    fn temporal_ramp_endpoints() {
        assert_eq!(temporal_color(0.0), TEMPORAL_START);
        assert_eq!(temporal_color(1.0), TEMPORAL_END);
    }
}
