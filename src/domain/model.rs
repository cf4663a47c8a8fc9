use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Range holding one row per course.
pub const COURSES_RANGE: &str = "courses";
/// Range holding one row per lesson.
pub const LESSONS_RANGE: &str = "lessons";
/// Ranges requested from the bridge on every load.
pub const WANTED_RANGES: [&str; 2] = [COURSES_RANGE, LESSONS_RANGE];

/// One spreadsheet row as delivered by the bridge: column name to cell value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow {
    pub data: HashMap<String, serde_json::Value>,
}

impl RawRow {
    pub fn get(&self, column: &str) -> Option<&serde_json::Value> {
        self.data.get(column)
    }
}

impl<K: Into<String>, V: Into<serde_json::Value>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            data: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Rows of a single named range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamedRange {
    #[serde(default)]
    pub elements: Vec<RawRow>,
}

impl From<Vec<RawRow>> for NamedRange {
    fn from(elements: Vec<RawRow>) -> Self {
        Self { elements }
    }
}

/// Range name to rows, as returned by a [`RangeFetcher`](super::ports::RangeFetcher).
pub type SheetRanges = HashMap<String, NamedRange>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub thumbnail: String,
    pub price: f64,
    pub category: String,
}

impl Course {
    pub fn is_free(&self) -> bool {
        self.price == 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub content: String,
    pub order: i64,
}
