//! Coercion of loosely-typed bridge rows into [`Course`] and [`Lesson`] records.
//!
//! Spreadsheet cells arrive as strings most of the time and as numbers when the
//! bridge guesses a type. Nothing here fails: a value that cannot be read falls
//! back to its default.

use crate::core::catalog::CourseCatalog;
use crate::domain::model::{
    Course, Lesson, NamedRange, RawRow, SheetRanges, COURSES_RANGE, LESSONS_RANGE,
};
use serde_json::Value;

pub fn normalize_course(row: &RawRow) -> Course {
    Course {
        id: text(row, "id"),
        title: text(row, "title"),
        slug: text(row, "slug"),
        description: text(row, "description"),
        thumbnail: text(row, "thumbnail"),
        price: price(row.get("price")),
        category: text(row, "category"),
    }
}

pub fn normalize_lesson(row: &RawRow) -> Lesson {
    Lesson {
        id: text(row, "id"),
        course_id: text(row, "course_id"),
        title: text(row, "title"),
        content: text(row, "content"),
        order: order(row.get("order")),
    }
}

/// Build a catalog snapshot from the fetched ranges.
pub fn normalize_ranges(mut ranges: SheetRanges) -> CourseCatalog {
    let courses = take_range(&mut ranges, COURSES_RANGE)
        .elements
        .iter()
        .map(normalize_course)
        .collect();
    let lessons = take_range(&mut ranges, LESSONS_RANGE)
        .elements
        .iter()
        .map(normalize_lesson)
        .collect();

    CourseCatalog::new(courses, lessons)
}

fn take_range(ranges: &mut SheetRanges, name: &str) -> NamedRange {
    ranges.remove(name).unwrap_or_else(|| {
        tracing::warn!("Range '{}' missing from bridge response, treating as empty", name);
        NamedRange::default()
    })
}

fn text(row: &RawRow, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn price(value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(p) if p.is_finite() && p >= 0.0 => p,
        Some(p) => {
            tracing::debug!("Price {} out of range, using 0", p);
            0.0
        }
        None => {
            if let Some(v) = value {
                tracing::debug!("Unreadable price {}, using 0", v);
            }
            0.0
        }
    }
}

fn order(value: Option<&Value>) -> i64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        if let Some(v) = value {
            tracing::debug!("Unreadable lesson order {}, using 0", v);
        }
        0
    })
}
