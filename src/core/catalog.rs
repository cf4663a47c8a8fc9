use crate::domain::model::{Course, Lesson};
use crate::utils::error::CatalogError;
use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;

/// Immutable snapshot of every course and lesson from one load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CourseCatalog {
    courses: Vec<Course>,
    lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFacet {
    Free,
    Paid,
}

impl PriceFacet {
    pub fn matches(self, course: &Course) -> bool {
        match self {
            PriceFacet::Free => course.is_free(),
            PriceFacet::Paid => !course.is_free(),
        }
    }
}

impl FromStr for PriceFacet {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(PriceFacet::Free),
            "paid" => Ok(PriceFacet::Paid),
            other => Err(CatalogError::InvalidConfigValueError {
                field: "price".to_string(),
                value: other.to_string(),
                reason: "expected 'free' or 'paid'".to_string(),
            }),
        }
    }
}

/// Conjunctive course filter; empty or absent parts match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseFilter {
    pub query: String,
    pub category: Option<String>,
    pub price: Option<PriceFacet>,
}

impl CourseFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price(mut self, price: PriceFacet) -> Self {
        self.price = Some(price);
        self
    }
}

impl CourseCatalog {
    pub fn new(courses: Vec<Course>, lessons: Vec<Lesson>) -> Self {
        Self { courses, lessons }
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty() && self.lessons.is_empty()
    }

    /// All courses in delivery order.
    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    /// All lessons in delivery order.
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    /// First course carrying `slug`; later duplicates are shadowed.
    pub fn course_by_slug(&self, slug: &str) -> Option<&Course> {
        self.courses.iter().find(|course| course.slug == slug)
    }

    /// Lessons of one course, ascending by `order`. Equal orders keep delivery order.
    pub fn lessons_for_course(&self, course_id: &str) -> Vec<&Lesson> {
        let mut lessons: Vec<&Lesson> = self
            .lessons
            .iter()
            .filter(|lesson| lesson.course_id == course_id)
            .collect();
        lessons.sort_by_key(|lesson| lesson.order);
        lessons
    }

    /// Distinct non-empty categories, sorted.
    pub fn categories(&self) -> Vec<&str> {
        self.courses
            .iter()
            .map(|course| course.category.as_str())
            .filter(|category| !category.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn search_courses(&self, query: &str, category: Option<&str>) -> Vec<&Course> {
        let filter = CourseFilter {
            query: query.to_string(),
            category: category.map(str::to_string),
            price: None,
        };
        self.filter_courses(&filter)
    }

    pub fn filter_courses(&self, filter: &CourseFilter) -> Vec<&Course> {
        let needle = filter.query.to_lowercase();
        let category = filter.category.as_deref().filter(|c| !c.is_empty());

        self.courses
            .iter()
            .filter(|course| {
                needle.is_empty()
                    || course.title.to_lowercase().contains(&needle)
                    || course.description.to_lowercase().contains(&needle)
            })
            .filter(|course| category.map_or(true, |c| course.category == c))
            .filter(|course| filter.price.map_or(true, |facet| facet.matches(course)))
            .collect()
    }
}
