use crate::algorithms::AttributeCatalog;
use crate::error::{RecommendError, Result};
use crate::models::{Course, CourseAttributes};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Course lookups keyed by raw course id and by course name.
///
/// Every load builds a fresh instance, so two catalogs in one process never
/// share state.
#[derive(Debug, Clone, Default)]
pub struct CourseCatalog {
    courses: HashMap<String, Course>,
    name_to_id: HashMap<String, String>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads a headered CSV with columns
    /// `id, name, difficulty_level, category_id, lecturer_id` (by position).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.display().to_string();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .map_err(|e| RecommendError::Io {
                path: path_str.clone(),
                message: format!("Failed to open CSV: {e}"),
            })?;

        let mut catalog = Self::new();
        for record in reader.records() {
            let record = record.map_err(|e| RecommendError::CsvParse {
                path: path_str.clone(),
                line: e.position().map(|p| p.line()).unwrap_or(0),
                message: e.to_string(),
            })?;

            let line = record.position().map(|p| p.line()).unwrap_or(0);
            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();

            let course_id = field(0);
            if course_id.is_empty() {
                warn!("{}:{}: skipping course row without id", path_str, line);
                continue;
            }

            let course = Course::new(
                course_id,
                field(1),
                CourseAttributes::new(field(2), field(3), field(4)),
            );
            catalog.insert(course);
        }

        info!("Loaded {} courses from {}", catalog.len(), path_str);
        Ok(catalog)
    }

    pub fn insert(&mut self, course: Course) {
        if let Some(previous) = self.courses.get(&course.course_id) {
            warn!("Course {} listed twice, keeping the later row", course.course_id);
            if self.name_to_id.get(&previous.name) == Some(&course.course_id) {
                self.name_to_id.remove(&previous.name);
            }
        }
        self.name_to_id
            .insert(course.name.clone(), course.course_id.clone());
        self.courses.insert(course.course_id.clone(), course);
    }

    pub fn course(&self, course_id: &str) -> Option<&Course> {
        self.courses.get(course_id)
    }

    /// Course name, or an empty string for unknown ids.
    pub fn name_of(&self, course_id: &str) -> &str {
        self.courses
            .get(course_id)
            .map(|course| course.name.as_str())
            .unwrap_or("")
    }

    pub fn id_of(&self, name: &str) -> Option<&str> {
        self.name_to_id.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.courses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }
}

impl AttributeCatalog for CourseCatalog {
    fn attributes_of(&self, raw_iid: &str) -> CourseAttributes {
        self.courses
            .get(raw_iid)
            .map(|course| course.attributes.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_csv() {
        let mut file = NamedTempFile::new().expect("temp file");
        writeln!(file, "id,name,difficulty_level,category_id,lecturer_id").expect("write header");
        writeln!(file, "c1,Rust Basics,beginner,prog,alice").expect("write row");
        writeln!(file, "c2,\"Drawing, Intro\",beginner,art,").expect("write row");
        writeln!(file, "c3,Short Row").expect("write row");

        let catalog = CourseCatalog::load(file.path()).expect("load");
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.name_of("c2"), "Drawing, Intro");
        assert_eq!(catalog.id_of("Rust Basics"), Some("c1"));
        assert_eq!(
            catalog.attributes_of("c1"),
            CourseAttributes::new("beginner", "prog", "alice")
        );
        assert_eq!(catalog.attributes_of("c2").lecturer_id, "");
        assert_eq!(catalog.attributes_of("c3"), CourseAttributes::default());
    }

    #[test]
    fn test_unknown_course_has_empty_attributes() {
        let catalog = CourseCatalog::new();
        assert_eq!(catalog.attributes_of("missing"), CourseAttributes::default());
        assert_eq!(catalog.name_of("missing"), "");
        assert_eq!(catalog.id_of("Missing"), None);
    }

    #[test]
    fn test_reinsert_replaces_name_mapping() {
        let mut catalog = CourseCatalog::new();
        catalog.insert(Course::new("c1", "Old", CourseAttributes::default()));
        catalog.insert(Course::new("c1", "New", CourseAttributes::default()));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.id_of("Old"), None);
        assert_eq!(catalog.id_of("New"), Some("c1"));
    }

    #[test]
    fn test_missing_file() {
        let err = CourseCatalog::load("/nonexistent/courses.csv").expect_err("missing file");
        assert!(matches!(err, RecommendError::Io { .. }));
    }
}
