//! Static JSON data: student directory, certificate links and FAQ content.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::gate::normalize_credential;

/// File name of the student directory inside the data directory.
pub const STUDENTS_FILE: &str = "student_id.json";

/// File name of the certificate links inside the data directory.
pub const CERTIFICATES_FILE: &str = "certificates_students.json";

/// File name of the FAQ content inside the data directory.
pub const FAQ_FILE: &str = "faq.json";

/// Errors that can occur while loading or validating data files.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("No students configured in {file}")]
    NoStudents { file: String },

    #[error("Empty student ID in {file}")]
    EmptyId { file: String },

    #[error("Duplicate ID after normalization in {file}: {id}")]
    DuplicateId { file: String, id: String },

    #[error("Invalid link for {key}: {url} (must start with http:// or https://)")]
    InvalidUrl { key: String, url: String },

    #[error("Resource at index {index} has an empty keyword")]
    EmptyKeyword { index: usize },

    #[error("Date entry at index {index} has an empty label")]
    EmptyLabel { index: usize },

    #[error("Failed to read data file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse data file {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Calendar topics students ask about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateTopic {
    /// Exam sessions.
    Exam,
    /// Tuition payment deadlines.
    Payment,
    /// Holidays and breaks.
    Holiday,
}

impl DateTopic {
    /// All topics, in routing order.
    pub const ALL: [Self; 3] = [Self::Exam, Self::Payment, Self::Holiday];
}

impl fmt::Display for DateTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Exam => "exam",
            Self::Payment => "payment",
            Self::Holiday => "holiday",
        };
        f.write_str(name)
    }
}

/// A downloadable resource matched by keyword.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLink {
    /// Keyword that triggers the link (matched case-insensitively).
    pub keyword: String,
    /// Link sent back to the student.
    pub url: String,
}

/// A published date on the academic calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateEntry {
    /// Which question this date answers.
    pub topic: DateTopic,
    /// Human readable description.
    pub label: String,
    /// The date itself.
    pub date: NaiveDate,
}

/// FAQ content: resource links and calendar dates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaqData {
    /// Resource links, checked in order.
    #[serde(default)]
    pub resources: Vec<ResourceLink>,

    /// Calendar dates.
    #[serde(default)]
    pub dates: Vec<DateEntry>,
}

impl FaqData {
    /// Returns the dates for a topic, sorted chronologically.
    #[must_use]
    pub fn dates_for(&self, topic: DateTopic) -> Vec<&DateEntry> {
        let mut dates: Vec<_> = self.dates.iter().filter(|d| d.topic == topic).collect();
        dates.sort_by_key(|d| d.date);
        dates
    }
}

/// All data files the bot needs.
#[derive(Debug, Clone, Default)]
pub struct DataBundle {
    /// Student ID to display name, IDs normalized.
    pub students: HashMap<String, String>,

    /// Student ID to certificate link, IDs normalized.
    pub certificates: HashMap<String, String>,

    /// FAQ content.
    pub faq: FaqData,
}

impl DataBundle {
    /// Loads all data files from a directory.
    ///
    /// The student directory is required unless `require_students` is false
    /// (passcode deployments). Certificates and FAQ files are optional.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file cannot be read or parsed, or if
    /// two IDs collide after normalization.
    pub fn load_from_dir(dir: impl AsRef<Path>, require_students: bool) -> Result<Self, DataError> {
        let dir = dir.as_ref();

        let students_path = dir.join(STUDENTS_FILE);
        let students = if require_students || students_path.exists() {
            normalize_ids(read_json(&students_path)?, STUDENTS_FILE)?
        } else {
            debug!("No student directory at {}", students_path.display());
            HashMap::new()
        };

        let certificates_path = dir.join(CERTIFICATES_FILE);
        let certificates = if certificates_path.exists() {
            normalize_ids(read_json(&certificates_path)?, CERTIFICATES_FILE)?
        } else {
            debug!("No certificate links at {}", certificates_path.display());
            HashMap::new()
        };

        let faq_path = dir.join(FAQ_FILE);
        let faq = if faq_path.exists() {
            read_json(&faq_path)?
        } else {
            debug!("No FAQ data at {}", faq_path.display());
            FaqData::default()
        };

        Ok(Self {
            students,
            certificates,
            faq,
        })
    }

    /// Writes all data files into a directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be written.
    pub fn save_to_dir(&self, dir: impl AsRef<Path>) -> Result<(), DataError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir).map_err(|source| DataError::Io {
            file: dir.display().to_string(),
            source,
        })?;

        let students: BTreeMap<_, _> = self.students.iter().collect();
        let certificates: BTreeMap<_, _> = self.certificates.iter().collect();

        write_json(&dir.join(STUDENTS_FILE), &students)?;
        write_json(&dir.join(CERTIFICATES_FILE), &certificates)?;
        write_json(&dir.join(FAQ_FILE), &self.faq)?;
        Ok(())
    }

    /// Validates the loaded data.
    ///
    /// Returns non-fatal warnings, such as certificates for unknown students.
    ///
    /// # Errors
    ///
    /// Returns the first hard validation error encountered.
    pub fn validate(&self, require_students: bool) -> Result<Vec<String>, DataError> {
        if require_students && self.students.is_empty() {
            return Err(DataError::NoStudents {
                file: STUDENTS_FILE.to_owned(),
            });
        }

        let mut warnings = Vec::new();

        for (id, name) in &self.students {
            if name.trim().is_empty() {
                warnings.push(format!("Student {id} has no name; greeted as Unknown"));
            }
        }

        for (id, url) in &self.certificates {
            check_url(id, url)?;
            if !self.students.is_empty() && !self.students.contains_key(id) {
                warnings.push(format!("Certificate for unknown student ID {id}"));
            }
        }

        let mut keywords = HashSet::new();
        for (index, resource) in self.faq.resources.iter().enumerate() {
            let keyword = resource.keyword.trim().to_lowercase();
            if keyword.is_empty() {
                return Err(DataError::EmptyKeyword { index });
            }
            check_url(&resource.keyword, &resource.url)?;
            if !keywords.insert(keyword) {
                warnings.push(format!(
                    "Resource keyword '{}' appears more than once; only the first is used",
                    resource.keyword
                ));
            }
        }

        for (index, entry) in self.faq.dates.iter().enumerate() {
            if entry.label.trim().is_empty() {
                return Err(DataError::EmptyLabel { index });
            }
        }

        Ok(warnings)
    }

    /// Creates example data for a new deployment.
    #[must_use]
    pub fn example() -> Self {
        let students = [
            ("ASU-1001", "Marie Joseph"),
            ("ASU-1002", "Jean Baptiste"),
            ("ASU-1003", "Nadia Pierre"),
        ]
        .into_iter()
        .map(|(id, name)| (id.to_owned(), name.to_owned()))
        .collect();

        let certificates = [(
            "ASU-1001".to_owned(),
            "https://drive.google.com/file/d/CERTIFICATE_ID/view?usp=sharing".to_owned(),
        )]
        .into_iter()
        .collect();

        let faq = FaqData {
            resources: vec![
                ResourceLink {
                    keyword: "transcript".to_owned(),
                    url: "https://drive.google.com/file/d/TRANSCRIPT_ID/view?usp=sharing"
                        .to_owned(),
                },
                ResourceLink {
                    keyword: "schedule".to_owned(),
                    url: "https://drive.google.com/file/d/SCHEDULE_ID/view?usp=sharing".to_owned(),
                },
            ],
            dates: vec![
                example_date(DateTopic::Exam, "Final exams begin", 2025, 6, 16),
                example_date(DateTopic::Payment, "Second installment due", 2025, 3, 31),
                example_date(DateTopic::Holiday, "Easter break", 2025, 4, 18),
            ],
        };

        Self {
            students,
            certificates,
            faq,
        }
    }
}

fn example_date(topic: DateTopic, label: &str, year: i32, month: u32, day: u32) -> DateEntry {
    DateEntry {
        topic,
        label: label.to_owned(),
        date: NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
    }
}

/// Normalizes map keys the same way the gate normalizes user input.
fn normalize_ids(
    raw: BTreeMap<String, String>,
    file: &str,
) -> Result<HashMap<String, String>, DataError> {
    let mut normalized = HashMap::with_capacity(raw.len());
    for (id, value) in raw {
        let key = normalize_credential(&id);
        if key.is_empty() {
            return Err(DataError::EmptyId {
                file: file.to_owned(),
            });
        }
        if normalized.insert(key.clone(), value).is_some() {
            return Err(DataError::DuplicateId {
                file: file.to_owned(),
                id: key,
            });
        }
    }
    Ok(normalized)
}

fn check_url(key: &str, url: &str) -> Result<(), DataError> {
    if url.starts_with("https://") || url.starts_with("http://") {
        Ok(())
    } else {
        Err(DataError::InvalidUrl {
            key: key.to_owned(),
            url: url.to_owned(),
        })
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let file = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|source| DataError::Io {
        file: file.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| DataError::Parse { file, source })
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DataError> {
    let file = path.display().to_string();
    let content = serde_json::to_string_pretty(value).map_err(|source| DataError::Parse {
        file: file.clone(),
        source,
    })?;
    std::fs::write(path, content).map_err(|source| DataError::Io { file, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_example_is_valid() {
        let example = DataBundle::example();
        let warnings = example.validate(true).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(example.students.len(), 3);
    }

    #[test]
    fn test_save_and_load_example() {
        let dir = tempfile::tempdir().unwrap();
        DataBundle::example().save_to_dir(dir.path()).unwrap();

        let loaded = DataBundle::load_from_dir(dir.path(), true).unwrap();
        assert_eq!(loaded.students.get("ASU-1002").map(String::as_str), Some("Jean Baptiste"));
        assert!(loaded.certificates.contains_key("ASU-1001"));
        assert_eq!(loaded.faq, DataBundle::example().faq);
    }

    #[test]
    fn test_ids_are_normalized() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), STUDENTS_FILE, r#"{" asu-7 ": "Rose"}"#);

        let loaded = DataBundle::load_from_dir(dir.path(), true).unwrap();
        assert_eq!(loaded.students.get("ASU-7").map(String::as_str), Some("Rose"));
    }

    #[test]
    fn test_duplicate_ids_after_normalization() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), STUDENTS_FILE, r#"{"a1": "One", "A1": "Two"}"#);

        let err = DataBundle::load_from_dir(dir.path(), true).unwrap_err();
        assert!(matches!(err, DataError::DuplicateId { ref id, .. } if id == "A1"));
    }

    #[test]
    fn test_missing_students_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = DataBundle::load_from_dir(dir.path(), true).unwrap_err();
        assert!(matches!(err, DataError::Io { .. }));

        let loaded = DataBundle::load_from_dir(dir.path(), false).unwrap();
        assert!(loaded.students.is_empty());
        assert!(loaded.validate(false).unwrap().is_empty());
        assert!(matches!(loaded.validate(true), Err(DataError::NoStudents { .. })));
    }

    #[test]
    fn test_invalid_certificate_url() {
        let mut data = DataBundle::example();
        data.certificates
            .insert("ASU-1002".to_owned(), "drive.google.com/nope".to_owned());
        assert!(matches!(data.validate(true), Err(DataError::InvalidUrl { .. })));
    }

    #[test]
    fn test_certificate_for_unknown_student_warns() {
        let mut data = DataBundle::example();
        data.certificates
            .insert("ASU-9999".to_owned(), "https://example.org/c.pdf".to_owned());
        let warnings = data.validate(true).unwrap();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("ASU-9999"));
    }

    #[test]
    fn test_faq_parses_dates() {
        let json = r#"{
            "dates": [
                {"topic": "exam", "label": "Midterms", "date": "2025-03-10"},
                {"topic": "exam", "label": "Finals", "date": "2025-01-05"},
                {"topic": "holiday", "label": "Carnival", "date": "2025-03-03"}
            ]
        }"#;
        let faq: FaqData = serde_json::from_str(json).unwrap();
        assert!(faq.resources.is_empty());

        let exams = faq.dates_for(DateTopic::Exam);
        assert_eq!(exams.len(), 2);
        assert_eq!(exams[0].label, "Finals");
        assert!(faq.dates_for(DateTopic::Payment).is_empty());
    }

    #[test]
    fn test_empty_resource_keyword() {
        let mut data = DataBundle::example();
        data.faq.resources.push(ResourceLink {
            keyword: "  ".to_owned(),
            url: "https://example.org".to_owned(),
        });
        assert!(matches!(data.validate(true), Err(DataError::EmptyKeyword { index: 2 })));
    }
}
