//! Credential set checked by the authentication gate.

use std::collections::HashMap;

/// Display name used when a credential has no name attached.
pub const UNKNOWN_NAME: &str = "Unknown";

/// A credential that matched, with the name to greet the student by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    /// Normalized credential (student ID or passcode).
    pub credential_id: String,
    /// Display name, or [`UNKNOWN_NAME`].
    pub display_name: String,
}

/// Fixed set of credentials accepted by the gate.
///
/// Loaded once at startup and never mutated afterwards.
#[derive(Debug, Clone)]
pub enum CredentialSet {
    /// A single shared passcode.
    Passcode(String),
    /// Student ID to display name.
    StudentIds(HashMap<String, String>),
}

/// Normalizes user input for credential comparison (trimmed, uppercase).
#[must_use]
pub fn normalize_credential(text: &str) -> String {
    text.trim().to_uppercase()
}

impl CredentialSet {
    /// Creates a passcode credential set.
    #[must_use]
    pub fn passcode(code: &str) -> Self {
        Self::Passcode(normalize_credential(code))
    }

    /// Creates a student ID credential set, normalizing every ID.
    #[must_use]
    pub fn student_ids<I>(students: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Self::StudentIds(
            students
                .into_iter()
                .map(|(id, name)| (normalize_credential(&id), name))
                .collect(),
        )
    }

    /// Checks raw user text against the set.
    #[must_use]
    pub fn resolve(&self, text: &str) -> Option<ResolvedCredential> {
        let candidate = normalize_credential(text);
        if candidate.is_empty() {
            return None;
        }

        match self {
            Self::Passcode(code) => (candidate == *code).then(|| ResolvedCredential {
                credential_id: candidate,
                display_name: UNKNOWN_NAME.to_owned(),
            }),
            Self::StudentIds(students) => students.get(&candidate).map(|name| {
                let display_name = if name.trim().is_empty() {
                    UNKNOWN_NAME.to_owned()
                } else {
                    name.clone()
                };
                ResolvedCredential {
                    credential_id: candidate,
                    display_name,
                }
            }),
        }
    }

    /// Number of accepted credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Passcode(_) => 1,
            Self::StudentIds(students) => students.len(),
        }
    }

    /// Returns true if no credential can ever match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Passcode(code) => code.is_empty(),
            Self::StudentIds(students) => students.is_empty(),
        }
    }

    /// Short name of the deployment mode, for logs.
    #[must_use]
    pub const fn mode(&self) -> &'static str {
        match self {
            Self::Passcode(_) => "passcode",
            Self::StudentIds(_) => "student-id",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn students() -> CredentialSet {
        CredentialSet::student_ids([
            ("a1".to_owned(), "Marie Joseph".to_owned()),
            ("B2".to_owned(), String::new()),
        ])
    }

    #[test]
    fn test_resolve_is_case_insensitive_and_trimmed() {
        let resolved = students().resolve("  a1 ").unwrap();
        assert_eq!(resolved.credential_id, "A1");
        assert_eq!(resolved.display_name, "Marie Joseph");
    }

    #[test]
    fn test_resolve_blank_name_is_unknown() {
        let resolved = students().resolve("b2").unwrap();
        assert_eq!(resolved.display_name, UNKNOWN_NAME);
    }

    #[test]
    fn test_resolve_miss() {
        assert!(students().resolve("A2").is_none());
        assert!(students().resolve("").is_none());
        assert!(students().resolve("   ").is_none());
    }

    #[test]
    fn test_passcode_mode() {
        let set = CredentialSet::passcode("Sapience2024");
        assert_eq!(set.len(), 1);
        assert_eq!(set.mode(), "passcode");

        let resolved = set.resolve("sapience2024").unwrap();
        assert_eq!(resolved.credential_id, "SAPIENCE2024");
        assert_eq!(resolved.display_name, UNKNOWN_NAME);
        assert!(set.resolve("sapience").is_none());
    }

    #[test]
    fn test_empty_passcode_never_matches() {
        let set = CredentialSet::passcode("  ");
        assert!(set.is_empty());
        assert!(set.resolve("").is_none());
    }
}
