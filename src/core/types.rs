//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`ProjectKey`] - Validated project key as used by `componentKeys`
//! - [`Severity`], [`IssueType`], [`IssueStatus`] - Partition dimensions
//! - [`Issue`] - A single finding returned by the issue search API
//!
//! # Validation
//!
//! Project keys are validated at construction time so that malformed
//! input is rejected before any remote call is made.
//!
//! # Examples
//!
//! ```
//! use sonar_harvest::core::types::{ProjectKey, Severity};
//!
//! let key = ProjectKey::new("my-org_backend").unwrap();
//! assert_eq!(key.as_str(), "my-org_backend");
//!
//! assert!(ProjectKey::new("").is_err());
//! assert!(ProjectKey::new("a,b").is_err());
//!
//! assert_eq!(Severity::from("MAJOR".to_string()), Severity::Major);
//! ```

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest project key the server accepts.
const MAX_PROJECT_KEY_LEN: usize = 400;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid project key: {0}")]
    InvalidProjectKey(String),
}

/// A validated project key.
///
/// Project keys must:
/// - Not be empty
/// - Not contain whitespace or control characters
/// - Not contain `,` (the search API treats `componentKeys` as a list)
/// - Be at most 400 characters long
///
/// # Example
///
/// ```
/// use sonar_harvest::core::types::ProjectKey;
///
/// let key = ProjectKey::new("org:service").unwrap();
/// assert_eq!(key.to_string(), "org:service");
///
/// assert!(ProjectKey::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProjectKey(String);

impl ProjectKey {
    /// Create a new validated project key.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidProjectKey` if the key is malformed.
    pub fn new(key: impl Into<String>) -> Result<Self, TypeError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self(key))
    }

    fn validate(key: &str) -> Result<(), TypeError> {
        if key.is_empty() {
            return Err(TypeError::InvalidProjectKey(
                "project key cannot be empty".into(),
            ));
        }

        if key.len() > MAX_PROJECT_KEY_LEN {
            return Err(TypeError::InvalidProjectKey(format!(
                "project key exceeds {} characters",
                MAX_PROJECT_KEY_LEN
            )));
        }

        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidProjectKey(format!(
                "'{}' contains whitespace or control characters",
                key
            )));
        }

        if key.contains(',') {
            return Err(TypeError::InvalidProjectKey(format!(
                "'{}' contains ','",
                key
            )));
        }

        Ok(())
    }

    /// Get the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ProjectKey {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProjectKey> for String {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

impl AsRef<str> for ProjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Declares a server-side enumeration that round-trips unknown values.
///
/// The server adds values over time (e.g. new statuses), and reports are
/// expected to carry them through untouched, so anything unrecognised lands
/// in `Other` instead of failing deserialization.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($(#[$vmeta])* $variant,)+
            /// A value this crate does not know about, kept verbatim.
            Other(String),
        }

        impl $name {
            /// Every known value, in the server's canonical order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire representation.
            pub fn as_str(&self) -> &str {
                match self {
                    $($name::$variant => $text,)+
                    $name::Other(s) => s.as_str(),
                }
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                match value.as_str() {
                    $($text => $name::$variant,)+
                    _ => $name::Other(value),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                match value {
                    $name::Other(s) => s,
                    known => known.as_str().to_string(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

wire_enum! {
    /// Issue severity. Every issue has exactly one, so severities partition
    /// a project's issue space.
    Severity {
        Blocker => "BLOCKER",
        Critical => "CRITICAL",
        Major => "MAJOR",
        Minor => "MINOR",
        Info => "INFO",
    }
}

wire_enum! {
    /// Issue type.
    IssueType {
        CodeSmell => "CODE_SMELL",
        Bug => "BUG",
        Vulnerability => "VULNERABILITY",
        SecurityHotspot => "SECURITY_HOTSPOT",
    }
}

wire_enum! {
    /// Issue workflow status.
    IssueStatus {
        Open => "OPEN",
        Confirmed => "CONFIRMED",
        Reopened => "REOPENED",
        Resolved => "RESOLVED",
        Closed => "CLOSED",
    }
}

/// A single finding returned by the issue search API.
///
/// Only the fields the harvester inspects are typed. Everything else the
/// server sends (`message`, `line`, `rule`, `textRange`, ...) is kept in
/// [`Issue::extra`] and serialized back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    /// Unique issue key; the deduplication identity.
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<IssueType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IssueStatus>,

    /// Component path, prefixed by the project key (`project:path/to/file`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,

    /// Creation timestamp as sent by the server (`2023-04-01T10:00:00+0000`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<String>,

    /// Pass-through fields.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Issue {
    /// Create an issue carrying only a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            severity: None,
            issue_type: None,
            status: None,
            component: None,
            project: None,
            creation_date: None,
            extra: serde_json::Map::new(),
        }
    }

    /// Parse the creation timestamp.
    ///
    /// Accepts the server's `+0000` offset form as well as RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.creation_date.as_deref()?;
        DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z")
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// UTC calendar date of creation.
    pub fn created_on(&self) -> Option<NaiveDate> {
        self.created_at().map(|dt| dt.date_naive())
    }

    /// Whether this issue's component lies under the given project key.
    ///
    /// This is a plain prefix test on `component`.
    pub fn belongs_to(&self, project: &str) -> bool {
        self.component
            .as_deref()
            .is_some_and(|c| c.starts_with(project))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod project_key {
        use super::*;

        #[test]
        fn valid_keys() {
            assert!(ProjectKey::new("simple").is_ok());
            assert!(ProjectKey::new("org_project").is_ok());
            assert!(ProjectKey::new("org:module:sub").is_ok());
            assert!(ProjectKey::new("my.project-1").is_ok());
        }

        #[test]
        fn empty_rejected() {
            assert!(ProjectKey::new("").is_err());
        }

        #[test]
        fn whitespace_rejected() {
            assert!(ProjectKey::new("has space").is_err());
            assert!(ProjectKey::new("tab\there").is_err());
            assert!(ProjectKey::new("newline\n").is_err());
        }

        #[test]
        fn comma_rejected() {
            let err = ProjectKey::new("a,b").unwrap_err();
            assert!(err.to_string().contains("','"));
        }

        #[test]
        fn too_long_rejected() {
            let key = "k".repeat(MAX_PROJECT_KEY_LEN + 1);
            assert!(ProjectKey::new(key).is_err());
            assert!(ProjectKey::new("k".repeat(MAX_PROJECT_KEY_LEN)).is_ok());
        }

        #[test]
        fn serde_validates() {
            let ok: Result<ProjectKey, _> = serde_json::from_str("\"proj\"");
            assert!(ok.is_ok());

            let bad: Result<ProjectKey, _> = serde_json::from_str("\"a b\"");
            assert!(bad.is_err());
        }
    }

    mod wire_enums {
        use super::*;

        #[test]
        fn known_values_parse() {
            assert_eq!(Severity::from("BLOCKER".to_string()), Severity::Blocker);
            assert_eq!(IssueType::from("BUG".to_string()), IssueType::Bug);
            assert_eq!(
                IssueStatus::from("REOPENED".to_string()),
                IssueStatus::Reopened
            );
        }

        #[test]
        fn unknown_values_round_trip() {
            let status = IssueStatus::from("ACCEPTED".to_string());
            assert_eq!(status, IssueStatus::Other("ACCEPTED".into()));
            assert_eq!(String::from(status), "ACCEPTED");
        }

        #[test]
        fn all_lists_are_complete() {
            assert_eq!(Severity::ALL.len(), 5);
            assert_eq!(IssueType::ALL.len(), 4);
            assert_eq!(IssueStatus::ALL.len(), 5);
            assert_eq!(Severity::ALL[0].as_str(), "BLOCKER");
            assert_eq!(IssueType::ALL[3].as_str(), "SECURITY_HOTSPOT");
        }
    }

    mod issue {
        use super::*;

        #[test]
        fn deserializes_with_pass_through_fields() {
            let json = r#"{
                "key": "AX1",
                "severity": "MAJOR",
                "type": "CODE_SMELL",
                "status": "OPEN",
                "component": "proj-a:src/main.rs",
                "project": "proj-a",
                "message": "Remove this unused import.",
                "line": 12,
                "creationDate": "2023-04-01T10:15:30+0000"
            }"#;

            let issue: Issue = serde_json::from_str(json).unwrap();
            assert_eq!(issue.key, "AX1");
            assert_eq!(issue.severity, Some(Severity::Major));
            assert_eq!(issue.issue_type, Some(IssueType::CodeSmell));
            assert_eq!(issue.status, Some(IssueStatus::Open));
            assert_eq!(
                issue.extra.get("message").and_then(|v| v.as_str()),
                Some("Remove this unused import.")
            );

            let back = serde_json::to_value(&issue).unwrap();
            assert_eq!(back["type"], "CODE_SMELL");
            assert_eq!(back["line"], 12);
            assert_eq!(back["creationDate"], "2023-04-01T10:15:30+0000");
        }

        #[test]
        fn created_on_parses_server_offset() {
            let mut issue = Issue::new("a");
            issue.creation_date = Some("2023-04-01T23:30:00-0200".into());
            // 23:30 at -02:00 is the next day in UTC
            assert_eq!(
                issue.created_on(),
                NaiveDate::from_ymd_opt(2023, 4, 2)
            );
        }

        #[test]
        fn created_on_parses_rfc3339() {
            let mut issue = Issue::new("a");
            issue.creation_date = Some("2022-12-31T08:00:00Z".into());
            assert_eq!(
                issue.created_on(),
                NaiveDate::from_ymd_opt(2022, 12, 31)
            );
        }

        #[test]
        fn created_on_none_for_garbage() {
            let mut issue = Issue::new("a");
            issue.creation_date = Some("yesterday".into());
            assert!(issue.created_on().is_none());
            assert!(Issue::new("b").created_on().is_none());
        }

        #[test]
        fn belongs_to_is_prefix_match() {
            let mut issue = Issue::new("a");
            issue.component = Some("proj-a:src/x".into());
            assert!(issue.belongs_to("proj-a"));
            assert!(issue.belongs_to("proj"));
            assert!(!issue.belongs_to("proj-b"));
            assert!(!Issue::new("b").belongs_to("proj-a"));
        }
    }
}
