use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of ids the client invents for tasks the server has not acknowledged.
pub const PLACEHOLDER_PREFIX: &str = "temp-";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
            created_at,
        }
    }

    /// Overwrites the mutable fields present in `patch`.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(PLACEHOLDER_PREFIX)
    }

    pub fn matches(&self, filter: StatusFilter) -> bool {
        match filter {
            StatusFilter::All => true,
            StatusFilter::Active => !self.completed,
            StatusFilter::Completed => self.completed,
        }
    }
}

/// Fields an update may touch. Anything else in a payload (`id`, `createdAt`)
/// is dropped during deserialization.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            completed: None,
        }
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }

    pub fn has_blank_title(&self) -> bool {
        self.title.as_deref().is_some_and(|title| title.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [
        StatusFilter::All,
        StatusFilter::Active,
        StatusFilter::Completed,
    ];

    /// Reads the `status` query value. `completed` selects completed tasks and
    /// any other non-empty value except `all` selects active ones.
    pub fn from_query(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            None | Some("") | Some("all") => StatusFilter::All,
            Some("completed") => StatusFilter::Completed,
            Some(_) => StatusFilter::Active,
        }
    }

    pub fn as_query(self) -> Option<&'static str> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Active => Some("active"),
            StatusFilter::Completed => Some("completed"),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusFilter::All => "All",
            StatusFilter::Active => "Active",
            StatusFilter::Completed => "Done",
        }
    }

    pub fn next(self) -> Self {
        match self {
            StatusFilter::All => StatusFilter::Active,
            StatusFilter::Active => StatusFilter::Completed,
            StatusFilter::Completed => StatusFilter::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, StatusFilter::All)]
    #[case(Some(""), StatusFilter::All)]
    #[case(Some("all"), StatusFilter::All)]
    #[case(Some("completed"), StatusFilter::Completed)]
    #[case(Some("active"), StatusFilter::Active)]
    #[case(Some("pending"), StatusFilter::Active)]
    fn status_query_is_parsed(#[case] status: Option<&str>, #[case] expected: StatusFilter) {
        assert_eq!(StatusFilter::from_query(status), expected);
    }

    #[test]
    fn patch_ignores_immutable_fields() {
        let patch: TaskPatch = serde_json::from_str(
            r#"{"id":"999","createdAt":"2020-01-01T00:00:00Z","completed":true}"#,
        )
        .unwrap();
        assert_eq!(patch, TaskPatch::completed(true));
    }

    #[test]
    fn apply_only_touches_supplied_fields() {
        let mut task = Task::new("1", "Learn React", Utc::now());
        task.apply(&TaskPatch::completed(true));
        assert_eq!(task.title, "Learn React");
        assert!(task.completed);

        task.apply(&TaskPatch::title("Learn Rust"));
        assert_eq!(task.title, "Learn Rust");
        assert!(task.completed);
    }

    #[test]
    fn task_serializes_camel_case() {
        let task = Task::new("1", "Learn React", Utc::now());
        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn blank_title_detection() {
        assert!(TaskPatch::title("   ").has_blank_title());
        assert!(!TaskPatch::title("x").has_blank_title());
        assert!(!TaskPatch::completed(false).has_blank_title());
    }
}
