// File: ./src/model/item.rs
// Record shapes exchanged with the ClickUp v2 API.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct User {
    // Task creators and assignees may come without an id.
    #[serde(default)]
    pub id: Option<u64>,
    // ClickUp sends `null` for users that never picked a username.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub status: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskPriority {
    #[serde(default)]
    pub id: Option<String>,
    pub priority: String,
    #[serde(default)]
    pub color: Option<String>,
}

impl TaskPriority {
    /// Human label: `urgent` -> `Urgent`.
    pub fn label(&self) -> String {
        let mut chars = self.priority.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

/// A task as returned by `GET /list/{id}/task`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    /// Milliseconds since the epoch, sent as a numeric string.
    pub date_created: String,
    pub creator: User,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Space {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub task_count: Option<u64>,
}

/// Body of `POST /list/{id}/task`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub assignees: Vec<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl NewTask {
    /// Task built from a text selection: no description, no assignees,
    /// normal priority.
    pub fn from_selection(selection: &str) -> Self {
        Self {
            name: selection.trim().to_string(),
            description: String::new(),
            assignees: Vec::new(),
            priority: Some(3),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CreatedTask {
    pub id: String,
    pub url: String,
}

impl CreatedTask {
    /// Markdown link inserted after the selection.
    pub fn to_markdown_link(&self) -> String {
        format!(" [task]({})", self.url)
    }
}

// --- Response envelopes ---

#[derive(Debug, Deserialize)]
pub(crate) struct TasksResponse {
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub last_page: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TeamsResponse {
    pub teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpacesResponse {
    pub spaces: Vec<Space>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListsResponse {
    pub lists: Vec<TaskList>,
}

/// Error body ClickUp sends alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub err: String,
    #[serde(default, rename = "ECODE")]
    pub ecode: Option<String>,
}
