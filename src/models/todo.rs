use serde::{Deserialize, Serialize};

/// A todo item together with its embedded subtasks. Stored as one document,
/// addressed by `id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    /// HIGH, MEDIUM or LOW by convention.
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTask>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubTask {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

/// Caller-supplied content of a todo item: everything except identity and
/// timestamps, which the service owns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub priority: Option<String>,
    pub due_date: Option<String>,
    pub sub_tasks: Vec<SubTask>,
}

impl TodoDraft {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Builds the stored item with the given identity and timestamps.
    pub fn into_item(self, id: String, created_at: i64, updated_at: i64) -> TodoItem {
        TodoItem {
            id,
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            due_date: self.due_date,
            sub_tasks: self.sub_tasks,
            created_at,
            updated_at,
        }
    }
}

impl SubTask {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            completed: false,
        }
    }
}
