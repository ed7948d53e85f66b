use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::factory;
use crate::models::todo::{SubTask, TodoDraft};

pub const PRIORITIES: [&str; 3] = ["HIGH", "MEDIUM", "LOW"];

/// Field name to violation message.
pub type ValidationErrors = BTreeMap<String, String>;

/// Request body for creating or replacing a todo item. Server-owned fields
/// (`id`, `createdAt`, `updatedAt`) are ignored if sent.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoPayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub sub_tasks: Vec<SubTaskPayload>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubTaskPayload {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

impl TodoPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.title.trim().is_empty() {
            errors.insert("title".to_string(), "must not be blank".to_string());
        }
        if let Some(priority) = &self.priority {
            if !PRIORITIES.contains(&priority.as_str()) {
                errors.insert(
                    "priority".to_string(),
                    format!("must be one of {}", PRIORITIES.join(", ")),
                );
            }
        }
        for (index, sub_task) in self.sub_tasks.iter().enumerate() {
            if let Err(sub_errors) = sub_task.validate() {
                for (field, message) in sub_errors {
                    errors.insert(format!("subTasks[{}].{}", index, field), message);
                }
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub fn into_draft(self) -> TodoDraft {
        TodoDraft {
            title: self.title,
            description: self.description,
            completed: self.completed,
            priority: self.priority,
            due_date: self.due_date,
            sub_tasks: self
                .sub_tasks
                .into_iter()
                .map(SubTaskPayload::into_sub_task)
                .collect(),
        }
    }
}

impl SubTaskPayload {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        if self.title.trim().is_empty() {
            let mut errors = ValidationErrors::new();
            errors.insert("title".to_string(), "must not be blank".to_string());
            return Err(errors);
        }
        Ok(())
    }

    /// Keeps a caller-supplied id, generating one when absent or blank.
    pub fn into_sub_task(self) -> SubTask {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(factory::new_id);
        SubTask {
            id,
            title: self.title,
            completed: self.completed,
        }
    }
}
