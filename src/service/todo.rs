//! Todo aggregate operations.
//!
//! Every operation checks its inputs before touching the store, and every
//! subtask change is a read-modify-write of the whole parent item. There is
//! no version check: concurrent writers to the same item race and the last
//! `put` wins.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::models::factory;
use crate::models::todo::{SubTask, TodoDraft, TodoItem};
use crate::repository::{StorageError, TodoStore};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl ServiceError {
    fn invalid(message: &str) -> Self {
        Self::InvalidArgument(message.to_string())
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn require_todo_id(id: &str) -> Result<(), ServiceError> {
    if is_blank(id) {
        return Err(ServiceError::invalid("Todo ID cannot be empty"));
    }
    Ok(())
}

fn require_sub_task_id(id: &str) -> Result<(), ServiceError> {
    if is_blank(id) {
        return Err(ServiceError::invalid("SubTask ID cannot be empty"));
    }
    Ok(())
}

fn require_draft(draft: Option<TodoDraft>) -> Result<TodoDraft, ServiceError> {
    let draft = draft.ok_or_else(|| ServiceError::invalid("Todo item cannot be null"))?;
    if is_blank(&draft.title) {
        return Err(ServiceError::invalid("Todo title cannot be empty"));
    }
    Ok(draft)
}

#[derive(Clone)]
pub struct TodoService {
    store: Arc<dyn TodoStore>,
}

impl TodoService {
    pub fn new(store: Arc<dyn TodoStore>) -> Self {
        Self { store }
    }

    pub async fn list_todos(&self) -> Result<Vec<TodoItem>, ServiceError> {
        debug!("Fetching all todo items");
        Ok(self.store.list_all().await?)
    }

    pub async fn get_todo(&self, id: &str) -> Result<TodoItem, ServiceError> {
        require_todo_id(id)?;

        debug!(id, "Fetching todo item");
        self.store
            .get_by_id(id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Todo not found with id: {}", id)))
    }

    /// Stores a new item with a fresh id; `createdAt` and `updatedAt` are the
    /// same instant.
    pub async fn create_todo(&self, draft: Option<TodoDraft>) -> Result<TodoItem, ServiceError> {
        let draft = require_draft(draft)?;

        let now = factory::now_millis();
        let todo = draft.into_item(factory::new_id(), now, now);
        debug!(id = %todo.id, title = %todo.title, "Creating new todo item");
        self.store.put(&todo).await?;
        Ok(todo)
    }

    /// Replaces every field of the stored item with `draft`, keeping `id` and
    /// `createdAt`.
    pub async fn update_todo(
        &self,
        id: &str,
        draft: Option<TodoDraft>,
    ) -> Result<TodoItem, ServiceError> {
        require_todo_id(id)?;
        let draft = require_draft(draft)?;

        debug!(id, "Updating todo item");
        let existing = self.get_todo(id).await?;
        let todo = draft.into_item(
            existing.id,
            existing.created_at,
            factory::next_millis(existing.updated_at),
        );
        self.store.put(&todo).await?;
        Ok(todo)
    }

    pub async fn delete_todo(&self, id: &str) -> Result<(), ServiceError> {
        require_todo_id(id)?;

        debug!(id, "Deleting todo item");
        let todo = self.get_todo(id).await?;
        self.store.delete(&todo).await?;
        Ok(())
    }

    /// Appends `sub_task` as given; its id is not regenerated.
    pub async fn add_sub_task(
        &self,
        todo_id: &str,
        sub_task: Option<SubTask>,
    ) -> Result<TodoItem, ServiceError> {
        require_todo_id(todo_id)?;
        let sub_task = sub_task.ok_or_else(|| ServiceError::invalid("SubTask cannot be null"))?;

        debug!(todo_id, sub_task_id = %sub_task.id, "Adding subtask to todo");
        let mut todo = self.get_todo(todo_id).await?;
        todo.sub_tasks.push(sub_task);
        self.save(todo).await
    }

    /// Replaces the first subtask with a matching id, keeping its position.
    pub async fn update_sub_task(
        &self,
        todo_id: &str,
        sub_task_id: &str,
        updated: Option<SubTask>,
    ) -> Result<TodoItem, ServiceError> {
        require_todo_id(todo_id)?;
        require_sub_task_id(sub_task_id)?;
        let mut updated =
            updated.ok_or_else(|| ServiceError::invalid("Updated SubTask cannot be null"))?;

        debug!(todo_id, sub_task_id, "Updating subtask");
        let mut todo = self.get_todo(todo_id).await?;
        let slot = todo
            .sub_tasks
            .iter_mut()
            .find(|sub_task| sub_task.id == sub_task_id)
            .ok_or_else(|| sub_task_not_found(sub_task_id))?;
        updated.id = sub_task_id.to_string();
        *slot = updated;
        self.save(todo).await
    }

    /// Removes every subtask with the given id.
    pub async fn delete_sub_task(
        &self,
        todo_id: &str,
        sub_task_id: &str,
    ) -> Result<TodoItem, ServiceError> {
        require_todo_id(todo_id)?;
        require_sub_task_id(sub_task_id)?;

        debug!(todo_id, sub_task_id, "Deleting subtask");
        let mut todo = self.get_todo(todo_id).await?;
        let before = todo.sub_tasks.len();
        todo.sub_tasks.retain(|sub_task| sub_task.id != sub_task_id);
        if todo.sub_tasks.len() == before {
            return Err(sub_task_not_found(sub_task_id));
        }
        self.save(todo).await
    }

    async fn save(&self, mut todo: TodoItem) -> Result<TodoItem, ServiceError> {
        todo.updated_at = factory::next_millis(todo.updated_at);
        self.store.put(&todo).await?;
        Ok(todo)
    }
}

fn sub_task_not_found(sub_task_id: &str) -> ServiceError {
    ServiceError::NotFound(format!("Subtask not found with id: {}", sub_task_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts writes on top of an in-memory store.
    #[derive(Default)]
    struct RecordingStore {
        inner: InMemoryStore,
        writes: AtomicUsize,
    }

    impl RecordingStore {
        fn writes(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TodoStore for RecordingStore {
        async fn put(&self, item: &TodoItem) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.put(item).await
        }

        async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StorageError> {
            self.inner.get_by_id(id).await
        }

        async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError> {
            self.inner.list_all().await
        }

        async fn delete_by_id(&self, id: &str) -> Result<(), StorageError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete_by_id(id).await
        }
    }

    struct BrokenStore;

    #[async_trait]
    impl TodoStore for BrokenStore {
        async fn put(&self, _: &TodoItem) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn get_by_id(&self, _: &str) -> Result<Option<TodoItem>, StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }

        async fn delete_by_id(&self, _: &str) -> Result<(), StorageError> {
            Err(StorageError::Unavailable("connection refused".to_string()))
        }
    }

    fn recording_service() -> (TodoService, Arc<RecordingStore>) {
        let store = Arc::new(RecordingStore::default());
        (TodoService::new(store.clone()), store)
    }

    fn sub_task(id: &str, title: &str) -> Option<SubTask> {
        Some(SubTask::new(id, title))
    }

    fn assert_invalid<T: std::fmt::Debug>(result: Result<T, ServiceError>, message: &str) {
        match result {
            Err(ServiceError::InvalidArgument(actual)) => assert_eq!(actual, message),
            other => panic!("expected InvalidArgument({}), got {:?}", message, other),
        }
    }

    fn assert_not_found<T: std::fmt::Debug>(result: Result<T, ServiceError>) {
        assert!(
            matches!(result, Err(ServiceError::NotFound(_))),
            "expected NotFound, got {:?}",
            result
        );
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let (service, _) = recording_service();

        let created = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();
        let fetched = service.get_todo(&created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "A");
        assert!(!fetched.completed);
        assert!(fetched.sub_tasks.is_empty());
        assert_eq!(fetched.created_at, fetched.updated_at);
    }

    #[tokio::test]
    async fn create_assigns_distinct_ids() {
        let (service, _) = recording_service();
        let a = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();
        let b = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(service.list_todos().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_without_writes() {
        let (service, store) = recording_service();
        let existing = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();
        let id = existing.id.as_str();
        let writes = store.writes();

        assert_invalid(service.get_todo("").await, "Todo ID cannot be empty");
        assert_invalid(service.create_todo(None).await, "Todo item cannot be null");
        assert_invalid(
            service.create_todo(Some(TodoDraft::titled("   "))).await,
            "Todo title cannot be empty",
        );
        assert_invalid(
            service.update_todo(" ", Some(TodoDraft::titled("B"))).await,
            "Todo ID cannot be empty",
        );
        assert_invalid(service.update_todo(id, None).await, "Todo item cannot be null");
        assert_invalid(
            service.update_todo(id, Some(TodoDraft::titled(""))).await,
            "Todo title cannot be empty",
        );
        assert_invalid(service.delete_todo("").await, "Todo ID cannot be empty");
        assert_invalid(
            service.add_sub_task("", sub_task("s1", "x")).await,
            "Todo ID cannot be empty",
        );
        assert_invalid(service.add_sub_task(id, None).await, "SubTask cannot be null");
        assert_invalid(
            service.update_sub_task(id, "", sub_task("s1", "x")).await,
            "SubTask ID cannot be empty",
        );
        assert_invalid(
            service.update_sub_task(id, "s1", None).await,
            "Updated SubTask cannot be null",
        );
        assert_invalid(
            service.delete_sub_task("\t", "s1").await,
            "Todo ID cannot be empty",
        );
        assert_invalid(
            service.delete_sub_task(id, " ").await,
            "SubTask ID cannot be empty",
        );

        assert_eq!(store.writes(), writes);
        assert_eq!(service.get_todo(id).await.unwrap(), existing);
    }

    #[tokio::test]
    async fn missing_parent_is_not_found() {
        let (service, store) = recording_service();

        assert_not_found(service.get_todo("missing").await);
        assert_not_found(service.update_todo("missing", Some(TodoDraft::titled("B"))).await);
        assert_not_found(service.delete_todo("missing").await);
        assert_not_found(service.add_sub_task("missing", sub_task("s1", "x")).await);
        assert_not_found(service.update_sub_task("missing", "s1", sub_task("s1", "x")).await);
        assert_not_found(service.delete_sub_task("missing", "s1").await);

        assert_eq!(store.writes(), 0);
    }

    #[tokio::test]
    async fn not_found_message_names_the_id() {
        let (service, _) = recording_service();
        let err = service.get_todo("abc").await.unwrap_err();
        assert_eq!(err.to_string(), "Todo not found with id: abc");
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let (service, _) = recording_service();
        let created = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();

        service.delete_todo(&created.id).await.unwrap();

        assert_not_found(service.get_todo(&created.id).await);
        assert_not_found(service.delete_todo(&created.id).await);
    }

    #[tokio::test]
    async fn update_replaces_fields_but_keeps_identity() {
        let (service, _) = recording_service();
        let created = service
            .create_todo(Some(TodoDraft {
                description: Some("old".to_string()),
                priority: Some("HIGH".to_string()),
                sub_tasks: vec![SubTask::new("s1", "keep?")],
                ..TodoDraft::titled("A")
            }))
            .await
            .unwrap();

        let updated = service
            .update_todo(&created.id, Some(TodoDraft::titled("B")))
            .await
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.title, "B");
        assert!(updated.updated_at > created.updated_at);
        // full replace: fields absent from the draft are cleared
        assert_eq!(updated.description, None);
        assert_eq!(updated.priority, None);
        assert!(updated.sub_tasks.is_empty());
        assert_eq!(service.get_todo(&created.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn add_sub_task_appends_and_refreshes_updated_at() {
        let (service, _) = recording_service();
        let created = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();

        let updated = service
            .add_sub_task(&created.id, sub_task("s1", "s1"))
            .await
            .unwrap();
        assert!(updated.updated_at > created.updated_at);
        assert_eq!(updated.created_at, created.created_at);

        let fetched = service.get_todo(&created.id).await.unwrap();
        assert_eq!(fetched.sub_tasks.len(), 1);
        assert_eq!(fetched.sub_tasks[0].title, "s1");
        assert!(!fetched.sub_tasks[0].completed);
    }

    #[tokio::test]
    async fn update_sub_task_keeps_position_and_forces_id() {
        let (service, _) = recording_service();
        let created = service
            .create_todo(Some(TodoDraft {
                sub_tasks: vec![
                    SubTask::new("a", "first"),
                    SubTask::new("b", "second"),
                    SubTask::new("c", "third"),
                ],
                ..TodoDraft::titled("A")
            }))
            .await
            .unwrap();

        let replacement = SubTask {
            id: "other".to_string(),
            title: "SECOND".to_string(),
            completed: true,
        };
        let updated = service
            .update_sub_task(&created.id, "b", Some(replacement))
            .await
            .unwrap();

        let ids: Vec<&str> = updated.sub_tasks.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
        assert_eq!(updated.sub_tasks[1].title, "SECOND");
        assert!(updated.sub_tasks[1].completed);
    }

    #[tokio::test]
    async fn unknown_sub_task_is_not_found_and_list_is_unchanged() {
        let (service, store) = recording_service();
        let created = service
            .create_todo(Some(TodoDraft {
                sub_tasks: vec![SubTask::new("a", "first")],
                ..TodoDraft::titled("A")
            }))
            .await
            .unwrap();
        let writes = store.writes();

        let err = service
            .update_sub_task(&created.id, "zzz", sub_task("zzz", "x"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Subtask not found with id: zzz");
        assert_not_found(service.delete_sub_task(&created.id, "zzz").await);

        assert_eq!(store.writes(), writes);
        assert_eq!(service.get_todo(&created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn delete_sub_task_removes_all_matching_entries() {
        let (service, _) = recording_service();
        let created = service
            .create_todo(Some(TodoDraft {
                sub_tasks: vec![
                    SubTask::new("dup", "one"),
                    SubTask::new("keep", "two"),
                    SubTask::new("dup", "three"),
                ],
                ..TodoDraft::titled("A")
            }))
            .await
            .unwrap();

        let updated = service.delete_sub_task(&created.id, "dup").await.unwrap();
        assert_eq!(updated.sub_tasks, vec![SubTask::new("keep", "two")]);
    }

    #[tokio::test]
    async fn buy_milk_scenario() {
        let (service, _) = recording_service();
        let todo = service
            .create_todo(Some(TodoDraft::titled("Buy milk")))
            .await
            .unwrap();

        service
            .add_sub_task(&todo.id, sub_task("s-2", "2%"))
            .await
            .unwrap();
        service
            .add_sub_task(&todo.id, sub_task("s-whole", "whole"))
            .await
            .unwrap();
        service
            .update_sub_task(
                &todo.id,
                "s-2",
                Some(SubTask {
                    id: "s-2".to_string(),
                    title: "2%".to_string(),
                    completed: true,
                }),
            )
            .await
            .unwrap();
        service.delete_sub_task(&todo.id, "s-whole").await.unwrap();

        let fetched = service.get_todo(&todo.id).await.unwrap();
        assert_eq!(fetched.sub_tasks.len(), 1);
        assert_eq!(fetched.sub_tasks[0].title, "2%");
        assert!(fetched.sub_tasks[0].completed);
    }

    #[tokio::test]
    async fn concurrent_sub_task_adds_lose_one_update() {
        let (service, _) = recording_service();
        let todo = service.create_todo(Some(TodoDraft::titled("A"))).await.unwrap();

        // Two writers that both read the same base state: the later put wins.
        let base = service.get_todo(&todo.id).await.unwrap();
        let mut first = base.clone();
        first.sub_tasks.push(SubTask::new("s1", "first"));
        let mut second = base;
        second.sub_tasks.push(SubTask::new("s2", "second"));
        service.save(first).await.unwrap();
        service.save(second).await.unwrap();

        let fetched = service.get_todo(&todo.id).await.unwrap();
        assert_eq!(fetched.sub_tasks, vec![SubTask::new("s2", "second")]);
    }

    #[tokio::test]
    async fn storage_failures_propagate() {
        let service = TodoService::new(Arc::new(BrokenStore));
        assert!(matches!(
            service.list_todos().await,
            Err(ServiceError::Storage(StorageError::Unavailable(_)))
        ));
        assert!(matches!(
            service.create_todo(Some(TodoDraft::titled("A"))).await,
            Err(ServiceError::Storage(_))
        ));
        assert!(matches!(
            service.get_todo("id").await,
            Err(ServiceError::Storage(_))
        ));
    }
}
