use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::models::todo::TodoItem;
use crate::repository::store::{StorageError, TodoStore};

/// Process-local store. Scans return items in first-insertion order.
#[derive(Clone, Debug)]
pub struct InMemoryStore {
    todos: Arc<Mutex<Vec<TodoItem>>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore {
            todos: Arc::new(Mutex::new(vec![])),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<TodoItem>>, StorageError> {
        self.todos
            .lock()
            .map_err(|_| StorageError::Unavailable("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl TodoStore for InMemoryStore {
    async fn put(&self, item: &TodoItem) -> Result<(), StorageError> {
        let mut todos = self.lock()?;
        match todos.iter().position(|t| t.id == item.id) {
            Some(index) => todos[index] = item.clone(),
            None => todos.push(item.clone()),
        }
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StorageError> {
        let todos = self.lock()?;
        Ok(todos.iter().find(|todo| todo.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError> {
        let todos = self.lock()?;
        Ok(todos.clone())
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StorageError> {
        let mut todos = self.lock()?;
        todos.retain(|todo| todo.id != id);
        Ok(())
    }
}
