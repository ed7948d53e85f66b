pub mod dynamo;
pub mod memory;
pub mod mongo;
pub mod store;

pub use dynamo::DynamoStore;
pub use memory::InMemoryStore;
pub use mongo::MongoStore;
pub use store::{StorageError, TodoStore};

use std::sync::Arc;

use crate::config::StorageBackend;

/// Opens the configured backend.
pub async fn connect(backend: &StorageBackend) -> Result<Arc<dyn TodoStore>, StorageError> {
    let store: Arc<dyn TodoStore> = match backend {
        StorageBackend::Memory => Arc::new(InMemoryStore::new()),
        StorageBackend::MongoDb(config) => Arc::new(MongoStore::connect(config).await?),
        StorageBackend::DynamoDb(config) => Arc::new(DynamoStore::connect(config).await),
    };
    Ok(store)
}
