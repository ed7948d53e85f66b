use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::error::{Error, ErrorKind};
use mongodb::options::{ClientOptions, IndexOptions, ReplaceOptions};
use mongodb::{Client, Collection, IndexModel};

use crate::config::MongoConfig;
use crate::models::todo::TodoItem;
use crate::repository::store::{StorageError, TodoStore};

/// Todo items as documents in a single MongoDB collection, matched on their
/// own `id` field. The driver-assigned `_id` is ignored on read.
#[derive(Clone, Debug)]
pub struct MongoStore {
    client: Client,
    database: String,
    collection: String,
}

impl MongoStore {
    pub async fn connect(config: &MongoConfig) -> Result<Self, StorageError> {
        let client_options = ClientOptions::parse(&config.uri).await.map_err(storage_error)?;
        let client = Client::with_options(client_options).map_err(storage_error)?;
        let store = Self {
            client,
            database: config.database.clone(),
            collection: config.collection.clone(),
        };
        store.ensure_id_index().await?;
        Ok(store)
    }

    async fn ensure_id_index(&self) -> Result<(), StorageError> {
        let index = IndexModel::builder()
            .keys(doc! { "id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.todos()
            .create_index(index, None)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    fn todos(&self) -> Collection<TodoItem> {
        let db = self.client.database(&self.database);
        db.collection(&self.collection)
    }
}

fn storage_error(err: Error) -> StorageError {
    match *err.kind {
        ErrorKind::BsonDeserialization(_) | ErrorKind::BsonSerialization(_) => {
            StorageError::serialization(err)
        }
        _ => StorageError::unavailable(err),
    }
}

#[async_trait]
impl TodoStore for MongoStore {
    async fn put(&self, item: &TodoItem) -> Result<(), StorageError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.todos()
            .replace_one(doc! { "id": item.id.as_str() }, item, options)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StorageError> {
        self.todos()
            .find_one(doc! { "id": id }, None)
            .await
            .map_err(storage_error)
    }

    async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError> {
        let cursor = self.todos().find(None, None).await.map_err(storage_error)?;
        cursor.try_collect().await.map_err(storage_error)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StorageError> {
        self.todos()
            .delete_one(doc! { "id": id }, None)
            .await
            .map_err(storage_error)?;
        Ok(())
    }
}
