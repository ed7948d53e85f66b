//! DynamoDB table addressed by a single string partition key, `id`.
//!
//! Items are whole [`TodoItem`] documents converted with `serde_dynamo`; the
//! subtask list is stored as a nested list attribute.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::{Credentials, Region};
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use serde_dynamo::{from_item, to_item};

use crate::config::DynamoConfig;
use crate::models::todo::TodoItem;
use crate::repository::store::{StorageError, TodoStore};

pub const PARTITION_KEY: &str = "id";

#[derive(Clone, Debug)]
pub struct DynamoStore {
    client: Client,
    table: String,
}

impl DynamoStore {
    pub fn new(client: Client, table: impl Into<String>) -> Self {
        Self {
            client,
            table: table.into(),
        }
    }

    /// Builds an SDK client for the configured region, endpoint and
    /// credentials. Without static credentials the default provider chain
    /// applies.
    pub async fn connect(config: &DynamoConfig) -> Self {
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(credentials) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &credentials.access_key_id,
                &credentials.secret_access_key,
                None,
                None,
                "tasksphere-static",
            ));
        }
        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config), config.table.clone())
    }

    fn key(id: &str) -> AttributeValue {
        AttributeValue::S(id.to_string())
    }
}

pub fn to_attributes(item: &TodoItem) -> Result<HashMap<String, AttributeValue>, StorageError> {
    to_item(item).map_err(StorageError::serialization)
}

pub fn from_attributes(item: HashMap<String, AttributeValue>) -> Result<TodoItem, StorageError> {
    from_item(item).map_err(StorageError::serialization)
}

#[async_trait]
impl TodoStore for DynamoStore {
    async fn put(&self, item: &TodoItem) -> Result<(), StorageError> {
        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(to_attributes(item)?))
            .send()
            .await
            .map_err(|err| StorageError::unavailable(DisplayErrorContext(err)))?;
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<TodoItem>, StorageError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, Self::key(id))
            .send()
            .await
            .map_err(|err| StorageError::unavailable(DisplayErrorContext(err)))?;
        output.item.map(from_attributes).transpose()
    }

    async fn list_all(&self) -> Result<Vec<TodoItem>, StorageError> {
        let mut items = self
            .client
            .scan()
            .table_name(&self.table)
            .into_paginator()
            .items()
            .send();
        let mut todos = Vec::new();
        while let Some(item) = items.next().await {
            let item = item.map_err(|err| StorageError::unavailable(DisplayErrorContext(err)))?;
            todos.push(from_attributes(item)?);
        }
        Ok(todos)
    }

    async fn delete_by_id(&self, id: &str) -> Result<(), StorageError> {
        self.client
            .delete_item()
            .table_name(&self.table)
            .key(PARTITION_KEY, Self::key(id))
            .send()
            .await
            .map_err(|err| StorageError::unavailable(DisplayErrorContext(err)))?;
        Ok(())
    }
}
