//! Runtime configuration read from the environment (and a `.env` file when
//! present).

use thiserror::Error;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_MONGODB_DATABASE: &str = "tasksphere";
const DEFAULT_TABLE: &str = "TodoItem";
const DEFAULT_REGION: &str = "eu-central-1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be set when STORAGE_BACKEND is {backend}")]
    Missing { name: &'static str, backend: &'static str },

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageBackend,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    MongoDb(MongoConfig),
    DynamoDb(DynamoConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamoConfig {
    pub table: String,
    pub region: String,
    pub endpoint_url: Option<String>,
    pub credentials: Option<StaticCredentials>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| dotenvy::var(name).ok())
    }

    /// Builds a config from any variable source; `lookup` returns `None` for
    /// unset variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match var("PORT") {
            Some(value) => value
                .parse()
                .map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            None => DEFAULT_PORT,
        };

        let backend = var("STORAGE_BACKEND").unwrap_or_else(|| "memory".to_string());
        let storage = match backend.to_ascii_lowercase().as_str() {
            "memory" => StorageBackend::Memory,
            "mongodb" => StorageBackend::MongoDb(MongoConfig {
                uri: var("MONGODB_URI").ok_or(ConfigError::Missing {
                    name: "MONGODB_URI",
                    backend: "mongodb",
                })?,
                database: var("MONGODB_DATABASE")
                    .unwrap_or_else(|| DEFAULT_MONGODB_DATABASE.to_string()),
                collection: var("MONGODB_COLLECTION").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            }),
            "dynamodb" => {
                let credentials = match (var("AWS_ACCESS_KEY_ID"), var("AWS_SECRET_ACCESS_KEY")) {
                    (Some(access_key_id), Some(secret_access_key)) => Some(StaticCredentials {
                        access_key_id,
                        secret_access_key,
                    }),
                    (Some(_), None) => {
                        return Err(ConfigError::Missing {
                            name: "AWS_SECRET_ACCESS_KEY",
                            backend: "dynamodb",
                        })
                    }
                    _ => None,
                };
                StorageBackend::DynamoDb(DynamoConfig {
                    table: var("DYNAMODB_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                    region: var("AWS_REGION").unwrap_or_else(|| DEFAULT_REGION.to_string()),
                    endpoint_url: var("AWS_ENDPOINT_URL"),
                    credentials,
                })
            }
            _ => {
                return Err(ConfigError::Invalid {
                    name: "STORAGE_BACKEND",
                    value: backend,
                })
            }
        };

        Ok(Self { host, port, storage })
    }

    pub fn in_memory() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            storage: StorageBackend::Memory,
        }
    }
}

impl MongoConfig {
    pub fn new(uri: String) -> Self {
        Self {
            uri,
            database: DEFAULT_MONGODB_DATABASE.to_string(),
            collection: DEFAULT_TABLE.to_string(),
        }
    }
}
