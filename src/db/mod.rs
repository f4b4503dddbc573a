//! Persistence gateway for the `events` table.

use std::future::Future;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use thiserror::Error;

use crate::config::DatabaseConfig;
use crate::models::{Event, NewEvent};

pub const INSERT_NOT_IMPLEMENTED: &str = "Database insert function not implemented.";
pub const FETCH_NOT_IMPLEMENTED: &str = "Database fetch function not implemented.";

pub const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id INT AUTO_INCREMENT PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    date DATE NOT NULL,
    location VARCHAR(255)
)"#;

const INSERT_EVENT_SQL: &str =
    "INSERT INTO events (title, description, date, location) VALUES (?, ?, ?, ?)";

const SELECT_EVENTS_SQL: &str =
    "SELECT id, title, description, date, location FROM events ORDER BY id";

const SELECT_EVENT_BY_ID_SQL: &str =
    "SELECT id, title, description, date, location FROM events WHERE id = ?";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    NotImplemented(&'static str),

    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("Inserted event id {0} does not fit the events.id column")]
    IdOutOfRange(u64),
}

/// Storage operations behind the HTTP handlers.
///
/// Only `ensure_schema` is mandatory. The default `insert` creates the table
/// and then reports [`StoreError::NotImplemented`], and the default
/// `fetch_all` reports it straight away.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    async fn insert(&self, _event: NewEvent) -> Result<Event, StoreError> {
        self.ensure_schema().await?;
        Err(StoreError::NotImplemented(INSERT_NOT_IMPLEMENTED))
    }

    async fn fetch_all(&self) -> Result<Vec<Event>, StoreError> {
        Err(StoreError::NotImplemented(FETCH_NOT_IMPLEMENTED))
    }
}

/// MySQL-backed store. Every operation opens its own connection and closes
/// it before returning; dropping the connection on an error path closes the
/// socket as well.
#[derive(Clone)]
pub struct MySqlEventStore {
    host: String,
    database: String,
    options: MySqlConnectOptions,
}

impl std::fmt::Debug for MySqlEventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MySqlEventStore")
            .field("host", &self.host)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

impl MySqlEventStore {
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .username(&config.user)
            .password(&config.password)
            .database(&config.name);

        Self {
            host: config.host.clone(),
            database: config.name.clone(),
            options,
        }
    }

    pub async fn connect(&self) -> Result<MySqlConnection, StoreError> {
        Ok(MySqlConnection::connect_with(&self.options).await?)
    }
}

async fn create_table(conn: &mut MySqlConnection) -> Result<(), StoreError> {
    sqlx::query(CREATE_TABLE_SQL).execute(&mut *conn).await?;
    Ok(())
}

/// Hands back `value` once the connection close has run. The work is already
/// committed, so a failed close is only logged.
async fn finish<T, F>(value: T, close: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<(), sqlx::Error>>,
{
    if let Err(err) = close.await {
        tracing::warn!(error = %err, "Failed to close database connection");
    }
    Ok(value)
}

#[async_trait]
impl EventStore for MySqlEventStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        let mut conn = self.connect().await?;
        create_table(&mut conn).await?;

        tracing::info!("Events table created or already exists");
        finish((), conn.close()).await
    }

    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError> {
        let mut conn = self.connect().await?;
        create_table(&mut conn).await?;

        let mut tx = conn.begin().await?;
        let result = sqlx::query(INSERT_EVENT_SQL)
            .bind(event.title.as_str())
            .bind(event.description.as_deref())
            .bind(event.date.as_str())
            .bind(event.location.as_deref())
            .execute(&mut *tx)
            .await?;

        let raw_id = result.last_insert_id();
        let id = i32::try_from(raw_id).map_err(|_| StoreError::IdOutOfRange(raw_id))?;

        // Read the row back so the date reflects what MySQL stored.
        let stored = sqlx::query_as::<_, Event>(SELECT_EVENT_BY_ID_SQL)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::debug!(id, title = %stored.title, "Inserted event");
        finish(stored, conn.close()).await
    }

    async fn fetch_all(&self) -> Result<Vec<Event>, StoreError> {
        let mut conn = self.connect().await?;
        create_table(&mut conn).await?;

        let events = sqlx::query_as::<_, Event>(SELECT_EVENTS_SQL)
            .fetch_all(&mut conn)
            .await?;

        tracing::debug!(count = events.len(), "Fetched events");
        finish(events, conn.close()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct SchemaOnlyStore {
        schema_calls: AtomicUsize,
    }

    #[async_trait]
    impl EventStore for SchemaOnlyStore {
        async fn ensure_schema(&self) -> Result<(), StoreError> {
            self.schema_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn launch() -> NewEvent {
        NewEvent {
            title: "Launch".to_string(),
            description: None,
            date: "2024-01-01".to_string(),
            location: None,
        }
    }

    #[tokio::test]
    async fn test_default_insert_ensures_schema_then_fails() {
        let store = SchemaOnlyStore::default();

        let err = store.insert(launch()).await.unwrap_err();

        assert!(matches!(err, StoreError::NotImplemented(INSERT_NOT_IMPLEMENTED)));
        assert_eq!(err.to_string(), INSERT_NOT_IMPLEMENTED);
        assert_eq!(store.schema_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_fetch_fails_without_touching_schema() {
        let store = SchemaOnlyStore::default();

        let err = store.fetch_all().await.unwrap_err();

        assert!(matches!(err, StoreError::NotImplemented(FETCH_NOT_IMPLEMENTED)));
        assert_eq!(store.schema_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_schema_declares_documented_columns() {
        assert!(CREATE_TABLE_SQL.contains("IF NOT EXISTS events"));
        for column in [
            "id INT AUTO_INCREMENT PRIMARY KEY",
            "title VARCHAR(255) NOT NULL",
            "description TEXT",
            "date DATE NOT NULL",
            "location VARCHAR(255)",
        ] {
            assert!(CREATE_TABLE_SQL.contains(column), "missing column {column}");
        }
    }

    #[tokio::test]
    async fn test_close_failure_after_commit_keeps_result() {
        let stored = finish(7, async { Err(sqlx::Error::PoolClosed) }).await;
        assert!(matches!(stored, Ok(7)));

        let stored = finish("row", async { Ok(()) }).await;
        assert!(matches!(stored, Ok("row")));
    }

    #[test]
    fn test_debug_omits_password() {
        let store = MySqlEventStore::new(&DatabaseConfig {
            host: "db.internal".to_string(),
            user: "admin".to_string(),
            password: "hunter2".to_string(),
            name: "events".to_string(),
        });

        let rendered = format!("{:?}", store);
        assert!(rendered.contains("db.internal"));
        assert!(!rendered.contains("hunter2"));
    }

    /// Needs a reachable MySQL configured through `DB_*` variables.
    #[tokio::test]
    #[ignore]
    async fn test_mysql_round_trip() {
        let config = crate::config::Config::from_env().expect("DB_* variables must be set");
        let store = MySqlEventStore::new(&config.database);

        store.ensure_schema().await.unwrap();
        store.ensure_schema().await.unwrap();

        let before = store.fetch_all().await.unwrap().len();
        let stored = store.insert(launch()).await.unwrap();
        let events = store.fetch_all().await.unwrap();

        assert_eq!(events.len(), before + 1);
        assert_eq!(events.last(), Some(&stored));
        assert_eq!(stored.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let mut bad_date = launch();
        bad_date.date = "tomorrow".to_string();
        assert!(matches!(
            store.insert(bad_date).await,
            Err(StoreError::Database(_))
        ));
    }
}
