//! SQLite-backed search history

use super::encode::to_portable;
use super::models::{normalize_country, SearchRecord};
use super::sanitize::{is_sensitive, strip_nested};
use crate::config::HistorySettings;
use crate::error::HistoryError;
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::fmt::Debug;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS searches (
        id        INTEGER PRIMARY KEY AUTOINCREMENT,
        query     TEXT NOT NULL,
        country   TEXT NOT NULL,
        timestamp DATETIME NOT NULL,
        results   TEXT NOT NULL,
        settings  TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_searches_timestamp ON searches (timestamp)",
];

/// Persisted search history
///
/// Cloning is cheap and shares the pool. Each operation checks a connection
/// out only for its own duration.
#[derive(Clone)]
pub struct HistoryStore {
    pool: SqlitePool,
}

impl HistoryStore {
    /// Open (creating if needed) the database named in settings
    pub async fn connect(settings: &HistorySettings) -> Result<Self, HistoryError> {
        let options = SqliteConnectOptions::from_str(&settings.database_url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(settings.busy_timeout));

        let pool = SqlitePoolOptions::new()
            .max_connections(settings.max_connections.max(1))
            .connect_with(options)
            .await?;

        info!(url = %settings.database_url, "history.connected");
        Self::with_pool(pool).await
    }

    /// Use an existing pool, preparing the schema
    pub async fn with_pool(pool: SqlitePool) -> Result<Self, HistoryError> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&pool)
                .await
                .map_err(|e| HistoryError::Migration(e.to_string()))?;
        }
        Ok(Self { pool })
    }

    /// Save a search and return the stored record.
    ///
    /// Credential keys are dropped from `settings` before anything is
    /// encoded. Values that cannot be encoded as JSON are stored as their
    /// `Debug` rendering, per settings value and for `results` as a whole.
    pub async fn add_search<R, I, K, V>(
        &self,
        query: &str,
        country: &str,
        results: &R,
        settings: I,
    ) -> Result<SearchRecord, HistoryError>
    where
        R: Serialize + Debug + ?Sized,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Serialize + Debug,
    {
        let settings = encode_settings(settings);
        let results = to_portable(results);
        let country = normalize_country(country);
        let timestamp = Utc::now().trunc_subsecs(6);

        let mut tx = self.pool.begin().await?;
        let res = sqlx::query(
            r#"INSERT INTO searches (query, country, timestamp, results, settings)
            VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(query)
        .bind(&country)
        .bind(format_timestamp(&timestamp))
        .bind(results.to_string())
        .bind(Value::Object(settings.clone()).to_string())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        let id = res.last_insert_rowid();
        info!(id, query = %query, country = %country, "history.add_search");

        Ok(SearchRecord {
            id,
            query: query.to_string(),
            country,
            timestamp,
            settings,
            results,
        })
    }

    /// Most recent searches first
    pub async fn get_recent(&self, limit: u32) -> Result<Vec<SearchRecord>, HistoryError> {
        let rows = sqlx::query(
            r#"SELECT id, query, country, timestamp, results, settings
            FROM searches
            ORDER BY timestamp DESC, id DESC
            LIMIT ?"#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(limit, rows = rows.len(), "history.get_recent");
        rows.iter().map(decode_row).collect()
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<SearchRecord>, HistoryError> {
        let row = sqlx::query(
            r#"SELECT id, query, country, timestamp, results, settings
            FROM searches WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(decode_row).transpose()
    }

    /// Look up a record by an id given as text; non-numeric ids match nothing
    pub async fn get_by_raw_id(&self, raw: &str) -> Result<Option<SearchRecord>, HistoryError> {
        match raw.trim().parse::<i64>() {
            Ok(id) => self.get_by_id(id).await,
            Err(_) => {
                debug!(raw_id = %raw, "history.get_by_raw_id.not_numeric");
                Ok(None)
            }
        }
    }

    /// Delete a record, returning whether one was removed
    pub async fn delete(&self, id: i64) -> Result<bool, HistoryError> {
        let res = sqlx::query("DELETE FROM searches WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = res.rows_affected() > 0;
        info!(id, deleted, "history.delete");
        Ok(deleted)
    }

    /// Overlay top-level keys onto a record's results.
    ///
    /// Existing keys not named in `partial` are kept. Returns false when the
    /// record does not exist.
    pub async fn update_results(
        &self,
        id: i64,
        partial: &Map<String, Value>,
    ) -> Result<bool, HistoryError> {
        // IMMEDIATE takes the write lock up front so concurrent merges
        // serialize instead of overwriting each other. Dropping the
        // transaction on any early exit rolls it back.
        let mut tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        let updated = match merge_results(&mut tx, id, partial).await {
            Ok(updated) => updated,
            Err(err) => {
                error!(id, error = %err, "history.update_results.failed");
                return Err(err.into());
            }
        };
        tx.commit().await?;

        info!(id, updated, keys = partial.len(), "history.update_results");
        Ok(updated)
    }

    /// Delete every record, returning how many were removed
    pub async fn clear(&self) -> Result<u64, HistoryError> {
        let res = sqlx::query("DELETE FROM searches")
            .execute(&self.pool)
            .await?;
        info!(removed = res.rows_affected(), "history.clear");
        Ok(res.rows_affected())
    }

    pub async fn count(&self) -> Result<i64, HistoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM searches")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn merge_results(
    conn: &mut SqliteConnection,
    id: i64,
    partial: &Map<String, Value>,
) -> Result<bool, sqlx::Error> {
    let stored: Option<String> = sqlx::query_scalar("SELECT results FROM searches WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(stored) = stored else {
        return Ok(false);
    };

    let mut merged = match parse_json(&stored) {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };
    for (key, value) in partial {
        merged.insert(key.clone(), value.clone());
    }

    sqlx::query("UPDATE searches SET results = ? WHERE id = ?")
        .bind(Value::Object(merged).to_string())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(true)
}

fn encode_settings<I, K, V>(settings: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Serialize + Debug,
{
    let mut encoded = Map::new();
    for (key, value) in settings {
        let key = key.into();
        if is_sensitive(&key) {
            continue;
        }
        let mut value = to_portable(&value);
        strip_nested(&mut value);
        encoded.insert(key, value);
    }
    encoded
}

/// Fixed-width UTC text so that string order is time order
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_json(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

fn decode_row(row: &SqliteRow) -> Result<SearchRecord, HistoryError> {
    let settings = match parse_json(&row.try_get::<String, _>("settings")?) {
        Value::Object(map) => map,
        other => {
            warn!(value = %other, "history.decode.settings_not_object");
            Map::new()
        }
    };

    Ok(SearchRecord {
        id: row.try_get("id")?,
        query: row.try_get("query")?,
        country: row.try_get("country")?,
        timestamp: row.try_get("timestamp")?,
        settings,
        results: parse_json(&row.try_get::<String, _>("results")?),
    })
}
