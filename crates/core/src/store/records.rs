//! Cache record lookup and upsert operations.

use super::connection::CacheDb;
use crate::Error;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// The persisted mapping from an origin URL to its cached location.
///
/// At most one record exists per origin. A record is written only after
/// the content has been successfully relocated, so a present record always
/// carries a non-empty `cached_url`. The `err` field exists for diagnostic
/// notes about failed attempts but the core flow never persists failures.
///
/// Empty and zero fields are omitted from the JSON form, matching the
/// wire format of the external interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    #[serde(rename = "original_url", default, skip_serializing_if = "String::is_empty")]
    pub origin: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub cached_url: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub err: String,

    #[serde(default, skip_serializing_if = "i64_is_zero")]
    pub time_at: i64,
}

fn i64_is_zero(v: &i64) -> bool {
    *v == 0
}

/// Key-value persistence for cache records.
///
/// `get` returns `Ok(None)` for an absent record, distinct from a backend
/// error, so callers can tell "no cache entry" from "store unavailable".
/// `upsert` is insert-or-replace keyed by origin and atomic per key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(&self, origin: &str) -> Result<Option<CacheRecord>, Error>;
    async fn upsert(&self, record: &CacheRecord) -> Result<(), Error>;
}

#[async_trait]
impl RecordStore for CacheDb {
    async fn get(&self, origin: &str) -> Result<Option<CacheRecord>, Error> {
        let origin = origin.to_string();
        self.conn
            .call(move |conn| -> Result<Option<CacheRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT origin, cached_url, err, time_at FROM records WHERE origin = ?1",
                )?;

                let result = stmt.query_row(params![origin], |row| {
                    Ok(CacheRecord {
                        origin: row.get(0)?,
                        cached_url: row.get(1)?,
                        err: row.get(2)?,
                        time_at: row.get(3)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn upsert(&self, record: &CacheRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO records (origin, cached_url, err, time_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(origin) DO UPDATE SET
                        cached_url = excluded.cached_url,
                        err = excluded.err,
                        time_at = excluded.time_at",
                    params![&record.origin, &record.cached_url, &record.err, record.time_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(origin: &str) -> CacheRecord {
        CacheRecord {
            origin: origin.to_string(),
            cached_url: format!("http://cdn.test/objects/{origin}"),
            err: String::new(),
            time_at: chrono::Utc::now().timestamp(),
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let record = make_record("https://example.com/a.jpg");

        db.upsert(&record).await.unwrap();

        let found = db.get(&record.origin).await.unwrap().unwrap();
        assert_eq!(found, record);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.get("https://example.com/absent").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_origin() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let mut record = make_record("https://example.com/a.jpg");
        db.upsert(&record).await.unwrap();

        record.cached_url = "http://cdn.test/objects/refetched".to_string();
        record.time_at += 60;
        db.upsert(&record).await.unwrap();

        let found = db.get(&record.origin).await.unwrap().unwrap();
        assert_eq!(found.cached_url, "http://cdn.test/objects/refetched");

        let count: i64 = db
            .conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_record_json_omits_empty_fields() {
        let record = CacheRecord {
            origin: "https://example.com/a.jpg".to_string(),
            cached_url: "http://cdn.test/objects/abc".to_string(),
            err: String::new(),
            time_at: 0,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("original_url"));
        assert!(json.contains("cached_url"));
        assert!(!json.contains("\"err\""));
        assert!(!json.contains("time_at"));
    }
}
