use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::StoreError;
use crate::codec::{decode_from_storage, decode_record_from_storage, encode_for_storage};
use crate::codec::{BillingYearView, CodecError};
use crate::domain::BillingYear;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS billing_years (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    start_month INTEGER NOT NULL,
    start_year  INTEGER NOT NULL,
    num_months  INTEGER NOT NULL,
    payload     BLOB    NOT NULL
)
"#;

/// An encoded record ready to be inserted. The denormalized columns mirror
/// the payload header.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBillingYearRecord {
    pub start_month: i64,
    pub start_year: i64,
    pub num_months: i64,
    pub payload: Vec<u8>,
}

impl NewBillingYearRecord {
    pub fn encode(by: &BillingYear) -> Result<Self, CodecError> {
        Ok(Self {
            start_month: i64::from(by.start_month),
            start_year: i64::from(by.start_year),
            num_months: i64::from(by.num_months),
            payload: encode_for_storage(by)?,
        })
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StoredBillingYear {
    pub id: i64,
    pub start_month: i64,
    pub start_year: i64,
    pub num_months: i64,
    pub payload: Vec<u8>,
}

impl StoredBillingYear {
    pub fn view(&self) -> Result<BillingYearView, CodecError> {
        decode_from_storage(&self.payload)
    }

    pub fn record(&self) -> Result<BillingYear, CodecError> {
        decode_record_from_storage(&self.payload)
    }
}

/// Persistence for encoded billing years. Records are immutable once stored.
#[async_trait::async_trait]
pub trait BillingYearStore: Send + Sync {
    /// Inserts a record and returns its newly assigned id.
    async fn put(&self, record: &NewBillingYearRecord) -> Result<i64, StoreError>;

    async fn get(&self, id: i64) -> Result<StoredBillingYear, StoreError>;

    /// Every record, in insertion order.
    async fn list_all(&self) -> Result<Vec<StoredBillingYear>, StoreError>;

    /// Returns `false` when no record had this id.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;
}

#[derive(Clone)]
pub struct SqliteBillingYearStore {
    pool: SqlitePool,
}

impl SqliteBillingYearStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let opts = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;
        Ok(Self::new(pool))
    }

    /// A private in-memory database. The pool pins a single connection so the
    /// database lives as long as the store.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// Creates the table if it does not exist yet.
    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE).execute(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl BillingYearStore for SqliteBillingYearStore {
    async fn put(&self, record: &NewBillingYearRecord) -> Result<i64, StoreError> {
        let mut tx = self.pool.begin().await?;
        let id = sqlx::query(
            r#"
            INSERT INTO billing_years (start_month, start_year, num_months, payload)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(record.start_month)
        .bind(record.start_year)
        .bind(record.num_months)
        .bind(&record.payload)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();
        tx.commit().await?;

        tracing::debug!(id, bytes = record.payload.len(), "billing year stored");
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<StoredBillingYear, StoreError> {
        sqlx::query_as::<_, StoredBillingYear>(
            r#"
            SELECT id, start_month, start_year, num_months, payload
            FROM billing_years
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound(id))
    }

    async fn list_all(&self) -> Result<Vec<StoredBillingYear>, StoreError> {
        let rows = sqlx::query_as::<_, StoredBillingYear>(
            r#"
            SELECT id, start_month, start_year, num_months, payload
            FROM billing_years
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;
        let removed = sqlx::query("DELETE FROM billing_years WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        tx.commit().await?;

        if removed > 0 {
            tracing::debug!(id, "billing year deleted");
        }
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode;
    use crate::codec::fixtures::sample_year_json;

    async fn store() -> SqliteBillingYearStore {
        let store = SqliteBillingYearStore::in_memory().await.unwrap();
        store.init().await.unwrap();
        store
    }

    fn sample_record() -> NewBillingYearRecord {
        let by = decode(&sample_year_json()).unwrap();
        NewBillingYearRecord::encode(&by).unwrap()
    }

    #[tokio::test]
    async fn put_then_get_returns_same_payload() {
        let store = store().await;
        let record = sample_record();
        let id = store.put(&record).await.unwrap();

        let stored = store.get(id).await.unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.start_month, 5);
        assert_eq!(stored.start_year, 2024);
        assert_eq!(stored.num_months, 2);
        assert_eq!(stored.payload, record.payload);
        assert_eq!(stored.record().unwrap(), decode(&sample_year_json()).unwrap());
    }

    #[tokio::test]
    async fn ids_increase_and_are_not_reused() {
        let store = store().await;
        let record = sample_record();
        let a = store.put(&record).await.unwrap();
        let b = store.put(&record).await.unwrap();
        assert!(b > a);

        assert!(store.delete(b).await.unwrap());
        let c = store.put(&record).await.unwrap();
        assert!(c > b);
    }

    #[tokio::test]
    async fn get_missing_id_is_not_found() {
        let store = store().await;
        match store.get(42).await {
            Err(StoreError::NotFound(42)) => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = store().await;
        let id = store.put(&sample_record()).await.unwrap();
        assert!(store.delete(id).await.unwrap());
        assert!(!store.delete(id).await.unwrap());
        assert!(!store.delete(9999).await.unwrap());
        assert!(matches!(store.get(id).await, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_all_is_in_insertion_order() {
        let store = store().await;
        assert!(store.list_all().await.unwrap().is_empty());

        let mut by = decode(&sample_year_json()).unwrap();
        let first = store
            .put(&NewBillingYearRecord::encode(&by).unwrap())
            .await
            .unwrap();
        by.start_year = 2025;
        by.billing_months.clear();
        let second = store
            .put(&NewBillingYearRecord::encode(&by).unwrap())
            .await
            .unwrap();

        let all = store.list_all().await.unwrap();
        assert_eq!(all.iter().map(|r| r.id).collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(all[1].start_year, 2025);
        assert_eq!(all[1].view().unwrap().start_year, 2025);
    }

    #[tokio::test]
    async fn dropped_transaction_leaves_nothing_visible() {
        let store = store().await;
        let record = sample_record();
        {
            let mut tx = store.pool().begin().await.unwrap();
            sqlx::query(
                "INSERT INTO billing_years (start_month, start_year, num_months, payload) VALUES (?, ?, ?, ?)",
            )
            .bind(record.start_month)
            .bind(record.start_year)
            .bind(record.num_months)
            .bind(&record.payload)
            .execute(&mut *tx)
            .await
            .unwrap();
        }
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_payload_surfaces_as_codec_error() {
        let store = store().await;
        let id = store
            .put(&NewBillingYearRecord {
                start_month: 5,
                start_year: 2024,
                num_months: 2,
                payload: b"not json".to_vec(),
            })
            .await
            .unwrap();
        let stored = store.get(id).await.unwrap();
        assert!(matches!(stored.view(), Err(CodecError::Corrupt(_))));
    }
}
